//! Cache artifact storage API.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use tracing::info;

use crate::types::{ArtifactHeader, CacheArtifact, ResultMapping, SCHEMA_VERSION};
use crate::{ResultsError, ResultsResult};

/// Serialization format of a cache artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFormat {
    #[default]
    Json,
    Yaml,
}

impl StoreFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for StoreFormat {
    type Err = ResultsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ResultsError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    root_dir: PathBuf,
    format: StoreFormat,
}

impl ResultStore {
    /// Open a store rooted at `root_dir`, creating the directory if needed.
    pub fn new(root_dir: impl Into<PathBuf>) -> ResultsResult<Self> {
        let root_dir = root_dir.into();
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self {
            root_dir,
            format: StoreFormat::default(),
        })
    }

    /// Refer to an existing store without touching the filesystem.
    pub fn at(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            format: StoreFormat::default(),
        }
    }

    pub fn with_format(mut self, format: StoreFormat) -> Self {
        self.format = format;
        self
    }

    /// Path of the artifact for `base_name`: any extension on the base
    /// name is replaced by the format's extension.
    pub fn artifact_path(&self, base_name: &str) -> ResultsResult<PathBuf> {
        let base = Path::new(base_name);
        if base_name.trim().is_empty() || base.file_name().is_none() {
            return Err(ResultsError::InvalidName {
                message: format!("'{}' does not name a file", base_name),
            });
        }
        Ok(self
            .root_dir
            .join(base.with_extension(self.format.extension())))
    }

    pub fn save(&self, mapping: &ResultMapping, base_name: &str) -> ResultsResult<PathBuf> {
        self.save_with_fingerprint(mapping, base_name, None)
    }

    pub fn save_with_fingerprint(
        &self,
        mapping: &ResultMapping,
        base_name: &str,
        fingerprint: Option<&str>,
    ) -> ResultsResult<PathBuf> {
        let path = self.artifact_path(base_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let artifact = CacheArtifact {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now().to_rfc3339(),
            fingerprint: fingerprint.map(str::to_string),
            mapping: mapping.clone(),
        };
        let content = match self.format {
            StoreFormat::Json => serde_json::to_string(&artifact)?,
            StoreFormat::Yaml => serde_yaml::to_string(&artifact)?,
        };
        fs::write(&path, content)?;

        info!(
            path = %path.display(),
            pairs = mapping.len(),
            "Saved difference energy cache"
        );
        Ok(path)
    }

    pub fn load_artifact(&self, base_name: &str) -> ResultsResult<CacheArtifact> {
        let path = self.artifact_path(base_name)?;
        if !path.exists() {
            return Err(ResultsError::NotFound { path });
        }

        let content = fs::read_to_string(&path)?;
        let artifact: CacheArtifact = match self.format {
            StoreFormat::Json => serde_json::from_str(&content)?,
            StoreFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        check_version(artifact.schema_version)?;

        info!(
            path = %path.display(),
            pairs = artifact.mapping.len(),
            "Loaded difference energy cache"
        );
        Ok(artifact)
    }

    /// Load a mapping. Every call returns an independent copy.
    pub fn load(&self, base_name: &str) -> ResultsResult<ResultMapping> {
        Ok(self.load_artifact(base_name)?.mapping)
    }

    /// Fingerprint stored with an artifact, `None` when there is no artifact.
    /// Only the header is decoded.
    pub fn peek_fingerprint(&self, base_name: &str) -> ResultsResult<Option<String>> {
        let path = self.artifact_path(base_name)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let header: ArtifactHeader = match self.format {
            StoreFormat::Json => serde_json::from_str(&content)?,
            StoreFormat::Yaml => serde_yaml::from_str(&content)?,
        };
        check_version(header.schema_version)?;
        Ok(header.fingerprint)
    }
}

fn check_version(found: u32) -> ResultsResult<()> {
    if found > SCHEMA_VERSION {
        return Err(ResultsError::UnsupportedVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}

/// Save `mapping` as `<dir>/<base_name>.<ext>`, returning the path written.
pub fn save(
    mapping: &ResultMapping,
    dir: &Path,
    base_name: &str,
    format: &str,
) -> ResultsResult<PathBuf> {
    let format: StoreFormat = format.parse()?;
    ResultStore::new(dir)?
        .with_format(format)
        .save(mapping, base_name)
}

/// Load the mapping stored as `<dir>/<base_name>.<ext>`.
pub fn load(dir: &Path, base_name: &str, format: &str) -> ResultsResult<ResultMapping> {
    let format: StoreFormat = format.parse()?;
    ResultStore::at(dir).with_format(format).load(base_name)
}
