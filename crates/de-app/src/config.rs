//! YAML configuration of a difference energy computation.

use std::path::{Path, PathBuf};

use de_core::{Level, Timestamp, from_epoch_seconds, parse_timestamp};
use de_energy::{EnergyKind, IntegrationMode, VerticalBounds};
use de_results::StoreFormat;
use serde::{Deserialize, Serialize};

use crate::compute_service::{ComputeOptions, ComputeRequest, DEFAULT_BASE_NAME, OutputRequest};
use crate::error::{AppError, AppResult};

/// A single value or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

/// A time given as epoch seconds or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(i64),
    Text(String),
}

impl TimeValue {
    pub fn resolve(&self) -> AppResult<Timestamp> {
        match self {
            Self::Seconds(secs) => from_epoch_seconds(*secs).ok_or_else(|| {
                AppError::Config(format!("Epoch seconds {} out of range", secs))
            }),
            Self::Text(raw) => Ok(parse_timestamp(raw)?),
        }
    }
}

/// `d_save`: `true` saves to `$HOME`, `false` disables saving, a string
/// names the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SaveTarget {
    Flag(bool),
    Dir(PathBuf),
}

impl Default for SaveTarget {
    fn default() -> Self {
        SaveTarget::Flag(true)
    }
}

impl SaveTarget {
    pub fn resolve(&self) -> AppResult<Option<PathBuf>> {
        match self {
            SaveTarget::Flag(false) => Ok(None),
            SaveTarget::Flag(true) => std::env::var_os("HOME")
                .map(|home| Some(PathBuf::from(home)))
                .ok_or_else(|| AppError::Config("d_save is true but HOME is not set".to_string())),
            SaveTarget::Dir(dir) => Ok(Some(dir.clone())),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fname() -> String {
    DEFAULT_BASE_NAME.to_string()
}

fn default_format() -> String {
    StoreFormat::default().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEnergyConfig {
    /// `sum_z` or `sum_xyz`.
    pub ptype: String,
    /// `kinetic` or `total`.
    pub energy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<Level>,
    pub files: Vec<PathBuf>,
    pub times: OneOrMany<TimeValue>,
    #[serde(default)]
    pub d_save: SaveTarget,
    #[serde(default = "default_true")]
    pub d_return: bool,
    #[serde(default = "default_fname")]
    pub d_fname: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Vec<String>>,
}

impl DiffEnergyConfig {
    /// Validate and convert into a compute request.
    pub fn into_request(self) -> AppResult<ComputeRequest> {
        let mode: IntegrationMode = self.ptype.parse()?;
        let energy: EnergyKind = self.energy.parse()?;
        let bounds = VerticalBounds::from_levels(self.lower, self.upper)?;
        let format: StoreFormat = self.format.parse()?;

        if self.files.len() < 2 {
            return Err(AppError::Config(format!(
                "At least two files are needed to form a pair, got {}",
                self.files.len()
            )));
        }

        let times = self
            .times
            .into_vec()
            .iter()
            .map(TimeValue::resolve)
            .collect::<AppResult<Vec<_>>>()?;
        if times.is_empty() {
            return Err(AppError::Config("No times given".to_string()));
        }

        Ok(ComputeRequest {
            mode,
            energy,
            bounds,
            files: self.files,
            times,
            output: OutputRequest {
                persist_to: self.d_save.resolve()?,
                base_name: self.d_fname,
                return_result: self.d_return,
            },
            options: ComputeOptions {
                parallel: self.parallel,
                use_cache: self.use_cache,
                format,
            },
        })
    }
}

pub fn parse_config(content: &str) -> AppResult<DiffEnergyConfig> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn load_config(path: &Path) -> AppResult<DiffEnergyConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const MINIMAL: &str = r#"
ptype: sum_z
energy: total
upper: 500
lower: 850hPa
files: [/ens/a/wrfout, /ens/b/wrfout]
times: "2011-04-19 18:00:00"
d_save: false
"#;

    #[test]
    fn minimal_config_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.d_fname, "diff_energy_data");
        assert!(config.d_return);
        assert!(config.use_cache);
        assert!(!config.parallel);

        let request = config.into_request().unwrap();
        assert_eq!(request.mode, IntegrationMode::SumZ);
        assert_eq!(request.energy, EnergyKind::Total);
        assert_eq!(request.bounds, VerticalBounds::new(Some(850.0), Some(500.0)));
        assert_eq!(
            request.times,
            vec![Utc.with_ymd_and_hms(2011, 4, 19, 18, 0, 0).unwrap()]
        );
        assert_eq!(request.output.persist_to, None);
        assert_eq!(request.options.format, StoreFormat::Json);
    }

    #[test]
    fn times_list_and_save_dir() {
        let yaml = r#"
ptype: sum_xyz
energy: kinetic
files: [a, b, c]
times: [1303236000, "2011-04-19T21:00:00Z"]
d_save: /tmp/diffenergy
d_return: false
format: yaml
"#;
        let request = parse_config(yaml).unwrap().into_request().unwrap();
        assert_eq!(request.times.len(), 2);
        assert_eq!(request.times[0], Utc.with_ymd_and_hms(2011, 4, 19, 18, 0, 0).unwrap());
        assert_eq!(request.output.persist_to, Some(PathBuf::from("/tmp/diffenergy")));
        assert!(!request.output.return_result);
        assert!(request.bounds.is_unbounded());
        assert_eq!(request.options.format, StoreFormat::Yaml);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_mode = MINIMAL.replace("sum_z", "sum_xy");
        assert!(matches!(
            parse_config(&bad_mode).unwrap().into_request(),
            Err(AppError::Energy(_))
        ));

        let bad_level = MINIMAL.replace("upper: 500", "upper: 320K");
        assert!(matches!(
            parse_config(&bad_level).unwrap().into_request(),
            Err(AppError::Core(_))
        ));

        let bad_format = format!("{}format: pickle\n", MINIMAL);
        assert!(matches!(
            parse_config(&bad_format).unwrap().into_request(),
            Err(AppError::Results(_))
        ));

        let one_file = MINIMAL.replace("[/ens/a/wrfout, /ens/b/wrfout]", "[/ens/a/wrfout]");
        assert!(matches!(
            parse_config(&one_file).unwrap().into_request(),
            Err(AppError::Config(_))
        ));
    }
}
