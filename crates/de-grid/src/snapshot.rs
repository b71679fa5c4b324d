//! Grid snapshots: a [`MemoryGrid`] serialized to JSON or YAML.

use std::fs;
use std::path::Path;

use crate::accessor::GridOpener;
use crate::memory::MemoryGrid;
use crate::{GridError, GridResult};

enum SnapshotFormat {
    Json,
    Yaml,
}

fn snapshot_format(path: &Path) -> GridResult<SnapshotFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(SnapshotFormat::Json),
        Some("yaml") | Some("yml") => Ok(SnapshotFormat::Yaml),
        _ => Err(GridError::UnsupportedExtension {
            path: path.to_path_buf(),
        }),
    }
}

pub fn load_snapshot(path: &Path) -> GridResult<MemoryGrid> {
    if !path.exists() {
        return Err(GridError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let mut grid: MemoryGrid = match snapshot_format(path)? {
        SnapshotFormat::Json => serde_json::from_str(&content)?,
        SnapshotFormat::Yaml => serde_yaml::from_str(&content)?,
    };
    grid.validate()?;
    grid.id = path.display().to_string();
    Ok(grid)
}

pub fn save_snapshot(path: &Path, grid: &MemoryGrid) -> GridResult<()> {
    grid.validate()?;
    let content = match snapshot_format(path)? {
        SnapshotFormat::Json => serde_json::to_string(grid)?,
        SnapshotFormat::Yaml => serde_yaml::to_string(grid)?,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Opens grid snapshot files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotOpener;

impl GridOpener for SnapshotOpener {
    type Accessor = MemoryGrid;

    fn open(&self, path: &Path) -> GridResult<MemoryGrid> {
        load_snapshot(path)
    }
}
