//! de-grid: access to gridded model output.
//!
//! The native model file reader lives outside this workspace. This crate
//! defines the narrow interface the energy engine consumes
//! ([`GridAccessor`], [`GridOpener`]) plus two implementations: an
//! in-memory grid and a serialized grid snapshot on disk.

pub mod accessor;
pub mod memory;
pub mod snapshot;

pub use accessor::{GridAccessor, GridOpener};
pub use memory::{MemoryGrid, MemoryOpener};
pub use snapshot::{SnapshotOpener, load_snapshot, save_snapshot};

use std::path::PathBuf;

use de_core::Timestamp;

/// Variable names as written by the model.
pub mod vars {
    /// x-wind component (staggered in x).
    pub const U: &str = "U";
    /// y-wind component (staggered in y).
    pub const V: &str = "V";
    /// Perturbation potential temperature.
    pub const T: &str = "T";
    /// Perturbation pressure.
    pub const P: &str = "P";
    /// Base-state pressure.
    pub const PB: &str = "PB";
}

pub type GridResult<T> = Result<T, GridError>;

#[derive(thiserror::Error, Debug)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Grid file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported grid file extension: {path}")]
    UnsupportedExtension { path: PathBuf },

    #[error("Variable '{name}' not found in {grid}")]
    VariableNotFound { grid: String, name: String },

    #[error("Time {time} not found in {grid}")]
    TimeNotFound { grid: String, time: Timestamp },

    #[error("Variable '{name}' has {found} time steps, time axis has {expected}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}
