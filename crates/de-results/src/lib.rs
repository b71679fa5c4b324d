//! de-results: difference-energy result mapping and its on-disk cache.

pub mod codec;
pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_fingerprint;
pub use store::{ResultStore, StoreFormat, load, save};
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Cache artifact not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported format '{format}' (expected json or yaml)")]
    UnsupportedFormat { format: String },

    #[error("Artifact schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Invalid base name: {message}")]
    InvalidName { message: String },
}
