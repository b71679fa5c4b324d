//! Error types for the de-app service layer.

use std::path::PathBuf;

use de_core::CoreError;
use de_energy::EnergyError;
use de_grid::GridError;
use de_results::ResultsError;

/// Application error type that wraps errors from the backend crates
/// and gives the CLI one error surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Neither persistence nor an in-memory result was asked for.
    #[error("No output requested: set a save directory, request the result, or both")]
    NoOutputRequested,

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Energy error: {0}")]
    Energy(#[from] EnergyError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for de-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
