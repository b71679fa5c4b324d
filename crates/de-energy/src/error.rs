//! Energy computation errors.

use de_core::CoreError;
use de_grid::GridError;
use thiserror::Error;

/// Result type for energy computations.
pub type EnergyResult<T> = Result<T, EnergyError>;

#[derive(Error, Debug)]
pub enum EnergyError {
    /// The two runs of a pair do not share a time axis. Fatal for a whole run.
    #[error("Times are not identical between {file1} and {file2}: {detail}")]
    TimeMismatch {
        file1: String,
        file2: String,
        detail: String,
    },

    /// Unrecognized integration mode or energy kind.
    #[error("Invalid {what} '{value}' (expected one of: {expected})")]
    InvalidMode {
        what: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Variable '{name}' has shape {first:?} in one run and {second:?} in the other")]
    ShapeMismatch {
        name: String,
        first: Vec<usize>,
        second: Vec<usize>,
    },

    #[error("Time index {index} out of range for {len} time steps")]
    TimeIndexOutOfRange { index: usize, len: usize },

    #[error("No finite pressure in column at y={y}, x={x}")]
    NoValidPressure { y: usize, x: usize },

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
