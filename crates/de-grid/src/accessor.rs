//! Accessor traits for one simulation output.

use std::path::Path;

use de_core::{Real, Timestamp};
use ndarray::ArrayView4;

use crate::{GridError, GridResult};

/// Read access to the fields of one simulation output.
///
/// Fields are indexed `(time, level, y, x)`.
pub trait GridAccessor {
    /// Identifier of the source, normally its path.
    fn id(&self) -> &str;

    /// Ordered valid times of the output.
    fn time_axis(&self) -> &[Timestamp];

    /// Borrow a named 4D field.
    fn variable(&self, name: &str) -> GridResult<ArrayView4<'_, Real>>;

    /// Index of `time` on the time axis.
    fn time_index(&self, time: &Timestamp) -> GridResult<usize> {
        self.time_axis()
            .iter()
            .position(|t| t == time)
            .ok_or_else(|| GridError::TimeNotFound {
                grid: self.id().to_string(),
                time: *time,
            })
    }
}

/// Opens accessors by path. Each call yields an independent accessor.
pub trait GridOpener: Sync {
    type Accessor: GridAccessor;

    fn open(&self, path: &Path) -> GridResult<Self::Accessor>;
}
