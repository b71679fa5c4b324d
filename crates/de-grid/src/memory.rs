//! In-memory grid, also the serialized form of a grid snapshot.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use de_core::{Real, Timestamp};
use ndarray::{Array4, ArrayView4, Axis};
use serde::{Deserialize, Serialize};

use crate::accessor::{GridAccessor, GridOpener};
use crate::{GridError, GridResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryGrid {
    #[serde(default)]
    pub id: String,
    pub times: Vec<Timestamp>,
    #[serde(default)]
    pub variables: BTreeMap<String, Array4<Real>>,
}

impl MemoryGrid {
    pub fn new(id: impl Into<String>, times: Vec<Timestamp>) -> Self {
        Self {
            id: id.into(),
            times,
            variables: BTreeMap::new(),
        }
    }

    /// Add a field; its leading axis must match the time axis.
    pub fn with_variable(mut self, name: impl Into<String>, field: Array4<Real>) -> GridResult<Self> {
        let name = name.into();
        check_time_extent(&name, &field, self.times.len())?;
        self.variables.insert(name, field);
        Ok(self)
    }

    /// Check every stored field against the time axis.
    pub fn validate(&self) -> GridResult<()> {
        for (name, field) in &self.variables {
            check_time_extent(name, field, self.times.len())?;
        }
        Ok(())
    }
}

fn check_time_extent(name: &str, field: &Array4<Real>, expected: usize) -> GridResult<()> {
    let found = field.len_of(Axis(0));
    if found != expected {
        return Err(GridError::ShapeMismatch {
            name: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

impl GridAccessor for MemoryGrid {
    fn id(&self) -> &str {
        &self.id
    }

    fn time_axis(&self) -> &[Timestamp] {
        &self.times
    }

    fn variable(&self, name: &str) -> GridResult<ArrayView4<'_, Real>> {
        self.variables
            .get(name)
            .map(|field| field.view())
            .ok_or_else(|| GridError::VariableNotFound {
                grid: self.id.clone(),
                name: name.to_string(),
            })
    }
}

/// Opener over grids held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    grids: HashMap<PathBuf, MemoryGrid>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `grid` under `path`; the grid id becomes the path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, mut grid: MemoryGrid) {
        let path = path.into();
        grid.id = path.display().to_string();
        self.grids.insert(path, grid);
    }
}

impl GridOpener for MemoryOpener {
    type Accessor = MemoryGrid;

    fn open(&self, path: &Path) -> GridResult<MemoryGrid> {
        self.grids
            .get(path)
            .cloned()
            .ok_or_else(|| GridError::FileNotFound {
                path: path.to_path_buf(),
            })
    }
}
