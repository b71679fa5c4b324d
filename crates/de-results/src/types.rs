//! Result data types.

use std::collections::BTreeMap;

use de_core::{PairId, Real, Timestamp};
use de_energy::{EnergyKind, IntegrationMode, VerticalBounds};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Version written into every cache artifact.
pub const SCHEMA_VERSION: u32 = 1;

/// Values of one pair, aligned with its time sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EnergyValues {
    /// One domain-integrated value per time (`sum_xyz`).
    #[serde(with = "crate::codec::scalars")]
    Scalars(Vec<Real>),
    /// One column-integrated 2D field per time (`sum_z`).
    #[serde(with = "crate::codec::fields")]
    Fields(Vec<Array2<Real>>),
}

impl EnergyValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Scalars(v) => v.len(),
            Self::Fields(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub file1: String,
    pub file2: String,
    pub times: Vec<Timestamp>,
    pub values: EnergyValues,
}

impl ResultRecord {
    /// Position of `time` in this record's time sequence.
    pub fn time_position(&self, time: &Timestamp) -> Option<usize> {
        self.times.iter().position(|t| t == time)
    }

    /// Field stored for `time`, if the record holds fields.
    pub fn field_at(&self, time: &Timestamp) -> Option<&Array2<Real>> {
        let idx = self.time_position(time)?;
        match &self.values {
            EnergyValues::Fields(fields) => fields.get(idx),
            EnergyValues::Scalars(_) => None,
        }
    }
}

/// Results of one computation, keyed by pair in enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMapping {
    pub mode: IntegrationMode,
    pub energy: EnergyKind,
    #[serde(default)]
    pub bounds: VerticalBounds,
    pub records: BTreeMap<PairId, ResultRecord>,
}

impl ResultMapping {
    pub fn new(mode: IntegrationMode, energy: EnergyKind, bounds: VerticalBounds) -> Self {
        Self {
            mode,
            energy,
            bounds,
            records: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, pair: PairId, record: ResultRecord) {
        self.records.insert(pair, record);
    }

    pub fn get(&self, pair: PairId) -> Option<&ResultRecord> {
        self.records.get(&pair)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairId, &ResultRecord)> {
        self.records.iter()
    }

    /// Time sequence shared by the records (taken from the first pair).
    pub fn times(&self) -> Option<&[Timestamp]> {
        self.records.values().next().map(|r| r.times.as_slice())
    }
}

/// On-disk envelope around a [`ResultMapping`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheArtifact {
    pub schema_version: u32,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub mapping: ResultMapping,
}

/// Leading fields of a [`CacheArtifact`], read without the mapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtifactHeader {
    pub schema_version: u32,
    #[serde(default)]
    pub fingerprint: Option<String>,
}
