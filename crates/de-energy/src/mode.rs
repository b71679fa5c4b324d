//! Energy kind, integration mode and vertical bounds.

use std::fmt;
use std::str::FromStr;

use de_core::{CoreResult, Level, hpa, to_pa};
use serde::{Deserialize, Serialize};

use crate::EnergyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyKind {
    /// Wind only (DKE).
    Kinetic,
    /// Wind plus weighted temperature (DTE).
    Total,
}

impl EnergyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kinetic => "kinetic",
            Self::Total => "total",
        }
    }

    /// Short diagnostic name used in labels.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Kinetic => "DKE",
            Self::Total => "DTE",
        }
    }
}

impl FromStr for EnergyKind {
    type Err = EnergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "kinetic" => Ok(Self::Kinetic),
            "total" => Ok(Self::Total),
            other => Err(EnergyError::InvalidMode {
                what: "energy kind",
                value: other.to_string(),
                expected: "kinetic, total",
            }),
        }
    }
}

impl fmt::Display for EnergyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    /// Per grid point vertical sum between pressure bounds: one 2D field per time.
    SumZ,
    /// Whole-domain sum: one scalar per time.
    SumXyz,
}

impl IntegrationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SumZ => "sum_z",
            Self::SumXyz => "sum_xyz",
        }
    }
}

impl FromStr for IntegrationMode {
    type Err = EnergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sum_z" => Ok(Self::SumZ),
            "sum_xyz" => Ok(Self::SumXyz),
            other => Err(EnergyError::InvalidMode {
                what: "integration mode",
                value: other.to_string(),
                expected: "sum_z, sum_xyz",
            }),
        }
    }
}

impl fmt::Display for IntegrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pressure bounds (hPa) of a vertical sum. `None` leaves that end untrimmed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VerticalBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_hpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_hpa: Option<f64>,
}

impl VerticalBounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(lower_hpa: Option<f64>, upper_hpa: Option<f64>) -> Self {
        Self {
            lower_hpa,
            upper_hpa,
        }
    }

    /// Bounds from decoded levels; only isobaric levels and `all` qualify.
    pub fn from_levels(lower: Option<Level>, upper: Option<Level>) -> CoreResult<Self> {
        let to_hpa = |level: Option<Level>| -> CoreResult<Option<f64>> {
            match level {
                Some(l) => Ok(l.pressure_bound()?.map(|p| to_pa(p) / 100.0)),
                None => Ok(None),
            }
        };
        Ok(Self {
            lower_hpa: to_hpa(lower)?,
            upper_hpa: to_hpa(upper)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower_hpa.is_none() && self.upper_hpa.is_none()
    }

    pub fn lower_pa(&self) -> Option<f64> {
        self.lower_hpa.map(|h| to_pa(hpa(h)))
    }

    pub fn upper_pa(&self) -> Option<f64> {
        self.upper_hpa.map(|h| to_pa(hpa(h)))
    }
}
