//! Vertical level decoding.
//!
//! User input names a level as a bare number (`850` is isobaric hPa,
//! `2000` is the surface), a suffixed value (`320K`, `2PVU`, `3km`,
//! `500hPa`) or `all`. The text is decoded once into [`Level`] and the
//! rest of the workspace matches on the variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::units::{Pressure, hpa};
use crate::{CoreError, CoreResult};

/// Bare numbers below this are isobaric levels in hPa.
const ISOBARIC_LIMIT_HPA: f64 = 1500.0;
/// Bare number reserved for the surface.
const SURFACE_CODE: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    /// Pressure level, hPa.
    Isobaric(f64),
    Surface,
    /// Potential temperature surface, K.
    Isentropic(f64),
    /// Potential vorticity surface, PVU.
    PvSurface(f64),
    /// Height above ground, km.
    Geometric(f64),
    AllLevels,
}

impl Level {
    /// Decode a bare numeric level.
    pub fn from_number(value: f64) -> CoreResult<Self> {
        if value.is_finite() && value > 0.0 && value < ISOBARIC_LIMIT_HPA {
            Ok(Level::Isobaric(value))
        } else if value == SURFACE_CODE {
            Ok(Level::Surface)
        } else {
            Err(CoreError::UnknownLevel {
                raw: value.to_string(),
            })
        }
    }

    /// Pressure bound for vertical integration.
    ///
    /// `AllLevels` means no trimming. Only isobaric levels can bound a
    /// pressure column; every other coordinate is rejected.
    pub fn pressure_bound(&self) -> CoreResult<Option<Pressure>> {
        match self {
            Level::Isobaric(h) => Ok(Some(hpa(*h))),
            Level::AllLevels => Ok(None),
            other => Err(CoreError::UnsupportedLevel {
                level: other.to_string(),
                reason: "vertical integration bounds must be isobaric or 'all'",
            }),
        }
    }
}

fn parse_suffixed(raw: &str, suffix: &str) -> Option<CoreResult<f64>> {
    let number = raw.strip_suffix(suffix)?;
    Some(
        number
            .trim()
            .parse::<f64>()
            .map_err(|_| CoreError::UnknownLevel {
                raw: raw.to_string(),
            }),
    )
}

impl FromStr for Level {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw {
            "all" | "all_lev" => return Ok(Level::AllLevels),
            "sfc" | "surface" => return Ok(Level::Surface),
            _ => {}
        }

        if let Ok(value) = raw.parse::<f64>() {
            return Level::from_number(value);
        }
        if let Some(v) = parse_suffixed(raw, "hPa") {
            let v = v?;
            return match Level::from_number(v)? {
                Level::Isobaric(h) => Ok(Level::Isobaric(h)),
                _ => Err(CoreError::UnknownLevel {
                    raw: raw.to_string(),
                }),
            };
        }
        if let Some(v) = parse_suffixed(raw, "PVU") {
            return Ok(Level::PvSurface(v?));
        }
        if let Some(v) = parse_suffixed(raw, "km") {
            return Ok(Level::Geometric(v?));
        }
        if let Some(v) = parse_suffixed(raw, "K") {
            return Ok(Level::Isentropic(v?));
        }

        Err(CoreError::UnknownLevel {
            raw: raw.to_string(),
        })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Isobaric(h) => write!(f, "{}hPa", h),
            Level::Surface => write!(f, "sfc"),
            Level::Isentropic(k) => write!(f, "{}K", k),
            Level::PvSurface(pvu) => write!(f, "{}PVU", pvu),
            Level::Geometric(km) => write!(f, "{}km", km),
            Level::AllLevels => write!(f, "all_lev"),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let decoded = match RawLevel::deserialize(deserializer)? {
            RawLevel::Number(v) => Level::from_number(v),
            RawLevel::Text(s) => s.parse(),
        };
        decoded.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::to_pa;

    #[test]
    fn decodes_every_coordinate() {
        assert_eq!("850".parse::<Level>().unwrap(), Level::Isobaric(850.0));
        assert_eq!("500hPa".parse::<Level>().unwrap(), Level::Isobaric(500.0));
        assert_eq!("2000".parse::<Level>().unwrap(), Level::Surface);
        assert_eq!("320K".parse::<Level>().unwrap(), Level::Isentropic(320.0));
        assert_eq!("2PVU".parse::<Level>().unwrap(), Level::PvSurface(2.0));
        assert_eq!("3km".parse::<Level>().unwrap(), Level::Geometric(3.0));
        assert_eq!("all".parse::<Level>().unwrap(), Level::AllLevels);
    }

    #[test]
    fn rejects_unknown_text() {
        assert!(matches!(
            "banana".parse::<Level>(),
            Err(CoreError::UnknownLevel { .. })
        ));
        assert!("1700".parse::<Level>().is_err());
        assert!("2000hPa".parse::<Level>().is_err());
    }

    #[test]
    fn display_parses_back() {
        for level in [
            Level::Isobaric(850.0),
            Level::Surface,
            Level::Isentropic(320.0),
            Level::PvSurface(2.0),
            Level::Geometric(3.0),
            Level::AllLevels,
        ] {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn only_isobaric_and_all_bound_a_column() {
        let bound = Level::Isobaric(500.0).pressure_bound().unwrap().unwrap();
        assert_eq!(to_pa(bound), 50_000.0);
        assert!(Level::AllLevels.pressure_bound().unwrap().is_none());

        let err = Level::Isentropic(320.0).pressure_bound().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedLevel { .. }));
        assert!(Level::Surface.pressure_bound().is_err());
    }
}
