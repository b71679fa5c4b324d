//! Serde encoding of stored energy values.
//!
//! JSON has no NaN or infinity, so non-finite values are written as the
//! strings `"nan"`, `"inf"` and `"-inf"`. Finite values stay plain numbers.
//! Reading accepts either form in both formats.

use std::fmt;

use de_core::Real;
use ndarray::Array2;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

const NAN: &str = "nan";
const POS_INF: &str = "inf";
const NEG_INF: &str = "-inf";

/// A single stored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredReal(pub Real);

impl Serialize for StoredReal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            serializer.serialize_str(NAN)
        } else if v > 0.0 {
            serializer.serialize_str(POS_INF)
        } else {
            serializer.serialize_str(NEG_INF)
        }
    }
}

struct StoredRealVisitor;

impl Visitor<'_> for StoredRealVisitor {
    type Value = StoredReal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or one of \"nan\", \"inf\", \"-inf\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(StoredReal(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(StoredReal(v as Real))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(StoredReal(v as Real))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        match v.trim().to_ascii_lowercase().as_str() {
            NAN | ".nan" => Ok(StoredReal(Real::NAN)),
            POS_INF | "+inf" | ".inf" | "infinity" => Ok(StoredReal(Real::INFINITY)),
            NEG_INF | "-.inf" | "-infinity" => Ok(StoredReal(Real::NEG_INFINITY)),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for StoredReal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StoredRealVisitor)
    }
}

/// `#[serde(with)]` helpers for `Vec<Real>`.
pub mod scalars {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[Real], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| StoredReal(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Real>, D::Error> {
        let stored = Vec::<StoredReal>::deserialize(deserializer)?;
        Ok(stored.into_iter().map(|v| v.0).collect())
    }
}

#[derive(Serialize, Deserialize)]
struct FieldRepr {
    dim: [usize; 2],
    data: Vec<StoredReal>,
}

/// `#[serde(with)]` helpers for `Vec<Array2<Real>>`, row-major.
pub mod fields {
    use super::*;

    pub fn serialize<S: Serializer>(
        fields: &[Array2<Real>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(fields.iter().map(|field| {
            let (ny, nx) = field.dim();
            FieldRepr {
                dim: [ny, nx],
                data: field.iter().map(|v| StoredReal(*v)).collect(),
            }
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Array2<Real>>, D::Error> {
        Vec::<FieldRepr>::deserialize(deserializer)?
            .into_iter()
            .map(|repr| {
                let [ny, nx] = repr.dim;
                let data = repr.data.into_iter().map(|v| v.0).collect();
                Array2::from_shape_vec((ny, nx), data).map_err(de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "scalars")]
        values: Vec<Real>,
    }

    #[test]
    fn non_finite_values_are_written_as_text() {
        let holder = Holder {
            values: vec![1.5, Real::NAN, Real::INFINITY, Real::NEG_INFINITY],
        };
        let json = serde_json::to_string(&holder).unwrap();
        assert_eq!(json, r#"{"values":[1.5,"nan","inf","-inf"]}"#);

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.values[0], 1.5);
        assert!(back.values[1].is_nan());
        assert_eq!(back.values[2], Real::INFINITY);
        assert_eq!(back.values[3], Real::NEG_INFINITY);
    }

    #[test]
    fn yaml_native_specials_are_accepted() {
        let back: Holder = serde_yaml::from_str("values: [.nan, .inf, -.inf, 2]").unwrap();
        assert!(back.values[0].is_nan());
        assert_eq!(back.values[1], Real::INFINITY);
        assert_eq!(back.values[2], Real::NEG_INFINITY);
        assert_eq!(back.values[3], 2.0);
    }

    #[test]
    fn unknown_text_is_rejected() {
        assert!(serde_json::from_str::<Holder>(r#"{"values":["many"]}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"values":[null]}"#).is_err());
    }
}
