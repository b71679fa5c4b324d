use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Compact, stable identifier of a file pair.
///
/// The index is the 0-based position of the pair in combinatorial
/// enumeration order of the input file list.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<PairId>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(NonZeroU32);

impl PairId {
    /// Create a PairId from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self::try_from_index(index).expect("pair index below u32::MAX")
    }

    /// Fallible form of [`PairId::from_index`].
    pub fn try_from_index(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Self)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairId({})", self.index())
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// Persisted as the plain 0-based index so cache artifacts key pairs "0", "1", ...
impl Serialize for PairId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index())
    }
}

impl<'de> Deserialize<'de> for PairId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u32::deserialize(deserializer)?;
        Self::try_from_index(index)
            .ok_or_else(|| serde::de::Error::custom("pair index out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = PairId::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_pair_id_is_small() {
        assert_eq!(
            core::mem::size_of::<PairId>(),
            core::mem::size_of::<Option<PairId>>()
        );
    }

    #[test]
    fn last_index_is_rejected() {
        assert!(PairId::try_from_index(u32::MAX).is_none());
    }
}
