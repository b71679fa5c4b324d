//! Content-based fingerprint of a computation request.

use de_core::Timestamp;
use de_energy::{EnergyKind, IntegrationMode, VerticalBounds};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::SCHEMA_VERSION;

#[derive(Serialize)]
struct FingerprintInput<'a> {
    schema_version: u32,
    mode: IntegrationMode,
    energy: EnergyKind,
    bounds: &'a VerticalBounds,
    files: &'a [String],
    times: &'a [Timestamp],
}

pub fn compute_fingerprint(
    mode: IntegrationMode,
    energy: EnergyKind,
    bounds: &VerticalBounds,
    files: &[String],
    times: &[Timestamp],
) -> String {
    let input = FingerprintInput {
        schema_version: SCHEMA_VERSION,
        mode,
        energy,
        bounds,
        files,
        times,
    };

    let mut hasher = Sha256::new();
    let input_json = serde_json::to_string(&input).unwrap_or_default();
    hasher.update(input_json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
