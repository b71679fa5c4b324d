#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};
use de_core::Timestamp;
use de_grid::{MemoryGrid, MemoryOpener, vars};
use ndarray::Array4;

pub const NZ: usize = 2;
pub const NY: usize = 3;
pub const NX: usize = 4;

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

pub fn times() -> Vec<Timestamp> {
    vec![
        Utc.with_ymd_and_hms(2011, 4, 19, 18, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2011, 4, 19, 21, 0, 0).unwrap(),
    ]
}

/// Staggered member grid on two levels (1000 and 500 hPa).
///
/// `U = offset * (t + 1)`, `V = offset`, `T = 300 + offset`, so a pair with
/// offset difference `d` has `0.5 * (d^2 (t+1)^2 + d^2)` kinetic energy at
/// every compared point.
pub fn member_grid(times: Vec<Timestamp>, offset: f64) -> MemoryGrid {
    let nt = times.len();
    let u = Array4::from_shape_fn((nt, NZ, NY, NX + 1), |(t, _, _, _)| offset * (t as f64 + 1.0));
    let v = Array4::from_elem((nt, NZ, NY + 1, NX), offset);
    let temp = Array4::from_elem((nt, NZ, NY, NX), 300.0 + offset);
    let pb = Array4::from_shape_fn((nt, NZ, NY, NX), |(_, k, _, _)| {
        if k == 0 { 100_000.0 - 50.0 } else { 50_000.0 - 50.0 }
    });
    let p = Array4::from_elem((nt, NZ, NY, NX), 50.0);

    MemoryGrid::new("", times)
        .with_variable(vars::U, u)
        .and_then(|g| g.with_variable(vars::V, v))
        .and_then(|g| g.with_variable(vars::T, temp))
        .and_then(|g| g.with_variable(vars::PB, pb))
        .and_then(|g| g.with_variable(vars::P, p))
        .expect("failed to build member grid")
}

pub fn member_path(name: &str) -> PathBuf {
    PathBuf::from(format!("/ens/{}/wrfout_d01", name))
}

/// Opener holding one member per `(directory name, offset)`.
pub fn ensemble(members: &[(&str, f64)]) -> (MemoryOpener, Vec<PathBuf>) {
    let mut opener = MemoryOpener::new();
    let mut files = Vec::new();
    for (name, offset) in members {
        let path = member_path(name);
        opener.insert(path.clone(), member_grid(times(), *offset));
        files.push(path);
    }
    (opener, files)
}

/// Domain sum of kinetic energy for an offset difference `d` at time index `t`.
pub fn expected_xyz(d: f64, t: usize) -> f64 {
    let points = (NZ * NY * NX) as f64;
    let growth = (t as f64 + 1.0).powi(2);
    0.5 * points * (d * d * growth + d * d)
}
