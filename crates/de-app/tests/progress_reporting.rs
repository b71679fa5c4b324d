//! Integration tests for compute progress and timing reporting.

mod support;

use std::fs;

use de_app::{
    ComputeOptions, ComputeProgressEvent, ComputeRequest, ComputeResponse, ComputeStage,
    OutputRequest, run_with_progress,
};
use de_energy::{EnergyKind, IntegrationMode, VerticalBounds};
use de_grid::MemoryOpener;
use support::*;

fn collect_events(
    opener: &MemoryOpener,
    request: &ComputeRequest,
) -> (ComputeResponse, Vec<ComputeProgressEvent>) {
    let mut events = Vec::new();
    let response = run_with_progress(opener, request, Some(&mut |event| events.push(event)))
        .expect("run with progress should succeed");
    (response, events)
}

#[test]
fn compute_and_cache_progress_are_reported() {
    let dir = unique_temp_dir("de_app_progress");
    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0), ("c", 2.0), ("d", 3.0)]);
    let request = ComputeRequest {
        mode: IntegrationMode::SumZ,
        energy: EnergyKind::Total,
        bounds: VerticalBounds::new(Some(1000.0), None),
        files,
        times: times(),
        output: OutputRequest {
            persist_to: Some(dir.clone()),
            base_name: "dte".to_string(),
            return_result: true,
        },
        options: ComputeOptions::default(),
    };

    let (response, events) = collect_events(&opener, &request);
    assert!(!response.loaded_from_cache);
    assert_eq!(response.pair_count, 6);
    assert!(response.timing.total_time_s >= response.timing.compute_time_s);
    assert_eq!(response.artifact_path, Some(dir.join("dte.json")));

    let completed: Vec<_> = events
        .iter()
        .filter(|e| e.stage == ComputeStage::PairCompleted)
        .filter_map(|e| e.pairs.as_ref())
        .collect();
    assert_eq!(completed.len(), 6);
    assert_eq!(completed.last().unwrap().fraction_complete(), 1.0);
    assert!(events.iter().any(|e| e.stage == ComputeStage::SavingResults));
    assert_eq!(events.last().unwrap().stage, ComputeStage::Completed);

    let (cached, events) = collect_events(&opener, &request);
    assert!(cached.loaded_from_cache);
    assert!(
        events
            .iter()
            .any(|e| e.stage == ComputeStage::LoadingCachedResult),
        "expected cache load stage event"
    );
    assert!(!events.iter().any(|e| e.stage == ComputeStage::ComputingPairs));

    let _ = fs::remove_dir_all(&dir);
}
