mod support;

use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use de_app::{
    AppError, ComputeOptions, ComputeRequest, OutputRequest, compute_service, load_result,
};
use de_core::{PairId, Real};
use de_energy::{EnergyError, EnergyKind, IntegrationMode, VerticalBounds};
use de_grid::{GridError, MemoryGrid, vars};
use de_results::{EnergyValues, StoreFormat};
use support::*;

fn request(files: Vec<PathBuf>, mode: IntegrationMode, output: OutputRequest) -> ComputeRequest {
    ComputeRequest {
        mode,
        energy: EnergyKind::Kinetic,
        bounds: VerticalBounds::unbounded(),
        files,
        times: times(),
        output,
        options: ComputeOptions {
            parallel: false,
            use_cache: false,
            format: StoreFormat::Json,
        },
    }
}

fn return_only() -> OutputRequest {
    OutputRequest::default()
}

fn persist_only(dir: &std::path::Path) -> OutputRequest {
    OutputRequest {
        persist_to: Some(dir.to_path_buf()),
        base_name: "diff_energy_data".to_string(),
        return_result: false,
    }
}

fn scalars(values: &EnergyValues) -> &[Real] {
    match values {
        EnergyValues::Scalars(v) => v,
        EnergyValues::Fields(_) => panic!("expected scalars"),
    }
}

fn assert_close(a: Real, b: Real) {
    assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{} != {}", a, b);
}

#[test]
fn three_files_persist_only() {
    let dir = unique_temp_dir("de_app_persist_only");
    let (opener, files) = ensemble(&[("ctrl", 0.0), ("s01", 1.0), ("s02", 2.0)]);
    let request = request(files.clone(), IntegrationMode::SumXyz, persist_only(&dir));

    let returned = compute_service::run(&opener, &request).expect("compute failed");
    assert!(returned.is_none());

    let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(dir.join("diff_energy_data.json").exists());

    let mapping = load_result(&dir, "diff_energy_data", StoreFormat::Json).expect("load failed");
    assert_eq!(mapping.len(), 3);

    let expected_pairs = [(0, 1, 1.0), (0, 2, 2.0), (1, 2, 1.0)];
    for (index, (i, j, d)) in expected_pairs.into_iter().enumerate() {
        let record = mapping.get(PairId::from_index(index as u32)).unwrap();
        assert_eq!(record.file1, files[i].display().to_string());
        assert_eq!(record.file2, files[j].display().to_string());
        assert_eq!(record.times, times());
        let values = scalars(&record.values);
        assert_eq!(values.len(), 2);
        assert_close(values[0], expected_xyz(d, 0));
        assert_close(values[1], expected_xyz(d, 1));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn four_files_give_six_pairs() {
    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0), ("c", 3.0), ("d", 6.0)]);
    let request = request(files, IntegrationMode::SumXyz, return_only());

    let mapping = compute_service::run(&opener, &request)
        .expect("compute failed")
        .expect("result requested");
    let keys: Vec<u32> = mapping.iter().map(|(pair, _)| pair.index()).collect();
    assert_eq!(keys, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn identical_files_have_zero_energy() {
    let (opener, files) = ensemble(&[("a", 2.5), ("b", 2.5)]);
    let mut request = request(files, IntegrationMode::SumXyz, return_only());
    request.energy = EnergyKind::Total;

    let mapping = compute_service::run(&opener, &request).unwrap().unwrap();
    let record = mapping.get(PairId::from_index(0)).unwrap();
    assert_eq!(scalars(&record.values), &[0.0, 0.0]);
}

#[test]
fn column_fields_between_bounds() {
    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0)]);
    let mut request = request(files, IntegrationMode::SumZ, return_only());

    let mapping = compute_service::run(&opener, &request).unwrap().unwrap();
    let record = mapping.get(PairId::from_index(0)).unwrap();
    let t0 = record.field_at(&times()[0]).unwrap();
    assert_eq!(t0.dim(), (NY, NX));
    assert!(t0.iter().all(|&v| (v - 2.0).abs() < 1e-12));

    // Single level at 1000 hPa.
    request.bounds = VerticalBounds::new(Some(1000.0), Some(1000.0));
    let mapping = compute_service::run(&opener, &request).unwrap().unwrap();
    let record = mapping.get(PairId::from_index(0)).unwrap();
    let t1 = record.field_at(&times()[1]).unwrap();
    assert!(t1.iter().all(|&v| (v - 2.5).abs() < 1e-12));
}

#[test]
fn no_output_requested_fails_before_work() {
    let opener = de_grid::MemoryOpener::new();
    let output = OutputRequest {
        persist_to: None,
        base_name: "unused".to_string(),
        return_result: false,
    };
    let request = request(
        vec![member_path("missing_a"), member_path("missing_b")],
        IntegrationMode::SumXyz,
        output,
    );

    assert!(matches!(
        compute_service::run(&opener, &request),
        Err(AppError::NoOutputRequested)
    ));
}

#[test]
fn time_mismatch_aborts_whole_run() {
    let dir = unique_temp_dir("de_app_mismatch");
    let (mut opener, mut files) = ensemble(&[("a", 0.0), ("b", 1.0)]);
    let shifted = vec![
        Utc.with_ymd_and_hms(2011, 4, 19, 18, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2011, 4, 20, 0, 0, 0).unwrap(),
    ];
    let odd = member_path("odd");
    opener.insert(odd.clone(), member_grid(shifted, 4.0));
    files.push(odd);

    let request = request(files, IntegrationMode::SumXyz, persist_only(&dir));
    let err = compute_service::run(&opener, &request).unwrap_err();
    assert!(matches!(
        err,
        AppError::Energy(EnergyError::TimeMismatch { .. })
    ));
    assert!(!dir.join("diff_energy_data.json").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_time_is_not_found() {
    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0)]);
    let mut request = request(files, IntegrationMode::SumXyz, return_only());
    request.times = vec![Utc.with_ymd_and_hms(2011, 4, 20, 6, 0, 0).unwrap()];

    assert!(matches!(
        compute_service::run(&opener, &request),
        Err(AppError::Grid(GridError::TimeNotFound { .. }))
    ));
}

#[test]
fn missing_variable_propagates() {
    let (mut opener, mut files) = ensemble(&[("a", 0.0)]);
    let bare = member_path("bare");
    opener.insert(bare.clone(), MemoryGrid::new("", times()));
    files.push(bare);

    let request = request(files, IntegrationMode::SumXyz, return_only());
    assert!(matches!(
        compute_service::run(&opener, &request),
        Err(AppError::Energy(EnergyError::Grid(GridError::VariableNotFound { .. })))
    ));
}

#[test]
fn parallel_matches_sequential() {
    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0), ("c", 3.0), ("d", 6.0), ("e", 10.0)]);
    let mut request = request(files, IntegrationMode::SumZ, return_only());
    request.energy = EnergyKind::Total;

    let sequential = compute_service::run(&opener, &request).unwrap().unwrap();
    request.options.parallel = true;
    let parallel = compute_service::run(&opener, &request).unwrap().unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.len(), 10);
}

#[test]
fn matching_fingerprint_reuses_artifact() {
    let dir = unique_temp_dir("de_app_cache");
    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0), ("c", 2.0)]);
    let mut request = request(
        files,
        IntegrationMode::SumXyz,
        OutputRequest {
            persist_to: Some(dir.clone()),
            base_name: "dke".to_string(),
            return_result: true,
        },
    );
    request.options.use_cache = true;

    let first = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(!first.loaded_from_cache);
    assert_eq!(first.pair_count, 3);

    let second = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(second.mapping, first.mapping);

    request.energy = EnergyKind::Total;
    let third = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(!third.loaded_from_cache);
    assert_ne!(third.fingerprint, first.fingerprint);

    let _ = fs::remove_dir_all(&dir);
}

fn cached_request(files: Vec<PathBuf>, dir: &std::path::Path) -> ComputeRequest {
    let mut request = request(
        files,
        IntegrationMode::SumXyz,
        OutputRequest {
            persist_to: Some(dir.to_path_buf()),
            base_name: "dke".to_string(),
            return_result: true,
        },
    );
    request.options.use_cache = true;
    request
}

#[test]
fn unreadable_artifact_is_recomputed_and_replaced() {
    let dir = unique_temp_dir("de_app_garbage_cache");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("dke.json"), "{ not an artifact").unwrap();

    let (opener, files) = ensemble(&[("a", 0.0), ("b", 1.0)]);
    let request = cached_request(files, &dir);

    let response = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(!response.loaded_from_cache);
    assert_eq!(response.pair_count, 1);

    let reloaded = load_result(&dir, "dke", StoreFormat::Json).unwrap();
    assert_eq!(Some(reloaded), response.mapping);

    let again = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(again.loaded_from_cache);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn non_finite_results_are_cached_and_reused() {
    let dir = unique_temp_dir("de_app_nan_cache");
    let (mut opener, files) = ensemble(&[("a", 0.0), ("b", 1.0)]);

    let mut u = ndarray::Array4::from_elem((2, NZ, NY, NX + 1), 0.0);
    u[[0, 0, 0, 0]] = f64::NAN;
    let grid = member_grid(times(), 0.0)
        .with_variable(vars::U, u)
        .unwrap();
    opener.insert(member_path("a"), grid);

    let request = cached_request(files, &dir);

    let first = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(!first.loaded_from_cache);
    let values = first.mapping.as_ref().unwrap().get(PairId::from_index(0)).unwrap();
    assert!(scalars(&values.values)[0].is_nan());

    let loaded = load_result(&dir, "dke", StoreFormat::Json).unwrap();
    let stored = scalars(&loaded.get(PairId::from_index(0)).unwrap().values).to_vec();
    assert!(stored[0].is_nan());
    assert_close(stored[1], expected_xyz(1.0, 1));

    let second = compute_service::run_with_progress(&opener, &request, None).unwrap();
    assert!(second.loaded_from_cache);

    let _ = fs::remove_dir_all(&dir);
}

