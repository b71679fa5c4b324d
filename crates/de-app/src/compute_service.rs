//! Pairwise difference energy computation and caching service.

use std::path::{Path, PathBuf};
use std::time::Instant;

use de_core::{PairId, Timestamp};
use de_energy::{
    DiffEnergyCalculator, EnergyKind, EnergyResult, IntegrationMode, VerticalBounds,
    ensure_matching_times,
};
use de_grid::{GridAccessor, GridOpener, GridResult};
use de_results::{EnergyValues, ResultMapping, ResultRecord, ResultStore, StoreFormat};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::{ComputeProgressEvent, ComputeStage, PairProgress};

/// Base name used for cache artifacts when none is given.
pub const DEFAULT_BASE_NAME: &str = "diff_energy_data";

/// Where the computed mapping goes.
#[derive(Debug, Clone)]
pub struct OutputRequest {
    /// Directory to persist the artifact into.
    pub persist_to: Option<PathBuf>,
    pub base_name: String,
    /// Hand the mapping back to the caller.
    pub return_result: bool,
}

impl Default for OutputRequest {
    fn default() -> Self {
        Self {
            persist_to: None,
            base_name: DEFAULT_BASE_NAME.to_string(),
            return_result: true,
        }
    }
}

impl OutputRequest {
    pub fn is_empty(&self) -> bool {
        self.persist_to.is_none() && !self.return_result
    }
}

/// Options for running a computation.
#[derive(Debug, Clone)]
pub struct ComputeOptions {
    /// Compute pairs on the rayon thread pool.
    pub parallel: bool,
    /// Reuse a persisted artifact whose fingerprint matches the request.
    pub use_cache: bool,
    pub format: StoreFormat,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            use_cache: true,
            format: StoreFormat::Json,
        }
    }
}

/// Request to compute difference energy for every pair of `files`.
#[derive(Debug, Clone)]
pub struct ComputeRequest {
    pub mode: IntegrationMode,
    pub energy: EnergyKind,
    pub bounds: VerticalBounds,
    pub files: Vec<PathBuf>,
    pub times: Vec<Timestamp>,
    pub output: OutputRequest,
    pub options: ComputeOptions,
}

impl ComputeRequest {
    fn file_ids(&self) -> Vec<String> {
        self.files.iter().map(|p| p.display().to_string()).collect()
    }

    pub fn fingerprint(&self) -> String {
        de_results::compute_fingerprint(
            self.mode,
            self.energy,
            &self.bounds,
            &self.file_ids(),
            &self.times,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComputeTimingSummary {
    pub compute_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a computation.
#[derive(Debug, Clone)]
pub struct ComputeResponse {
    /// Present when the request asked for the result.
    pub mapping: Option<ResultMapping>,
    pub artifact_path: Option<PathBuf>,
    pub fingerprint: String,
    pub pair_count: usize,
    pub loaded_from_cache: bool,
    pub timing: ComputeTimingSummary,
}

type ProgressCallback<'a> = Option<&'a mut dyn FnMut(ComputeProgressEvent)>;

fn emit_progress(
    progress_cb: &mut ProgressCallback<'_>,
    stage: ComputeStage,
    started: Instant,
    message: Option<String>,
    pairs: Option<PairProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(ComputeProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            pairs,
        });
    }
}

/// All unordered pairs of `n` items in combination order:
/// `(0,1), (0,2), ..., (1,2), ...`.
pub fn enumerate_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Compute (or reload) the mapping and return it if the request asks for it.
pub fn run<O: GridOpener>(
    opener: &O,
    request: &ComputeRequest,
) -> AppResult<Option<ResultMapping>> {
    Ok(run_with_progress(opener, request, None)?.mapping)
}

/// Compute (or reload) the mapping and stream progress events.
pub fn run_with_progress<O: GridOpener>(
    opener: &O,
    request: &ComputeRequest,
    mut progress_cb: ProgressCallback<'_>,
) -> AppResult<ComputeResponse> {
    if request.output.is_empty() {
        return Err(AppError::NoOutputRequested);
    }

    let started = Instant::now();
    let mut timing = ComputeTimingSummary::default();
    let fingerprint = request.fingerprint();
    let pairs = enumerate_pairs(request.files.len());

    let store = request
        .output
        .persist_to
        .as_ref()
        .map(|dir| ResultStore::at(dir.clone()).with_format(request.options.format));
    let base_name = request.output.base_name.as_str();

    if let Some(store) = store.as_ref().filter(|_| request.options.use_cache) {
        emit_progress(
            &mut progress_cb,
            ComputeStage::CheckingCache,
            started,
            Some("Checking result cache".to_string()),
            None,
        );

        let cached_fingerprint = store.peek_fingerprint(base_name).unwrap_or_else(|err| {
            warn!(error = %err, base_name, "Unreadable cache artifact, recomputing");
            None
        });

        let cached = match cached_fingerprint {
            Some(found) if found == fingerprint => {
                emit_progress(
                    &mut progress_cb,
                    ComputeStage::LoadingCachedResult,
                    started,
                    Some("Loading cached result".to_string()),
                    None,
                );
                let load_started = Instant::now();
                match store.load(base_name) {
                    Ok(mapping) => Some((mapping, load_started.elapsed().as_secs_f64())),
                    Err(err) => {
                        warn!(error = %err, base_name, "Cached result failed to load, recomputing");
                        None
                    }
                }
            }
            _ => None,
        };

        if let Some((mapping, load_time_s)) = cached {
            timing.load_cache_time_s = load_time_s;
            timing.total_time_s = started.elapsed().as_secs_f64();
            info!(
                fingerprint = %fingerprint,
                pairs = mapping.len(),
                "Reusing cached difference energy"
            );

            emit_progress(
                &mut progress_cb,
                ComputeStage::Completed,
                started,
                Some("Loaded cached result".to_string()),
                None,
            );

            return Ok(ComputeResponse {
                pair_count: mapping.len(),
                mapping: request.output.return_result.then_some(mapping),
                artifact_path: Some(store.artifact_path(base_name)?),
                fingerprint,
                loaded_from_cache: true,
                timing,
            });
        }
    }

    emit_progress(
        &mut progress_cb,
        ComputeStage::ComputingPairs,
        started,
        Some(format!(
            "Computing {} for {} pairs",
            request.energy.abbreviation(),
            pairs.len()
        )),
        Some(PairProgress {
            pair: None,
            completed: 0,
            total: pairs.len(),
            pair_elapsed_s: 0.0,
        }),
    );

    let compute_started = Instant::now();
    let mapping = compute_mapping(opener, request, &pairs, &mut progress_cb, started)?;
    timing.compute_time_s = compute_started.elapsed().as_secs_f64();

    let mut artifact_path = None;
    if let Some(store) = &store {
        emit_progress(
            &mut progress_cb,
            ComputeStage::SavingResults,
            started,
            Some("Saving results".to_string()),
            None,
        );
        let save_started = Instant::now();
        let path = store.save_with_fingerprint(&mapping, base_name, Some(fingerprint.as_str()))?;
        artifact_path = Some(path);
        timing.save_time_s = save_started.elapsed().as_secs_f64();
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        ComputeStage::Completed,
        started,
        Some("Computation completed".to_string()),
        None,
    );

    Ok(ComputeResponse {
        pair_count: mapping.len(),
        mapping: request.output.return_result.then_some(mapping),
        artifact_path,
        fingerprint,
        loaded_from_cache: false,
        timing,
    })
}

fn compute_mapping<O: GridOpener>(
    opener: &O,
    request: &ComputeRequest,
    pairs: &[(usize, usize)],
    progress_cb: &mut ProgressCallback<'_>,
    started: Instant,
) -> AppResult<ResultMapping> {
    let calculator = DiffEnergyCalculator::new();
    let total = pairs.len();
    let mut mapping = ResultMapping::new(request.mode, request.energy, request.bounds);

    let pair_job = |index: usize, (i, j): (usize, usize)| -> AppResult<(PairId, ResultRecord, f64)> {
        let pair_started = Instant::now();
        let pair = PairId::try_from_index(index as u32)
            .ok_or_else(|| AppError::InvalidInput(format!("Too many file pairs: {}", total)))?;
        let record = compute_pair(
            opener,
            &calculator,
            request,
            pair,
            &request.files[i],
            &request.files[j],
        )?;
        Ok((pair, record, pair_started.elapsed().as_secs_f64()))
    };

    if request.options.parallel {
        // Any failed pair aborts the whole run, so nothing partial is kept.
        let records = pairs
            .par_iter()
            .enumerate()
            .map(|(index, &files)| pair_job(index, files))
            .collect::<AppResult<Vec<_>>>()?;

        for (completed, (pair, record, pair_elapsed_s)) in records.into_iter().enumerate() {
            mapping.insert(pair, record);
            emit_pair_completed(progress_cb, started, pair, completed + 1, total, pair_elapsed_s);
        }
    } else {
        for (index, &files) in pairs.iter().enumerate() {
            let (pair, record, pair_elapsed_s) = pair_job(index, files)?;
            mapping.insert(pair, record);
            emit_pair_completed(progress_cb, started, pair, index + 1, total, pair_elapsed_s);
        }
    }

    Ok(mapping)
}

fn emit_pair_completed(
    progress_cb: &mut ProgressCallback<'_>,
    started: Instant,
    pair: PairId,
    completed: usize,
    total: usize,
    pair_elapsed_s: f64,
) {
    emit_progress(
        progress_cb,
        ComputeStage::PairCompleted,
        started,
        None,
        Some(PairProgress {
            pair: Some(pair),
            completed,
            total,
            pair_elapsed_s,
        }),
    );
}

/// Open both files of a pair, check their time axes and compute every
/// requested time. Times are resolved against the first file.
pub fn compute_pair<O: GridOpener>(
    opener: &O,
    calculator: &DiffEnergyCalculator,
    request: &ComputeRequest,
    pair: PairId,
    file1: &Path,
    file2: &Path,
) -> AppResult<ResultRecord> {
    let started = Instant::now();
    let first = opener.open(file1)?;
    let second = opener.open(file2)?;
    ensure_matching_times(&first, &second)?;

    let indices = request
        .times
        .iter()
        .map(|t| first.time_index(t))
        .collect::<GridResult<Vec<_>>>()?;

    let values = match request.mode {
        IntegrationMode::SumXyz => {
            let series = calculator.compute_xyz(&first, &second, &indices, request.energy)?;
            for (time, value) in request.times.iter().zip(&series) {
                debug!(pair = %pair, time = %time, value, "Domain sum");
            }
            EnergyValues::Scalars(series)
        }
        IntegrationMode::SumZ => EnergyValues::Fields(
            indices
                .iter()
                .map(|&t| calculator.compute_z(&first, &second, t, request.energy, request.bounds))
                .collect::<EnergyResult<Vec<_>>>()?,
        ),
    };

    info!(
        pair = %pair,
        file1 = %file1.display(),
        file2 = %file2.display(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "Computed {} for pair",
        request.energy.abbreviation()
    );

    Ok(ResultRecord {
        file1: file1.display().to_string(),
        file2: file2.display().to_string(),
        times: request.times.clone(),
        values,
    })
}

/// Load a previously persisted mapping.
pub fn load_result(dir: &Path, base_name: &str, format: StoreFormat) -> AppResult<ResultMapping> {
    Ok(ResultStore::at(dir).with_format(format).load(base_name)?)
}
