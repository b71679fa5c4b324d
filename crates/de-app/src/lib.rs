//! Shared application service layer for diffenergy.
//!
//! Centralizes the pairwise computation, result caching, error growth
//! aggregation and plot hand-off used by the CLI.

pub mod compute_service;
pub mod config;
pub mod error;
pub mod growth;
pub mod plot;
pub mod progress;

// Re-export key types for convenience
pub use compute_service::{
    ComputeOptions, ComputeRequest, ComputeResponse, ComputeTimingSummary, DEFAULT_BASE_NAME,
    OutputRequest, enumerate_pairs, load_result, run, run_with_progress,
};
pub use config::{DiffEnergyConfig, load_config, parse_config};
pub use error::{AppError, AppResult};
pub use growth::{GroupGrowth, GrowthReport, MemberSeries, aggregate, average, field_average_at, reduce_series};
pub use plot::{FieldPlot, PlotLine, PlotSink, SeriesPlot, plot_error_growth, plot_field_averages};
pub use progress::{ComputeProgressEvent, ComputeStage, PairProgress};
