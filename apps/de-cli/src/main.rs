use clap::{Parser, Subcommand};
use de_app::config::{OneOrMany, SaveTarget, TimeValue};
use de_app::{
    AppError, AppResult, ComputeProgressEvent, ComputeStage, DiffEnergyConfig, FieldPlot,
    PlotSink, SeriesPlot, compute_service, load_config, plot_error_growth, plot_field_averages,
};
use de_core::{Level, parse_timestamp};
use de_grid::SnapshotOpener;
use de_results::{EnergyValues, ResultMapping, StoreFormat};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "de-cli")]
#[command(about = "diffenergy CLI - difference kinetic/total energy between model runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute difference energy for every pair of runs
    Compute(ComputeArgs),
    /// Write error growth series from a cached result
    Growth {
        #[command(flatten)]
        source: ResultSource,
        /// Sensitivity key; repeat to group by several keys
        #[arg(short, long)]
        sensitivity: Vec<String>,
        /// Prefix of the output file names
        #[arg(long, default_value = "diffenergy")]
        prefix: String,
        /// Directory for the CSV files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write the pair-averaged column field at each time from a cached result
    Fields {
        #[command(flatten)]
        source: ResultSource,
        /// Times to write (RFC 3339, 'YYYY-MM-DD HH:MM:SS' or epoch seconds)
        #[arg(short, long = "time", required = true)]
        times: Vec<String>,
        /// Prefix of the output file names
        #[arg(long, default_value = "diffenergy")]
        prefix: String,
        /// Directory for the CSV files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Show a summary of a cached result
    Show {
        #[command(flatten)]
        source: ResultSource,
    },
}

#[derive(clap::Args)]
struct ComputeArgs {
    /// YAML config file; the flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Integration mode: sum_z or sum_xyz
    #[arg(long)]
    ptype: Option<String>,
    /// Energy kind: kinetic or total
    #[arg(long)]
    energy: Option<String>,
    /// Upper bound of the vertical sum (hPa or 'all')
    #[arg(long)]
    upper: Option<Level>,
    /// Lower bound of the vertical sum (hPa or 'all')
    #[arg(long)]
    lower: Option<Level>,
    /// Grid snapshot file; repeat for every run
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,
    /// Time to compute; repeat for several
    #[arg(short, long = "time")]
    times: Vec<String>,
    /// Directory to save the result into
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Do not save the result
    #[arg(long, conflicts_with = "save_dir")]
    no_save: bool,
    /// Base name of the saved result
    #[arg(long)]
    name: Option<String>,
    /// Result format: json or yaml
    #[arg(long)]
    format: Option<String>,
    /// Compute pairs in parallel
    #[arg(long)]
    parallel: bool,
    /// Skip cache and force recomputation
    #[arg(long)]
    no_cache: bool,
}

#[derive(clap::Args)]
struct ResultSource {
    /// Directory holding the cached result
    #[arg(short, long)]
    dir: PathBuf,
    /// Base name of the cached result
    #[arg(short, long, default_value = compute_service::DEFAULT_BASE_NAME)]
    name: String,
    /// Result format: json or yaml
    #[arg(long, default_value = "json")]
    format: String,
}

impl ResultSource {
    fn load(&self) -> AppResult<ResultMapping> {
        let format: StoreFormat = self.format.parse()?;
        compute_service::load_result(&self.dir, &self.name, format)
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute(args) => cmd_compute(args),
        Commands::Growth {
            source,
            sensitivity,
            prefix,
            out_dir,
        } => cmd_growth(&source, &sensitivity, &prefix, &out_dir),
        Commands::Fields {
            source,
            times,
            prefix,
            out_dir,
        } => cmd_fields(&source, &times, &prefix, &out_dir),
        Commands::Show { source } => cmd_show(&source),
    }
}

fn build_config(args: ComputeArgs) -> AppResult<DiffEnergyConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DiffEnergyConfig {
            ptype: args.ptype.clone().ok_or_else(|| {
                AppError::InvalidInput("--ptype is required without --config".to_string())
            })?,
            energy: args.energy.clone().ok_or_else(|| {
                AppError::InvalidInput("--energy is required without --config".to_string())
            })?,
            upper: None,
            lower: None,
            files: Vec::new(),
            times: OneOrMany::Many(Vec::new()),
            d_save: SaveTarget::default(),
            d_return: true,
            d_fname: compute_service::DEFAULT_BASE_NAME.to_string(),
            format: StoreFormat::default().to_string(),
            parallel: false,
            use_cache: true,
            sensitivity: None,
        },
    };

    if let Some(ptype) = args.ptype {
        config.ptype = ptype;
    }
    if let Some(energy) = args.energy {
        config.energy = energy;
    }
    if args.upper.is_some() {
        config.upper = args.upper;
    }
    if args.lower.is_some() {
        config.lower = args.lower;
    }
    if !args.files.is_empty() {
        config.files = args.files;
    }
    if !args.times.is_empty() {
        config.times = OneOrMany::Many(args.times.into_iter().map(TimeValue::Text).collect());
    }
    if let Some(dir) = args.save_dir {
        config.d_save = SaveTarget::Dir(dir);
    }
    if args.no_save {
        config.d_save = SaveTarget::Flag(false);
    }
    if let Some(name) = args.name {
        config.d_fname = name;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    config.parallel |= args.parallel;
    config.use_cache &= !args.no_cache;

    Ok(config)
}

fn cmd_compute(args: ComputeArgs) -> AppResult<()> {
    let request = build_config(args)?.into_request()?;
    println!(
        "Computing {} ({}) for {} runs, {} times",
        request.energy.abbreviation(),
        request.mode,
        request.files.len(),
        request.times.len()
    );

    let mut last_emit = Instant::now();
    let mut last_stage = String::new();
    let response = compute_service::run_with_progress(
        &SnapshotOpener,
        &request,
        Some(&mut |event| {
            let stage_key = format!("{:?}", event.stage);
            let emit_now = stage_key != last_stage || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = stage_key;
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();
    info!(
        fingerprint = %response.fingerprint,
        pairs = response.pair_count,
        cached = response.loaded_from_cache,
        total_s = response.timing.total_time_s,
        "Compute command finished"
    );

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.fingerprint);
    } else {
        println!("✓ Computation completed: {}", response.fingerprint);
    }
    if let Some(path) = &response.artifact_path {
        println!("  Saved to: {}", path.display());
    }
    println!("  Pairs: {}", response.pair_count);

    let timing = &response.timing;
    let total = timing.total_time_s.max(1.0e-12);
    println!("\nTiming summary:");
    println!(
        "  Compute: {:.3}s ({:.1}%)",
        timing.compute_time_s,
        100.0 * timing.compute_time_s / total
    );
    println!(
        "  Save:    {:.3}s ({:.1}%)",
        timing.save_time_s,
        100.0 * timing.save_time_s / total
    );
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:   {:.3}s", timing.total_time_s);

    if let Some(mapping) = &response.mapping {
        print_mapping_summary(mapping);
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &ComputeProgressEvent) {
    match (&event.stage, &event.pairs) {
        (ComputeStage::PairCompleted, Some(p)) => {
            let width = 28usize;
            let fraction = p.fraction_complete();
            let filled = ((fraction * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  pairs={}/{}  last={:.2}s  elapsed={:.1}s",
                bar,
                fraction * 100.0,
                p.completed,
                p.total,
                p.pair_elapsed_s,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_mapping_summary(mapping: &ResultMapping) {
    println!("\nResult Summary:");
    println!("  Mode: {}", mapping.mode);
    println!("  Energy: {}", mapping.energy);
    if let Some(lower) = mapping.bounds.lower_hpa {
        println!("  Lower bound: {} hPa", lower);
    }
    if let Some(upper) = mapping.bounds.upper_hpa {
        println!("  Upper bound: {} hPa", upper);
    }
    if let Some(times) = mapping.times() {
        let labels: Vec<String> = times.iter().map(|t| t.to_rfc3339()).collect();
        println!("  Times: {}", labels.join(", "));
    }

    println!("\nPairs:");
    for (pair, record) in mapping.iter() {
        let kind = match &record.values {
            EnergyValues::Scalars(v) => format!("{} scalars", v.len()),
            EnergyValues::Fields(v) => format!("{} fields", v.len()),
        };
        println!("  {}: {} - {} ({})", pair, record.file1, record.file2, kind);
    }
}

fn cmd_show(source: &ResultSource) -> AppResult<()> {
    println!("Loading result: {}", source.name);
    let mapping = source.load()?;
    print_mapping_summary(&mapping);
    Ok(())
}

fn cmd_growth(
    source: &ResultSource,
    sensitivity: &[String],
    prefix: &str,
    out_dir: &Path,
) -> AppResult<()> {
    let mapping = source.load()?;
    let mut sink = CsvPlotSink::new(out_dir)?;
    let keys = (!sensitivity.is_empty()).then_some(sensitivity);
    let report = plot_error_growth(&mapping, keys, prefix, &mut sink)?;
    info!(
        groups = report.groups.len(),
        plots = sink.written.len(),
        "Growth command finished"
    );

    for path in &sink.written {
        println!("✓ Wrote {}", path.display());
    }
    println!("  Groups: {}", report.groups.len());
    Ok(())
}

fn cmd_fields(source: &ResultSource, times: &[String], prefix: &str, out_dir: &Path) -> AppResult<()> {
    let mapping = source.load()?;
    let times = times
        .iter()
        .map(|raw| parse_timestamp(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let mut sink = CsvPlotSink::new(out_dir)?;
    let count = plot_field_averages(&mapping, &times, prefix, &mut sink)?;
    info!(fields = count, "Fields command finished");

    for path in &sink.written {
        println!("✓ Wrote {}", path.display());
    }
    Ok(())
}

/// Writes each plot as a CSV file named after the plot.
struct CsvPlotSink {
    out_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvPlotSink {
    fn new(out_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            written: Vec::new(),
        })
    }

    fn write(&mut self, name: &str, csv: String) -> AppResult<()> {
        let path = self.out_dir.join(format!("{}.csv", name));
        std::fs::write(&path, csv)?;
        debug!(path = %path.display(), "Wrote plot data");
        self.written.push(path);
        Ok(())
    }
}

impl PlotSink for CsvPlotSink {
    fn series_plot(&mut self, plot: &SeriesPlot) -> AppResult<()> {
        let mut csv = String::from("time,tick");
        for line in &plot.lines {
            csv.push_str(&format!(",{}", line.label));
        }
        csv.push('\n');
        for (n, (time, tick)) in plot.times.iter().zip(&plot.tick_labels).enumerate() {
            csv.push_str(&format!("{},{}", time.to_rfc3339(), tick));
            for line in &plot.lines {
                match line.values.get(n) {
                    Some(v) => csv.push_str(&format!(",{}", v)),
                    None => csv.push(','),
                }
            }
            csv.push('\n');
        }
        self.write(&plot.name, csv)
    }

    fn field_plot(&mut self, plot: &FieldPlot) -> AppResult<()> {
        let mut csv = String::new();
        for row in plot.field.rows() {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }
        self.write(&plot.name, csv)
    }
}
