//! Accelerated Life Test Core - Generation, Fitting and Regression
//!
//! The main entry point for alt-core, handling:
//! - Synthetic lifetime generation from a study catalog
//! - Censored Weibull fitting per stress cell
//! - Arrhenius regression across temperatures
//! - Full study runs with JSON and Parquet result tables

use alt_common::{Error, LifetimeRecord, OutputFormat, StructuredError, TestType, SCHEMA_VERSION};
use alt_config::validate::validate_fit_options;
use alt_config::{load_study, ConfigPaths, StudyConfig};
use alt_core::exit_codes::{install_panic_hook, ExitCode};
use alt_core::inference::{fit_arrhenius, fit_records, fits_for_test_type};
use alt_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use alt_core::model::SyntheticGenerator;
use alt_core::output::{render, CatalogView, RecordSet, Render};
use alt_core::pipeline::{analyze_records, run_pipeline, AnalysisOptions, PipelineOutput};
use alt_telemetry::{read_lifetime_records, write_run_tables, WriterConfig};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Accelerated life test engine - synthetic studies, Weibull fits, Arrhenius checks
#[derive(Parser)]
#[command(name = "alt-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Study configuration file (JSON or TOML)
    #[arg(long, global = true, env = "ALT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q warnings only, -qq silent)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic lifetime records for the study catalog
    Generate(GenerateArgs),

    /// Fit a censored Weibull model to every stress cell
    Fit(FitArgs),

    /// Regress fitted scale on inverse temperature for one test type
    Arrhenius(ArrheniusArgs),

    /// Full study: generate, fit, regress and tabulate survival
    Run(RunArgs),

    /// Show the stress catalog
    Catalog,

    /// Validate the study configuration
    Check,

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Override the generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override devices per stress cell
    #[arg(long)]
    n_per_group: Option<usize>,

    /// Write records to a file (.json or .jsonl) instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FitOverrides {
    /// Minimum failures for a cell to be fitted
    #[arg(long)]
    min_fails: Option<usize>,

    /// Fit cells in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Lifetime records: JSON array, JSONL or a lifetime_records Parquet file
    #[arg(long, short = 'i')]
    input: PathBuf,

    #[command(flatten)]
    fit: FitOverrides,
}

#[derive(Args, Debug)]
struct ArrheniusArgs {
    /// Lifetime records to fit; generated from the study when omitted
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Test type to regress (defaults to the study's)
    #[arg(long)]
    test_type: Option<TestType>,

    /// Points on the prediction line
    #[arg(long, default_value = "100")]
    line_points: usize,

    #[command(flatten)]
    fit: FitOverrides,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Override the generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Analyze these records instead of generating
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Directory for run artifacts (one subdirectory per run)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Also write Parquet result tables
    #[arg(long)]
    parquet: bool,

    #[command(flatten)]
    fit: FitOverrides,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);
    install_panic_hook(cli.global.format.is_machine());
    let ctx = LogContext::new(generate_run_id());

    let result = match &cli.command {
        Commands::Generate(args) => run_generate(&cli.global, &ctx, args),
        Commands::Fit(args) => run_fit(&cli.global, args),
        Commands::Arrhenius(args) => run_arrhenius(&cli.global, &ctx, args),
        Commands::Run(args) => run_study(&cli.global, &ctx, args),
        Commands::Catalog => run_catalog(&cli.global),
        Commands::Check => Ok(run_check(&cli.global)),
        Commands::Version => {
            print_version(&cli.global);
            Ok(ExitCode::Clean)
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => output_error(&cli.global, &ctx, &err),
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(global: &GlobalOpts) -> Result<(StudyConfig, ConfigPaths), Error> {
    let (study, paths) = load_study(global.config.as_deref())?;
    if paths.study.is_none() {
        tracing::info!(
            target: event_names::CONFIG_DEFAULT_USED,
            stage = %Stage::Init,
            "no study file found, using built-in catalog"
        );
    }
    tracing::debug!(
        target: event_names::CONFIG_LOADED,
        stage = %Stage::Init,
        source = %paths.source,
        path = ?paths.study,
        "study configuration loaded"
    );
    Ok((study, paths))
}

fn apply_fit_overrides(study: &mut StudyConfig, overrides: &FitOverrides) -> Result<(), Error> {
    if let Some(min_fails) = overrides.min_fails {
        study.fit.min_fails = min_fails;
    }
    if overrides.parallel {
        study.fit.parallel = true;
    }
    validate_fit_options(&study.fit)?;
    Ok(())
}

fn is_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Read records from JSON, JSONL or Parquet, chosen by extension.
fn load_records(path: &Path) -> Result<Vec<LifetimeRecord>, Error> {
    if is_extension(path, "parquet") {
        return Ok(read_lifetime_records(path)?);
    }

    let content = std::fs::read_to_string(path)?;
    let records: Vec<LifetimeRecord> = if is_extension(path, "jsonl") {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<LifetimeRecord>, _>>()?
    } else {
        serde_json::from_str(&content)?
    };
    tracing::debug!(path = %path.display(), rows = records.len(), "read lifetime records");
    Ok(records)
}

fn emit<T: Render + ?Sized>(global: &GlobalOpts, value: &T) -> Result<(), Error> {
    println!("{}", render(value, global.format)?);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn run_generate(global: &GlobalOpts, ctx: &LogContext, args: &GenerateArgs) -> Result<ExitCode, Error> {
    let (mut study, _) = load_config(global)?;
    if let Some(seed) = args.seed {
        study.generator.seed = seed;
    }
    if let Some(n) = args.n_per_group {
        study.generator.n_per_group = n;
    }

    let records = SyntheticGenerator::new(study.generator, study.catalog)?.generate()?;

    match &args.out {
        Some(path) => {
            let body = if is_extension(path, "jsonl") {
                render(&RecordSet(&records), OutputFormat::Jsonl)?
            } else {
                serde_json::to_string_pretty(&records)?
            };
            std::fs::write(path, body + "\n")?;
            alt_core::log_event!(
                ctx,
                INFO,
                event_names::PERSIST_TABLE_WRITTEN,
                Stage::Persist,
                "records written",
                path = tracing::field::display(path.display()),
                rows = records.len()
            );
            if global.format.is_machine() {
                let response = serde_json::json!({
                    "schema_version": SCHEMA_VERSION,
                    "path": path.display().to_string(),
                    "records": records.len(),
                });
                println!("{}", response);
            } else {
                println!("{} -> {}", RecordSet(&records).summary(), path.display());
            }
        }
        None => emit(global, &RecordSet(&records))?,
    }
    Ok(ExitCode::Clean)
}

fn run_fit(global: &GlobalOpts, args: &FitArgs) -> Result<ExitCode, Error> {
    let (mut study, _) = load_config(global)?;
    apply_fit_overrides(&mut study, &args.fit)?;

    let records = load_records(&args.input)?;
    if records.is_empty() {
        return Err(Error::EmptyInput(format!(
            "{} holds no lifetime records",
            args.input.display()
        )));
    }

    let report = fit_records(&records, &study.fit);
    emit(global, &report)?;
    Ok(ExitCode::from_skipped(report.skipped.len()))
}

fn run_arrhenius(global: &GlobalOpts, ctx: &LogContext, args: &ArrheniusArgs) -> Result<ExitCode, Error> {
    let (mut study, _) = load_config(global)?;
    apply_fit_overrides(&mut study, &args.fit)?;
    let test_type = args.test_type.unwrap_or(study.arrhenius_test_type);

    let records = match &args.input {
        Some(path) => load_records(path)?,
        None => SyntheticGenerator::new(study.generator.clone(), study.catalog.clone())?.generate()?,
    };
    let report = fit_records(&records, &study.fit);
    let regression = fit_arrhenius(&fits_for_test_type(&report.fits, test_type))?;

    alt_core::log_event!(
        ctx,
        INFO,
        event_names::REGRESS_FINISHED,
        Stage::Regress,
        "Arrhenius regression finished",
        test_type = tracing::field::display(&test_type),
        r_squared = regression.coefficients.r_squared
    );

    if global.format == OutputFormat::Json {
        let response = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "run_id": ctx.run_id,
            "regression": regression,
            "prediction_line": regression.prediction_line(args.line_points),
        });
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        emit(global, &regression)?;
    }
    Ok(ExitCode::Clean)
}

fn run_study(global: &GlobalOpts, ctx: &LogContext, args: &RunArgs) -> Result<ExitCode, Error> {
    let (mut study, _) = load_config(global)?;
    apply_fit_overrides(&mut study, &args.fit)?;
    if let Some(seed) = args.seed {
        study.generator.seed = seed;
    }

    let output = match &args.input {
        Some(path) => analyze_records(load_records(path)?, &AnalysisOptions::from(&study), ctx)?,
        None => run_pipeline(&study, ctx)?,
    };

    if args.out_dir.is_some() || args.parquet {
        let base = args
            .out_dir
            .clone()
            .unwrap_or_else(alt_telemetry::default_output_dir);
        persist_run(ctx, &base, &output, args.parquet)?;
    }

    emit(global, &output)?;
    Ok(ExitCode::from_skipped(output.fit.skipped.len()))
}

/// Write `pipeline.json`, `events.jsonl` and optionally the Parquet tables
/// under `<base>/<run_id>/`.
fn persist_run(ctx: &LogContext, base: &Path, output: &PipelineOutput, parquet: bool) -> Result<(), Error> {
    let mut writer_config = WriterConfig::new(base.to_path_buf(), output.run_id.clone())
        .with_metadata("schema_version", SCHEMA_VERSION);
    if let Some(seed) = output.seed {
        writer_config = writer_config.with_metadata("seed", seed.to_string());
    }
    let run_dir = writer_config.run_dir();
    std::fs::create_dir_all(&run_dir)?;

    let pipeline_path = run_dir.join("pipeline.json");
    std::fs::write(&pipeline_path, serde_json::to_string_pretty(output)?)?;

    let mut tables = Vec::new();
    if parquet {
        let written = write_run_tables(
            &writer_config,
            &output.records,
            &output.fit.fits,
            &output.fit.skipped,
        )?;
        tables = vec![written.lifetime_records, written.weibull_fits, written.skipped_cells];
    }

    for path in std::iter::once(&pipeline_path).chain(&tables) {
        alt_core::log_event!(
            ctx,
            INFO,
            event_names::PERSIST_TABLE_WRITTEN,
            Stage::Persist,
            "run artifact written",
            path = tracing::field::display(path.display())
        );
    }

    let started = ctx
        .info(event_names::RUN_STARTED, Stage::Init, "study run started")
        .with_field("seed", output.seed)
        .with_field("records", output.records.len());
    let finished = ctx
        .info(event_names::RUN_FINISHED, Stage::Persist, "study run finished")
        .with_field("fitted", output.fit.fits.len())
        .with_field("skipped", output.fit.skipped.len())
        .with_field(
            "activation_energy_ev",
            output
                .arrhenius
                .as_ref()
                .map(|r| r.coefficients.activation_energy_ev),
        )
        .with_field("artifacts", &tables);
    let mut events = started.to_jsonl();
    events.push('\n');
    for skip in &output.fit.skipped {
        let line = ctx
            .warn(event_names::FIT_CELL_SKIPPED, Stage::Fit, "cell skipped")
            .with_field("cell", skip.cell.to_string())
            .with_field("reason", skip.reason.tag())
            .to_jsonl();
        events.push_str(&line);
        events.push('\n');
    }
    events.push_str(&finished.to_jsonl());
    events.push('\n');
    std::fs::write(run_dir.join("events.jsonl"), events)?;
    Ok(())
}

fn run_catalog(global: &GlobalOpts) -> Result<ExitCode, Error> {
    let (study, _) = load_config(global)?;
    emit(global, &CatalogView(&study.catalog))?;
    Ok(ExitCode::Clean)
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    match load_study(global.config.as_deref()) {
        Ok((study, paths)) => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "valid",
                "source": paths.source.to_string(),
                "path": paths.study.as_ref().map(|p| p.display().to_string()),
                "using_defaults": paths.study.is_none(),
                "test_types": study.catalog.len(),
                "stress_cells": study.catalog.cells().len(),
                "devices": study.catalog.cells().len() * study.generator.n_per_group,
            });

            match global.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&response).unwrap_or_default()
                ),
                OutputFormat::Jsonl => println!("{}", response),
                OutputFormat::Summary => println!("check: OK ({})", paths.source),
                OutputFormat::Md => {
                    println!("# Study Configuration");
                    println!();
                    println!("Status: ✓ Valid");
                    match &paths.study {
                        Some(path) => println!("Study: {}", path.display()),
                        None => println!("Study: using built-in defaults"),
                    }
                    println!("Stress cells: {}", study.catalog.cells().len());
                }
            }
            ExitCode::Clean
        }
        Err(e) => {
            tracing::error!(
                target: event_names::CONFIG_ERROR,
                stage = %Stage::Init,
                error = %e,
                "study configuration invalid"
            );
            let err = Error::from(e);
            print_error(global, &err);
            ExitCode::ConfigError
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "alt_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            println!("{}", version_info);
        }
        _ => {
            println!("alt-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

fn print_error(global: &GlobalOpts, err: &Error) {
    if global.format.is_machine() {
        eprintln!("{}", StructuredError::from(err).to_json());
    } else {
        eprintln!("{}", err.to_human());
    }
}

/// Report a command error in the appropriate format and map it to an exit code.
fn output_error(global: &GlobalOpts, ctx: &LogContext, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    alt_core::log_event!(
        ctx,
        ERROR,
        event_names::INTERNAL_ERROR,
        Stage::Init,
        "command failed",
        code = err.code(),
        exit_code = exit_code.as_i32(),
        error = tracing::field::display(err)
    );
    print_error(global, err);
    exit_code
}
