pub mod cli;
pub mod config;
pub mod data;
pub mod filter;
pub mod io_utils;
pub mod ranking;
pub mod saw;
pub mod schema;
pub mod store;
pub mod table;
pub mod topsis;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::Parser;
use log::{LevelFilter, error, info, warn};

use crate::{
    cli::{Cli, Commands, InputArgs, RegionArgs},
    config::Settings,
    data::RawTable,
    io_utils::{FILTER_PREFIX, RESULT_PREFIX, ReadOptions},
    schema::{CanonicalTable, ValidationError},
};

pub use crate::{
    filter::{RegionFilter, filter},
    ranking::{RankedResult, RankedRow, rank},
    schema::reconcile_and_validate,
    store::ResultStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("topsis_rank", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Settings::load_optional(cli.config.as_deref())?;
    match cli.command {
        Commands::Rank(args) => handle_rank(&args, &settings),
        Commands::Export(args) => handle_export(&args, &settings),
        Commands::Verify(args) => handle_verify(&args, &settings),
        Commands::Template(args) => handle_template(&args),
    }
}

fn handle_rank(args: &cli::RankArgs, settings: &Settings) -> Result<()> {
    let households = load_validated(&args.source, settings)?;
    let result = ranking::rank(&households);

    let output_dir = settings.output_dir(args.output_dir.as_deref());
    let state_file = settings.state_file(args.state.as_deref(), &output_dir);
    let store = ResultStore::new();
    let published = store.publish(result);
    store
        .save_snapshot(&state_file)
        .with_context(|| format!("Saving ranking snapshot to {state_file:?}"))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| io_utils::timestamped_path(&output_dir, RESULT_PREFIX, Local::now()));
    io_utils::write_ranked_csv(&output, &published, io_utils::DEFAULT_CSV_DELIMITER)
        .with_context(|| format!("Writing ranking to {output:?}"))?;
    info!(
        "Ranking of {} household(s) written to {:?}",
        published.len(),
        output
    );

    let constraints = region_filter(&args.region);
    if constraints.is_unconstrained() {
        if args.table {
            print!("{}", table::render_ranking(&published));
        }
        return Ok(());
    }

    let selected = filter::filter(&published, &constraints);
    if selected.is_empty() {
        warn!("No household matches {}", constraints.describe());
    }
    let filtered_output = io_utils::timestamped_path(&output_dir, FILTER_PREFIX, Local::now());
    io_utils::write_ranked_csv(&filtered_output, &selected, io_utils::DEFAULT_CSV_DELIMITER)
        .with_context(|| format!("Writing filtered ranking to {filtered_output:?}"))?;
    info!(
        "{} household(s) matching {} written to {:?}",
        selected.len(),
        constraints.describe(),
        filtered_output
    );
    if args.table {
        print!("{}", table::render_ranking(&selected));
    }
    Ok(())
}

fn handle_export(args: &cli::ExportArgs, settings: &Settings) -> Result<()> {
    let output_dir = settings.output_dir(args.output_dir.as_deref());
    let store = match &args.from {
        Some(path) => {
            let delimiter = io_utils::resolve_input_delimiter(path, None);
            let store = ResultStore::new();
            store.publish(io_utils::read_ranked_csv(path, delimiter)?);
            store
        }
        None => {
            let state_file = settings.state_file(args.state.as_deref(), &output_dir);
            ResultStore::load_snapshot(&state_file)?
        }
    };

    let constraints = region_filter(&args.region);
    let exported = store
        .filtered(&constraints)
        .ok_or_else(|| anyhow!("No ranking has been computed yet; run `rank` first"))?;
    if exported.is_empty() {
        warn!("No household matches {}", constraints.describe());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| io_utils::timestamped_path(&output_dir, FILTER_PREFIX, Local::now()));
    io_utils::write_ranked_csv(&output, &exported, io_utils::DEFAULT_CSV_DELIMITER)
        .with_context(|| format!("Writing export to {output:?}"))?;
    info!(
        "Exported {} household(s) ({}) to {:?}",
        exported.len(),
        constraints.describe(),
        output
    );

    if args.table {
        print!("{}", table::render_ranking(&exported));
    }
    Ok(())
}

fn handle_verify(args: &cli::VerifyArgs, settings: &Settings) -> Result<()> {
    let raw = read_input(&args.source, settings)?;
    if let Ok(binding) = schema::bind_columns(&raw.headers) {
        print!("{}", table::render_binding(&binding));
    }
    let households = validate(&raw, &args.source)?;
    info!(
        "✓ {:?}: {} household(s) ready for ranking",
        args.source.input,
        households.len()
    );
    Ok(())
}

fn handle_template(args: &cli::TemplateArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    io_utils::write_template(&args.output, delimiter)
        .with_context(|| format!("Writing template to {:?}", args.output))?;
    info!("Template written to {:?}", args.output);
    Ok(())
}

fn read_input(args: &InputArgs, settings: &Settings) -> Result<RawTable> {
    let encoding =
        io_utils::resolve_encoding(settings.input_encoding(args.input_encoding.as_deref()))?;
    let options = ReadOptions {
        delimiter: settings.delimiter(args.delimiter),
        encoding,
        sheet: settings.sheet(args.sheet.as_deref()),
    };
    let raw = io_utils::read_raw_table(&args.input, &options)
        .with_context(|| format!("Reading {:?}", args.input))?;
    info!(
        "Read {} row(s) across {} column(s) from {:?}",
        raw.row_count(),
        raw.headers.len(),
        args.input
    );
    Ok(raw)
}

fn validate(raw: &RawTable, args: &InputArgs) -> Result<CanonicalTable> {
    schema::reconcile_and_validate(raw)
        .inspect_err(report_validation_error)
        .with_context(|| format!("Validating {:?}", args.input))
}

fn load_validated(args: &InputArgs, settings: &Settings) -> Result<CanonicalTable> {
    let raw = read_input(args, settings)?;
    validate(&raw, args)
}

fn report_validation_error(err: &ValidationError) {
    match err {
        ValidationError::SchemaMismatch { missing } => {
            for field in missing {
                error!("Column not found: {field}");
            }
        }
        ValidationError::DataQuality { problems } => {
            for problem in problems {
                error!("Column '{}': {}", problem.column, problem.reason);
            }
        }
        ValidationError::RangeViolation { fields } => {
            for field in fields {
                error!(
                    "Column '{}' must lie between {} and {}",
                    field.column, field.min, field.max
                );
            }
        }
    }
}

fn region_filter(args: &RegionArgs) -> RegionFilter {
    RegionFilter::new(args.rw.as_deref(), args.rt.as_deref(), args.dusun.as_deref())
}
