//! Command implementations for the mosobs CLI
//!
//! Sets up logging and configuration, then dispatches to one handler per
//! subcommand. Library errors are wrapped with `anyhow` context here.

use crate::aligner::{AlignedForecast, Aligner};
use crate::archive::BulletinArchive;
use crate::bulletin::BulletinParser;
use crate::cli::args::{AlignArgs, Args, Commands, ParseArgs, ProcessArgs, SplitArgs};
use crate::config::MosConfig;
use crate::models::{Bulletin, ProcessingStats};
use crate::processor::BatchProcessor;
use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Main command runner
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = Arc::new(load_configuration(&args)?);

    match &args.command {
        Commands::Parse(parse) => run_parse(&config, parse),
        Commands::Align(align) => run_align(&config, align).await,
        Commands::Process(process) => run_process(config, process, args.quiet).await,
        Commands::Split(split) => run_split(&config, split),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mosobs={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration from file or defaults, then apply CLI overrides
fn load_configuration(args: &Args) -> Result<MosConfig> {
    let mut config = MosConfig::load(args.config_file.as_deref())
        .context("Failed to load configuration")?;

    if let Some(data_root) = &args.data_root {
        config = config.with_data_root(data_root);
    }
    if let Commands::Process(process) = &args.command {
        if let Some(workers) = process.workers {
            config = config.with_max_concurrent_files(workers);
        }
    }

    config.validate()?;
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

fn run_parse(config: &Arc<MosConfig>, args: &ParseArgs) -> Result<ProcessingStats> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let bulletin = BulletinParser::new(config.clone())
        .parse_str(&text)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    print_bulletin(&bulletin);

    Ok(ProcessingStats {
        bulletins_parsed: 1,
        ..Default::default()
    })
}

async fn run_align(config: &Arc<MosConfig>, args: &AlignArgs) -> Result<ProcessingStats> {
    let aligner = Aligner::new(config.clone());
    let station = args.station.clone();
    let date = args.date;
    let models = args.models.clone();

    let aligned = tokio::task::spawn_blocking(move || aligner.align(&station, date, &models))
        .await
        .context("Alignment task failed")?
        .with_context(|| format!("Failed to align {} for {}", args.station, args.date))?;

    print_aligned(&aligned);

    Ok(ProcessingStats {
        dates_processed: 1,
        bulletins_parsed: aligned.available_count(),
        bulletins_missing: aligned.missing_count(),
        bulletins_rejected: aligned.rejected().len(),
        ..Default::default()
    })
}

async fn run_process(
    config: Arc<MosConfig>,
    args: &ProcessArgs,
    quiet: bool,
) -> Result<ProcessingStats> {
    let (output_path, format) = args.output();
    info!(
        "Processing {} from {} to {} into {}",
        args.station,
        args.start,
        args.end,
        output_path.display()
    );

    let stats = BatchProcessor::new(config, &args.station)
        .with_models(args.models.clone())
        .with_output(output_path, format)
        .with_quiet(quiet)
        .process(args.start, args.end)
        .await
        .with_context(|| format!("Failed to process {}", args.station))?;

    Ok(stats)
}

fn run_split(config: &Arc<MosConfig>, args: &SplitArgs) -> Result<ProcessingStats> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let archive = BulletinArchive::new(config.clone());
    let paths = archive
        .import_compilation(&text, &args.station, args.model)
        .with_context(|| format!("Failed to split {}", args.input.display()))?;

    for path in &paths {
        println!("  {} {}", "Wrote".bright_green(), path.display());
    }
    println!(
        "{} {} bulletins for {}",
        "Stored".bright_green().bold(),
        paths.len().to_string().bright_white().bold(),
        args.station.to_uppercase()
    );

    Ok(ProcessingStats {
        bulletins_parsed: paths.len(),
        ..Default::default()
    })
}

fn print_bulletin(bulletin: &Bulletin) {
    let header = bulletin.header();
    println!(
        "{} {} issued {} ({})",
        "Bulletin".bright_green().bold(),
        header.station.bright_white().bold(),
        header.issued,
        header.issuance_hour
    );
    println!(
        "  {} {} from {} to {}",
        "Timestamps:".bright_cyan(),
        bulletin.timestamps().len(),
        bulletin
            .timestamps()
            .first()
            .map(|ts| ts.to_string())
            .unwrap_or_default(),
        bulletin
            .timestamps()
            .last()
            .map(|ts| ts.to_string())
            .unwrap_or_default()
    );
    let codes: Vec<String> = bulletin.fields().codes().map(|c| c.to_string()).collect();
    println!("  {} {}", "Fields:".bright_cyan(), codes.join(" "));

    println!("\n{}", "Max/Min".bright_yellow());
    for (date, day) in bulletin.extremes().iter() {
        println!(
            "  {}  max {:>4}  min {:>4}  range {:>3}",
            date,
            display_value(day.max),
            display_value(day.min),
            display_value(day.range())
        );
    }

    println!("\n{}", "12-hour precipitation".bright_yellow());
    for (date, day) in bulletin.precip().iter() {
        println!(
            "  {}  PoP {:>3} {:>3} (max {:>3})  QPF {:>2} {:>2}",
            date,
            day.probability[0],
            day.probability[1],
            day.max_probability(),
            day.quantity[0],
            day.quantity[1]
        );
    }
}

fn print_aligned(aligned: &AlignedForecast) {
    println!(
        "{} {} for {}",
        "Aligned".bright_green().bold(),
        aligned.station.bright_white().bold(),
        aligned.validation_date
    );
    println!(
        "  {:<7} {:>4} {:>4} {:>7} {:>7} {:>4} {:>6}",
        "source", "max", "min", "pop", "qpf", "wind", "speed"
    );

    for slot in &aligned.slots {
        let key = slot.key();
        if !slot.is_available() {
            println!("  {:<7} {}", key, "absent".bright_red());
            continue;
        }

        let features = slot.features(aligned.validation_date);
        println!(
            "  {:<7} {:>4} {:>4} {:>3}/{:<3} {:>3}/{:<3} {:>4} {:>6}",
            key,
            display_value(features.max_temp),
            display_value(features.min_temp),
            display_value(features.pop_early),
            display_value(features.pop_late),
            display_value(features.qpf_early),
            display_value(features.qpf_late),
            features
                .wind_quadrant
                .map(|q| q.to_string())
                .unwrap_or_else(|| "-".to_string()),
            features
                .mean_wind_speed
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    for (key, reason) in aligned.rejected() {
        println!("  {} {}: {}", "Rejected".bright_red(), key, reason);
    }
}

fn display_value(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
