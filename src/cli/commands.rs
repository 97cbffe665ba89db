//! Command handlers for CelesTrak Fetcher CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the core application functionality.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::{
    create_shutdown_channel, generation_timestamps, rotate, units_in_category, Inventory, Job,
    JobOutcome, RunTimestamp, SignalHandler,
};
use crate::cli::{CatalogArgs, Cli, Commands, ConfigAction, ConfigArgs, FetchArgs, ListArgs};
use crate::cli::ProgressDisplay;
use crate::config::AppConfig;
use crate::constants::{files, workers};
use crate::errors::{AppError, Result};

/// Exit status when `--strict` is set and the run was not fully successful
pub const EXIT_UNIT_FAILURES: i32 = 2;

/// Load configuration for a command and apply global overrides
///
/// `config init` works from defaults so a broken file can be replaced.
pub async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match cli.command {
        Some(Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        })) => AppConfig::default(),
        _ => AppConfig::load(cli.global.config.clone()).await?,
    };
    cli.global.apply_to(&mut config);
    Ok(config)
}

/// Handle the fetch command
///
/// Rotates the working area and fetches the catalog. Returns the process exit
/// status: per-unit failures only affect it with `--strict`.
pub async fn handle_fetch(mut config: AppConfig, args: FetchArgs, quiet: bool) -> Result<i32> {
    let start_time = Instant::now();
    args.apply_to(&mut config);

    let job = Job::from_config(&config)?;
    let total_units = job.catalog().len();
    info!(
        "Starting fetch of {} units into {}",
        total_units,
        job.working_area().display()
    );

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let signal_handle = SignalHandler::new(shutdown_tx).setup();

    let show_progress = args.wants_progress() && !quiet && ProgressDisplay::is_supported();
    let (job, progress) = if show_progress {
        let (tx, rx) = mpsc::channel(workers::EVENT_BUFFER_SIZE);
        (job.with_events(tx), Some(ProgressDisplay::start(total_units, rx)))
    } else {
        (job, None)
    };

    if !quiet && !args.json {
        println!(
            "🛰  Fetching {} groups into {}...",
            total_units,
            job.working_area().display()
        );
    }

    let result = job.run(&RunTimestamp::now(), shutdown_rx).await;
    signal_handle.abort();

    // Closing the event channel lets the progress task finish
    drop(job);
    if let Some(progress) = progress {
        progress.finish().await;
    }
    let outcome = result?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| AppError::generic(format!("Failed to serialize report: {}", e)))?;
        println!("{}", json);
    } else if !quiet {
        print_summary(&outcome, start_time);
    }

    let report = &outcome.report;
    if args.strict && (report.has_failures() || !report.is_complete()) {
        warn!("Strict mode: run was not fully successful");
        return Ok(EXIT_UNIT_FAILURES);
    }
    Ok(0)
}

fn print_summary(outcome: &JobOutcome, start_time: Instant) {
    let report = &outcome.report;

    println!("\n📊 Fetch Summary ({}):", report.timestamp);
    println!("  Moved to backup: {}", outcome.relocated);
    println!("  Attempted: {}", report.attempted);
    println!("  Succeeded: {}", report.succeeded_count());
    println!("  Failed: {}", report.failed_count());
    if report.cancelled {
        println!("  Skipped (cancelled): {}", report.skipped.len());
    }
    println!("  Bytes written: {}", report.total_bytes());
    println!("  Total time: {:?}", start_time.elapsed());

    if !outcome.relocation_failures.is_empty() {
        println!("\n⚠️  Left in the working area (could not move to backup):");
        for failure in &outcome.relocation_failures {
            println!("  • {}: {}", failure.path.display(), failure.reason);
        }
    }

    if report.has_failures() {
        println!("\n❌ Failed units:");
        for failure in &report.failed {
            println!("  • {} [{}]: {}", failure.unit, failure.kind, failure.error);
        }
    }
}

/// Handle the rotate command
pub async fn handle_rotate(config: AppConfig, quiet: bool) -> Result<()> {
    let area = rotate(&config.data.working_area).await?;

    if !quiet {
        println!(
            "🔄 Moved {} entries into {}",
            area.relocated().len(),
            area.backup().display()
        );
        for failure in area.failures() {
            println!("  ⚠️  {}: {}", failure.path.display(), failure.reason);
        }
    }
    Ok(())
}

/// Handle the catalog command
pub async fn handle_catalog(config: AppConfig, args: CatalogArgs) -> Result<()> {
    let catalog = config.catalog();
    let units: Vec<_> = match args.category {
        Some(category) => units_in_category(&catalog, category),
        None => catalog.iter().collect(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&units)
            .map_err(|e| AppError::generic(format!("Failed to serialize catalog: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("📋 Catalog ({} units)", units.len());
    println!("===================");
    let sample = RunTimestamp::new("{timestamp}");
    for unit in units {
        println!(
            "  {:<28} -> {}",
            unit.group_id,
            unit.relative_output(&sample)
        );
    }
    Ok(())
}

/// Handle the list command
///
/// Shows the latest file per type in each category of the current
/// generation, plus the timestamps held in the backup area.
pub async fn handle_list(config: AppConfig, args: ListArgs) -> Result<()> {
    let root = &config.data.working_area;
    let inventory = Inventory::scan(root).await?;
    let backup = generation_timestamps(&root.join(files::BACKUP_DIR_NAME)).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&list_as_json(&inventory, &backup))
            .map_err(|e| AppError::generic(format!("Failed to serialize inventory: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("📂 Working area: {}", root.display());
    if inventory.is_empty() {
        println!("  (no snapshot files)");
    }
    for category in inventory.categories() {
        let label = category.map(|c| c.as_str()).unwrap_or("(root)");
        println!("  {}", label);
        for base_name in inventory.base_names(category) {
            if let Some(latest) = inventory.latest(base_name, category) {
                println!("    {:<28} {}", base_name, file_name(&latest.path));
            }
        }
    }

    match backup.last() {
        Some(latest) => println!("🗄  Backup generation: {}", latest),
        None => println!("🗄  Backup generation: none"),
    }
    if backup.len() > 1 {
        warn!(
            "Backup area holds {} distinct timestamps; expected a single generation",
            backup.len()
        );
    }
    Ok(())
}

fn list_as_json(inventory: &Inventory, backup: &[RunTimestamp]) -> serde_json::Value {
    let mut categories = BTreeMap::new();
    for category in inventory.categories() {
        let label = category.map(|c| c.as_str()).unwrap_or("");
        let latest: BTreeMap<&str, &Path> = inventory
            .base_names(category)
            .into_iter()
            .filter_map(|name| {
                inventory
                    .latest(name, category)
                    .map(|f| (name, f.path.as_path()))
            })
            .collect();
        categories.insert(label, serde_json::json!(latest));
    }

    serde_json::json!({
        "categories": categories,
        "generations": inventory.generation_timestamps(),
        "backup_generations": backup,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Handle the config command
pub async fn handle_config(config: AppConfig, args: ConfigArgs, cli: &Cli) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = match &cli.global.config {
                Some(path) => path.clone(),
                None => AppConfig::get_default_config_path()?,
            };
            AppConfig::write_default(&path, force).await?;
            println!("📁 Created default configuration file:");
            println!("   {}", path.display());
            println!("   You can customize settings by editing this file.");
        }
        ConfigAction::Show => {
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
