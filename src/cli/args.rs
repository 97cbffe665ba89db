//! Command-line argument parsing for CelesTrak Fetcher
//!
//! This module defines the CLI structure using clap derive macros. Running
//! the binary without a subcommand performs a full fetch.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use humantime_serde::re::humantime;

use crate::app::limiter::PacingMode;
use crate::app::models::Category;
use crate::config::AppConfig;

/// CelesTrak Fetcher - keep a local snapshot of satellite orbital elements
#[derive(Parser, Debug)]
#[command(
    name = "celestrak_fetcher",
    version,
    about = "Download CelesTrak orbital element sets into a rotating local snapshot",
    long_about = "Moves the previous snapshot into backup/ and fetches every catalog group from CelesTrak.
Requests are paced, and a failing group never stops the others."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand (defaults to `fetch`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only, no progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working area directory
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Rotate the working area and fetch the whole catalog
    Fetch(FetchArgs),

    /// Move the current snapshot into backup without fetching
    ///
    /// The backup area is emptied first, and a later `fetch` empties it
    /// again: running `rotate` then `fetch` discards the only previous
    /// generation.
    Rotate,

    /// Print the download catalog
    Catalog(CatalogArgs),

    /// List the snapshot files in the working area
    List(ListArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Number of concurrent fetch workers
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Spacing between fetches, e.g. "1s" or "500ms" ("0s" disables pacing)
    #[arg(long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Timeout for a single fetch
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Stop starting new fetches after this long
    #[arg(long, value_parser = parse_duration)]
    pub run_timeout: Option<Duration>,

    /// Use a shared token bucket instead of a fixed interval
    #[arg(long)]
    pub token_bucket: bool,

    /// Token bucket burst size
    #[arg(long, requires = "token_bucket")]
    pub burst: Option<u32>,

    /// Exit with status 2 when any unit failed or was skipped
    #[arg(long)]
    pub strict: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the catalog command
#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Only show units of this category
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run, `fetch` when none was given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Fetch(FetchArgs::default()))
    }

    /// Logging level requested by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::TRACE)
        } else if self.global.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}

impl GlobalArgs {
    /// Apply global overrides on top of loaded configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data.working_area = dir.clone();
        }
    }
}

impl FetchArgs {
    /// Apply fetch flags on top of loaded configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        let orchestrator = &mut config.orchestrator;
        if let Some(workers) = self.workers {
            orchestrator.worker_count = workers;
        }
        if let Some(interval) = self.interval {
            orchestrator.pacing_interval = interval;
        }
        if let Some(timeout) = self.timeout {
            orchestrator.fetch_timeout = timeout;
        }
        if self.run_timeout.is_some() {
            orchestrator.run_timeout = self.run_timeout;
        }
        if self.token_bucket {
            orchestrator.pacing = PacingMode::TokenBucket;
        }
        if let Some(burst) = self.burst {
            orchestrator.burst = burst;
        }
    }

    /// Whether a progress bar may be drawn
    pub fn wants_progress(&self) -> bool {
        !self.no_progress && !self.json
    }
}

/// Parse a human-readable duration such as `1s`, `250ms` or `10m`
fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| format!("invalid duration '{}': {}", value, e))
}
