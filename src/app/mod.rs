//! Core application logic for CelesTrak Fetcher
//!
//! This module contains the catalog and data models, generation rotation,
//! the HTTP client, request pacing, batch orchestration, and the inventory
//! of files a run leaves behind.
//!
//! # Examples
//!
//! ```rust,no_run
//! use celestrak_fetcher::app::{create_shutdown_channel, Job, RunTimestamp};
//! use celestrak_fetcher::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None).await?;
//! let job = Job::from_config(&config)?;
//!
//! let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
//! let outcome = job.run(&RunTimestamp::now(), shutdown_rx).await?;
//! for failure in &outcome.report.failed {
//!     eprintln!("{}: {}", failure.unit, failure.error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod inventory;
pub mod job;
pub mod limiter;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod rotation;

// Re-export main public API
pub use catalog::{default_catalog, units_in_category, validate_catalog};
pub use client::{CelestrakClient, ClientConfig, Fetcher, ProviderEndpoint};
pub use inventory::{generation_timestamps, latest_file, Inventory, SnapshotFile};
pub use job::{Job, JobOutcome};
pub use limiter::{FixedInterval, PacingMode, RateLimit, TokenBucket, Unpaced};
pub use models::{Category, DownloadUnit, RunTimestamp};
pub use orchestrator::{
    create_shutdown_channel, Orchestrator, OrchestratorConfig, SignalHandler, UnitEvent,
};
pub use report::{RunReport, UnitFailure, UnitSuccess};
pub use rotation::{rotate, RelocationFailure, RotatedArea};
