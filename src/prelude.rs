//! Prelude module for CelesTrak Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use celestrak_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use celestrak_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let job = Job::from_config(&config)?;
//!     let (_tx, rx) = create_shutdown_channel();
//!     let outcome = job.run(&RunTimestamp::now(), rx).await?;
//!     println!("{}", outcome.report.summary());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Data types
    Category,
    CelestrakClient,
    ClientConfig,
    DownloadUnit,
    Fetcher,
    Inventory,
    // Core orchestration
    Job,
    JobOutcome,
    Orchestrator,
    OrchestratorConfig,
    ProviderEndpoint,
    RateLimit,
    RunReport,
    RunTimestamp,

    // Functions
    create_shutdown_channel,
    default_catalog,
    rotate,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{BACKUP_DIR_NAME, CELESTRAK_BASE_URL, DEFAULT_WORKER_COUNT, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
