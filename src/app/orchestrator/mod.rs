//! Batch fetch orchestration
//!
//! The orchestrator walks the catalog and, for every unit, ensures the
//! category directory exists, performs one paced fetch and writes the payload
//! to `{base}_{timestamp}.json`. Per-unit failures are recorded and the run
//! moves on: there is no retry and no abort.
//!
//! Units are drawn from a shared ordered queue by `worker_count` tasks. With
//! the default of one worker this is exactly the sequential "fetch, sleep,
//! fetch" loop. With more workers completion order may differ from catalog
//! order, but every unit is still taken from the queue exactly once. Only the
//! queue, the limiter and the outcome list are shared; no lock is held while
//! a fetch is in flight.
//!
//! - [`config`] - worker count, pacing, timeouts
//! - [`events`] - progress events for front ends
//! - [`signals`] - shutdown signals and run cancellation
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use celestrak_fetcher::app::{
//!     default_catalog, rotate, CelestrakClient, ClientConfig, Orchestrator,
//!     OrchestratorConfig, ProviderEndpoint, RunTimestamp,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OrchestratorConfig::default();
//! let client = CelestrakClient::new(&ClientConfig::default())?;
//! let orchestrator = Orchestrator::new(
//!     config.clone(),
//!     ProviderEndpoint::default(),
//!     Arc::new(client),
//!     config.build_limiter()?,
//! );
//!
//! let area = rotate("./data".as_ref()).await?;
//! let report = orchestrator
//!     .run(&default_catalog(), &area, &RunTimestamp::now())
//!     .await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod events;
pub mod signals;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::fs;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::app::client::{Fetcher, ProviderEndpoint};
use crate::app::limiter::RateLimit;
use crate::app::models::{DownloadUnit, RunTimestamp};
use crate::app::report::{RunReport, UnitOutcome};
use crate::app::rotation::RotatedArea;
use crate::constants::files;
use crate::errors::{FetchError, UnitError, WriteError};

pub use config::OrchestratorConfig;
pub use events::UnitEvent;
pub use signals::{create_shutdown_channel, SignalHandler};

/// Drives one batch run over a catalog
pub struct Orchestrator {
    config: OrchestratorConfig,
    endpoint: ProviderEndpoint,
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<dyn RateLimit>,
    events: Option<mpsc::Sender<UnitEvent>>,
}

/// State shared by the workers of one run
struct RunContext {
    root: PathBuf,
    timestamp: RunTimestamp,
    endpoint: ProviderEndpoint,
    fetch_timeout: Duration,
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<dyn RateLimit>,
    events: Option<mpsc::Sender<UnitEvent>>,
    queue: Mutex<VecDeque<(usize, DownloadUnit)>>,
    outcomes: Mutex<Vec<(usize, UnitOutcome)>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        endpoint: ProviderEndpoint,
        fetcher: Arc<dyn Fetcher>,
        limiter: Arc<dyn RateLimit>,
    ) -> Self {
        Self {
            config,
            endpoint,
            fetcher,
            limiter,
            events: None,
        }
    }

    /// Send per-unit progress events to `tx`
    pub fn with_events(mut self, tx: mpsc::Sender<UnitEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run the whole catalog against a freshly rotated working area
    pub async fn run(
        &self,
        catalog: &[DownloadUnit],
        area: &RotatedArea,
        timestamp: &RunTimestamp,
    ) -> RunReport {
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let report = self
            .run_with_shutdown(catalog, area, timestamp, shutdown_rx)
            .await;
        drop(shutdown_tx);
        report
    }

    /// Run the catalog, stopping early when `shutdown_rx` fires or the run
    /// timeout expires
    ///
    /// Cancellation is observed between units. In-flight fetches finish or
    /// hit their own timeout; units not yet started are reported as skipped.
    pub async fn run_with_shutdown(
        &self,
        catalog: &[DownloadUnit],
        area: &RotatedArea,
        timestamp: &RunTimestamp,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> RunReport {
        let started = Instant::now();
        let worker_count = self.config.worker_count.max(1).min(catalog.len());

        info!(
            "Fetching {} units into {} with {} worker(s), timestamp {}",
            catalog.len(),
            area.root().display(),
            worker_count,
            timestamp
        );

        let context = Arc::new(RunContext {
            root: area.root().to_path_buf(),
            timestamp: timestamp.clone(),
            endpoint: self.endpoint.clone(),
            fetch_timeout: self.config.fetch_timeout,
            fetcher: self.fetcher.clone(),
            limiter: self.limiter.clone(),
            events: self.events.clone(),
            queue: Mutex::new(catalog.iter().cloned().enumerate().collect()),
            outcomes: Mutex::new(Vec::with_capacity(catalog.len())),
        });

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let watcher = tokio::spawn(signals::watch_for_cancellation(
            shutdown_rx,
            self.config.run_timeout,
            cancel_tx,
        ));

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                let context = context.clone();
                let cancel_rx = cancel_rx.clone();
                tokio::spawn(worker_loop(worker_id, context, cancel_rx))
            })
            .collect();

        for (worker_id, result) in futures::future::join_all(handles)
            .await
            .into_iter()
            .enumerate()
        {
            if let Err(e) = result {
                error!("Worker {} terminated unexpectedly: {}", worker_id, e);
            }
        }
        watcher.abort();

        let skipped: Vec<usize> = context
            .queue
            .lock()
            .await
            .drain(..)
            .map(|(index, _)| index)
            .collect();
        // A shutdown arriving after the last unit finished cut nothing short
        let cancelled = *cancel_rx.borrow() && !skipped.is_empty();
        let outcomes = std::mem::take(&mut *context.outcomes.lock().await);

        let report = RunReport::build(
            timestamp.clone(),
            catalog,
            outcomes,
            skipped,
            cancelled,
            started.elapsed(),
        );

        if report.has_failures() {
            warn!(
                "Run {} finished with failures: {} (failed: {})",
                timestamp,
                report.summary(),
                report.failed_groups().join(", ")
            );
        } else {
            info!("Run {} finished: {}", timestamp, report.summary());
        }

        report
    }
}

async fn worker_loop(
    worker_id: usize,
    context: Arc<RunContext>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    debug!("Worker {} starting", worker_id);

    loop {
        if *cancel_rx.borrow() {
            debug!("Worker {} observed cancellation", worker_id);
            break;
        }

        let next = context.queue.lock().await.pop_front();
        let Some((index, unit)) = next else {
            break;
        };

        let paced = tokio::select! {
            _ = context.limiter.acquire() => true,
            _ = signals::cancelled(&mut cancel_rx) => false,
        };
        if !paced {
            // Not started; put it back so it is reported as skipped
            context.queue.lock().await.push_front((index, unit));
            break;
        }

        let outcome = context.process_unit(worker_id, &unit).await;
        context.outcomes.lock().await.push((index, outcome));
    }

    debug!("Worker {} finished", worker_id);
}

impl RunContext {
    async fn process_unit(&self, worker_id: usize, unit: &DownloadUnit) -> UnitOutcome {
        self.emit(UnitEvent::Started {
            worker_id,
            unit: unit.clone(),
        })
        .await;

        // A panicking fetcher fails its own unit, not the worker
        let result = AssertUnwindSafe(self.fetch_and_store(unit))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(FetchError::Other(format!(
                    "unit processing panicked: {}",
                    panic_message(panic.as_ref())
                ))
                .into())
            });

        match result {
            Ok((path, bytes)) => {
                debug!(
                    "Worker {} stored {} ({} bytes) at {}",
                    worker_id,
                    unit,
                    bytes,
                    path.display()
                );
                self.emit(UnitEvent::Succeeded {
                    unit: unit.clone(),
                    bytes,
                })
                .await;
                UnitOutcome::Succeeded { path, bytes }
            }
            Err(e) => {
                warn!(
                    group = %unit.group_id,
                    kind = e.kind(),
                    "Unit {} failed: {}",
                    unit,
                    e
                );
                self.emit(UnitEvent::Failed {
                    unit: unit.clone(),
                    error: e.to_string(),
                })
                .await;
                UnitOutcome::Failed(e)
            }
        }
    }

    async fn fetch_and_store(&self, unit: &DownloadUnit) -> Result<(PathBuf, usize), UnitError> {
        let dir = unit.destination_dir(&self.root);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| WriteError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        let path = dir.join(unit.output_file_name(&self.timestamp));

        let url = self.endpoint.url_for(&unit.group_id);
        let payload = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&url))
            .await
            .map_err(|_| FetchError::Timeout {
                after: self.fetch_timeout,
            })??;

        write_atomically(&path, &payload).await?;
        Ok((path, payload.len()))
    }

    async fn emit(&self, event: UnitEvent) {
        if let Some(tx) = &self.events {
            // Front end may have gone away; the run does not depend on it
            let _ = tx.send(event).await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Write to `<path>.tmp`, then rename onto `path`
async fn write_atomically(path: &Path, payload: &[u8]) -> Result<(), WriteError> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(files::TEMP_FILE_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, payload)
        .await
        .map_err(|source| WriteError::Write {
            path: temp_path.clone(),
            source,
        })?;

    if let Err(source) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(WriteError::Rename {
            temp_path,
            final_path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
