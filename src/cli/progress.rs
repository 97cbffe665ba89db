//! Progress display for fetch runs
//!
//! The orchestrator emits a [`UnitEvent`] for every unit it starts and
//! finishes. [`ProgressDisplay`] drains those events on a background task and
//! drives a single indicatif bar. Failures are printed above the bar so they
//! stay visible after it is cleared.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::orchestrator::UnitEvent;

/// Live progress bar fed by orchestrator events
pub struct ProgressDisplay {
    bar: ProgressBar,
    task: JoinHandle<(usize, usize)>,
}

impl ProgressDisplay {
    /// True when stderr is a terminal a bar can be drawn on
    pub fn is_supported() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// Start consuming `events` for a run of `total_units`
    pub fn start(total_units: usize, mut events: mpsc::Receiver<UnitEvent>) -> Self {
        let bar = ProgressBar::new(total_units as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let task_bar = bar.clone();
        let task = tokio::spawn(async move {
            let mut succeeded = 0usize;
            let mut failed = 0usize;

            while let Some(event) = events.recv().await {
                match event {
                    UnitEvent::Started { unit, .. } => {
                        task_bar.set_message(unit.to_string());
                    }
                    UnitEvent::Succeeded { .. } => {
                        succeeded += 1;
                        task_bar.inc(1);
                    }
                    UnitEvent::Failed { unit, error } => {
                        failed += 1;
                        task_bar.println(format!("❌ {}: {}", unit, error));
                        task_bar.inc(1);
                    }
                }
            }

            debug!(
                "Progress event stream closed ({} succeeded, {} failed)",
                succeeded, failed
            );
            (succeeded, failed)
        });

        Self { bar, task }
    }

    /// Wait for the event stream to close, then clear the bar
    ///
    /// Every sender must have been dropped, otherwise this never returns.
    pub async fn finish(self) -> (usize, usize) {
        let counts = self.task.await.unwrap_or_default();
        self.bar.finish_and_clear();
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Category, DownloadUnit};

    #[tokio::test]
    async fn test_display_counts_terminal_events() {
        let (tx, rx) = mpsc::channel(8);
        let display = ProgressDisplay::start(2, rx);
        let unit = DownloadUnit::categorized("noaa", Category::Weather);

        tx.send(UnitEvent::Started {
            worker_id: 0,
            unit: unit.clone(),
        })
        .await
        .unwrap();
        tx.send(UnitEvent::Succeeded {
            unit: unit.clone(),
            bytes: 2,
        })
        .await
        .unwrap();
        tx.send(UnitEvent::Failed {
            unit,
            error: "Server error: HTTP 500".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        assert_eq!(display.finish().await, (1, 1));
    }
}
