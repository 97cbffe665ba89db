//! Run report
//!
//! Outcome of one batch run. Outcomes are collected from the workers in
//! completion order and sorted back into catalog order when the report is
//! built, so concurrent runs report the same way sequential runs do.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::app::models::{DownloadUnit, RunTimestamp};
use crate::errors::UnitError;

/// A unit whose payload landed on disk
#[derive(Debug, Clone, Serialize)]
pub struct UnitSuccess {
    pub unit: DownloadUnit,
    pub path: PathBuf,
    pub bytes: usize,
}

/// A unit that was attempted and failed
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub unit: DownloadUnit,
    /// `fetch` or `write`
    pub kind: String,
    pub error: String,
}

/// Per-unit result as produced by a worker
#[derive(Debug)]
pub(crate) enum UnitOutcome {
    Succeeded { path: PathBuf, bytes: usize },
    Failed(UnitError),
}

/// Summary of a completed (or cancelled) batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Timestamp shared by every file of this generation
    pub timestamp: RunTimestamp,
    /// Units whose fetch was started
    pub attempted: usize,
    pub succeeded: Vec<UnitSuccess>,
    pub failed: Vec<UnitFailure>,
    /// Units never started because the run was cancelled
    pub skipped: Vec<DownloadUnit>,
    pub cancelled: bool,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl RunReport {
    /// Assemble a report from unordered outcomes
    pub(crate) fn build(
        timestamp: RunTimestamp,
        catalog: &[DownloadUnit],
        mut outcomes: Vec<(usize, UnitOutcome)>,
        skipped: Vec<usize>,
        cancelled: bool,
        duration: Duration,
    ) -> Self {
        outcomes.sort_by_key(|(index, _)| *index);

        let attempted = outcomes.len();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (index, outcome) in outcomes {
            let unit = catalog[index].clone();
            match outcome {
                UnitOutcome::Succeeded { path, bytes } => {
                    succeeded.push(UnitSuccess { unit, path, bytes })
                }
                UnitOutcome::Failed(error) => failed.push(UnitFailure {
                    unit,
                    kind: error.kind().to_string(),
                    error: error.to_string(),
                }),
            }
        }

        let mut skipped = skipped;
        skipped.sort_unstable();
        let skipped = skipped.into_iter().map(|i| catalog[i].clone()).collect();

        Self {
            timestamp,
            attempted,
            succeeded,
            failed,
            skipped,
            cancelled,
            duration,
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Every unit of the catalog was attempted
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped.is_empty()
    }

    /// Group ids of the failed units, in catalog order
    pub fn failed_groups(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.unit.group_id.as_str()).collect()
    }

    /// Total payload bytes written
    pub fn total_bytes(&self) -> usize {
        self.succeeded.iter().map(|s| s.bytes).sum()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} attempted, {} succeeded, {} failed",
            self.attempted,
            self.succeeded_count(),
            self.failed_count()
        );
        if self.cancelled {
            line.push_str(&format!(", {} skipped (cancelled)", self.skipped.len()));
        }
        line
    }
}
