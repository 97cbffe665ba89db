//! Configuration structures for the batch orchestrator
//!
//! Worker count, pacing and the two timeouts: the per-fetch timeout bounds a
//! single request, the run timeout bounds the whole batch.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::limiter::{PacingMode, RateLimit};
use crate::constants::{limits, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the batch orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of concurrent fetch workers
    pub worker_count: usize,
    /// Pacing strategy shared by all workers
    pub pacing: PacingMode,
    /// Spacing between fetches (token period for the token bucket)
    pub pacing_interval: Duration,
    /// Token bucket burst size
    pub burst: u32,
    /// Timeout for a single fetch
    pub fetch_timeout: Duration,
    /// Optional timeout for the whole run
    pub run_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            pacing: PacingMode::Fixed,
            pacing_interval: limits::DEFAULT_PACING_INTERVAL,
            burst: 1,
            fetch_timeout: limits::DEFAULT_FETCH_TIMEOUT,
            run_timeout: None,
        }
    }
}

impl OrchestratorConfig {
    /// Set the number of concurrent workers
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set pacing mode and interval
    pub fn with_pacing(mut self, mode: PacingMode, interval: Duration) -> Self {
        self.pacing = mode;
        self.pacing_interval = interval;
        self
    }

    /// Set the per-fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the overall run timeout
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker_count == 0 || self.worker_count > workers::MAX_WORKER_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.worker_count".to_string(),
                value: self.worker_count.to_string(),
                reason: format!("Must be between 1 and {}", workers::MAX_WORKER_COUNT),
            });
        }

        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.fetch_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Fetch timeout cannot be zero".to_string(),
            });
        }

        if self.burst == 0 {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.burst".to_string(),
                value: "0".to_string(),
                reason: "Burst must be at least 1".to_string(),
            });
        }

        if matches!(self.run_timeout, Some(t) if t.is_zero()) {
            return Err(ConfigError::InvalidValue {
                field: "orchestrator.run_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Run timeout cannot be zero; omit it to disable".to_string(),
            });
        }

        Ok(())
    }

    /// Build the shared rate limiter described by this configuration
    pub fn build_limiter(&self) -> ConfigResult<Arc<dyn RateLimit>> {
        let burst = NonZeroU32::new(self.burst).ok_or_else(|| ConfigError::InvalidValue {
            field: "orchestrator.burst".to_string(),
            value: "0".to_string(),
            reason: "Burst must be at least 1".to_string(),
        })?;
        self.pacing.build(self.pacing_interval, burst)
    }
}
