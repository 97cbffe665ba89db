//! Request pacing
//!
//! The orchestrator acquires the shared [`RateLimit`] once before every fetch.
//! Two strategies are provided:
//!
//! - [`FixedInterval`]: the first acquisition passes immediately and every
//!   later one waits a constant interval, no matter how long the previous
//!   fetch took. With a single worker this is a plain sleep between units.
//! - [`TokenBucket`]: a governor quota shared by all workers, bounding the
//!   aggregate request rate while allowing a small burst.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::errors::{ConfigError, ConfigResult};

/// Pacing applied before each outbound fetch
#[async_trait]
pub trait RateLimit: Send + Sync {
    /// Wait until the next fetch may start
    async fn acquire(&self);
}

/// Constant spacing between consecutive acquisitions
#[derive(Debug)]
pub struct FixedInterval {
    interval: Duration,
    started: Mutex<bool>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Mutex::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RateLimit for FixedInterval {
    async fn acquire(&self) {
        // Held while sleeping so concurrent workers queue up behind each other
        let mut started = self.started.lock().await;
        if *started {
            tokio::time::sleep(self.interval).await;
        }
        *started = true;
    }
}

/// Token bucket shared across workers
#[derive(Debug)]
pub struct TokenBucket {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl TokenBucket {
    /// One token replenished every `interval`, at most `burst` stored
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the interval is zero
    pub fn new(interval: Duration, burst: NonZeroU32) -> ConfigResult<Self> {
        let quota = Quota::with_period(interval).ok_or_else(|| ConfigError::InvalidValue {
            field: "orchestrator.pacing_interval".to_string(),
            value: format!("{:?}", interval),
            reason: "Token bucket period must be non-zero".to_string(),
        })?;
        Ok(Self {
            limiter: RateLimiter::direct(quota.allow_burst(burst)),
        })
    }
}

#[async_trait]
impl RateLimit for TokenBucket {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

/// No pacing at all
#[derive(Debug, Default, Clone, Copy)]
pub struct Unpaced;

#[async_trait]
impl RateLimit for Unpaced {
    async fn acquire(&self) {}
}

/// Pacing strategy selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PacingMode {
    /// Sleep a fixed interval between fetches
    #[default]
    Fixed,
    /// Shared token bucket
    TokenBucket,
}

impl PacingMode {
    /// Build the limiter for this mode
    ///
    /// A zero interval disables pacing for either mode.
    pub fn build(self, interval: Duration, burst: NonZeroU32) -> ConfigResult<Arc<dyn RateLimit>> {
        if interval.is_zero() {
            return Ok(Arc::new(Unpaced));
        }
        Ok(match self {
            PacingMode::Fixed => Arc::new(FixedInterval::new(interval)),
            PacingMode::TokenBucket => Arc::new(TokenBucket::new(interval, burst)?),
        })
    }
}
