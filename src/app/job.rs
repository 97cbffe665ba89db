//! One complete snapshot job: rotate, then fetch the catalog
//!
//! The catalog is validated before anything touches the disk. Rotation must
//! succeed before a single fetch is made; the orchestrator's signature makes
//! that ordering impossible to get wrong.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::app::catalog::validate_catalog;
use crate::app::client::{CelestrakClient, ProviderEndpoint};
use crate::app::models::{DownloadUnit, RunTimestamp};
use crate::app::orchestrator::{Orchestrator, UnitEvent};
use crate::app::report::RunReport;
use crate::app::rotation::{rotate, RelocationFailure};
use crate::config::AppConfig;
use crate::errors::Result;

/// Result of a job that got past rotation
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub report: RunReport,
    /// Entries of the previous generation moved into backup
    pub relocated: usize,
    /// Entries that could not be moved and stayed in the working area
    pub relocation_failures: Vec<RelocationFailure>,
}

/// A configured snapshot job
pub struct Job {
    working_area: PathBuf,
    catalog: Vec<DownloadUnit>,
    orchestrator: Orchestrator,
}

impl Job {
    pub fn new(
        working_area: impl Into<PathBuf>,
        catalog: Vec<DownloadUnit>,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            working_area: working_area.into(),
            catalog,
            orchestrator,
        }
    }

    /// Build a job against the live provider from application configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any section fails validation or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let (client_config, orchestrator_config) = config.to_runtime_config();

        let endpoint = ProviderEndpoint::from_config(&client_config)?;
        let client = CelestrakClient::new(&client_config)?;
        let limiter = orchestrator_config.build_limiter()?;

        let orchestrator =
            Orchestrator::new(orchestrator_config, endpoint, Arc::new(client), limiter);

        Ok(Self::new(
            config.data.working_area.clone(),
            config.catalog(),
            orchestrator,
        ))
    }

    /// Forward per-unit progress events to `tx`
    pub fn with_events(mut self, tx: mpsc::Sender<UnitEvent>) -> Self {
        self.orchestrator = self.orchestrator.with_events(tx);
        self
    }

    pub fn working_area(&self) -> &Path {
        &self.working_area
    }

    pub fn catalog(&self) -> &[DownloadUnit] {
        &self.catalog
    }

    /// Rotate the working area and fetch every unit of the catalog
    ///
    /// # Errors
    ///
    /// Fails only when the catalog is invalid or rotation cannot establish a
    /// clean working area; in both cases no fetch is attempted. Per-unit
    /// failures are reported in [`JobOutcome::report`].
    pub async fn run(
        &self,
        timestamp: &RunTimestamp,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<JobOutcome> {
        validate_catalog(&self.catalog)?;

        let area = rotate(&self.working_area).await?;
        if area.is_partial() {
            warn!(
                "{} entries could not be moved to {} and remain in the working area",
                area.failures().len(),
                area.backup().display()
            );
        }
        info!(
            "Rotated {} entries into {}",
            area.relocated().len(),
            area.backup().display()
        );

        let report = self
            .orchestrator
            .run_with_shutdown(&self.catalog, &area, timestamp, shutdown_rx)
            .await;

        Ok(JobOutcome {
            report,
            relocated: area.relocated().len(),
            relocation_failures: area.failures().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::Fetcher;
    use crate::app::limiter::Unpaced;
    use crate::app::models::Category;
    use crate::app::orchestrator::{create_shutdown_channel, OrchestratorConfig};
    use crate::errors::{AppError, FetchResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use url::Url;

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, _url: &Url) -> FetchResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"[]".to_vec())
        }
    }

    fn job(root: &Path, catalog: Vec<DownloadUnit>, fetcher: Arc<CountingFetcher>) -> Job {
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default(),
            ProviderEndpoint::default(),
            fetcher,
            Arc::new(Unpaced),
        );
        Job::new(root, catalog, orchestrator)
    }

    #[tokio::test]
    async fn test_job_rotates_then_fetches() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        tokio::fs::create_dir_all(root.join("weather")).await.unwrap();
        tokio::fs::write(root.join("weather/noaa_20261016_000000.json"), b"old")
            .await
            .unwrap();

        let fetcher = Arc::new(CountingFetcher::default());
        let job = job(
            root,
            vec![DownloadUnit::categorized("noaa", Category::Weather)],
            fetcher.clone(),
        );
        let (_tx, rx) = create_shutdown_channel();
        let outcome = job
            .run(&RunTimestamp::new("20261017_000000"), rx)
            .await
            .unwrap();

        assert_eq!(outcome.relocated, 1);
        assert!(outcome.relocation_failures.is_empty());
        assert_eq!(outcome.report.succeeded_count(), 1);
        assert!(root.join("backup/weather/noaa_20261016_000000.json").exists());
        assert!(root.join("weather/noaa_20261017_000000.json").exists());
        assert!(!root.join("weather/noaa_20261016_000000.json").exists());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rotation_failure_prevents_fetching() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        tokio::fs::write(root.join("backup"), b"not a directory")
            .await
            .unwrap();

        let fetcher = Arc::new(CountingFetcher::default());
        let job = job(
            root,
            vec![DownloadUnit::categorized("stations", Category::SpecialInterest)],
            fetcher.clone(),
        );
        let (_tx, rx) = create_shutdown_channel();
        let result = job.run(&RunTimestamp::new("T"), rx).await;

        assert!(matches!(result, Err(AppError::Rotation(_))));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(!root.join("special-interest").exists());
    }

    #[tokio::test]
    async fn test_invalid_catalog_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        tokio::fs::write(root.join("keep.json"), b"x").await.unwrap();

        let fetcher = Arc::new(CountingFetcher::default());
        let job = job(
            root,
            vec![DownloadUnit::new("stations", "../escape", None)],
            fetcher.clone(),
        );
        let (_tx, rx) = create_shutdown_channel();
        let result = job.run(&RunTimestamp::new("T"), rx).await;

        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(root.join("keep.json").exists());
        assert!(!root.join("backup").exists());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_partial_rotation_is_reported_and_run_proceeds() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        tokio::fs::write(root.join("old.json"), b"old").await.unwrap();
        // Moving a directory to a new parent needs write access to it
        let locked = root.join("locked");
        tokio::fs::create_dir(&locked).await.unwrap();
        tokio::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555))
            .await
            .unwrap();

        let privileged = tokio::fs::write(locked.join("write-check"), b"").await.is_ok();
        if privileged {
            // Permission bits are not enforced for this user
            tokio::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
                .await
                .unwrap();
            return;
        }

        let fetcher = Arc::new(CountingFetcher::default());
        let job = job(
            root,
            vec![DownloadUnit::categorized("noaa", Category::Weather)],
            fetcher.clone(),
        );
        let (_tx, rx) = create_shutdown_channel();
        let outcome = job
            .run(&RunTimestamp::new("20261017_000000"), rx)
            .await
            .unwrap();

        tokio::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
            .await
            .unwrap();

        assert_eq!(outcome.relocated, 1);
        assert_eq!(outcome.relocation_failures.len(), 1);
        assert_eq!(outcome.relocation_failures[0].path, locked);
        assert!(root.join("backup/old.json").exists());
        assert!(locked.is_dir());
        assert_eq!(outcome.report.succeeded_count(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_uses_configured_catalog() {
        let mut config = AppConfig::default();
        config.data.working_area = PathBuf::from("/tmp/celestrak-test");
        config.catalog = Some(vec![DownloadUnit::new("visual", "brightest", None)]);

        let job = Job::from_config(&config).unwrap();
        assert_eq!(job.catalog().len(), 1);
        assert_eq!(job.working_area(), Path::new("/tmp/celestrak-test"));

        config.orchestrator.worker_count = 0;
        assert!(Job::from_config(&config).is_err());
    }
}
