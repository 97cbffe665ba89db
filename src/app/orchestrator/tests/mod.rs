//! Unit tests for the batch orchestrator
//!
//! A scripted [`Fetcher`] stands in for the network so failures, delays and
//! call counts are fully controlled. End-to-end tests over HTTP live in the
//! top-level tests directory.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

use crate::app::limiter::{FixedInterval, Unpaced};
use crate::app::models::Category;
use crate::app::rotation::rotate;
use crate::errors::FetchResult;

use super::*;

/// Scripted fetcher keyed by group id
#[derive(Default)]
pub struct MockFetcher {
    failures: HashMap<String, u16>,
    delays: HashMap<String, Duration>,
    panics: HashSet<String>,
    calls: StdMutex<Vec<String>>,
    on_first_call: StdMutex<Option<broadcast::Sender<()>>>,
}

impl MockFetcher {
    pub fn failing(mut self, group: &str, status: u16) -> Self {
        self.failures.insert(group.to_string(), status);
        self
    }

    pub fn delayed(mut self, group: &str, delay: Duration) -> Self {
        self.delays.insert(group.to_string(), delay);
        self
    }

    pub fn panicking(mut self, group: &str) -> Self {
        self.panics.insert(group.to_string());
        self
    }

    /// Fire `tx` when the first fetch starts
    pub fn shutdown_on_first_call(self, tx: broadcast::Sender<()>) -> Self {
        *self.on_first_call.lock().unwrap() = Some(tx);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn payload_for(group: &str) -> Vec<u8> {
        format!("[{{\"GROUP\":\"{}\"}}]", group).into_bytes()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let group = url
            .query_pairs()
            .find(|(k, _)| k == "GROUP")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(group.clone());

        if let Some(tx) = self.on_first_call.lock().unwrap().take() {
            let _ = tx.send(());
        }

        if self.panics.contains(&group) {
            panic!("scripted panic for {}", group);
        }

        if let Some(delay) = self.delays.get(&group) {
            tokio::time::sleep(*delay).await;
        }

        match self.failures.get(&group) {
            Some(&status) => Err(FetchError::Status { status }),
            None => Ok(Self::payload_for(&group)),
        }
    }
}

/// Limiter that only counts acquisitions
#[derive(Default)]
struct CountingLimiter {
    acquired: AtomicUsize,
}

#[async_trait]
impl RateLimit for CountingLimiter {
    async fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_config() -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_pacing(crate::app::limiter::PacingMode::Fixed, Duration::ZERO)
        .with_fetch_timeout(Duration::from_secs(5))
}

fn orchestrator(config: OrchestratorConfig, fetcher: Arc<MockFetcher>) -> Orchestrator {
    Orchestrator::new(
        config,
        ProviderEndpoint::default(),
        fetcher,
        Arc::new(Unpaced),
    )
}

fn two_unit_catalog() -> Vec<DownloadUnit> {
    vec![
        DownloadUnit::new("stations", "stations", Some(Category::SpecialInterest)),
        DownloadUnit::new("gps-ops", "gps-ops", Some(Category::Navigation)),
    ]
}

fn numbered_catalog(count: usize) -> Vec<DownloadUnit> {
    (0..count)
        .map(|i| DownloadUnit::new(format!("group-{i}"), format!("group-{i}"), None))
        .collect()
}

/// Stations and GPS both succeed; stale data ends up in backup
#[tokio::test]
async fn test_full_run_after_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("old.json"), b"stale").await.unwrap();

    let area = rotate(root).await.unwrap();
    assert!(area.backup().join("old.json").exists());
    assert!(!root.join("old.json").exists());

    let fetcher = Arc::new(MockFetcher::default());
    let ts = RunTimestamp::new("T");
    let report = orchestrator(test_config(), fetcher.clone())
        .run(&two_unit_catalog(), &area, &ts)
        .await;

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded_count(), 2);
    assert_eq!(report.failed_count(), 0);
    assert!(report.is_complete());

    let stations = root.join("special-interest/stations_T.json");
    let gps = root.join("navigation/gps-ops_T.json");
    assert_eq!(
        fs::read(&stations).await.unwrap(),
        MockFetcher::payload_for("stations")
    );
    assert_eq!(
        fs::read(&gps).await.unwrap(),
        MockFetcher::payload_for("gps-ops")
    );
    assert_eq!(report.succeeded[0].path, stations);
    assert_eq!(fetcher.calls(), vec!["stations", "gps-ops"]);
}

/// GPS fetch fails; stations is still stored and the failure is named
#[tokio::test]
async fn test_failed_unit_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let fetcher = Arc::new(MockFetcher::default().failing("gps-ops", 503));
    let ts = RunTimestamp::new("T");
    let report = orchestrator(test_config(), fetcher.clone())
        .run(&two_unit_catalog(), &area, &ts)
        .await;

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded_count(), 1);
    assert_eq!(report.failed_groups(), vec!["gps-ops"]);
    assert_eq!(report.failed[0].kind, "fetch");
    assert!(report.failed[0].error.contains("503"));

    assert!(temp_dir
        .path()
        .join("special-interest/stations_T.json")
        .exists());
    assert!(!temp_dir.path().join("navigation/gps-ops_T.json").exists());
    // No temp file left behind either
    assert!(!temp_dir
        .path()
        .join("navigation/gps-ops_T.json.tmp")
        .exists());
}

#[tokio::test]
async fn test_failure_does_not_stop_later_units_or_retry() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let catalog = numbered_catalog(5);
    let fetcher = Arc::new(MockFetcher::default().failing("group-1", 500));
    let report = orchestrator(test_config(), fetcher.clone())
        .run(&catalog, &area, &RunTimestamp::new("T"))
        .await;

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls.iter().filter(|g| *g == "group-1").count(), 1);
    assert_eq!(report.failed_groups(), vec!["group-1"]);
    assert_eq!(report.succeeded_count(), 4);
    assert!(temp_dir.path().join("group-4_T.json").exists());
}

#[tokio::test]
async fn test_panicking_fetch_fails_only_its_unit() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let fetcher = Arc::new(MockFetcher::default().panicking("group-1"));
    let report = orchestrator(test_config(), fetcher.clone())
        .run(&numbered_catalog(4), &area, &RunTimestamp::new("T"))
        .await;

    assert_eq!(report.attempted, 4);
    assert_eq!(report.succeeded_count(), 3);
    assert_eq!(report.failed_groups(), vec!["group-1"]);
    assert_eq!(report.failed[0].kind, "fetch");
    assert!(report.failed[0].error.contains("scripted panic for group-1"));
    assert!(report.skipped.is_empty());
    assert!(!report.cancelled);
    assert_eq!(
        fetcher.calls(),
        vec!["group-0", "group-1", "group-2", "group-3"]
    );
    assert!(temp_dir.path().join("group-3_T.json").exists());
}

#[tokio::test]
async fn test_attempted_matches_catalog_length() {
    for size in [0usize, 1, 7] {
        let temp_dir = TempDir::new().unwrap();
        let area = rotate(temp_dir.path()).await.unwrap();
        let fetcher = Arc::new(MockFetcher::default().failing("group-0", 404));

        let report = orchestrator(test_config(), fetcher)
            .run(&numbered_catalog(size), &area, &RunTimestamp::new("T"))
            .await;

        assert_eq!(report.attempted, size);
        assert_eq!(
            report.succeeded_count() + report.failed_count(),
            report.attempted
        );
        assert!(report.skipped.is_empty());
    }
}

#[tokio::test]
async fn test_same_base_name_in_two_categories() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();
    let catalog = vec![
        DownloadUnit::new("other", "other", Some(Category::Miscellaneous)),
        DownloadUnit::new("other-comm", "other", Some(Category::Communications)),
    ];

    let report = orchestrator(test_config(), Arc::new(MockFetcher::default()))
        .run(&catalog, &area, &RunTimestamp::new("T"))
        .await;

    assert_eq!(report.succeeded_count(), 2);
    assert_ne!(report.succeeded[0].path, report.succeeded[1].path);
    assert_eq!(
        fs::read(temp_dir.path().join("communications/other_T.json"))
            .await
            .unwrap(),
        MockFetcher::payload_for("other-comm")
    );
}

#[tokio::test]
async fn test_limiter_acquired_once_per_unit() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();
    let limiter = Arc::new(CountingLimiter::default());

    let orchestrator = Orchestrator::new(
        test_config(),
        ProviderEndpoint::default(),
        Arc::new(MockFetcher::default().failing("group-2", 500)),
        limiter.clone(),
    );
    orchestrator
        .run(&numbered_catalog(4), &area, &RunTimestamp::new("T"))
        .await;

    assert_eq!(limiter.acquired.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_fixed_interval_spaces_fetches() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let orchestrator = Orchestrator::new(
        test_config(),
        ProviderEndpoint::default(),
        Arc::new(MockFetcher::default()),
        Arc::new(FixedInterval::new(Duration::from_millis(100))),
    );
    let started = Instant::now();
    let report = orchestrator
        .run(&numbered_catalog(3), &area, &RunTimestamp::new("T"))
        .await;

    // Two gaps between three fetches, none after the last
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_millis(1000));
    assert_eq!(report.succeeded_count(), 3);
}

#[tokio::test]
async fn test_fetch_timeout_is_per_unit() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let fetcher = Arc::new(MockFetcher::default().delayed("group-0", Duration::from_secs(30)));
    let config = test_config().with_fetch_timeout(Duration::from_millis(50));
    let report = orchestrator(config, fetcher)
        .run(&numbered_catalog(2), &area, &RunTimestamp::new("T"))
        .await;

    assert_eq!(report.failed_groups(), vec!["group-0"]);
    assert!(report.failed[0].error.contains("timed out"));
    assert_eq!(report.succeeded_count(), 1);
}

#[tokio::test]
async fn test_concurrent_workers_attempt_each_unit_once() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let catalog = numbered_catalog(20);
    let fetcher = Arc::new(
        MockFetcher::default()
            .failing("group-3", 500)
            .failing("group-11", 502)
            .delayed("group-0", Duration::from_millis(30)),
    );
    let config = test_config().with_worker_count(4);
    let report = orchestrator(config, fetcher.clone())
        .run(&catalog, &area, &RunTimestamp::new("T"))
        .await;

    let mut calls = fetcher.calls();
    calls.sort();
    let mut expected: Vec<String> = catalog.iter().map(|u| u.group_id.clone()).collect();
    expected.sort();
    assert_eq!(calls, expected);

    assert_eq!(report.attempted, 20);
    assert_eq!(report.failed_groups(), vec!["group-3", "group-11"]);
    // Report is in catalog order regardless of completion order
    let succeeded: Vec<&str> = report
        .succeeded
        .iter()
        .map(|s| s.unit.group_id.as_str())
        .collect();
    assert_eq!(succeeded[0], "group-0");
    assert_eq!(succeeded[1], "group-1");
}

#[tokio::test]
async fn test_shutdown_skips_remaining_units() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let fetcher = Arc::new(MockFetcher::default().shutdown_on_first_call(shutdown_tx.clone()));
    let orchestrator = Orchestrator::new(
        test_config(),
        ProviderEndpoint::default(),
        fetcher.clone(),
        Arc::new(FixedInterval::new(Duration::from_secs(10))),
    );

    let report = orchestrator
        .run_with_shutdown(&numbered_catalog(4), &area, &RunTimestamp::new("T"), shutdown_rx)
        .await;

    assert!(report.cancelled);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded_count(), 1);
    let skipped: Vec<&str> = report.skipped.iter().map(|u| u.group_id.as_str()).collect();
    assert_eq!(skipped, vec!["group-1", "group-2", "group-3"]);
    assert_eq!(fetcher.calls(), vec!["group-0"]);
}

#[tokio::test]
async fn test_run_timeout_cancels_between_units() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();

    let config = test_config().with_run_timeout(Some(Duration::from_millis(100)));
    let orchestrator = Orchestrator::new(
        config,
        ProviderEndpoint::default(),
        Arc::new(MockFetcher::default()),
        Arc::new(FixedInterval::new(Duration::from_secs(10))),
    );

    let started = Instant::now();
    let report = orchestrator
        .run(&numbered_catalog(3), &area, &RunTimestamp::new("T"))
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.cancelled);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.skipped.len(), 2);
}

#[tokio::test]
async fn test_blocked_category_dir_is_write_failure() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();
    // A file where the navigation directory should go
    fs::write(temp_dir.path().join("navigation"), b"x").await.unwrap();

    let fetcher = Arc::new(MockFetcher::default());
    let report = orchestrator(test_config(), fetcher.clone())
        .run(&two_unit_catalog(), &area, &RunTimestamp::new("T"))
        .await;

    assert_eq!(report.succeeded_count(), 1);
    assert_eq!(report.failed_groups(), vec!["gps-ops"]);
    assert_eq!(report.failed[0].kind, "write");
    // Directory is resolved before the fetch, so no request was wasted
    assert_eq!(fetcher.calls(), vec!["stations"]);
}

#[tokio::test]
async fn test_existing_output_is_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();
    let target = temp_dir.path().join("special-interest/stations_T.json");
    fs::create_dir_all(target.parent().unwrap()).await.unwrap();
    fs::write(&target, b"leftover").await.unwrap();

    let report = orchestrator(test_config(), Arc::new(MockFetcher::default()))
        .run(&two_unit_catalog()[..1], &area, &RunTimestamp::new("T"))
        .await;

    assert_eq!(report.succeeded_count(), 1);
    assert_eq!(
        fs::read(&target).await.unwrap(),
        MockFetcher::payload_for("stations")
    );
}

#[tokio::test]
async fn test_progress_events() {
    let temp_dir = TempDir::new().unwrap();
    let area = rotate(temp_dir.path()).await.unwrap();
    let (tx, mut rx) = mpsc::channel(16);

    let orchestrator = orchestrator(
        test_config(),
        Arc::new(MockFetcher::default().failing("gps-ops", 500)),
    )
    .with_events(tx);
    orchestrator
        .run(&two_unit_catalog(), &area, &RunTimestamp::new("T"))
        .await;
    drop(orchestrator);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 4);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 2);
    assert!(matches!(&events[1], UnitEvent::Succeeded { bytes, .. } if *bytes > 0));
    assert!(matches!(&events[3], UnitEvent::Failed { unit, .. } if unit.group_id == "gps-ops"));
}
