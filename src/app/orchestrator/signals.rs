//! Signal handling and run cancellation
//!
//! A broadcast channel carries shutdown requests (CTRL-C, SIGTERM, or a
//! manual trigger). The orchestrator folds that channel and its optional run
//! timeout into a single `watch` flag its workers poll between units.

use std::time::Duration;

use tokio::signal;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Signal handler for graceful shutdown coordination
pub struct SignalHandler {
    shutdown_tx: broadcast::Sender<()>,
}

impl SignalHandler {
    /// Create a new signal handler with the given shutdown broadcaster
    pub fn new(shutdown_tx: broadcast::Sender<()>) -> Self {
        Self { shutdown_tx }
    }

    /// Setup signal handling for graceful shutdown (CTRL-C, SIGTERM)
    ///
    /// Returns a handle to the background task that monitors for signals.
    /// When a signal is received, it broadcasts shutdown to all subscribers.
    pub fn setup(&self) -> JoinHandle<()> {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received Ctrl+C, finishing in-flight fetches");
                },
                _ = terminate => {
                    info!("Received terminate signal, finishing in-flight fetches");
                },
            }

            let _ = shutdown_tx.send(());
        })
    }
}

/// Create a shutdown signal broadcaster
pub fn create_shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// Raise `cancel_tx` on the first shutdown request or when `run_timeout` expires
///
/// A closed shutdown channel is not a request; only the timeout can fire then.
pub(crate) async fn watch_for_cancellation(
    mut shutdown_rx: broadcast::Receiver<()>,
    run_timeout: Option<Duration>,
    cancel_tx: watch::Sender<bool>,
) {
    let shutdown_requested = async move {
        if let Err(broadcast::error::RecvError::Closed) = shutdown_rx.recv().await {
            std::future::pending::<()>().await;
        }
    };

    let timed_out = async move {
        match run_timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown_requested => info!("Shutdown requested, no further units will be started"),
        _ = timed_out => warn!("Run timeout of {:?} reached, no further units will be started", run_timeout.unwrap_or_default()),
    }

    let _ = cancel_tx.send(true);
}

/// Resolve once the cancel flag is raised; never resolves if its sender is gone
pub(crate) async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
