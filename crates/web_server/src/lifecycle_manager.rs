//! Manager for the booking lifecycle worker.
//! Integrates with the web server to run the ledger sweeps in the background.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};

use booking_services::{BookingNotifier, LifecycleConfig, LifecycleWorker};

/// Owns the background sweep task for the lifetime of the server
pub struct LifecycleManager {
    pool: PgPool,
    worker_handle: Option<JoinHandle<()>>,
}

impl LifecycleManager {
    /// Create a new lifecycle manager
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            worker_handle: None,
        }
    }

    /// Start the lifecycle worker in a background task
    pub fn start(&mut self, notifier: Arc<BookingNotifier>) {
        info!("Starting booking lifecycle system");

        let config = LifecycleConfig::from_env();
        let worker = LifecycleWorker::new(self.pool.clone(), notifier, Some(config));

        let handle = tokio::spawn(async move {
            worker.run().await;
            error!("Booking lifecycle worker exited unexpectedly");
        });

        self.worker_handle = Some(handle);

        info!("Booking lifecycle system started successfully");
    }

    /// Stop the lifecycle worker
    pub async fn stop(&mut self) {
        info!("Stopping booking lifecycle system");

        if let Some(handle) = self.worker_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        info!("Booking lifecycle system stopped");
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        if let Some(handle) = self.worker_handle.take() {
            handle.abort();
        }
    }
}
