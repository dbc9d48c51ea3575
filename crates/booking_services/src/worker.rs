use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::notify::BookingNotifier;
use crate::service::booking_from_row;
use crate::types::{BookingError, BookingStatus};

/// Configuration for the booking lifecycle worker
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How often to sweep the ledger (default: 5 minutes)
    pub sweep_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl LifecycleConfig {
    /// Loads the configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let sweep_interval = std::env::var("BOOKING_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Self::default().sweep_interval);

        Self { sweep_interval }
    }
}

/// Counts of what a single sweep changed
#[derive(Debug, Default, serde::Serialize)]
pub struct SweepStats {
    /// Approved bookings whose stay ended, now completed
    pub completed: u64,
    /// Pending bookings whose check-in date passed undecided, now rejected
    pub expired: u64,
}

/// Background engine that walks the ledger on an interval and applies the
/// two system transitions: completing finished stays and expiring stale
/// pending requests. Each transition produces a notification.
pub struct LifecycleWorker {
    pool: PgPool,
    notifier: Arc<BookingNotifier>,
    config: LifecycleConfig,
}

impl LifecycleWorker {
    /// Creates a new lifecycle worker
    pub fn new(pool: PgPool, notifier: Arc<BookingNotifier>, config: Option<LifecycleConfig>) -> Self {
        Self {
            pool,
            notifier,
            config: config.unwrap_or_default(),
        }
    }

    /// Runs the sweep loop until the task is aborted
    pub async fn run(&self) {
        info!(
            "Starting booking lifecycle worker (sweep every {:?})",
            self.config.sweep_interval
        );

        let mut ticker = interval(self.config.sweep_interval);

        loop {
            ticker.tick().await;

            match self.sweep_once().await {
                Ok(stats) if stats.completed > 0 || stats.expired > 0 => {
                    info!(
                        "Lifecycle sweep: {} completed, {} expired",
                        stats.completed, stats.expired
                    );
                }
                Ok(_) => debug!("Lifecycle sweep: nothing to do"),
                Err(e) => error!("Lifecycle sweep failed: {}", e),
            }
        }
    }

    /// Runs a single sweep over the ledger
    pub async fn sweep_once(&self) -> Result<SweepStats, BookingError> {
        let mut stats = SweepStats::default();

        stats.completed = self
            .apply_system_transition(
                BookingStatus::Approved,
                BookingStatus::Completed,
                "b.check_out_date <= CURRENT_DATE",
            )
            .await?;

        stats.expired = self
            .apply_system_transition(
                BookingStatus::Pending,
                BookingStatus::Rejected,
                "b.check_in_date <= CURRENT_DATE",
            )
            .await?;

        Ok(stats)
    }

    /// Moves every booking matching `date_clause` from `from` to `to`,
    /// notifying each affected user.
    async fn apply_system_transition(
        &self,
        from: BookingStatus,
        to: BookingStatus,
        date_clause: &str,
    ) -> Result<u64, BookingError> {
        // The transition table is authoritative even for system sweeps
        debug_assert!(from.transition_allowed(to, crate::types::TransitionActor::System));

        let rows = sqlx::query(&format!(
            r#"
            UPDATE bookings b
            SET status = $1, updated_at = NOW()
            FROM resources r
            WHERE b.resource_id = r.id
              AND b.status = $2
              AND {date_clause}
            RETURNING
                b.id, b.user_id, b.resource_id, b.check_in_date, b.check_out_date,
                b.quantity, b.unit_price_cents, b.total_price_cents, b.status,
                b.created_at, b.updated_at, r.name as resource_name, r.kind as resource_kind
            "#
        ))
        .bind(to.as_str())
        .bind(from.as_str())
        .fetch_all(&self.pool)
        .await?;

        for row in &rows {
            let booking = booking_from_row(row)?;
            if let Err(e) = self.notifier.notify_status_change(&booking, to).await {
                error!(
                    "Failed to notify user {} about booking {}: {}",
                    booking.booking.user_id, booking.booking.id, e
                );
            }
        }

        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sweep_interval_is_five_minutes() {
        let config = LifecycleConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn from_env_falls_back_to_defaults() {
        // No env var set in the test environment
        let config = LifecycleConfig::from_env();
        assert_eq!(config.sweep_interval, LifecycleConfig::default().sweep_interval);
    }
}
