//! Background worker that runs the retention sweep on an interval.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::RetentionSweeper;
use crate::{config::RetentionConfig, db::DbPool};

/// Starts the retention worker as a background task.
///
/// The worker sweeps immediately, then once per `interval_hours`, until
/// `shutdown` is cancelled.
pub async fn start_retention_worker(
    db: Arc<DbPool>,
    config: RetentionConfig,
    shutdown: CancellationToken,
) {
    if !config.enabled {
        tracing::info!("Retention worker disabled by configuration");
        return;
    }

    tracing::info!(
        interval_hours = config.interval_hours,
        articles_days = config.periods.articles_days,
        emails_days = config.periods.emails_days,
        "Starting retention worker"
    );

    let sweeper = RetentionSweeper::new(db, config.periods.clone());
    let interval = Duration::from_secs(config.interval_hours.saturating_mul(3600));

    loop {
        match sweeper.sweep_all(Utc::now()).await {
            Ok(results) => {
                let total: u64 = results.iter().map(|r| r.deleted).sum();
                if total > 0 {
                    tracing::info!(total, "Retention run complete");
                } else {
                    tracing::debug!("Retention run complete, no records to delete");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error running retention");
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Retention worker stopping");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use super::*;
    use crate::db::tests::harness;

    async fn db() -> Arc<DbPool> {
        harness::migrated_sqlite_db().await
    }

    #[tokio::test]
    async fn test_disabled_worker_returns_immediately() {
        let config = RetentionConfig::default();
        tokio::time::timeout(
            Duration::from_secs(1),
            start_retention_worker(db().await, config, CancellationToken::new()),
        )
        .await
        .expect("disabled worker should return");
    }

    #[tokio::test]
    async fn test_worker_stops_on_cancel() {
        let config = RetentionConfig {
            enabled: true,
            ..Default::default()
        };
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(start_retention_worker(db().await, config, shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should stop after cancellation")
            .unwrap();
    }
}
