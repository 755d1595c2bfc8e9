use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::Collection;
use crate::{
    config::RetentionPeriods,
    db::{DbPool, DbResult},
};

/// Result of one sweep over one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepResult {
    pub collection: Collection,
    pub deleted: u64,
    /// Records with a timestamp strictly before this instant were deleted.
    pub cutoff: DateTime<Utc>,
}

/// Deletes records older than the configured retention window.
#[derive(Clone)]
pub struct RetentionSweeper {
    db: Arc<DbPool>,
    periods: RetentionPeriods,
}

impl RetentionSweeper {
    pub fn new(db: Arc<DbPool>, periods: RetentionPeriods) -> Self {
        Self { db, periods }
    }

    /// Retention window for a collection, or `None` if it is kept forever.
    pub fn window(&self, collection: Collection) -> Option<Duration> {
        let days = match collection {
            Collection::Emails => self.periods.emails_days,
            Collection::Articles => self.periods.articles_days,
        };
        (days > 0).then(|| Duration::days(i64::from(days)))
    }

    /// Delete every record in `collection` written strictly before `cutoff`.
    pub async fn sweep(&self, collection: Collection, cutoff: DateTime<Utc>) -> DbResult<SweepResult> {
        let deleted = match collection {
            Collection::Emails => self.db.emails().delete_before(cutoff).await?,
            Collection::Articles => self.db.articles().delete_before(cutoff).await?,
        };

        if deleted > 0 {
            tracing::info!(
                collection = collection.as_str(),
                deleted,
                cutoff = %cutoff,
                "Deleted expired records"
            );
        } else {
            tracing::debug!(collection = collection.as_str(), cutoff = %cutoff, "No expired records");
        }

        Ok(SweepResult {
            collection,
            deleted,
            cutoff,
        })
    }

    /// Sweep `collection` using its configured window relative to `now`.
    ///
    /// Returns `None` without touching the database when the collection has
    /// no window.
    pub async fn sweep_expired(
        &self,
        collection: Collection,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SweepResult>> {
        match self.window(collection) {
            Some(window) => self.sweep(collection, now - window).await.map(Some),
            None => Ok(None),
        }
    }

    /// Sweep every collection that has a window.
    pub async fn sweep_all(&self, now: DateTime<Utc>) -> DbResult<Vec<SweepResult>> {
        let mut results = Vec::with_capacity(2);
        for collection in [Collection::Articles, Collection::Emails] {
            if let Some(result) = self.sweep_expired(collection, now).await? {
                results.push(result);
            }
        }
        Ok(results)
    }
}
