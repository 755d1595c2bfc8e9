use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::error::DbResult,
    models::{Email, EmailRecord},
};

#[async_trait]
pub trait EmailRepo: Send + Sync {
    /// Merge-upsert a mail record keyed by its provider id.
    ///
    /// Every carried field overwrites the stored value (including explicit
    /// nulls) and `synced_at` is always set to the given timestamp.
    async fn upsert(&self, record: &EmailRecord, synced_at: DateTime<Utc>) -> DbResult<()>;

    /// Get a mail record by provider id
    async fn get_by_id(&self, id: &str) -> DbResult<Option<Email>>;

    /// Count stored mail records
    async fn count(&self) -> DbResult<i64>;

    // ==================== Retention Operations ====================

    /// Delete every mail record with `synced_at` strictly before `cutoff`.
    ///
    /// Runs as a single transaction: either all matching rows are removed or
    /// none are. Returns the number of rows deleted.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;
}
