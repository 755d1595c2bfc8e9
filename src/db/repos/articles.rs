use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::error::DbResult,
    models::{Article, ArticleRecord, NewArticle},
};

#[async_trait]
pub trait ArticleRepo: Send + Sync {
    /// Merge-upsert a synced article keyed by its URL-derived id.
    ///
    /// Overwrites the fields an [`ArticleRecord`] carries and stamps
    /// `created_at`. Columns it does not carry (`content`) are left untouched.
    async fn upsert_synced(&self, record: &ArticleRecord, created_at: DateTime<Utc>)
    -> DbResult<()>;

    /// Insert a manually posted article under a caller-chosen id.
    ///
    /// Returns `DbError::Conflict` if the id is already taken.
    async fn create(
        &self,
        id: &str,
        input: &NewArticle,
        created_at: DateTime<Utc>,
    ) -> DbResult<Article>;

    /// Get an article by id
    async fn get_by_id(&self, id: &str) -> DbResult<Option<Article>>;

    /// Count stored articles
    async fn count(&self) -> DbResult<i64>;

    // ==================== Retention Operations ====================

    /// Delete every article with `created_at` strictly before `cutoff`.
    ///
    /// Runs as a single transaction: either all matching rows are removed or
    /// none are. Returns the number of rows deleted.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;
}
