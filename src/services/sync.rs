//! Sync orchestration: fetch from a source, then merge-upsert every record.
//!
//! Writes are one statement per record in fetch order. The first failed write
//! stops the run and is reported together with how many records made it in.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::{
    db::{DbError, DbPool},
    retention::Collection,
    sources::{FetchQuery, MailSource, NewsSource, SourceError},
};

/// Outcome of a completed sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub collection: Collection,
    /// Records returned by the source.
    pub fetched: usize,
    /// Records upserted. Equal to `fetched` on success.
    pub written: usize,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A write failed part-way through; earlier records stay written.
    #[error("Write failed after {written} of {attempted} records: {source}")]
    Write {
        attempted: usize,
        written: usize,
        #[source]
        source: DbError,
    },
}

/// Service layer for the two sync operations
#[derive(Clone)]
pub struct SyncService {
    db: Arc<DbPool>,
    mail: Arc<MailSource>,
    news: Arc<NewsSource>,
}

impl SyncService {
    pub fn new(db: Arc<DbPool>, mail: Arc<MailSource>, news: Arc<NewsSource>) -> Self {
        Self { db, mail, news }
    }

    /// Pull the configured mailbox page into `emails`.
    pub async fn sync_emails(&self) -> Result<SyncReport, SyncError> {
        let records = self.mail.fetch(&FetchQuery::default()).await?;
        let fetched = records.len();
        let repo = self.db.emails();

        for (written, record) in records.iter().enumerate() {
            repo.upsert(record, Utc::now())
                .await
                .map_err(|source| write_failed(Collection::Emails, fetched, written, source))?;
        }

        tracing::info!(
            source = self.mail.name(),
            fetched,
            "Synced emails"
        );
        Ok(SyncReport {
            collection: Collection::Emails,
            fetched,
            written: fetched,
        })
    }

    /// Search the news source and upsert the results into `articles`.
    pub async fn sync_articles(&self, query: &FetchQuery) -> Result<SyncReport, SyncError> {
        let records = self.news.fetch(query).await?;
        let fetched = records.len();
        let repo = self.db.articles();

        for (written, record) in records.iter().enumerate() {
            repo.upsert_synced(record, Utc::now())
                .await
                .map_err(|source| write_failed(Collection::Articles, fetched, written, source))?;
        }

        tracing::info!(
            source = self.news.name(),
            query = ?query.query,
            fetched,
            "Synced articles"
        );
        Ok(SyncReport {
            collection: Collection::Articles,
            fetched,
            written: fetched,
        })
    }
}

fn write_failed(
    collection: Collection,
    attempted: usize,
    written: usize,
    source: DbError,
) -> SyncError {
    tracing::error!(
        collection = collection.as_str(),
        attempted,
        written,
        error = %source,
        "Sync aborted on write failure"
    );
    SyncError::Write {
        attempted,
        written,
        source,
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        db::tests::harness,
        models::{Article, ArticleRecord, EmailRecord, derive_article_id},
        sources::RecordSource,
    };

    /// Source that hands out a fixed batch, or a fixed error.
    struct StaticSource<R> {
        records: Result<Vec<R>, fn() -> SourceError>,
        calls: AtomicUsize,
    }

    impl<R> StaticSource<R> {
        fn ok(records: Vec<R>) -> Arc<Self> {
            Arc::new(Self {
                records: Ok(records),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: fn() -> SourceError) -> Arc<Self> {
            Arc::new(Self {
                records: Err(err),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl<R: Clone + Send + Sync> RecordSource for StaticSource<R> {
        type Record = R;

        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(&self, _query: &FetchQuery) -> Result<Vec<R>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.records {
                Ok(records) => Ok(records.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn email(id: &str) -> EmailRecord {
        EmailRecord {
            id: id.into(),
            subject: Some(format!("subject {id}")),
            sender_address: Some("ana@example.com".into()),
            received_at: None,
            preview: None,
        }
    }

    fn article(url: &str) -> ArticleRecord {
        ArticleRecord {
            id: derive_article_id(url),
            source: "Digi24".into(),
            title: Some("Titlu".into()),
            url: url.into(),
            description: None,
            published_at: None,
            language: "ro".into(),
            query_tag: "energie".into(),
        }
    }

    async fn sqlite_db() -> (Arc<DbPool>, sqlx::SqlitePool) {
        let pool = harness::migrated_sqlite_pool().await;
        (Arc::new(DbPool::from_sqlite(pool.clone())), pool)
    }

    #[tokio::test]
    async fn test_sync_emails_writes_every_record() {
        let (db, _) = sqlite_db().await;
        let mail = StaticSource::ok(vec![email("m1"), email("m2")]);
        let service = SyncService::new(db.clone(), mail, StaticSource::<ArticleRecord>::ok(vec![]));

        let report = service.sync_emails().await.unwrap();
        assert_eq!(
            report,
            SyncReport {
                collection: Collection::Emails,
                fetched: 2,
                written: 2
            }
        );
        assert_eq!(db.emails().count().await.unwrap(), 2);

        // A second run upserts in place.
        service.sync_emails().await.unwrap();
        assert_eq!(db.emails().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_fetch_writes_nothing() {
        let (db, _) = sqlite_db().await;
        let service = SyncService::new(
            db.clone(),
            StaticSource::<EmailRecord>::ok(vec![]),
            StaticSource::<ArticleRecord>::ok(vec![]),
        );

        let report = service
            .sync_articles(&FetchQuery::search("x", None))
            .await
            .unwrap();
        assert_eq!(report.fetched, 0);
        assert_eq!(report.written, 0);
        assert_eq!(db.articles().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let (db, _) = sqlite_db().await;
        let service = SyncService::new(
            db,
            StaticSource::<EmailRecord>::failing(|| {
                SourceError::NotConfigured("mail.mailbox".into())
            }),
            StaticSource::<ArticleRecord>::ok(vec![]),
        );

        let err = service.sync_emails().await.unwrap_err();
        assert!(matches!(err, SyncError::Source(SourceError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_write_failure_reports_progress() {
        let (db, pool) = sqlite_db().await;
        sqlx::query(
            "CREATE TRIGGER reject_m3 BEFORE INSERT ON emails WHEN NEW.id = 'm3' \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mail = StaticSource::ok(vec![email("m1"), email("m2"), email("m3"), email("m4")]);
        let service = SyncService::new(db.clone(), mail, StaticSource::<ArticleRecord>::ok(vec![]));

        match service.sync_emails().await.unwrap_err() {
            SyncError::Write {
                attempted, written, ..
            } => {
                assert_eq!(attempted, 4);
                assert_eq!(written, 2);
            }
            other => panic!("expected write error, got {other:?}"),
        }

        // Records before the failure stay; the rest are never attempted.
        assert_eq!(db.emails().count().await.unwrap(), 2);
        assert!(db.emails().get_by_id("m4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_articles_is_idempotent() {
        let (db, _) = sqlite_db().await;
        let news = StaticSource::ok(vec![article("https://example.ro/a")]);
        let service = SyncService::new(db.clone(), StaticSource::<EmailRecord>::ok(vec![]), news.clone());
        let query = FetchQuery::search("energie", None);

        service.sync_articles(&query).await.unwrap();
        let first = db
            .articles()
            .get_by_id(&derive_article_id("https://example.ro/a"))
            .await
            .unwrap()
            .unwrap();

        service.sync_articles(&query).await.unwrap();
        let second = db
            .articles()
            .get_by_id(&first.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(news.calls.load(Ordering::SeqCst), 2);
        assert_eq!(db.articles().count().await.unwrap(), 1);
        assert!(second.created_at >= first.created_at);
        // Only the write stamp moves between identical syncs.
        assert_eq!(
            Article {
                created_at: second.created_at,
                ..first
            },
            second
        );
    }
}
