//! Storage for the two synced collections.
//!
//! [`DbPool`] owns one connection pool (SQLite or PostgreSQL) and hands out the
//! `emails` and `articles` repositories as trait objects, so services never
//! see which backend is in use.

mod error;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, any(feature = "database-sqlite", feature = "database-postgres")))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

enum Backend {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "database-postgres")]
    Postgres(sqlx::PgPool),
    #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
    _None(std::convert::Infallible),
}

/// Connection pool plus the repositories built over it.
pub struct DbPool {
    backend: Backend,
    emails: Arc<dyn EmailRepo>,
    articles: Arc<dyn ArticleRepo>,
}

impl DbPool {
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            emails: Arc::new(sqlite::SqliteEmailRepo::new(pool.clone())),
            articles: Arc::new(sqlite::SqliteArticleRepo::new(pool.clone())),
            backend: Backend::Sqlite(pool),
        }
    }

    #[cfg(feature = "database-postgres")]
    pub fn from_postgres(pool: sqlx::PgPool) -> Self {
        Self {
            emails: Arc::new(postgres::PostgresEmailRepo::new(pool.clone())),
            articles: Arc::new(postgres::PostgresArticleRepo::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    /// Open the configured database. Migrations are applied when the backend
    /// config asks for them.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let db = match config {
            DatabaseConfig::None => return Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let journal_mode = if cfg.wal_mode {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                };
                let options = sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&cfg.path)
                    .create_if_missing(cfg.create_if_missing)
                    .journal_mode(journal_mode)
                    .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms));
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(options)
                    .await?;
                tracing::info!(path = %cfg.path, "Opened SQLite database");
                Self::from_sqlite(pool)
            }
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .acquire_timeout(std::time::Duration::from_secs(cfg.connect_timeout_secs))
                    .connect(&cfg.url)
                    .await?;
                tracing::info!("Connected to PostgreSQL");
                Self::from_postgres(pool)
            }
        };

        if config.run_migrations() {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Create or update the `emails` and `articles` tables.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.backend {
            #[cfg(feature = "database-sqlite")]
            Backend::Sqlite(pool) => sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?,
            #[cfg(feature = "database-postgres")]
            Backend::Postgres(pool) => {
                sqlx::migrate!("./migrations_sqlx/postgres").run(pool).await?
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            Backend::_None(infallible) => match *infallible {},
        }
        tracing::info!(backend = self.backend_name(), "Database migrations applied");
        Ok(())
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            #[cfg(feature = "database-sqlite")]
            Backend::Sqlite(_) => "sqlite",
            #[cfg(feature = "database-postgres")]
            Backend::Postgres(_) => "postgres",
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            Backend::_None(infallible) => match *infallible {},
        }
    }

    pub fn emails(&self) -> Arc<dyn EmailRepo> {
        Arc::clone(&self.emails)
    }

    pub fn articles(&self) -> Arc<dyn ArticleRepo> {
        Arc::clone(&self.articles)
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.backend {
            #[cfg(feature = "database-sqlite")]
            Backend::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            #[cfg(feature = "database-postgres")]
            Backend::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            Backend::_None(infallible) => match *infallible {},
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod pool_tests {
    use super::*;
    use crate::config::SqliteConfig;

    #[tokio::test]
    async fn test_connect_sqlite_applies_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::Sqlite(SqliteConfig {
            path: dir.path().join("sync.db").to_string_lossy().into_owned(),
            ..SqliteConfig::default()
        });

        let db = DbPool::connect(&config).await.unwrap();
        assert_eq!(db.backend_name(), "sqlite");
        db.health_check().await.unwrap();
        assert_eq!(db.articles().count().await.unwrap(), 0);
        assert_eq!(db.emails().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_without_database_fails() {
        let result = DbPool::connect(&DatabaseConfig::None).await;
        assert!(matches!(result, Err(DbError::NotConfigured)));
    }
}
