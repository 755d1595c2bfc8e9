//! Database fixtures shared by repository, service, and route tests.
//!
//! Every fixture applies the real migrations, so tests run against the
//! production schema of both collections.

#[cfg(feature = "database-sqlite")]
use std::sync::Arc;

#[cfg(feature = "database-sqlite")]
use sqlx::SqlitePool;

#[cfg(feature = "database-sqlite")]
use crate::db::DbPool;

/// Single-connection in-memory SQLite pool with `emails` and `articles` created.
///
/// One connection keeps every query on the same in-memory database.
#[cfg(feature = "database-sqlite")]
pub async fn migrated_sqlite_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite should open");
    sqlx::migrate!("./migrations_sqlx/sqlite")
        .run(&pool)
        .await
        .expect("SQLite migrations should apply");
    pool
}

/// A ready [`DbPool`] over a fresh in-memory database.
#[cfg(feature = "database-sqlite")]
pub async fn migrated_sqlite_db() -> Arc<DbPool> {
    Arc::new(DbPool::from_sqlite(migrated_sqlite_pool().await))
}

/// PostgreSQL fixtures. One container is started per test binary and each test
/// gets its own schema.
#[cfg(feature = "database-postgres")]
pub mod postgres {
    use sqlx::PgPool;
    use testcontainers_modules::{
        postgres::Postgres,
        testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
    };
    use tokio::sync::OnceCell;

    struct Container {
        // Dropping the handle stops the container.
        _handle: ContainerAsync<Postgres>,
        url: String,
    }

    static CONTAINER: OnceCell<Container> = OnceCell::const_new();

    async fn container_url() -> &'static str {
        let container = CONTAINER
            .get_or_init(|| async {
                let handle = Postgres::default()
                    .with_tag("16-alpine")
                    .start()
                    .await
                    .expect("PostgreSQL container should start");
                let host = handle.get_host().await.expect("container host");
                let port = handle
                    .get_host_port_ipv4(5432)
                    .await
                    .expect("container port");
                Container {
                    _handle: handle,
                    url: format!("postgres://postgres:postgres@{host}:{port}/postgres"),
                }
            })
            .await;
        &container.url
    }

    /// Pool bound to a fresh, migrated schema on the shared container.
    pub async fn migrated_postgres_pool() -> PgPool {
        let base_url = container_url().await;
        let schema = format!("sync_{}", uuid::Uuid::new_v4().simple());

        sqlx::query(&format!("CREATE SCHEMA \"{schema}\""))
            .execute(&PgPool::connect(base_url).await.expect("admin connection"))
            .await
            .expect("test schema should be created");

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&format!("{base_url}?options=-c search_path={schema}"))
            .await
            .expect("schema-scoped connection");
        sqlx::migrate!("./migrations_sqlx/postgres")
            .run(&pool)
            .await
            .expect("PostgreSQL migrations should apply");
        pool
    }
}
