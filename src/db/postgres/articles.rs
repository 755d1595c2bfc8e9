use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ArticleRepo,
    },
    models::{Article, ArticleOrigin, ArticleRecord, NewArticle},
};

pub struct PostgresArticleRepo {
    pool: PgPool,
}

impl PostgresArticleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse an Article from a database row.
    fn parse_article(row: &sqlx::postgres::PgRow) -> DbResult<Article> {
        let origin: ArticleOrigin = row
            .get::<String, _>("origin")
            .parse()
            .map_err(|message: String| DbError::MalformedRow {
                collection: "articles",
                message,
            })?;

        Ok(Article {
            id: row.get("id"),
            origin,
            title: row.get("title"),
            content: row.get("content"),
            source: row.get("source"),
            url: row.get("url"),
            description: row.get("description"),
            published_at: row.get("published_at"),
            language: row.get("language"),
            query_tag: row.get("query_tag"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl ArticleRepo for PostgresArticleRepo {
    async fn upsert_synced(
        &self,
        record: &ArticleRecord,
        created_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO articles (
                id, origin, source, title, url, description,
                published_at, language, query_tag, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                origin = EXCLUDED.origin,
                source = EXCLUDED.source,
                title = EXCLUDED.title,
                url = EXCLUDED.url,
                description = EXCLUDED.description,
                published_at = EXCLUDED.published_at,
                language = EXCLUDED.language,
                query_tag = EXCLUDED.query_tag,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&record.id)
        .bind(ArticleOrigin::Synced.as_str())
        .bind(&record.source)
        .bind(&record.title)
        .bind(&record.url)
        .bind(&record.description)
        .bind(record.published_at)
        .bind(&record.language)
        .bind(&record.query_tag)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create(
        &self,
        id: &str,
        input: &NewArticle,
        created_at: DateTime<Utc>,
    ) -> DbResult<Article> {
        let row = sqlx::query(
            r#"
            INSERT INTO articles (id, origin, title, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, origin, title, content, source, url, description,
                      published_at, language, query_tag, created_at
            "#,
        )
        .bind(id)
        .bind(ArticleOrigin::Manual.as_str())
        .bind(&input.title)
        .bind(&input.content)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_insert("articles", id, e))?;

        Self::parse_article(&row)
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Article>> {
        let result = sqlx::query(
            r#"
            SELECT id, origin, title, content, source, url, description,
                   published_at, language, query_tag, created_at
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(Some(Self::parse_article(&row)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM articles WHERE created_at < $1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
