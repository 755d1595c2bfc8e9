use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::{
    db::{error::DbResult, repos::EmailRepo},
    models::{Email, EmailRecord},
};

pub struct PostgresEmailRepo {
    pool: PgPool,
}

impl PostgresEmailRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_email(row: &sqlx::postgres::PgRow) -> Email {
        Email {
            id: row.get("id"),
            subject: row.get("subject"),
            sender_address: row.get("sender_address"),
            received_at: row.get("received_at"),
            preview: row.get("preview"),
            synced_at: row.get("synced_at"),
        }
    }
}

#[async_trait]
impl EmailRepo for PostgresEmailRepo {
    async fn upsert(&self, record: &EmailRecord, synced_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO emails (id, subject, sender_address, received_at, preview, synced_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                subject = EXCLUDED.subject,
                sender_address = EXCLUDED.sender_address,
                received_at = EXCLUDED.received_at,
                preview = EXCLUDED.preview,
                synced_at = EXCLUDED.synced_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.subject)
        .bind(&record.sender_address)
        .bind(record.received_at)
        .bind(&record.preview)
        .bind(synced_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<Email>> {
        let row = sqlx::query(
            r#"
            SELECT id, subject, sender_address, received_at, preview, synced_at
            FROM emails
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::parse_email))
    }

    async fn count(&self) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM emails")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM emails WHERE synced_at < $1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
