use thiserror::Error;

/// Storage failures for the `emails` and `articles` collections.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("no database is configured")]
    NotConfigured,

    /// An insert hit an existing primary key.
    #[error("{collection} record '{id}' already exists")]
    Conflict { collection: &'static str, id: String },

    /// A stored row could not be mapped back into a model.
    #[error("malformed {collection} row: {message}")]
    MalformedRow {
        collection: &'static str,
        message: String,
    },

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// Map an insert failure, turning a unique violation into [`DbError::Conflict`].
    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    pub(crate) fn from_insert(collection: &'static str, id: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict {
                collection,
                id: id.to_string(),
            },
            err => DbError::Sqlx(err),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_names_the_record() {
        let err = DbError::Conflict {
            collection: "articles",
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "articles record 'abc' already exists");
    }

    #[cfg(any(feature = "database-sqlite", feature = "database-postgres"))]
    #[test]
    fn test_non_unique_insert_failure_stays_sqlx() {
        let err = DbError::from_insert("articles", "abc", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }
}
