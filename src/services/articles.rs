use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{DbPool, DbResult},
    models::{Article, NewArticle},
};

/// Service layer for manually posted articles
#[derive(Clone)]
pub struct ArticleService {
    db: Arc<DbPool>,
}

impl ArticleService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Store a new article under a fresh UUID and stamp `created_at`.
    pub async fn create(&self, input: NewArticle) -> DbResult<Article> {
        let id = Uuid::new_v4().to_string();
        let article = self.db.articles().create(&id, &input, Utc::now()).await?;
        tracing::info!(article_id = %article.id, "Created article");
        Ok(article)
    }

    /// Get an article by ID
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Article>> {
        self.db.articles().get_by_id(id).await
    }
}
