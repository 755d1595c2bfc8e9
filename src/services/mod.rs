mod articles;
mod sync;

use std::sync::Arc;

pub use articles::ArticleService;
pub use sync::{SyncError, SyncReport, SyncService};

use crate::{
    db::DbPool,
    sources::{MailSource, NewsSource},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub sync: SyncService,
    pub articles: ArticleService,
}

impl Services {
    pub fn new(db: Arc<DbPool>, mail: Arc<MailSource>, news: Arc<NewsSource>) -> Self {
        Self {
            sync: SyncService::new(db.clone(), mail, news),
            articles: ArticleService::new(db),
        }
    }
}
