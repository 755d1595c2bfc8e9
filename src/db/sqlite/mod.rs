mod articles;
mod emails;

pub use articles::SqliteArticleRepo;
pub use emails::SqliteEmailRepo;
