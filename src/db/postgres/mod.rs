mod articles;
mod emails;

pub use articles::PostgresArticleRepo;
pub use emails::PostgresEmailRepo;
