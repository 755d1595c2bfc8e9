mod articles;
mod emails;

pub use articles::ArticleRepo;
pub use emails::EmailRepo;
