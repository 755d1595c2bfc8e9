use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

/// Source name stored when the news provider does not report one.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// How an article entered the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleOrigin {
    /// Posted through `POST /articles`; id is a random UUID.
    Manual,
    /// Pulled from the news provider; id is derived from the URL.
    Synced,
}

impl ArticleOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleOrigin::Manual => "manual",
            ArticleOrigin::Synced => "synced",
        }
    }
}

impl std::str::FromStr for ArticleOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ArticleOrigin::Manual),
            "synced" => Ok(ArticleOrigin::Synced),
            _ => Err(format!("Invalid article origin: {}", s)),
        }
    }
}

/// Derive the document id of a synced article from its URL.
///
/// SHA-256 of the URL bytes, base64url-encoded without padding: 43 characters
/// from `[A-Za-z0-9_-]`. Manually posted articles use hyphenated UUIDs
/// (36 characters), so the two id schemes never overlap.
pub fn derive_article_id(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(url.as_bytes()))
}

/// A news article normalized from the news provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// [`derive_article_id`] of `url`.
    pub id: String,
    pub source: String,
    pub title: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: String,
    /// Free-text query the article was found with.
    pub query_tag: String,
}

/// A stored article, from either origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub origin: ArticleOrigin,
    pub title: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub query_tag: Option<String>,
    /// Stamped on every write; the retention sweep keys off this.
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /articles`.
///
/// Fields are optional at the serde level so a missing field is reported as
/// a validation failure (400) rather than a JSON data error.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateArticle {
    #[validate(required, length(min = 1, max = 1000))]
    pub title: Option<String>,
    #[validate(required, length(min = 1))]
    pub content: Option<String>,
}

/// Validated input for a manually posted article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
}

impl CreateArticle {
    /// Unwrap the validated fields. Returns `None` if a required field is missing.
    pub fn into_new(self) -> Option<NewArticle> {
        Some(NewArticle {
            title: self.title?,
            content: self.content?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_article_id_is_deterministic() {
        let url = "https://example.ro/stiri/1";
        assert_eq!(derive_article_id(url), derive_article_id(url));
    }

    #[test]
    fn test_derive_article_id_distinguishes_urls() {
        assert_ne!(
            derive_article_id("https://example.ro/stiri/1"),
            derive_article_id("https://example.ro/stiri/2")
        );
    }

    #[test]
    fn test_derive_article_id_is_identifier_safe() {
        let id = derive_article_id("https://example.ro/a?b=c&d=e#f");
        assert_eq!(id.len(), 43);
        assert!(!id.contains('='));
        assert!(
            id.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_derived_ids_never_look_like_uuids() {
        let derived = derive_article_id("https://example.ro/stiri/1");
        let manual = uuid::Uuid::new_v4().to_string();
        assert_ne!(derived.len(), manual.len());
    }

    #[test]
    fn test_create_article_requires_both_fields() {
        let missing: CreateArticle = serde_json::from_str(r#"{"title": "A"}"#).unwrap();
        assert!(missing.validate().is_err());

        let empty: CreateArticle =
            serde_json::from_str(r#"{"title": "", "content": "B"}"#).unwrap();
        assert!(empty.validate().is_err());

        let ok: CreateArticle =
            serde_json::from_str(r#"{"title": "A", "content": "B"}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(
            ok.into_new(),
            Some(NewArticle {
                title: "A".into(),
                content: "B".into()
            })
        );
    }

    #[test]
    fn test_origin_round_trips_through_str() {
        for origin in [ArticleOrigin::Manual, ArticleOrigin::Synced] {
            assert_eq!(origin.as_str().parse::<ArticleOrigin>().unwrap(), origin);
        }
        assert!("imported".parse::<ArticleOrigin>().is_err());
    }
}
