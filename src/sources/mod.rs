//! Record sources: the identity-provider token cache and the two read-only
//! fetchers (mailbox and news search).
//!
//! Each fetcher turns a remote query into normalized records. Calls are single
//! attempts; timeouts come from the shared `reqwest::Client`.

mod error;
mod graph_mail;
mod news_api;
mod token;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use error::SourceError;
pub use graph_mail::GraphMailSource;
pub use news_api::NewsApiSource;
pub use token::{CachedToken, DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_SAFETY_MARGIN_SECS, TokenCache};

use crate::models::{ArticleRecord, EmailRecord};

/// Parameters for a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchQuery {
    /// Free-text search; required by the news source, ignored by mail.
    pub query: Option<String>,
    /// Language filter; the news source falls back to its configured default.
    pub language: Option<String>,
}

impl FetchQuery {
    pub fn search(query: impl Into<String>, language: Option<String>) -> Self {
        Self {
            query: Some(query.into()),
            language,
        }
    }
}

/// Read capability shared by every upstream source.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Record: Send;

    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Fetch one page of records. An absent or empty upstream list is `Ok(vec![])`.
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<Self::Record>, SourceError>;
}

pub type MailSource = dyn RecordSource<Record = EmailRecord>;
pub type NewsSource = dyn RecordSource<Record = ArticleRecord>;

/// Read the body of an upstream response, failing with `RemoteApi` on a
/// non-success status.
async fn read_success_body(
    service: &'static str,
    response: reqwest::Response,
) -> Result<String, SourceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(service, status = status.as_u16(), "Upstream request failed");
        return Err(SourceError::RemoteApi {
            service,
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Drop empty upstream strings so absent and blank values are both stored as null.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse an upstream timestamp, keeping the rest of the record when it is malformed.
fn parse_timestamp(
    service: &'static str,
    field: &'static str,
    raw: Option<String>,
) -> Option<DateTime<Utc>> {
    let raw = non_empty(raw)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(service, field, value = %raw, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("x".into())).as_deref(), Some("x"));
    }

    #[test]
    fn test_parse_timestamp_is_lenient() {
        let parsed = parse_timestamp("test", "ts", Some("2025-05-01T10:00:00+02:00".into()));
        assert_eq!(
            parsed.map(|t| t.to_rfc3339()),
            Some("2025-05-01T08:00:00+00:00".to_string())
        );
        assert_eq!(parse_timestamp("test", "ts", Some("2025-05-01 08:00".into())), None);
        assert_eq!(parse_timestamp("test", "ts", Some(String::new())), None);
        assert_eq!(parse_timestamp("test", "ts", None), None);
    }
}
