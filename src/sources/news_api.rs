use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{FetchQuery, RecordSource, SourceError, non_empty, parse_timestamp, read_success_body};
use crate::{
    config::NewsSourceConfig,
    models::{ArticleRecord, UNKNOWN_SOURCE, derive_article_id},
};

const SERVICE: &str = "newsapi";

/// News search fetcher backed by the NewsAPI `/everything` endpoint.
pub struct NewsApiSource {
    http: reqwest::Client,
    config: NewsSourceConfig,
}

impl NewsApiSource {
    pub fn new(http: reqwest::Client, config: NewsSourceConfig) -> Self {
        Self { http, config }
    }

    fn search_url(&self) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            SourceError::NotConfigured(format!("news.base_url is invalid: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| SourceError::NotConfigured("news.base_url cannot be a base URL".into()))?
            .pop_if_empty()
            .push("everything");
        Ok(url)
    }
}

#[async_trait]
impl RecordSource for NewsApiSource {
    type Record = ArticleRecord;

    fn name(&self) -> &'static str {
        SERVICE
    }

    #[tracing::instrument(name = "newsapi.fetch", skip_all, fields(query = ?query.query))]
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<ArticleRecord>, SourceError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| SourceError::NotConfigured("news.api_key".into()))?;
        let q = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| SourceError::InvalidRequest("query parameter 'q' is required".into()))?;
        let language = query
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.config.default_language);

        let response = self
            .http
            .get(self.search_url()?)
            .query(&[
                ("q", q),
                ("sortBy", "publishedAt"),
                ("language", language),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = read_success_body(SERVICE, response).await?;
        let page: SearchResponse = serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        // NewsAPI reports some failures with HTTP 200 and `status: "error"`.
        if page.status.as_deref().is_some_and(|s| s != "ok") {
            tracing::warn!(
                code = page.code.as_deref().unwrap_or_default(),
                "News search reported an in-body error"
            );
            return Err(SourceError::RemoteApi {
                service: SERVICE,
                status,
                body,
            });
        }

        let records: Vec<ArticleRecord> = page
            .articles
            .unwrap_or_default()
            .into_iter()
            .filter_map(|article| {
                let record = article.into_record(q, language);
                if record.is_none() {
                    tracing::warn!("Skipping article without a url");
                }
                record
            })
            .collect();

        tracing::debug!(count = records.len(), language, "Fetched news articles");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: Option<String>,
    code: Option<String>,
    #[serde(default)]
    articles: Option<Vec<NewsArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsArticle {
    source: Option<NewsArticleSource>,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsArticleSource {
    name: Option<String>,
}

impl NewsArticle {
    fn into_record(self, query: &str, language: &str) -> Option<ArticleRecord> {
        let url = non_empty(self.url)?;
        Some(ArticleRecord {
            id: derive_article_id(&url),
            source: non_empty(self.source.and_then(|s| s.name))
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            title: non_empty(self.title),
            url,
            description: non_empty(self.description),
            published_at: parse_timestamp(SERVICE, "publishedAt", self.published_at),
            language: language.to_string(),
            query_tag: query.to_string(),
        })
    }
}
