//! OAuth2 client-credentials token cache.
//!
//! One bearer token is cached per process. Callers share it through an
//! `Arc<TokenCache>` built at startup; a refresh happens lazily the first time
//! a caller finds the token missing or within [`TOKEN_SAFETY_MARGIN_SECS`] of
//! expiry. Refreshes are serialized behind the write lock, so concurrent
//! callers in the expiry window trigger a single exchange.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use url::Url;

use super::SourceError;
use crate::config::{ClientCredentials, MailSourceConfig};

/// A token is treated as expired this many seconds before its real expiry.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// A cached bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: Arc<str>,
    /// Absolute expiry as reported by the provider, without the safety margin.
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Whether the token may still be handed out at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(TOKEN_SAFETY_MARGIN_SECS)
    }
}

/// Client-credentials token cache for the mail provider.
pub struct TokenCache {
    http: reqwest::Client,
    authority_url: String,
    scope: String,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("authority_url", &self.authority_url)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenCache {
    pub fn new(
        http: reqwest::Client,
        authority_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http,
            authority_url: authority_url.into(),
            scope: scope.into(),
            cached: RwLock::new(None),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &MailSourceConfig) -> Self {
        Self::new(http, &config.authority_url, &config.scope)
    }

    /// Return a usable access token, exchanging credentials if needed.
    pub async fn get_access_token(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<Arc<str>, SourceError> {
        self.get_access_token_at(credentials, Utc::now()).await
    }

    /// [`Self::get_access_token`] evaluated at an explicit instant.
    pub async fn get_access_token_at(
        &self,
        credentials: &ClientCredentials,
        now: DateTime<Utc>,
    ) -> Result<Arc<str>, SourceError> {
        {
            let cache = self.cached.read().await;
            if let Some(ref cached) = *cache
                && cached.is_usable_at(now)
            {
                return Ok(cached.value.clone());
            }
        }

        let mut cache = self.cached.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(ref cached) = *cache
            && cached.is_usable_at(now)
        {
            return Ok(cached.value.clone());
        }

        let token = self.exchange(credentials, now).await?;
        let value = token.value.clone();

        tracing::debug!(
            tenant_id = %credentials.tenant_id,
            expires_at = %token.expires_at,
            "Acquired new access token"
        );

        *cache = Some(token);
        Ok(value)
    }

    /// The currently cached token, if any.
    pub async fn cached(&self) -> Option<CachedToken> {
        self.cached.read().await.clone()
    }

    /// Replace the cached token.
    pub async fn store(&self, token: CachedToken) {
        *self.cached.write().await = Some(token);
    }

    fn token_url(&self, tenant_id: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.authority_url).map_err(|e| {
            SourceError::NotConfigured(format!("mail.authority_url is invalid: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SourceError::NotConfigured("mail.authority_url cannot be a base URL".into())
            })?
            .pop_if_empty()
            .extend([tenant_id, "oauth2", "v2.0", "token"]);
        Ok(url)
    }

    async fn exchange(
        &self,
        credentials: &ClientCredentials,
        now: DateTime<Utc>,
    ) -> Result<CachedToken, SourceError> {
        let url = self.token_url(&credentials.tenant_id)?;

        let response = self
            .http
            .post(url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("scope", self.scope.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        let access_token = parsed
            .as_ref()
            .and_then(|v| v.get("access_token"))
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty());

        let Some(access_token) = access_token else {
            tracing::warn!(status, "Token exchange returned no access token");
            return Err(SourceError::Auth { status, body });
        };

        let lifetime = parsed
            .as_ref()
            .and_then(|v| v.get("expires_in"))
            .and_then(|v| {
                v.as_i64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            })
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(CachedToken {
            value: access_token.into(),
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}
