use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Microsoft Graph mailbox source.
///
/// Credentials are optional at load time: a deployment that only syncs news
/// does not need them. Missing values are reported when a mail sync is
/// requested, before any network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailSourceConfig {
    /// Application (client) id registered with the identity provider.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret for the client-credentials grant.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Directory (tenant) id.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Mailbox whose messages are synced.
    #[serde(default)]
    pub mailbox: Option<String>,

    /// Identity provider base URL. The token endpoint is
    /// `{authority_url}/{tenant_id}/oauth2/v2.0/token`.
    #[serde(default = "default_authority_url")]
    pub authority_url: String,

    /// OAuth2 scope requested in the token exchange.
    #[serde(default = "default_graph_scope")]
    pub scope: String,

    /// Graph API base URL including the version segment.
    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    /// Number of messages requested per sync (`$top`).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for MailSourceConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            tenant_id: None,
            mailbox: None,
            authority_url: default_authority_url(),
            scope: default_graph_scope(),
            graph_url: default_graph_url(),
            page_size: default_page_size(),
        }
    }
}

/// Client-credentials triple resolved from [`MailSourceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
}

impl MailSourceConfig {
    /// Resolve the client credentials, naming every missing setting.
    pub fn credentials(&self) -> Result<ClientCredentials, Vec<&'static str>> {
        let client_id = present(&self.client_id);
        let client_secret = present(&self.client_secret);
        let tenant_id = present(&self.tenant_id);

        match (client_id, client_secret, tenant_id) {
            (Some(id), Some(secret), Some(tenant)) => Ok(ClientCredentials {
                client_id: id.to_string(),
                client_secret: secret.to_string(),
                tenant_id: tenant.to_string(),
            }),
            (id, secret, tenant) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push("mail.client_id");
                }
                if secret.is_none() {
                    missing.push("mail.client_secret");
                }
                if tenant.is_none() {
                    missing.push("mail.tenant_id");
                }
                Err(missing)
            }
        }
    }

    /// Target mailbox, if configured and non-empty.
    pub fn mailbox(&self) -> Option<&str> {
        present(&self.mailbox)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=999).contains(&self.page_size) {
            return Err(ConfigError::Validation(
                "mail.page_size must be between 1 and 999".into(),
            ));
        }
        url::Url::parse(&self.authority_url).map_err(|e| {
            ConfigError::Validation(format!("mail.authority_url is not a valid URL: {e}"))
        })?;
        url::Url::parse(&self.graph_url).map_err(|e| {
            ConfigError::Validation(format!("mail.graph_url is not a valid URL: {e}"))
        })?;
        Ok(())
    }
}

fn default_authority_url() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_graph_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_graph_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_page_size() -> u32 {
    50
}

/// News search source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsSourceConfig {
    /// API key sent as the `apiKey` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,

    /// News API base URL; `/everything` is appended.
    #[serde(default = "default_news_url")]
    pub base_url: String,

    /// Language filter used when a request does not specify one.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for NewsSourceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_url(),
            default_language: default_language(),
        }
    }
}

impl NewsSourceConfig {
    /// API key, if configured and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        present(&self.api_key)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| {
            ConfigError::Validation(format!("news.base_url is not a valid URL: {e}"))
        })?;
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "news.default_language cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_news_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_language() -> String {
    "ro".to_string()
}

pub(super) fn validate_sources(
    mail: &MailSourceConfig,
    news: &NewsSourceConfig,
) -> Result<(), ConfigError> {
    mail.validate()?;
    news.validate()
}

// `${VAR:-}` expands to an empty string; treat that the same as unset.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_complete() {
        let config = MailSourceConfig {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            tenant_id: Some("tenant".into()),
            ..Default::default()
        };
        let creds = config.credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.tenant_id, "tenant");
    }

    #[test]
    fn test_credentials_reports_every_missing_setting() {
        let config = MailSourceConfig {
            client_id: Some("id".into()),
            client_secret: Some("   ".into()),
            ..Default::default()
        };
        let missing = config.credentials().unwrap_err();
        assert_eq!(missing, vec!["mail.client_secret", "mail.tenant_id"]);
    }

    #[test]
    fn test_empty_mailbox_is_missing() {
        let config = MailSourceConfig {
            mailbox: Some(String::new()),
            ..Default::default()
        };
        assert!(config.mailbox().is_none());
    }

    #[test]
    fn test_page_size_bounds() {
        let config = MailSourceConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_news_defaults() {
        let config = NewsSourceConfig::default();
        assert_eq!(config.default_language, "ro");
        assert_eq!(config.base_url, "https://newsapi.org/v2");
        assert!(config.api_key().is_none());
    }
}
