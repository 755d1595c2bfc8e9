//! Configuration module for the sync service.
//!
//! The service is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax, or `${VAR_NAME:-default}`
//! when the variable is optional. Without a file, configuration is read
//! straight from the environment (see [`SyncConfig::from_env`]).
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [database]
//! type = "sqlite"
//! path = "syncgate.db"
//!
//! [mail]
//! client_id = "${CLIENT_ID}"
//! client_secret = "${CLIENT_SECRET}"
//! tenant_id = "${TENANT_ID}"
//! mailbox = "${TARGET_USER_EMAIL}"
//!
//! [news]
//! api_key = "${NEWS_API_KEY:-}"
//! ```

mod database;
mod observability;
mod retention;
mod server;
mod sources;

use std::{path::Path, sync::LazyLock};

pub use database::*;
pub use observability::*;
pub use retention::*;
use serde::{Deserialize, Serialize};
pub use server::*;
pub use sources::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database backing the `emails` and `articles` collections.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Mailbox source (identity provider + Graph API).
    #[serde(default)]
    pub mail: MailSourceConfig,

    /// News search source.
    #[serde(default)]
    pub news: NewsSourceConfig,

    /// Retention windows and the optional background sweeper.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Logging.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: SyncConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables only.
    ///
    /// | Variable | Setting |
    /// |---|---|
    /// | `CLIENT_ID`, `CLIENT_SECRET`, `TENANT_ID` | mail client credentials |
    /// | `TARGET_USER_EMAIL` | mailbox to sync |
    /// | `NEWS_API_KEY` | news API key |
    /// | `PORT` | listen port (default 8080) |
    /// | `DATABASE_URL` | `postgres://…`, `sqlite:<path>` or a file path |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = SyncConfig::default();

        config.mail.client_id = env_opt("CLIENT_ID");
        config.mail.client_secret = env_opt("CLIENT_SECRET");
        config.mail.tenant_id = env_opt("TENANT_ID");
        config.mail.mailbox = env_opt("TARGET_USER_EMAIL");
        config.news.api_key = env_opt("NEWS_API_KEY");

        if let Some(port) = env_opt("PORT") {
            config.server.port = port.parse().map_err(|_| {
                ConfigError::Validation(format!("PORT must be a valid port number, got '{port}'"))
            })?;
        }

        if let Some(url) = env_opt("DATABASE_URL") {
            config.database = DatabaseConfig::from_url(&url)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate().map_err(ConfigError::Validation)?;
        self.database.validate()?;
        validate_sources(&self.mail, &self.news)?;
        self.retention.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

static ENV_VAR_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .expect("env var pattern is a valid regex")
});

/// Expand environment variables in the format `${VAR_NAME}` or
/// `${VAR_NAME:-default}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in ENV_VAR_RE.captures_iter(line) {
            let Some(whole) = cap.get(0) else { continue };

            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = match (std::env::var(var_name), cap.get(3)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_string(),
                (Err(_), None) => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
            };
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SyncConfig::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.news.default_language, "ro");
        assert_eq!(config.retention.periods.articles_days, 60);
        assert!(config.mail.credentials().is_err());
    }

    #[test]
    fn test_full_config() {
        let config = SyncConfig::from_str(
            r#"
            [server]
            port = 9090

            [server.http_client]
            timeout_secs = 15

            [mail]
            client_id = "id"
            client_secret = "secret"
            tenant_id = "tenant"
            mailbox = "inbox@example.com"
            page_size = 25

            [news]
            api_key = "news-key"
            default_language = "en"

            [retention]
            enabled = true
            interval_hours = 6

            [observability.logging]
            level = "debug"
            format = "json"
        "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.http_client.timeout_secs, 15);
        assert_eq!(config.mail.mailbox(), Some("inbox@example.com"));
        assert_eq!(config.mail.page_size, 25);
        assert_eq!(config.news.api_key(), Some("news-key"));
        assert!(config.retention.enabled);
        assert_eq!(config.observability.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = SyncConfig::from_str(
            r#"
            [news]
            apikey = "typo"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_surfaces() {
        let result = SyncConfig::from_str(
            r#"
            [mail]
            page_size = 5000
        "#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("TEST_API_KEY", Some("sk-secret"), || {
            let result = expand_env_vars("key = \"${TEST_API_KEY}\"").unwrap();
            assert_eq!(result, "key = \"sk-secret\"");
        });
    }

    #[test]
    fn test_env_var_missing_is_error() {
        temp_env::with_var_unset("SYNCGATE_TEST_MISSING", || {
            let result = expand_env_vars("key = \"${SYNCGATE_TEST_MISSING}\"");
            assert!(matches!(result, Err(ConfigError::EnvVarNotFound(name)) if name == "SYNCGATE_TEST_MISSING"));
        });
    }

    #[test]
    fn test_env_var_default_used_when_unset() {
        temp_env::with_var_unset("SYNCGATE_TEST_OPTIONAL", || {
            let result = expand_env_vars("key = \"${SYNCGATE_TEST_OPTIONAL:-}\"").unwrap();
            assert_eq!(result, "key = \"\"");
            let result = expand_env_vars("lang = \"${SYNCGATE_TEST_OPTIONAL:-en}\"").unwrap();
            assert_eq!(result, "lang = \"en\"");
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# api_key = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# api_key = \"${NONEXISTENT_VAR}\"");
    }

    #[test]
    fn test_env_var_before_comment_expanded() {
        temp_env::with_var("TEST_BEFORE_COMMENT", Some("expanded"), || {
            let result =
                expand_env_vars("key = \"${TEST_BEFORE_COMMENT}\" # ${NONEXISTENT}").unwrap();
            assert_eq!(result, "key = \"expanded\" # ${NONEXISTENT}");
        });
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syncgate.toml");
        std::fs::write(&path, "[server]\nport = 7000\n").unwrap();

        let config = SyncConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 7000);

        let missing = SyncConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_, _))));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("CLIENT_ID", Some("id")),
                ("CLIENT_SECRET", Some("secret")),
                ("TENANT_ID", Some("tenant")),
                ("TARGET_USER_EMAIL", Some("inbox@example.com")),
                ("NEWS_API_KEY", None),
                ("PORT", Some("3000")),
                ("DATABASE_URL", None),
            ],
            || {
                let config = SyncConfig::from_env().unwrap();
                assert_eq!(config.server.port, 3000);
                assert!(config.mail.credentials().is_ok());
                assert_eq!(config.mail.mailbox(), Some("inbox@example.com"));
                assert!(config.news.api_key().is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        temp_env::with_var("PORT", Some("eighty"), || {
            let result = SyncConfig::from_env();
            assert!(matches!(result, Err(ConfigError::Validation(_))));
        });
    }
}
