//! Data retention configuration.
//!
//! The articles window is used by `POST /cleanup-articles` and the `sweep`
//! command. The background worker is optional and off by default.
//!
//! # Example
//!
//! ```toml
//! [retention]
//! enabled = true
//! interval_hours = 24
//!
//! [retention.periods]
//! articles_days = 60
//! emails_days = 180
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Data retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Whether the periodic retention worker runs.
    /// Default: false (cleanup is triggered through the HTTP route)
    #[serde(default)]
    pub enabled: bool,

    /// How often the worker sweeps (in hours).
    /// Default: 24 (once per day)
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Retention windows per collection.
    #[serde(default)]
    pub periods: RetentionPeriods,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: default_interval_hours(),
            periods: RetentionPeriods::default(),
        }
    }
}

impl RetentionConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.interval_hours == 0 {
            return Err(ConfigError::Validation(
                "retention.interval_hours must be greater than 0 when retention is enabled".into(),
            ));
        }
        Ok(())
    }
}

fn default_interval_hours() -> u64 {
    24
}

/// Retention windows in days.
///
/// Set to 0 to keep a collection forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPeriods {
    /// Days an article survives after its last sync or creation.
    /// Default: 60 days
    #[serde(default = "default_articles_days")]
    pub articles_days: u32,

    /// Days a mail record survives after its last sync.
    /// Default: 0 (emails are never swept)
    #[serde(default)]
    pub emails_days: u32,
}

impl Default for RetentionPeriods {
    fn default() -> Self {
        Self {
            articles_days: default_articles_days(),
            emails_days: 0,
        }
    }
}

fn default_articles_days() -> u32 {
    60
}
