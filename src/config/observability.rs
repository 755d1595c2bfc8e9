use serde::{Deserialize, Serialize};

/// `[observability]` section. Only logging is configurable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[observability.logging]`: how the tracing subscriber renders events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for this crate and anything not named in `filter`.
    pub level: LogLevel,
    pub format: LogFormat,
    /// Prefix each line with a timestamp. Disable when the log collector adds its own.
    pub timestamps: bool,
    /// Include the source file and line of each event.
    pub file_line: bool,
    /// Extra `EnvFilter` directives appended after `level`,
    /// e.g. `"tower_http=debug,sqlx=info"`. Ignored when `RUST_LOG` is set.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            timestamps: true,
            file_line: false,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON for log shippers.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_logging_section_keeps_defaults() {
        let config: ObservabilityConfig = toml::from_str(
            r#"
            [logging]
            level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.logging.timestamps);
        assert!(config.logging.filter.is_none());
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result: Result<ObservabilityConfig, _> = toml::from_str(
            r#"
            [logging]
            level = "verbose"
            "#,
        );
        assert!(result.is_err());
    }
}
