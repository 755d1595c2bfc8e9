//! Tracing initialization with configurable logging formats.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig, ObservabilityConfig};

/// Initialize the global tracing subscriber with the given configuration.
///
/// Fails if a global subscriber was already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TracingError> {
    let logging = &config.logging;
    let filter = build_env_filter(logging);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (&logging.format, logging.timestamps) {
        (LogFormat::Pretty, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line),
            )
            .try_init(),
        (LogFormat::Pretty, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line)
                    .without_time(),
            )
            .try_init(),
        (LogFormat::Compact, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line),
            )
            .try_init(),
        (LogFormat::Compact, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line)
                    .without_time(),
            )
            .try_init(),
        (LogFormat::Json, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line),
            )
            .try_init(),
        (LogFormat::Json, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_file(logging.file_line)
                    .with_line_number(logging.file_line)
                    .without_time(),
            )
            .try_init(),
    };

    result.map_err(|e| TracingError::Init(e.to_string()))
}

/// Build the environment filter from logging config.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let base_level = config.level.as_directive();

    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else if let Some(filter) = &config.filter {
        let combined = format!("{},{}", base_level, filter);
        EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else {
        // Quiet the HTTP and database stacks by default
        EnvFilter::new(format!(
            "{},hyper=warn,h2=warn,tower=info,sqlx=warn,reqwest=warn",
            base_level
        ))
    }
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    #[serial]
    fn test_default_filter_quiets_dependencies() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = build_env_filter(&LoggingConfig::default());
            let rendered = filter.to_string();
            assert!(rendered.contains("sqlx=warn"));
            assert!(rendered.contains("info"));
        });
    }

    #[test]
    #[serial]
    fn test_config_filter_appended() {
        temp_env::with_var_unset("RUST_LOG", || {
            let config = LoggingConfig {
                level: LogLevel::Debug,
                filter: Some("tower_http=trace".into()),
                ..Default::default()
            };
            let rendered = build_env_filter(&config).to_string();
            assert!(rendered.contains("tower_http=trace"));
            assert!(rendered.contains("debug"));
        });
    }

    #[test]
    #[serial]
    fn test_rust_log_takes_precedence() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            let config = LoggingConfig {
                filter: Some("tower_http=trace".into()),
                ..Default::default()
            };
            let rendered = build_env_filter(&config).to_string();
            assert!(!rendered.contains("tower_http"));
        });
    }
}
