use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body size limit in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Seconds to wait for in-flight work when shutting down.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// HTTP client configuration for outbound requests to the identity, mail and news APIs.
    #[serde(default)]
    pub http_client: HttpClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            http_client: HttpClientConfig::default(),
        }
    }
}

impl ServerConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("server.port must be greater than 0".into());
        }
        self.http_client.validate()
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

pub(crate) fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1 MB
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// HTTP client configuration for outbound requests.
///
/// A single `reqwest::Client` is built at startup and shared by the token cache
/// and both fetchers. Every call is a single attempt bounded by `timeout_secs`;
/// nothing is retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Total time allowed for a request, including connection and response.
    #[serde(default = "default_http_client_timeout")]
    pub timeout_secs: u64,

    /// Time allowed to establish a connection to the remote server.
    #[serde(default = "default_http_client_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum idle connections to keep per host.
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Connections idle longer than this are closed.
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout_secs: u64,

    /// User-Agent header to send with requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_client_timeout(),
            connect_timeout_secs: default_http_client_connect_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout_secs: default_pool_idle_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpClientConfig {
    /// Build a reqwest Client from this configuration.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(self.pool_idle_timeout_secs))
            .user_agent(&self.user_agent)
            .build()
    }

    fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err("server.http_client timeouts must be greater than 0".into());
        }
        Ok(())
    }
}

// Upstream calls are short JSON exchanges; 30s bounds a hung provider.
fn default_http_client_timeout() -> u64 {
    30
}

fn default_http_client_connect_timeout() -> u64 {
    10
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_user_agent() -> String {
    format!("syncgate/{}", env!("CARGO_PKG_VERSION"))
}
