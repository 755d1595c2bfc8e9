use thiserror::Error;

/// Failure while talking to the identity provider or a record source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A required setting is absent. Detected before any network call.
    #[error("Missing configuration: {0}")]
    NotConfigured(String),

    /// The caller supplied an unusable query.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The client-credentials exchange returned no token.
    /// `body` is the raw provider response.
    #[error("Token exchange failed with status {status}: {body}")]
    Auth { status: u16, body: String },

    /// The upstream API signalled failure, by HTTP status or by an
    /// in-body status field.
    #[error("{service} returned status {status}: {body}")]
    RemoteApi {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Transport failure, including timeouts.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream payload could not be decoded.
    #[error("Invalid response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl SourceError {
    /// Whether the error is the caller's to fix (configuration or query)
    /// rather than an upstream or transport fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SourceError::NotConfigured(_) | SourceError::InvalidRequest(_)
        )
    }
}
