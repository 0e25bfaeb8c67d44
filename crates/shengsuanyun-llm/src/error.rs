use thiserror::Error;

/// Errors produced by the connector
#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection, timeout or body read failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-2xx status
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },

    /// Response was missing an expected field
    #[error("unexpected response: {0}")]
    ResponseShape(String),

    /// A single stream event could not be decoded
    #[error("malformed stream event: {0}")]
    Parse(String),

    /// Credentials or client settings are unusable
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether the failure happened at the HTTP layer
    ///
    /// Nothing in this crate retries; callers get every error as-is.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}
