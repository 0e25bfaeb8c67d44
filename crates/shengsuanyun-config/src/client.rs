use std::time::Duration;

use serde::Deserialize;

/// Value of the `HTTP-Referer` identification header
pub const DEFAULT_REFERER: &str = "https://github.com/shengsuan/n8n-nodes-shengsuanyun";

/// Value of the `X-Title` identification header
pub const DEFAULT_TITLE: &str = "n8n-nodes-shengsuanyun";

/// HTTP client settings shared by every outbound call
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Whole-request timeout (e.g. "30s", "2m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Sent as `HTTP-Referer`
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Sent as `X-Title`
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            referer: default_referer(),
            title: default_title(),
        }
    }
}

impl ClientConfig {
    /// Parsed request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration string
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.timeout).map_err(|e| anyhow::anyhow!("invalid client timeout '{}': {e}", self.timeout))
    }
}

fn default_timeout() -> String {
    "60s".to_owned()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_owned()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_owned()
}
