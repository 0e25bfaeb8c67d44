use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Base URL of the public ShengSuanYun router
pub const DEFAULT_BASE_URL: &str = "https://router.shengsuanyun.com/api/v1";

/// Credentials used to reach the chat-completion API
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Bearer token sent with every authenticated request
    pub api_key: SecretString,
    /// API root; `/chat/completions` and `/models` are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: Url,
}

impl CredentialsConfig {
    /// Credentials for the public router with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: default_base_url(),
        }
    }

    /// Point the credentials at another API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}
