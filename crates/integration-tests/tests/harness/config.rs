//! Programmatic configuration builder for integration tests

use shengsuanyun_config::{ClientConfig, Config, CredentialsConfig, ModelConfig};

/// Key the mock server accepts
pub const TEST_API_KEY: &str = "test-key";

/// Model id used by the tests
pub const TEST_MODEL: &str = "mock/model-1";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal configuration pointed at a mock backend
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                credentials: CredentialsConfig::new(TEST_API_KEY).with_base_url(base_url.parse().expect("valid URL")),
                client: ClientConfig {
                    timeout: "5s".to_owned(),
                    ..ClientConfig::default()
                },
                model: ModelConfig {
                    name: Some(TEST_MODEL.to_owned()),
                    ..ModelConfig::default()
                },
                telemetry: None,
            },
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.credentials = CredentialsConfig::new(api_key).with_base_url(self.config.credentials.base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        timeout.clone_into(&mut self.config.client.timeout);
        self
    }

    pub fn with_model_config(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
