use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, placeholder expansion
    /// fails, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if placeholder expansion, parsing or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that the configuration can produce a working client
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_credentials()?;
        self.client.timeout()?;
        self.validate_model()?;
        Ok(())
    }

    fn validate_credentials(&self) -> anyhow::Result<()> {
        if self.credentials.api_key.expose_secret().trim().is_empty() {
            anyhow::bail!("credentials.api_key must not be empty");
        }

        let scheme = self.credentials.base_url.scheme();
        if scheme != "http" && scheme != "https" {
            anyhow::bail!("credentials.base_url must use http or https, got '{scheme}'");
        }

        Ok(())
    }

    fn validate_model(&self) -> anyhow::Result<()> {
        let model = &self.model;

        check_range("model.temperature", model.temperature, 0.0, 2.0)?;
        check_range("model.top_p", model.top_p, 0.0, 1.0)?;
        check_range("model.presence_penalty", model.presence_penalty, -2.0, 2.0)?;
        check_range("model.frequency_penalty", model.frequency_penalty, -2.0, 2.0)?;

        if model.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            anyhow::bail!("model.name must not be blank when set");
        }

        Ok(())
    }
}

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> anyhow::Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => {
            anyhow::bail!("{field} must be between {min} and {max}, got {v}")
        }
        _ => Ok(()),
    }
}
