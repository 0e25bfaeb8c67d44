#![allow(clippy::must_use_candidate)]

//! Configuration for the ShengSuanYun connector
//!
//! A single TOML file describes the credentials, HTTP client identity,
//! model defaults and log output. `{{ env.VAR }}` placeholders are expanded
//! before parsing so secrets can stay out of the file.

pub mod client;
pub mod credentials;
mod env;
mod loader;
pub mod model;
pub mod telemetry;

use serde::Deserialize;

pub use client::*;
pub use credentials::*;
pub use model::*;
pub use telemetry::*;

/// Top-level connector configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// API key and endpoint
    pub credentials: CredentialsConfig,
    /// HTTP client settings
    #[serde(default)]
    pub client: ClientConfig,
    /// Model id and sampling defaults
    #[serde(default)]
    pub model: ModelConfig,
    /// Log output configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
