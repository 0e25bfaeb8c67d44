//! Log output for the ShengSuanYun connector
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! `fmt` layer writing human-readable or JSON lines to stderr.

use shengsuanyun_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps logging alive for the lifetime of the application
#[derive(Debug)]
pub struct TelemetryGuard {
    filter: String,
}

impl TelemetryGuard {
    /// The filter directive that was installed
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("shutting down telemetry");
    }
}

/// Initialize logging from configuration
///
/// `RUST_LOG` wins over the configured filter, which wins over
/// `default_filter`. An unparsable directive falls back to `info`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: Option<&TelemetryConfig>, default_filter: &str) -> anyhow::Result<TelemetryGuard> {
    let directive = resolve_filter(config, default_filter);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let format = config.map(|c| c.format).unwrap_or_default();

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(TelemetryGuard { filter: directive })
}

fn resolve_filter(config: Option<&TelemetryConfig>, default_filter: &str) -> String {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.and_then(|c| c.filter.clone()))
        .unwrap_or_else(|| default_filter.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(filter: Option<&str>) -> TelemetryConfig {
        TelemetryConfig {
            filter: filter.map(str::to_owned),
            format: LogFormat::Text,
        }
    }

    #[test]
    fn default_filter_applies_without_config() {
        temp_env::with_var_unset("RUST_LOG", || {
            assert_eq!(resolve_filter(None, "warn"), "warn");
        });
    }

    #[test]
    fn configured_filter_beats_default() {
        temp_env::with_var_unset("RUST_LOG", || {
            assert_eq!(resolve_filter(Some(&config(Some("debug"))), "warn"), "debug");
            assert_eq!(resolve_filter(Some(&config(None)), "warn"), "warn");
        });
    }

    #[test]
    fn rust_log_beats_configuration() {
        temp_env::with_var("RUST_LOG", Some("shengsuanyun_llm=trace"), || {
            assert_eq!(
                resolve_filter(Some(&config(Some("debug"))), "warn"),
                "shengsuanyun_llm=trace"
            );
        });
    }
}
