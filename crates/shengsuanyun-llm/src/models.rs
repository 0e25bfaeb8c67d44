//! Model catalogue for selection lists

use serde::Serialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::protocol::RemoteModel;
use crate::transport::Transport;

/// Path of the model catalogue below the API root
pub const MODELS_PATH: &str = "models";

/// One selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelOption {
    /// Display name
    pub name: String,
    /// Model id sent in requests
    pub value: String,
    /// Shortened description with pricing
    pub description: String,
}

/// Fetch the model catalogue
///
/// The catalogue is public, so only the identification headers are sent.
/// Entries that do not decode as a model are dropped.
pub async fn list_models(transport: &Transport) -> Result<Vec<RemoteModel>, LlmError> {
    let body: Value = transport.get_json(MODELS_PATH, false).await?;

    let Some(entries) = body.get("data").and_then(Value::as_array) else {
        return Err(LlmError::ResponseShape(
            "invalid response format: expected a `data` array".to_owned(),
        ));
    };

    let models: Vec<RemoteModel> = entries
        .iter()
        .filter_map(|entry| {
            serde_json::from_value(entry.clone())
                .inspect_err(|e| tracing::debug!(error = %e, "skipping unreadable model entry"))
                .ok()
        })
        .collect();

    tracing::debug!(count = models.len(), "fetched model catalogue");
    Ok(models)
}

/// Build the selection list: named models only, sorted by name
pub fn model_options(models: &[RemoteModel]) -> Result<Vec<ModelOption>, LlmError> {
    let mut options: Vec<ModelOption> = models
        .iter()
        .filter(|model| !model.id.is_empty() && !model.name.is_empty())
        .map(|model| ModelOption {
            name: model.name.clone(),
            value: model.id.clone(),
            description: describe_with_pricing(model),
        })
        .collect();

    if options.is_empty() {
        return Err(LlmError::ResponseShape("no models found in response".to_owned()));
    }

    options.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(options)
}

/// Check the API key with an authenticated catalogue request
pub async fn verify_credentials(transport: &Transport) -> Result<(), LlmError> {
    transport.require_api_key()?;
    transport.probe(MODELS_PATH).await
}

/// First half of the description followed by per-million-token prices
///
/// The result never grows past the original description: when it would,
/// it is cut to three characters short of the original length and `...`
/// is appended. For originals shorter than three characters the cut
/// counts back from the end of the combined text instead.
fn describe_with_pricing(model: &RemoteModel) -> String {
    let original: Vec<char> = model.description.as_deref().unwrap_or_default().chars().collect();
    let half: String = original[..original.len() / 2].iter().collect();

    let pricing = format!(
        "Price: ${}/1M tokens (prompt), ${}/1M tokens (completion)",
        format_price(per_million(&model.pricing.prompt)),
        format_price(per_million(&model.pricing.completion)),
    );
    let combined = format!("{half} {pricing}").trim().to_owned();

    let combined_len = combined.chars().count();
    if combined_len <= original.len() {
        return combined;
    }

    let keep = match original.len().checked_sub(3) {
        Some(end) => end.min(combined_len),
        None => combined_len.saturating_sub(3 - original.len()),
    };

    let mut truncated: String = combined.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

fn per_million(price: &str) -> f64 {
    price.trim().parse::<f64>().map_or(f64::NAN, |p| p * 1_000_000.0)
}

fn format_price(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if value == 0.0 {
        "0".to_owned()
    } else {
        value.to_string()
    }
}
