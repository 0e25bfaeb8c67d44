//! Model catalogue returned by `GET /models`

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A model offered by the router
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub pricing: ModelPricing,
}

/// Per-token prices, as decimal strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(default, deserialize_with = "price")]
    pub prompt: String,
    #[serde(default, deserialize_with = "price")]
    pub completion: String,
}

/// Accept prices sent as strings or bare numbers
fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
