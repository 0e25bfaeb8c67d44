use serde::Deserialize;

/// Output format requested from the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatKind {
    /// Free-form text, the API default
    #[default]
    Text,
    /// A single JSON object
    JsonObject,
}

impl ResponseFormatKind {
    /// Wire name of the format
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::JsonObject => "json_object",
        }
    }
}

/// Model selection and configured sampling defaults
///
/// Every sampling field is optional. Unset fields fall back to the
/// connector's hard-coded defaults when a request is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model identifier (e.g. `openai/gpt-4.1-mini`)
    #[serde(default)]
    pub name: Option<String>,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold (0.0 to 1.0)
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Presence penalty (-2.0 to 2.0)
    #[serde(default)]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty (-2.0 to 2.0)
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    /// Completion length cap; non-positive values are never sent
    #[serde(default)]
    pub max_tokens: Option<i64>,
    /// Requested output format
    #[serde(default)]
    pub response_format: Option<ResponseFormatKind>,
}
