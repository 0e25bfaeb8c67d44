//! Chat node: one blocking completion per workflow item

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::convert::format_messages;
use crate::error::LlmError;
use crate::model::CHAT_COMPLETIONS_PATH;
use crate::protocol::WireMessage;
use crate::transport::Transport;
use crate::types::Message;

/// Temperature used when an item does not set one
pub const DEFAULT_ITEM_TEMPERATURE: f64 = 0.9;

/// Parameters of one workflow item
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatItem {
    pub model: String,
    /// Sent as a system turn when non-empty
    #[serde(default)]
    pub system_prompt: String,
    pub message: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub additional: AdditionalFields,
}

impl ChatItem {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: String::new(),
            message: message.into(),
            temperature: DEFAULT_ITEM_TEMPERATURE,
            additional: AdditionalFields::default(),
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }
}

/// Optional request fields, sent only when set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdditionalFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

/// Output record paired with the index of the item that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    /// `{"response": ...}` on success, `{"error": ...}` for a tolerated failure
    pub json: Value,
    pub paired_item: usize,
}

#[derive(Serialize)]
struct NodeRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f64,
    #[serde(flatten)]
    additional: &'a AdditionalFields,
}

/// Runs chat items against the router
#[derive(Debug, Clone)]
pub struct ChatNode {
    transport: Transport,
}

impl ChatNode {
    pub const fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Process items in order
    ///
    /// With `continue_on_fail` a failing item yields an `error` record and
    /// processing moves on; otherwise the first failure is returned.
    pub async fn execute(&self, items: &[ChatItem], continue_on_fail: bool) -> Result<Vec<NodeOutput>, LlmError> {
        self.transport.require_api_key()?;

        let mut outputs = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let json = match self.run_item(item).await {
                Ok(response) => json!({ "response": response }),
                Err(e) if continue_on_fail => {
                    tracing::warn!(item = index, error = %e, "chat item failed");
                    json!({ "error": e.to_string() })
                }
                Err(e) => return Err(e),
            };

            outputs.push(NodeOutput {
                json,
                paired_item: index,
            });
        }

        Ok(outputs)
    }

    async fn run_item(&self, item: &ChatItem) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if !item.system_prompt.is_empty() {
            messages.push(Message::system(item.system_prompt.as_str()));
        }
        messages.push(Message::user(item.message.as_str()));

        let request = NodeRequest {
            model: &item.model,
            messages: format_messages(&messages),
            temperature: item.temperature,
            additional: &item.additional,
        };

        let response: Value = self.transport.post_json(CHAT_COMPLETIONS_PATH, &request).await?;

        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
            .map(|content| content.trim().to_owned())
            .ok_or_else(|| {
                LlmError::ResponseShape("invalid response format: missing choices[0].message.content".to_owned())
            })
    }
}

const fn default_temperature() -> f64 {
    DEFAULT_ITEM_TEMPERATURE
}
