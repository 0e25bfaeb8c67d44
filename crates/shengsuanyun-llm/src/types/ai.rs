//! Messages produced by the model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{Message, MessageKind, ToolCall, ToolCallChunk};

/// Token usage reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Raw tool-calling fields surfaced next to the content
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdditionalKwargs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallChunk>>,
    /// Legacy single function call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
}

/// Identification of the response a message came from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,
}

/// A message produced by the model
///
/// Blocking calls produce one per request; streaming calls produce one per
/// event. In the streaming case `content` is only that event's text while
/// `tool_calls` is the snapshot of every call assembled so far, ordered by
/// slot index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AiMessage {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// Raw fragments carried by this stream event
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    pub additional_kwargs: AdditionalKwargs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<Usage>,
    pub response_metadata: ResponseMetadata,
}

impl AiMessage {
    #[allow(clippy::unused_self)]
    pub const fn kind(&self) -> MessageKind {
        MessageKind::Ai
    }
}

/// Feed a model reply back into the conversation history
impl From<AiMessage> for Message {
    fn from(message: AiMessage) -> Self {
        let reply = Self::from_kind(&message.kind(), message.content);
        if message.tool_calls.is_empty() {
            reply
        } else {
            reply.with_tool_calls(message.tool_calls)
        }
    }
}
