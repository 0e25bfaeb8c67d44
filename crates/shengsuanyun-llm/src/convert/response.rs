//! Wire responses to [`AiMessage`]

use crate::protocol::{ChatCompletionResponse, WireChoice, WireMessageBody};
use crate::types::{AdditionalKwargs, AiMessage, ResponseMetadata, ToolCall};

/// Build the reply of a blocking call
///
/// A response without choices or without a message yields an empty
/// assistant reply rather than an error.
impl From<ChatCompletionResponse> for AiMessage {
    fn from(response: ChatCompletionResponse) -> Self {
        let ChatCompletionResponse {
            id,
            model,
            created,
            choices,
            usage,
        } = response;

        let mut choice = choices.into_iter().next().unwrap_or_default();
        let message = choice.message.take().unwrap_or_default();
        let tool_chunks = message.tool_calls.filter(|calls| !calls.is_empty());

        Self {
            content: message.content.unwrap_or_default(),
            tool_calls: tool_chunks
                .iter()
                .flatten()
                .cloned()
                .map(ToolCall::from)
                .collect(),
            tool_call_chunks: Vec::new(),
            additional_kwargs: AdditionalKwargs {
                tool_calls: tool_chunks,
                function_call: message.function_call,
            },
            usage_metadata: usage,
            response_metadata: metadata(id, model, created, choice),
        }
    }
}

impl AiMessage {
    /// Build the increment for one stream event
    ///
    /// `tool_calls` is the caller's accumulated snapshot; this event's own
    /// fragments go to `tool_call_chunks`.
    pub fn from_delta(event: ChatCompletionResponse, tool_calls: Vec<ToolCall>) -> Self {
        let ChatCompletionResponse {
            id,
            model,
            created,
            choices,
            usage,
        } = event;

        let mut choice = choices.into_iter().next().unwrap_or_default();
        let WireMessageBody {
            content,
            tool_calls: chunks,
            function_call,
            ..
        } = choice.delta.take().unwrap_or_default();

        Self {
            content: content.unwrap_or_default(),
            tool_calls,
            tool_call_chunks: chunks.clone().unwrap_or_default(),
            additional_kwargs: AdditionalKwargs {
                tool_calls: chunks,
                function_call,
            },
            usage_metadata: usage,
            response_metadata: metadata(id, model, created, choice),
        }
    }
}

fn metadata(id: Option<String>, model: Option<String>, created: Option<u64>, choice: WireChoice) -> ResponseMetadata {
    ResponseMetadata {
        id,
        model,
        created,
        finish_reason: choice.finish_reason,
        logprobs: choice.logprobs.filter(|v| !v.is_null()),
    }
}
