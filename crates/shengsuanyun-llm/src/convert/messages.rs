//! Caller messages to wire messages

use crate::protocol::WireMessage;
use crate::types::{Message, ToolCall};

/// Map messages to the API schema, preserving order
///
/// Content is flattened to text. `name` and `tool_call_id` are only sent
/// when non-empty and `tool_calls` only when the list is non-empty. The
/// streaming slot `index` of a tool call is not part of the request schema
/// and is dropped.
pub fn format_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages.iter().map(format_message).collect()
}

fn format_message(message: &Message) -> WireMessage {
    WireMessage {
        role: message.role.as_str().to_owned(),
        content: message.content.to_text(),
        tool_call_id: message.tool_call_id.clone().filter(|id| !id.is_empty()),
        name: message.name.clone().filter(|name| !name.is_empty()),
        tool_calls: message
            .tool_calls
            .as_ref()
            .filter(|calls| !calls.is_empty())
            .map(|calls| calls.iter().map(without_index).collect()),
    }
}

fn without_index(call: &ToolCall) -> ToolCall {
    ToolCall {
        index: None,
        ..call.clone()
    }
}
