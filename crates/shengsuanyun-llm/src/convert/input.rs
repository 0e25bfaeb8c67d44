//! Caller input normalization

use serde_json::{Map, Value};

use crate::types::{Content, Message, MessageKind, Role, ToolCall};

/// Anything a caller may pass as a prompt
#[derive(Debug, Clone, PartialEq)]
pub enum ChatInput {
    /// A single user turn
    Text(String),
    /// An already-built conversation
    Messages(Vec<Message>),
    /// Loosely shaped JSON input from an orchestration layer
    Json(Value),
}

impl From<String> for ChatInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ChatInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<Message>> for ChatInput {
    fn from(messages: Vec<Message>) -> Self {
        Self::Messages(messages)
    }
}

impl From<Value> for ChatInput {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Turn any accepted input into an ordered list of messages
///
/// JSON input is matched in this order: an array of messages, a string, an
/// object with a `messages` list, an object with `content`. Anything else is
/// serialized and sent as one user turn. Nothing here fails.
pub fn normalize(input: ChatInput) -> Vec<Message> {
    match input {
        ChatInput::Text(text) => vec![Message::user(text)],
        ChatInput::Messages(messages) => messages,
        ChatInput::Json(value) => normalize_json(value),
    }
}

fn normalize_json(value: Value) -> Vec<Message> {
    match value {
        Value::Array(items) => items.into_iter().map(message_from_value).collect(),
        Value::String(text) => vec![Message::user(text)],
        Value::Object(mut fields) if fields.contains_key("messages") => {
            match fields.remove("messages").unwrap_or_default() {
                Value::Array(items) => items.into_iter().map(message_from_value).collect(),
                other => vec![message_from_value(other)],
            }
        }
        Value::Object(fields) if fields.contains_key("content") => vec![message_from_object(fields)],
        other => vec![Message::user(other.to_string())],
    }
}

/// Build one message from a JSON value
///
/// An object with a string `type` tag and `content` is a framework message
/// whose kind decides the role. An object with a non-empty string `role`
/// and `content` keeps that role. Any other object becomes a user turn whose
/// content is the whole object.
pub fn message_from_value(value: Value) -> Message {
    match value {
        Value::Object(fields) => message_from_object(fields),
        Value::String(text) => Message::user(text),
        other => Message::user(Content::Structured(other)),
    }
}

fn message_from_object(mut fields: Map<String, Value>) -> Message {
    let has_content = fields.contains_key("content");
    let role = match (fields.get("type"), fields.get("role")) {
        (Some(Value::String(tag)), _) if has_content => Some(MessageKind::from(tag.as_str()).role()),
        (_, Some(Value::String(role))) if has_content && !role.is_empty() => Some(Role::from(role.clone())),
        _ => None,
    };
    let Some(role) = role else {
        return Message::user(Content::Structured(Value::Object(fields)));
    };

    let content = Content::from(fields.remove("content").unwrap_or_default());
    let mut message = Message::new(role, content);
    message.name = take_string(&mut fields, "name");
    message.tool_call_id = take_string(&mut fields, "tool_call_id");
    message.tool_calls = fields
        .remove("tool_calls")
        .and_then(|calls| match serde_json::from_value::<Vec<ToolCall>>(calls) {
            Ok(calls) => Some(calls),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable tool_calls on input message");
                None
            }
        });

    message
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}
