use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message author as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// System instruction
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
    /// Tool result
    Tool,
    /// Any other role string, forwarded verbatim
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Other(role) => role,
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            _ => Self::Other(role),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(role) => role,
            other => other.as_str().to_owned(),
        }
    }
}

/// Message kind tag used by orchestration frameworks
///
/// Kinds are resolved to a [`Role`] once, when a message is built, so
/// nothing downstream needs to know which vocabulary the caller used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Human,
    Ai,
    System,
    Tool,
    /// Unrecognized tag; treated as a user turn
    Unknown(String),
}

impl MessageKind {
    /// Wire role for this kind
    pub const fn role(&self) -> Role {
        match self {
            Self::Ai => Role::Assistant,
            Self::System => Role::System,
            Self::Tool => Role::Tool,
            Self::Human | Self::Unknown(_) => Role::User,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::System => "system",
            Self::Tool => "tool",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(tag: &str) -> Self {
        match tag {
            "human" => Self::Human,
            "ai" => Self::Ai,
            "system" => Self::System,
            "tool" => Self::Tool,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

/// Message content before flattening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Plain text
    Text(String),
    /// Any other JSON value (content parts, objects, numbers)
    Structured(Value),
}

impl Content {
    /// Flatten to the single string the API accepts
    ///
    /// Arrays are joined with newlines, serializing non-string elements as
    /// JSON. Every other non-string value is serialized as JSON.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(Value::String(text)) => text.clone(),
            Self::Structured(Value::Array(parts)) => parts
                .iter()
                .map(|part| match part {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Structured(other) => other.to_string(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Structured(other),
        }
    }
}

/// A conversational turn supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Content,
    /// Participant name
    pub name: Option<String>,
    /// ID of the tool call this message answers
    pub tool_call_id: Option<String>,
    /// Tool calls previously requested by the assistant
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Build a message from a framework kind tag
    pub fn from_kind(kind: &MessageKind, content: impl Into<Content>) -> Self {
        Self::new(kind.role(), content)
    }

    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tool result answering `tool_call_id`
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }
}

/// A complete tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
    pub function: FunctionCall,
    /// Accumulator slot the call was assembled in (streaming only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// One tool-call fragment as it appears in a response or stream delta
///
/// Every field is optional: streamed fragments usually carry only `index`
/// and a slice of `function.arguments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionChunk>,
}

/// Partial function data within a [`ToolCallChunk`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl From<ToolCallChunk> for ToolCall {
    fn from(chunk: ToolCallChunk) -> Self {
        let function = chunk.function.unwrap_or_default();
        Self {
            id: chunk.id.unwrap_or_default(),
            tool_type: chunk.tool_type.unwrap_or_else(default_tool_type),
            function: FunctionCall {
                name: function.name.unwrap_or_default(),
                arguments: function.arguments.unwrap_or_default(),
            },
            index: chunk.index,
        }
    }
}

pub(crate) fn default_tool_type() -> String {
    "function".to_owned()
}
