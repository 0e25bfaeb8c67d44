//! Canonical message and tool types
//!
//! Callers build conversations from these; the wire schema lives in
//! [`crate::protocol`] and conversions between the two in [`crate::convert`].

pub mod ai;
pub mod message;
pub mod tool;

pub use ai::{AdditionalKwargs, AiMessage, ResponseMetadata, Usage};
pub use message::{Content, FunctionCall, FunctionChunk, Message, MessageKind, Role, ToolCall, ToolCallChunk};
pub use tool::ToolDescriptor;
