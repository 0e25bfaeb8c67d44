//! Chat-completion connector for the ShengSuanYun router
//!
//! Normalizes caller input into wire messages, sends blocking or streaming
//! requests, and rebuilds [`AiMessage`]s from responses. Streaming replies
//! are decoded by [`stream::StreamReassembler`], which stitches fragmented
//! tool-call arguments back together per call index.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod model;
pub mod models;
pub mod node;
pub mod protocol;
pub mod request;
pub mod stream;
pub mod transport;
pub mod types;

pub use convert::ChatInput;
pub use error::LlmError;
pub use model::ChatModel;
pub use models::{ModelOption, list_models, model_options, verify_credentials};
pub use node::{ChatItem, ChatNode, NodeOutput};
pub use request::{CallOptions, ChatOptions};
pub use stream::{ChatStream, StreamReassembler};
pub use transport::Transport;
pub use types::{AiMessage, Message, ToolCall, ToolDescriptor};
