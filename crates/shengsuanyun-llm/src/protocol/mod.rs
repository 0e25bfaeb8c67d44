//! ShengSuanYun router wire format
//!
//! The router speaks the `OpenAI` chat-completion dialect.

pub mod chat;
pub mod models;

pub use chat::{ChatCompletionResponse, ChatRequest, ResponseFormat, WireChoice, WireMessage, WireMessageBody};
pub use models::{ModelPricing, RemoteModel};
