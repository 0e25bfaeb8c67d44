//! Chat model facade

use std::sync::Arc;

use serde_json::{Value, json};
use shengsuanyun_config::Config;

use crate::convert::{ChatInput, format_messages, normalize};
use crate::error::LlmError;
use crate::protocol::{ChatCompletionResponse, ChatRequest};
use crate::request::{CallOptions, ChatOptions, build_request};
use crate::stream::{ChatStream, reassemble};
use crate::transport::Transport;
use crate::types::{AiMessage, ToolDescriptor};

/// Path of the chat-completion endpoint below the API root
pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Identifier reported by [`ChatModel::llm_type`]
pub const LLM_TYPE: &str = "shengsuanyun-chat";

/// A chat model served by the router
///
/// Cloning is cheap and clones share one HTTP client. Each call builds its
/// own request and, when streaming, its own reassembly state.
#[derive(Debug, Clone)]
pub struct ChatModel {
    transport: Arc<Transport>,
    model: String,
    options: ChatOptions,
    bound_tools: Vec<ToolDescriptor>,
}

impl ChatModel {
    /// Create a model with configured sampling defaults
    pub fn new(transport: Transport, model: impl Into<String>, options: ChatOptions) -> Result<Self, LlmError> {
        transport.require_api_key()?;

        let model = model.into();
        if model.trim().is_empty() {
            return Err(LlmError::Config("model id must not be empty".to_owned()));
        }

        Ok(Self {
            transport: Arc::new(transport),
            model,
            options,
            bound_tools: Vec::new(),
        })
    }

    /// Create a model from a loaded configuration file
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let transport = Transport::new(&config.credentials, &config.client)?;
        let model = config
            .model
            .name
            .clone()
            .ok_or_else(|| LlmError::Config("model.name is required".to_owned()))?;

        Self::new(transport, model, ChatOptions::from(&config.model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub const fn options(&self) -> ChatOptions {
        self.options
    }

    pub fn bound_tools(&self) -> &[ToolDescriptor] {
        &self.bound_tools
    }

    /// A copy of this model with `tools` bound to every call
    ///
    /// Tools passed in [`CallOptions`] still take precedence.
    #[must_use]
    pub fn bind_tools(&self, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            bound_tools: tools,
            ..self.clone()
        }
    }

    pub const fn llm_type() -> &'static str {
        LLM_TYPE
    }

    /// Serializable summary; never includes the API key
    pub fn describe(&self) -> Value {
        json!({
            "_type": LLM_TYPE,
            "model": self.model,
            "baseURL": self.transport.base_url().as_str().trim_end_matches('/'),
        })
    }

    /// Send one blocking request
    pub async fn invoke(&self, input: impl Into<ChatInput>, call: &CallOptions) -> Result<AiMessage, LlmError> {
        let request = self.prepare(input.into(), call, false);
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "invoking chat completion"
        );

        let response: ChatCompletionResponse = self.transport.post_json(CHAT_COMPLETIONS_PATH, &request).await?;
        Ok(AiMessage::from(response))
    }

    /// Send one streaming request
    ///
    /// The returned stream yields one increment per event and must be
    /// consumed by a single reader. Dropping it closes the connection.
    pub async fn stream(&self, input: impl Into<ChatInput>, call: &CallOptions) -> Result<ChatStream, LlmError> {
        let request = self.prepare(input.into(), call, true);
        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "streaming chat completion"
        );

        let body = self.transport.post_stream(CHAT_COMPLETIONS_PATH, &request).await?;
        Ok(reassemble(body))
    }

    /// Invoke each input in turn, stopping at the first failure
    pub async fn batch<I>(&self, inputs: impl IntoIterator<Item = I>, call: &CallOptions) -> Result<Vec<AiMessage>, LlmError>
    where
        I: Into<ChatInput>,
    {
        let mut results = Vec::new();
        for input in inputs {
            results.push(self.invoke(input, call).await?);
        }
        Ok(results)
    }

    fn prepare(&self, input: ChatInput, call: &CallOptions, stream: bool) -> ChatRequest {
        let messages = format_messages(&normalize(input));
        let tools = call.tools.as_deref().unwrap_or(&self.bound_tools);

        build_request(&self.model, messages, call.options.or(self.options), tools, stream)
    }
}
