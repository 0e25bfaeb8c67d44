//! Request body assembly

use serde_json::Value;
use shengsuanyun_config::{ModelConfig, ResponseFormatKind};

use crate::protocol::{ChatRequest, ResponseFormat, WireMessage};
use crate::types::ToolDescriptor;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_PRESENCE_PENALTY: f64 = 0.0;
pub const DEFAULT_FREQUENCY_PENALTY: f64 = 0.0;

/// Sampling options; unset fields defer to the next layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub max_tokens: Option<i64>,
    pub response_format: Option<ResponseFormatKind>,
}

impl ChatOptions {
    /// Fill unset fields from `fallback`
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            temperature: self.temperature.or(fallback.temperature),
            top_p: self.top_p.or(fallback.top_p),
            presence_penalty: self.presence_penalty.or(fallback.presence_penalty),
            frequency_penalty: self.frequency_penalty.or(fallback.frequency_penalty),
            max_tokens: self.max_tokens.or(fallback.max_tokens),
            response_format: self.response_format.or(fallback.response_format),
        }
    }
}

impl From<&ModelConfig> for ChatOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            max_tokens: config.max_tokens,
            response_format: config.response_format,
        }
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub options: ChatOptions,
    /// Replaces any tools bound to the model for this call
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl CallOptions {
    #[must_use]
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Assemble the chat-completion body
///
/// `options` must already be resolved against configured defaults; the
/// hard-coded defaults fill whatever is still unset.
pub fn build_request(
    model: &str,
    messages: Vec<WireMessage>,
    options: ChatOptions,
    tools: &[ToolDescriptor],
    stream: bool,
) -> ChatRequest {
    let tools = (!tools.is_empty()).then(|| format_tools(tools));

    ChatRequest {
        model: model.to_owned(),
        messages,
        temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        top_p: options.top_p.unwrap_or(DEFAULT_TOP_P),
        presence_penalty: options.presence_penalty.unwrap_or(DEFAULT_PRESENCE_PENALTY),
        frequency_penalty: options.frequency_penalty.unwrap_or(DEFAULT_FREQUENCY_PENALTY),
        max_tokens: options.max_tokens.filter(|&n| n > 0),
        response_format: options
            .response_format
            .filter(|&kind| kind != ResponseFormatKind::Text)
            .map(|kind| ResponseFormat {
                format_type: kind.as_str().to_owned(),
            }),
        tool_choice: tools.as_ref().map(|_| "auto".to_owned()),
        tools,
        stream: stream.then_some(true),
    }
}

/// Normalize tool descriptors into the function-calling schema
pub fn format_tools(tools: &[ToolDescriptor]) -> Vec<Value> {
    tools.iter().map(ToolDescriptor::to_wire).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::convert::{format_messages, normalize};

    fn hello() -> Vec<WireMessage> {
        format_messages(&normalize("Hello".into()))
    }

    #[test]
    fn defaults_for_plain_prompt() {
        let request = build_request("openai/gpt-4.1-mini", hello(), ChatOptions::default(), &[], false);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "openai/gpt-4.1-mini",
                "messages": [{"role": "user", "content": "Hello"}],
                "temperature": 0.7,
                "top_p": 1.0,
                "presence_penalty": 0.0,
                "frequency_penalty": 0.0
            })
        );
    }

    #[test]
    fn call_options_beat_configured_defaults() {
        let configured = ChatOptions {
            temperature: Some(0.2),
            top_p: Some(0.9),
            ..ChatOptions::default()
        };
        let call = ChatOptions {
            temperature: Some(1.1),
            ..ChatOptions::default()
        };

        let request = build_request("m", hello(), call.or(configured), &[], false);

        assert!((request.temperature - 1.1).abs() < f64::EPSILON);
        assert!((request.top_p - 0.9).abs() < f64::EPSILON);
        assert!(request.presence_penalty.abs() < f64::EPSILON);
    }

    #[test]
    fn non_positive_max_tokens_are_omitted() {
        for max_tokens in [Some(0), Some(-1), None] {
            let options = ChatOptions {
                max_tokens,
                ..ChatOptions::default()
            };
            assert_eq!(build_request("m", hello(), options, &[], false).max_tokens, None);
        }

        let options = ChatOptions {
            max_tokens: Some(256),
            ..ChatOptions::default()
        };
        assert_eq!(build_request("m", hello(), options, &[], false).max_tokens, Some(256));
    }

    #[test]
    fn response_format_only_when_not_text() {
        let text = ChatOptions {
            response_format: Some(ResponseFormatKind::Text),
            ..ChatOptions::default()
        };
        assert!(build_request("m", hello(), text, &[], false).response_format.is_none());

        let json_object = ChatOptions {
            response_format: Some(ResponseFormatKind::JsonObject),
            ..ChatOptions::default()
        };
        let value = serde_json::to_value(build_request("m", hello(), json_object, &[], false)).unwrap();
        assert_eq!(value["response_format"], json!({"type": "json_object"}));
    }

    #[test]
    fn tools_attach_auto_tool_choice() {
        let tools = [ToolDescriptor::function("ping", "Check liveness", json!({}))];

        let value = serde_json::to_value(build_request("m", hello(), ChatOptions::default(), &tools, false)).unwrap();

        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["tools"][0]["function"]["name"], "ping");
    }

    #[test]
    fn empty_tool_list_sends_nothing() {
        let request = build_request("m", hello(), ChatOptions::default(), &[], false);

        assert!(request.tools.is_none());
        assert!(request.tool_choice.is_none());
    }

    #[test]
    fn stream_flag_only_when_streaming() {
        assert_eq!(build_request("m", hello(), ChatOptions::default(), &[], true).stream, Some(true));
        assert_eq!(build_request("m", hello(), ChatOptions::default(), &[], false).stream, None);
    }

    #[test]
    fn model_config_becomes_options() {
        let config = ModelConfig {
            temperature: Some(0.1),
            max_tokens: Some(64),
            response_format: Some(ResponseFormatKind::JsonObject),
            ..ModelConfig::default()
        };

        let options = ChatOptions::from(&config);
        assert_eq!(options.temperature, Some(0.1));
        assert_eq!(options.max_tokens, Some(64));
        assert_eq!(options.response_format, Some(ResponseFormatKind::JsonObject));
    }
}
