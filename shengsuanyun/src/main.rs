#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;
use std::path::Path;

use args::{Args, Command};
use clap::Parser;
use futures::StreamExt;
use shengsuanyun_config::Config;
use shengsuanyun_llm::node::{AdditionalFields, DEFAULT_ITEM_TEMPERATURE};
use shengsuanyun_llm::{
    CallOptions, ChatItem, ChatModel, ChatNode, Message, ToolCall, ToolDescriptor, Transport, list_models, model_options,
    verify_credentials,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    let _telemetry_guard = shengsuanyun_telemetry::init(config.telemetry.as_ref(), "info")?;

    tracing::debug!(
        config_path = %args.config.display(),
        base_url = %config.credentials.base_url,
        "loaded configuration"
    );

    match args.command {
        Command::Chat {
            messages,
            system,
            model,
            temperature,
            continue_on_fail,
            json,
        } => {
            let model = model
                .or_else(|| config.model.name.clone())
                .ok_or_else(|| anyhow::anyhow!("no model given; pass --model or set model.name"))?;
            let items: Vec<ChatItem> = messages
                .into_iter()
                .map(|message| ChatItem {
                    model: model.clone(),
                    system_prompt: system.clone().unwrap_or_default(),
                    message,
                    temperature: temperature
                        .or(config.model.temperature)
                        .unwrap_or(DEFAULT_ITEM_TEMPERATURE),
                    additional: AdditionalFields {
                        frequency_penalty: config.model.frequency_penalty,
                        max_tokens: config.model.max_tokens,
                        presence_penalty: config.model.presence_penalty,
                        top_p: config.model.top_p,
                    },
                })
                .collect();

            chat(&config, &items, continue_on_fail, json).await
        }
        Command::Stream {
            message,
            system,
            model,
            tools,
        } => {
            if model.is_some() {
                config.model.name = model;
            }
            stream(&config, system, message, tools.as_deref()).await
        }
        Command::Models { json } => models(&config, json).await,
        Command::Verify => {
            let transport = Transport::new(&config.credentials, &config.client)?;
            verify_credentials(&transport).await?;
            println!("credentials accepted by {}", config.credentials.base_url);
            Ok(())
        }
    }
}

async fn chat(config: &Config, items: &[ChatItem], continue_on_fail: bool, json: bool) -> anyhow::Result<()> {
    let node = ChatNode::new(Transport::new(&config.credentials, &config.client)?);
    let outputs = node.execute(items, continue_on_fail).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    for output in outputs {
        match (output.json.get("response"), output.json.get("error")) {
            (Some(response), _) => println!("{}", response.as_str().unwrap_or_default()),
            (None, Some(error)) => eprintln!("item {}: {}", output.paired_item, error.as_str().unwrap_or_default()),
            (None, None) => {}
        }
    }

    Ok(())
}

async fn stream(config: &Config, system: Option<String>, message: String, tools: Option<&Path>) -> anyhow::Result<()> {
    let model = ChatModel::from_config(config)?;
    let model = match tools {
        Some(path) => model.bind_tools(read_tools(path)?),
        None => model,
    };

    let mut messages: Vec<Message> = system.map(Message::system).into_iter().collect();
    messages.push(Message::user(message));

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_clone.cancel();
        }
    });

    let mut increments = model.stream(messages, &CallOptions::default()).await?;
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!("stream cancelled");
                break;
            }
            next = increments.next() => {
                let Some(increment) = next else { break };
                let increment = increment?;

                write!(stdout, "{}", increment.content)?;
                stdout.flush()?;

                if !increment.tool_calls.is_empty() {
                    tool_calls = increment.tool_calls;
                }
            }
        }
    }
    writeln!(stdout)?;

    for call in tool_calls {
        println!("tool call {} {}({})", call.id, call.function.name, call.function.arguments);
    }

    Ok(())
}

async fn models(config: &Config, json: bool) -> anyhow::Result<()> {
    let transport = Transport::new(&config.credentials, &config.client)?;
    let options = model_options(&list_models(&transport).await?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        for option in options {
            println!("{}\t{}\t{}", option.value, option.name, option.description);
        }
    }

    Ok(())
}

fn read_tools(path: &Path) -> anyhow::Result<Vec<ToolDescriptor>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read tools file {}: {e}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse tools file: {e}"))?;

    match value {
        serde_json::Value::Array(tools) => Ok(tools.into_iter().map(ToolDescriptor::from_value).collect()),
        _ => anyhow::bail!("tools file must contain a JSON array"),
    }
}
