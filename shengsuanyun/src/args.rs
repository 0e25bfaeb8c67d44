use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ShengSuanYun chat-completion client
#[derive(Debug, Parser)]
#[command(name = "shengsuanyun", about = "Chat with models served by the ShengSuanYun router")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "shengsuanyun.toml", env = "SHENGSUANYUN_CONFIG", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send each message as its own chat item and print the replies
    Chat {
        /// Messages to send, one request each
        #[arg(required = true)]
        messages: Vec<String>,

        /// System prompt sent before every message
        #[arg(short, long)]
        system: Option<String>,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Record failures per message instead of stopping
        #[arg(long)]
        continue_on_fail: bool,

        /// Print the raw output records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream a reply as it is generated
    Stream {
        /// Message to send
        message: String,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// JSON file holding an array of tool descriptions
        #[arg(long)]
        tools: Option<PathBuf>,
    },

    /// List the models offered by the router
    Models {
        /// Print the options as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the configured API key is accepted
    Verify,
}
