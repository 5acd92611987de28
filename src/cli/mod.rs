//! Command-line interface for studio-llm.

use clap::{Parser, Subcommand};

/// Local LLM helper for the creator studio
#[derive(Parser, Debug)]
#[command(name = "studio-llm", version, about = "Talk to a local Ollama server")]
pub struct Cli {
    /// Server URL (overrides OLLAMA_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file path (default: ~/.studio-llm/config.toml)
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the server is reachable
    Status,
    /// List installed models
    Models,
    /// Stream a one-off completion
    Generate(GenerateArgs),
    /// Interactive multi-turn chat
    Chat(ChatArgs),
    /// Download a model
    Pull(ModelArgs),
    /// Delete a model
    Rm(ModelArgs),
}

/// Arguments for `studio-llm generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Model to use (default from config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Max tokens to generate
    #[arg(long)]
    pub max_tokens: Option<i32>,

    /// Prompt (positional)
    pub prompt: String,
}

/// Arguments for `studio-llm chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (default from config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,
}

/// A single model name argument.
#[derive(Parser, Debug)]
pub struct ModelArgs {
    /// Model name, e.g. llama3.2 or mistral:7b
    pub model: String,
}

/// One line of pull progress, e.g. `pulling 6a0746a1ec1a  42%`.
pub fn format_progress(progress: &crate::stream::PullProgress) -> String {
    match progress.percent() {
        Some(pct) => format!("{}  {pct}%", progress.status),
        None => progress.status.clone(),
    }
}
