//! CLI module for ragchat
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `chat` - Interactive chat (streaming by default)
//! - `ask` - One-shot question
//! - `ingest` - Upload documents
//! - `delete` - Remove documents by key, filename, or all
//! - `documents` - List ingested documents
//! - `stats` - Show backend timing statistics
//! - `watch` - Refresh stats and documents periodically
//! - `bench` - Streaming load benchmark
//! - `config` - Configuration utilities (init, show)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Chat against a local backend
//! ragchat chat --url http://localhost:8000
//!
//! # Upload documents, then list them
//! ragchat ingest guide.pdf notes.txt
//! ragchat documents --json
//!
//! # 200 requests over 20 workers after a 10 request warmup
//! ragchat bench --concurrency 20 --requests 200 --warmup-requests 10
//! ```

pub mod bench;
pub mod chat;
pub mod completions;
pub mod config;
pub mod documents;
pub mod output;
pub mod setup;
pub mod stats;

pub use completions::handle_completions;
pub use config::{handle_config_init, handle_config_show};
pub use setup::{load_config_with_overrides, prepare, Context};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ragchat - terminal client for a RAG chat backend
#[derive(Parser, Debug)]
#[command(
    name = "ragchat",
    version,
    about = "Chat, ingest and benchmark against a streaming RAG backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat
    Chat(ChatArgs),
    /// Ask a single question
    Ask(AskArgs),
    /// Upload documents for retrieval
    Ingest(IngestArgs),
    /// Delete ingested documents
    Delete(DeleteArgs),
    /// List ingested documents
    Documents(DocumentsArgs),
    /// Show backend timing statistics
    Stats(StatsArgs),
    /// Refresh stats and documents until interrupted
    Watch(WatchArgs),
    /// Run a streaming load benchmark
    Bench(BenchArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to the backend.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "ragchat.toml")]
    pub config: PathBuf,

    /// Override backend base URL
    #[arg(short, long, env = "RAGCHAT_BACKEND_URL")]
    pub url: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RAGCHAT_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Use the non-streaming /query endpoint
    #[arg(long)]
    pub no_stream: bool,

    /// Continue an existing server session
    #[arg(short, long)]
    pub session: Option<String>,

    /// Cap on generated tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// The question
    pub query: String,

    /// Use the non-streaming /query endpoint
    #[arg(long)]
    pub no_stream: bool,

    /// Continue an existing server session
    #[arg(short, long)]
    pub session: Option<String>,

    /// Cap on generated tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Print the retrieved documents after the answer
    #[arg(long)]
    pub show_documents: bool,

    /// Output the completed request as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Files to upload (.pdf, .txt, .docx, .html)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .args(["key", "filename", "all"])
))]
pub struct DeleteArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Ingest key to delete (repeatable)
    #[arg(short, long)]
    pub key: Vec<String>,

    /// Uploaded filename to delete (repeatable)
    #[arg(short, long)]
    pub filename: Vec<String>,

    /// Delete every document
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Override poll interval in seconds
    #[arg(short, long, env = "RAGCHAT_POLL_INTERVAL")]
    pub interval: Option<u64>,
}

#[derive(Args, Debug)]
pub struct BenchArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Concurrent requests
    #[arg(long, default_value = "10")]
    pub concurrency: usize,

    /// Total measured requests
    #[arg(long, default_value = "100")]
    pub requests: usize,

    /// Warmup requests (not counted in primary stats)
    #[arg(long, default_value = "0")]
    pub warmup_requests: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "120")]
    pub timeout: u64,

    /// Maximum output tokens per request
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Read the prompt from a file
    #[arg(long)]
    pub prompt_file: Option<PathBuf>,

    /// Write the summary JSON to a file
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Print up to N error messages
    #[arg(long, default_value = "0")]
    pub show_errors: usize,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Print the effective configuration after file, env and flag layering
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "ragchat.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
