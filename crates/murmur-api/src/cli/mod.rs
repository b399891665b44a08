//! CLI definitions for the `murmur` binary.
//!
//! Every service flag can also be set through a `MURMUR_*` environment
//! variable, which is how the service is normally configured.

pub mod cursor;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use murmur_types::event::Cursor;

/// Reply bot for the AT Protocol network backed by a Letta agent.
#[derive(Parser)]
#[command(name = "murmur", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log at debug level when RUST_LOG is unset.
    #[arg(long, global = true, env = "MURMUR_DEBUG")]
    pub debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "MURMUR_LOG_JSON")]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "MURMUR_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the reply service.
    Run(Box<RunArgs>),

    /// Inspect or rewind the persisted event cursor.
    Cursor {
        #[command(subcommand)]
        action: CursorCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CursorCommand {
    /// Print the persisted cursor.
    Show {
        #[arg(long, env = "MURMUR_CURSOR_FILE")]
        cursor_file: PathBuf,
    },

    /// Overwrite the persisted cursor.
    Set {
        #[arg(long, env = "MURMUR_CURSOR_FILE")]
        cursor_file: PathBuf,

        /// Feed sequence (microseconds) to resume from.
        value: Cursor,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Jetstream websocket base URL.
    #[arg(long, env = "MURMUR_RELAY_HOST", default_value = "wss://jetstream2.us-east.bsky.network")]
    pub relay_host: String,

    /// File holding the last processed feed position.
    #[arg(long, env = "MURMUR_CURSOR_FILE")]
    pub cursor_file: PathBuf,

    /// SQLite URL for memory block bindings (defaults under MURMUR_DATA_DIR).
    #[arg(long, env = "MURMUR_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Optional TOML file with runtime tunables.
    #[arg(long, env = "MURMUR_CONFIG")]
    pub config: Option<PathBuf>,

    /// ClickHouse HTTP endpoint of the post archive.
    #[arg(long, env = "MURMUR_CLICKHOUSE_ADDR")]
    pub clickhouse_addr: String,

    #[arg(long, env = "MURMUR_CLICKHOUSE_DATABASE")]
    pub clickhouse_database: String,

    #[arg(long, env = "MURMUR_CLICKHOUSE_USER", default_value = "default")]
    pub clickhouse_user: String,

    #[arg(long, env = "MURMUR_CLICKHOUSE_PASS", hide_env_values = true)]
    pub clickhouse_pass: String,

    /// DID of the bot account.
    #[arg(long, env = "MURMUR_BOT_DID")]
    pub bot_did: String,

    /// Handle or email used to log in.
    #[arg(long, env = "MURMUR_BOT_IDENTIFIER")]
    pub bot_identifier: String,

    #[arg(long, env = "MURMUR_BOT_PASSWORD", hide_env_values = true)]
    pub bot_password: String,

    /// Base URL of the bot's PDS.
    #[arg(long, env = "MURMUR_BOT_PDS_HOST")]
    pub bot_pds_host: String,

    /// DIDs allowed to trigger replies in admin-only mode.
    #[arg(long, env = "MURMUR_BOT_ADMINS", value_delimiter = ',')]
    pub bot_admins: Vec<String>,

    /// Only reply to admins.
    #[arg(long, env = "MURMUR_ADMIN_ONLY")]
    pub admin_only: bool,

    /// DIDs the bot never replies to.
    #[arg(long, env = "MURMUR_IGNORE_DIDS", value_delimiter = ',')]
    pub ignore_dids: Vec<String>,

    #[arg(long, env = "MURMUR_LETTA_HOST")]
    pub letta_host: String,

    #[arg(long, env = "MURMUR_LETTA_API_KEY", hide_env_values = true)]
    pub letta_api_key: String,

    /// Identifier of the Letta agent every turn runs on.
    #[arg(long, env = "MURMUR_LETTA_AGENT_ID")]
    pub letta_agent_id: String,

    /// Bearer token the agent's tools present to the tool endpoints.
    #[arg(long, env = "MURMUR_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Listen address of the tool endpoints.
    #[arg(long, env = "MURMUR_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: String,
}
