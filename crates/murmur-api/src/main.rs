//! murmur service entry point.
//!
//! Binary name: `murmur`
//!
//! Parses CLI arguments, installs tracing, then either runs the reply
//! service or one of the maintenance commands.

mod cli;
mod http;
mod runner;
mod state;

use clap::Parser;
use clap_complete::generate;
use murmur_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, CursorCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "murmur", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(TracingOptions {
        debug: cli.debug,
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Run(args) => runner::run(*args).await,
        Commands::Cursor { action } => match action {
            CursorCommand::Show { cursor_file } => cli::cursor::show_cursor(&cursor_file).await,
            CursorCommand::Set { cursor_file, value } => {
                cli::cursor::set_cursor(&cursor_file, value).await
            }
        },
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}
