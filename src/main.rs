//! castreceiver - channel catalog player and Cast media receiver
//!
//! # Usage
//!
//! ```bash
//! castreceiver channels
//! castreceiver play news-24 --player mpv
//! castreceiver load request.json
//! castreceiver receive < messages.jsonl
//! ```

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use castreceiver::cli::{Cli, Command, ExitCode, Output};
use castreceiver::commands::{self, Context};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Logs go to stderr so stdout stays JSON-parseable
fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let ctx = match Context::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    match cli.command {
        Command::Channels(cmd) => commands::channels_cmd(cmd, &ctx, &output).await,
        Command::Movies(cmd) => commands::movies_cmd(cmd, &ctx, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, &ctx, &output).await,
        Command::Load(cmd) => commands::load_cmd(cmd, &ctx, &output).await,
        Command::Receive(cmd) => commands::receive_cmd(cmd, &ctx, &output).await,
    }
}
