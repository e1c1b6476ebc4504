//! CLI - Command Line Interface for castreceiver
//!
//! Every receiver action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Inspect the catalog
//! castreceiver channels --json
//! castreceiver --catalog https://example.com/channels.json movies
//!
//! # Play a channel (with its request headers)
//! castreceiver play news-24 --player mpv
//!
//! # Act as a Cast receiver
//! castreceiver load request.json
//! castreceiver receive < messages.jsonl
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use crate::playback::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Catalog could not be fetched or parsed
    NetworkError = 3,
    /// No channel matches the selector
    ChannelNotFound = 4,
    /// Channel has no playable stream
    NoStreams = 5,
    /// Player or Cast load failed
    PlaybackFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// castreceiver - channel catalog player and Cast receiver
#[derive(Parser, Debug)]
#[command(
    name = "castreceiver",
    version,
    about = "Channel catalog player and Cast media receiver",
    long_about = "Loads a channel catalog (remote URL, bundled asset or file), \
                  plays channels with their HTTP request headers in a local \
                  player, and handles Cast LOAD requests.",
    after_help = "EXAMPLES:\n\
                  castreceiver channels                  List catalog channels\n\
                  castreceiver play news-24              Play a channel\n\
                  castreceiver load request.json         Handle a Cast load\n\
                  castreceiver receive < messages.jsonl  Receive Cast messages"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Catalog location (http(s) URL, file:///android_asset/... or path)
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Directory bundled assets are read from
    #[arg(long, global = true)]
    pub assets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default tracing filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "castreceiver=debug"
        } else {
            "castreceiver=info"
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List catalog channels
    #[command(visible_alias = "ch")]
    Channels(ChannelsCmd),

    /// List the catalog as legacy movie records
    #[command(visible_alias = "mv")]
    Movies(MoviesCmd),

    /// Play a catalog channel
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Handle a single Cast LOAD request
    Load(LoadCmd),

    /// Read Cast messages (JSON lines) from stdin
    #[command(visible_alias = "rx")]
    Receive(ReceiveCmd),
}

/// List channels in the catalog
#[derive(Args, Debug)]
pub struct ChannelsCmd {
    /// Maximum number of channels
    #[arg(long, short = 'l', default_value = "100")]
    pub limit: usize,
}

/// List the catalog as movies
#[derive(Args, Debug)]
pub struct MoviesCmd {
    /// Maximum number of movies
    #[arg(long, short = 'l', default_value = "100")]
    pub limit: usize,
}

/// Player selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerChoice {
    /// mpv media player (default)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Mpv => PlayerType::Mpv,
            PlayerChoice::Vlc => PlayerType::Vlc,
        }
    }
}

/// Options shared by commands that start a player
#[derive(Args, Debug, Clone, Default)]
pub struct PlayerOpts {
    /// Player to use (defaults to the configured one)
    #[arg(long, short = 'p', value_enum)]
    pub player: Option<PlayerChoice>,

    /// Print what would be played without starting a player
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

/// Play a channel by id or list position
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Channel id, or zero-based position in the channel list
    #[arg(required = true)]
    pub channel: String,

    /// Start position in seconds or as MM:SS / HH:MM:SS
    #[arg(long, short = 's')]
    pub start: Option<String>,

    /// Fetch the stream once with its headers before playing
    #[arg(long)]
    pub check: bool,

    #[command(flatten)]
    pub player: PlayerOpts,
}

impl PlayCmd {
    /// Parsed start position; `None` if the argument is malformed
    pub fn start_position(&self) -> Option<Duration> {
        match self.start.as_deref().map(str::trim) {
            None | Some("") => Some(Duration::ZERO),
            Some(s) => s
                .parse::<u64>()
                .ok()
                .or_else(|| parse_timestamp(s))
                .map(Duration::from_secs),
        }
    }
}

/// Parse timestamp string (HH:MM:SS or MM:SS) to seconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.len() {
        2 => {
            let mins: u64 = parts[0].parse().ok()?;
            let secs: u64 = parts[1].parse().ok()?;
            Some(mins * 60 + secs)
        }
        3 => {
            let hours: u64 = parts[0].parse().ok()?;
            let mins: u64 = parts[1].parse().ok()?;
            let secs: u64 = parts[2].parse().ok()?;
            Some(hours * 3600 + mins * 60 + secs)
        }
        _ => None,
    }
}

/// Handle one Cast LOAD request from a file
#[derive(Args, Debug)]
pub struct LoadCmd {
    /// Path to the request JSON, or "-" for stdin
    #[arg(required = true)]
    pub request: String,

    /// Sender id reported in logs
    #[arg(long)]
    pub sender: Option<String>,

    #[command(flatten)]
    pub player: PlayerOpts,
}

/// Receive Cast messages on stdin
#[derive(Args, Debug)]
pub struct ReceiveCmd {
    #[command(flatten)]
    pub player: PlayerOpts,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Channel row for `channels`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub subtitle: String,
    pub url: String,
    pub kind: String,
    pub headers: usize,
}

/// What `play` started
#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub status: &'static str,
    pub channel: String,
    pub title: String,
    pub url: String,
    pub kind: String,
    pub player: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_status: Option<u16>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            // For non-JSON, caller should handle formatting
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print one compact JSON line (message streams)
    pub fn line(&self, line: &str) {
        println!("{}", line);
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
