//! Local Player - VLC/mpv playback backend
//!
//! Plays media sources in an external VLC or mpv process, forwarding each
//! stream's request headers on the command line.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::source::MediaSource;

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    /// mpv media player (default, forwards arbitrary request headers)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Errors from player backends
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
    #[error("Queue index {index} out of range (queue has {len} items)")]
    InvalidIndex { index: usize, len: usize },
    #[error("Player is not running")]
    NotRunning,
    #[error("{0} cannot be paused on this platform")]
    PauseUnsupported(String),
    #[error("Failed to signal player: {0}")]
    Signal(std::io::Error),
}

/// Something that can play a queue of media sources.
///
/// Holds at most one active playback; `load` replaces whatever was playing.
pub trait PlayerBackend {
    /// Prepare the queue and start playing at `index`
    fn load(
        &mut self,
        queue: &[MediaSource],
        index: usize,
        start_position: Duration,
    ) -> Result<(), PlayerError>;

    /// Pause playback; an error means the player is still playing
    fn pause(&mut self) -> Result<(), PlayerError>;

    /// Continue after `pause`
    fn resume(&mut self) -> Result<(), PlayerError>;

    /// Stop playback and free the player
    fn release(&mut self);

    fn is_playing(&mut self) -> bool;
}

/// External-process player for streaming content
pub struct LocalPlayer {
    player_type: PlayerType,
    dry_run: bool,
    paused: bool,
    child: Option<Child>,
    last_args: Option<Vec<String>>,
}

impl LocalPlayer {
    /// Create a new local player with the specified type
    pub fn new(player_type: PlayerType) -> Self {
        Self {
            player_type,
            dry_run: false,
            paused: false,
            child: None,
            last_args: None,
        }
    }

    /// Create a VLC player
    pub fn vlc() -> Self {
        Self::new(PlayerType::Vlc)
    }

    /// Create an mpv player
    pub fn mpv() -> Self {
        Self::new(PlayerType::Mpv)
    }

    /// Build command lines without spawning anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Get the player type
    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Process id of the running player
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Arguments of the most recent `load`
    pub fn last_args(&self) -> Option<&[String]> {
        self.last_args.as_deref()
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        // If it's a full path (macOS app bundle), check if it exists
        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        // Otherwise use 'which' to find in PATH
        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Command-line arguments to play `queue` starting at `index`
    pub fn build_args(
        &self,
        queue: &[MediaSource],
        index: usize,
        start_position: Duration,
    ) -> Result<Vec<String>, PlayerError> {
        let current = queue.get(index).ok_or(PlayerError::InvalidIndex {
            index,
            len: queue.len(),
        })?;

        let mut args = Vec::new();
        let start_secs = start_position.as_secs();
        let title = &current.item.metadata.title;

        match self.player_type {
            PlayerType::Mpv => {
                for (key, value) in current.headers() {
                    args.push(format!("--http-header-fields-append={}: {}", key, value));
                }
                if !title.is_empty() {
                    args.push(format!("--force-media-title={}", title));
                }
                if start_secs > 0 {
                    args.push(format!("--start={}", start_secs));
                }
                if index > 0 {
                    args.push(format!("--playlist-start={}", index));
                }
                args.push("--force-window=immediate".to_string());
                args.extend(queue.iter().map(|source| source.uri().to_string()));
            }
            PlayerType::Vlc => {
                for (key, value) in current.headers() {
                    match key.to_ascii_lowercase().as_str() {
                        "user-agent" => args.push(format!("--http-user-agent={}", value)),
                        "referer" => args.push(format!("--http-referrer={}", value)),
                        _ => warn!(header = %key, "VLC cannot forward request header, dropping it"),
                    }
                }
                if !title.is_empty() {
                    args.push(format!("--meta-title={}", title));
                }
                if start_secs > 0 {
                    args.push(format!("--start-time={}", start_secs));
                }
                // Don't show filename overlay
                args.push("--no-video-title-show".to_string());
                args.extend(queue[index..].iter().map(|source| source.uri().to_string()));
            }
        }

        Ok(args)
    }

    fn spawn(&self, args: &[String]) -> Result<Child, PlayerError> {
        let mut cmd = Command::new(self.player_type.command());
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })
    }

    /// Stop or continue the player process
    fn signal(&self, signal: ProcessSignal) -> Result<(), PlayerError> {
        if self.dry_run {
            return Ok(());
        }
        let pid = self.pid().ok_or(PlayerError::NotRunning)?;
        send_signal(pid, signal).map_err(|e| match e.kind() {
            std::io::ErrorKind::Unsupported => {
                PlayerError::PauseUnsupported(self.player_type.to_string())
            }
            _ => PlayerError::Signal(e),
        })
    }

    /// Wait for the player process to exit; a paused player is continued first
    pub async fn wait(&mut self) {
        if let Err(e) = PlayerBackend::resume(self) {
            warn!("Could not resume player before waiting: {}", e);
        }
        if let Some(child) = self.child.as_mut() {
            let _ = child.wait().await;
        }
        self.child = None;
    }
}

impl PlayerBackend for LocalPlayer {
    fn load(
        &mut self,
        queue: &[MediaSource],
        index: usize,
        start_position: Duration,
    ) -> Result<(), PlayerError> {
        let args = self.build_args(queue, index, start_position)?;
        self.release();

        debug!(player = %self.player_type, ?args, "Starting player");
        if !self.dry_run {
            self.child = Some(self.spawn(&args)?);
        }
        self.last_args = Some(args);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        if !self.paused {
            self.signal(ProcessSignal::Stop)?;
            debug!(player = %self.player_type, "Player paused");
            self.paused = true;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        if self.paused {
            self.signal(ProcessSignal::Continue)?;
            debug!(player = %self.player_type, "Player resumed");
            self.paused = false;
        }
        Ok(())
    }

    fn release(&mut self) {
        self.paused = false;
        if let Some(mut child) = self.child.take() {
            debug!(player = %self.player_type, "Releasing player");
            let _ = child.start_kill();
        }
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => self.dry_run && self.last_args.is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ProcessSignal {
    Stop,
    Continue,
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: ProcessSignal) -> std::io::Result<()> {
    let signal = match signal {
        ProcessSignal::Stop => libc::SIGSTOP,
        ProcessSignal::Continue => libc::SIGCONT,
    };
    // SAFETY: kill(2) takes plain integers; pid is our own unreaped child
    if unsafe { libc::kill(pid as libc::pid_t, signal) } == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: ProcessSignal) -> std::io::Result<()> {
    Err(std::io::ErrorKind::Unsupported.into())
}

impl Drop for LocalPlayer {
    fn drop(&mut self) {
        self.release();
    }
}
