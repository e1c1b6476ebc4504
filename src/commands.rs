//! CLI Command Handlers
//!
//! Implements all CLI commands by wiring the catalog, playback and Cast
//! receiver services together. Each handler takes CLI args and Output,
//! returns ExitCode.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::adapter::MovieListLoader;
use crate::cast::{CastReceiver, MediaLoadRequest};
use crate::catalog::{CatalogStore, ChannelListLoader};
use crate::cli::{
    ChannelEntry, ChannelsCmd, Cli, ExitCode, LoadCmd, MoviesCmd, Output, PlayCmd, PlayResponse,
    PlayerOpts, ReceiveCmd,
};
use crate::config::Config;
use crate::models::Channel;
use crate::playback::{LocalPlayer, MediaSource, PlaybackController, PlayerType};

// =============================================================================
// Shared Context
// =============================================================================

/// Settings resolved from config file, environment and global flags
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub catalog_url: String,
    pub asset_dir: PathBuf,
}

impl Context {
    /// Resolve settings; flags win over environment, environment over file
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let config = match cli.config.as_deref() {
            Some(path) => Config::load_from(path)?,
            None => Config::load(),
        };
        Ok(Self::with_overrides(config, cli.catalog.clone(), cli.assets.clone()))
    }

    pub fn with_overrides(
        config: Config,
        catalog_url: Option<String>,
        asset_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            catalog_url: catalog_url.unwrap_or_else(|| config.catalog_url()),
            asset_dir: asset_dir.unwrap_or_else(|| config.asset_dir()),
            config,
        }
    }

    /// Catalog loader bound to `store`
    pub fn channel_loader(&self, store: CatalogStore) -> ChannelListLoader {
        ChannelListLoader::with_timeout(store, &self.asset_dir, self.config.request_timeout())
    }

    fn player_type(&self, opts: &PlayerOpts) -> PlayerType {
        opts.player
            .map(PlayerType::from)
            .unwrap_or_else(|| self.config.player())
    }

    fn player(&self, opts: &PlayerOpts) -> LocalPlayer {
        LocalPlayer::new(self.player_type(opts)).dry_run(opts.dry_run)
    }
}

/// Pick a channel by id, falling back to its list position
pub fn select_channel<'a>(channels: &'a [Channel], selector: &str) -> Option<&'a Channel> {
    channels.iter().find(|c| c.id == selector).or_else(|| {
        selector
            .parse::<usize>()
            .ok()
            .and_then(|index| channels.get(index))
    })
}

/// Fail early when a real player is needed but not installed
async fn ensure_player(player: &LocalPlayer, dry_run: bool, output: &Output) -> Option<ExitCode> {
    if dry_run || player.is_available().await {
        return None;
    }
    let name = player.player_type().display_name();
    Some(output.error(
        format!("{} not found. Install it first.", name),
        ExitCode::PlaybackFailed,
    ))
}

// =============================================================================
// Channels Command
// =============================================================================

pub async fn channels_cmd(cmd: ChannelsCmd, ctx: &Context, output: &Output) -> ExitCode {
    let loader = ctx.channel_loader(CatalogStore::new());
    output.info(format!("Loading channels from {}...", ctx.catalog_url));

    match loader.load(&ctx.catalog_url).await {
        Ok(channels) => {
            let entries: Vec<ChannelEntry> = channels
                .iter()
                .take(cmd.limit)
                .enumerate()
                .map(|(index, channel)| {
                    let link = channel.primary_stream_link();
                    ChannelEntry {
                        index,
                        id: channel.id.clone(),
                        name: channel.name.clone(),
                        subtitle: channel.subtitle.clone(),
                        url: link.map(|l| l.url.clone()).unwrap_or_default(),
                        kind: link.map(|l| l.kind.clone()).unwrap_or_default(),
                        headers: link.map(|l| l.header_map().len()).unwrap_or_default(),
                    }
                })
                .collect();

            if let Err(e) = output.print(&entries) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(
            format!("Failed to load channels: {}", e),
            ExitCode::NetworkError,
        ),
    }
}

// =============================================================================
// Movies Command
// =============================================================================

pub async fn movies_cmd(cmd: MoviesCmd, ctx: &Context, output: &Output) -> ExitCode {
    let loader = MovieListLoader::new(ctx.channel_loader(CatalogStore::new()));

    match loader.try_load_movies(&ctx.catalog_url).await {
        Ok(mut movies) => {
            movies.truncate(cmd.limit);
            if let Err(e) = output.print(&movies) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(
            format!("Failed to load movies: {}", e),
            ExitCode::NetworkError,
        ),
    }
}

// =============================================================================
// Play Command
// =============================================================================

pub async fn play_cmd(cmd: PlayCmd, ctx: &Context, output: &Output) -> ExitCode {
    let Some(start_position) = cmd.start_position() else {
        return output.error(
            format!("Invalid start position: {}", cmd.start.as_deref().unwrap_or_default()),
            ExitCode::InvalidArgs,
        );
    };

    let loader = ctx.channel_loader(CatalogStore::new());
    let channels = match loader.load(&ctx.catalog_url).await {
        Ok(channels) => channels,
        Err(e) => {
            return output.error(
                format!("Failed to load channels: {}", e),
                ExitCode::NetworkError,
            )
        }
    };

    let Some(channel) = select_channel(&channels, &cmd.channel) else {
        return output.error(
            format!("Channel not found: {}", cmd.channel),
            ExitCode::ChannelNotFound,
        );
    };

    let source = match MediaSource::from_channel(channel) {
        Ok(source) => source,
        Err(e) => return output.error(e.to_string(), ExitCode::NoStreams),
    };

    let mut check_status = None;
    if cmd.check {
        output.info(format!("Checking {}...", source.uri()));
        match source.data_source.open(source.uri()).await {
            Ok(response) => check_status = Some(response.status().as_u16()),
            Err(e) => {
                return output.error(
                    format!("Stream check failed: {}", e),
                    ExitCode::NetworkError,
                )
            }
        }
    }

    let player = ctx.player(&cmd.player);
    if let Some(code) = ensure_player(&player, cmd.player.dry_run, output).await {
        return code;
    }

    output.info(format!(
        "Playing {} in {}...",
        channel.display_title(),
        player.player_type().display_name()
    ));

    let mut controller = PlaybackController::new(player);
    if let Err(e) = controller.start_from_channel(Some(channel), start_position) {
        return output.error(format!("Playback failed: {}", e), ExitCode::PlaybackFailed);
    }

    let response = PlayResponse {
        status: if cmd.player.dry_run { "dry_run" } else { "playing" },
        channel: channel.id.clone(),
        title: channel.display_title().to_string(),
        url: source.uri().to_string(),
        kind: source.kind.to_string(),
        player: controller.backend().player_type().to_string(),
        args: controller
            .backend()
            .last_args()
            .map(<[String]>::to_vec)
            .unwrap_or_default(),
        check_status,
    };
    if let Err(e) = output.print(&response) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    controller.backend_mut().wait().await;
    ExitCode::Success
}

// =============================================================================
// Load Command
// =============================================================================

/// Read a load request from a path, or stdin for "-".
///
/// A literal `null` document yields `None`.
pub async fn read_load_request(source: &str) -> anyhow::Result<Option<MediaLoadRequest>> {
    let text = if source == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        text
    } else {
        tokio::fs::read_to_string(source).await?
    };
    Ok(serde_json::from_str(&text)?)
}

/// Receiver over a freshly loaded catalog
async fn build_receiver(ctx: &Context, opts: &PlayerOpts) -> CastReceiver<LocalPlayer> {
    let store = CatalogStore::new();
    // Entity lookups and the movie playlist degrade to empty without a catalog
    ctx.channel_loader(store.clone())
        .load_or_none(&ctx.catalog_url)
        .await;
    CastReceiver::new(PlaybackController::new(ctx.player(opts)), store)
}

pub async fn load_cmd(cmd: LoadCmd, ctx: &Context, output: &Output) -> ExitCode {
    let request = match read_load_request(&cmd.request).await {
        Ok(request) => request,
        Err(e) => {
            return output.error(
                format!("Invalid load request: {}", e),
                ExitCode::InvalidArgs,
            )
        }
    };

    let mut receiver = build_receiver(ctx, &cmd.player).await;
    let backend = receiver.controller().backend();
    if let Some(code) = ensure_player(backend, cmd.player.dry_run, output).await {
        return code;
    }

    match receiver.on_load(cmd.sender.as_deref(), request) {
        Ok(_) => {
            if let Err(e) = output.print(receiver.media_status()) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            receiver.controller_mut().backend_mut().wait().await;
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), ExitCode::PlaybackFailed),
    }
}

// =============================================================================
// Receive Command
// =============================================================================

pub async fn receive_cmd(cmd: ReceiveCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut receiver = build_receiver(ctx, &cmd.player).await;
    let channels = receiver.store().len();
    info!(channels, "Receiver ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(reply) = receiver.handle_line(&line) {
                    output.line(&reply.to_json());
                }
            }
            Ok(None) => break,
            Err(e) => return output.error(format!("Failed to read stdin: {}", e), ExitCode::Error),
        }
    }

    debug!("Input closed");
    if receiver.controller().session().is_some() {
        receiver.controller_mut().backend_mut().wait().await;
    }
    ExitCode::Success
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: id.to_uppercase(),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_channel_by_id_then_index() {
        let channels = vec![channel("news"), channel("1"), channel("sport")];
        assert_eq!(select_channel(&channels, "sport").map(|c| c.name.as_str()), Some("SPORT"));
        // An id that looks like a number wins over the position
        assert_eq!(select_channel(&channels, "1").map(|c| c.name.as_str()), Some("1"));
        assert_eq!(select_channel(&channels, "0").map(|c| c.name.as_str()), Some("NEWS"));
        assert!(select_channel(&channels, "7").is_none());
        assert!(select_channel(&channels, "movies").is_none());
    }

    #[test]
    fn test_overrides_win_over_config() {
        let config = Config {
            catalog_url: Some("https://example.com/a.json".into()),
            ..Default::default()
        };
        let ctx = Context::with_overrides(
            config,
            Some("https://example.com/b.json".into()),
            Some(PathBuf::from("/tmp/assets")),
        );
        assert_eq!(ctx.catalog_url, "https://example.com/b.json");
        assert_eq!(ctx.asset_dir, PathBuf::from("/tmp/assets"));
    }

    #[tokio::test]
    async fn test_read_load_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(&path, r#"{"media":{"contentId":"http://a/b.mp4"}}"#).unwrap();
        let request = read_load_request(path.to_str().unwrap()).await.unwrap();
        assert!(request.and_then(|r| r.media).is_some());

        std::fs::write(&path, "null").unwrap();
        assert!(read_load_request(path.to_str().unwrap()).await.unwrap().is_none());
    }
}
