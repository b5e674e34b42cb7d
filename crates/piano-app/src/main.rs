//! Virtual Piano console front-end: entry point.
//!
//! Plays piano key samples from terminal input and records, replays, saves and
//! loads key sequences.
//!
//! # Usage
//!
//! ```text
//! virtual-piano [OPTIONS]
//!
//! Options:
//!   --config      <PATH>  Config file [default: platform config dir]
//!   --sounds-dir  <DIR>   Directory holding <key>.wav samples
//!   --export-dir  <DIR>   Directory :save writes recording.json into
//!   --init-config         Write the effective config to the config path and exit
//! ```
//!
//! Type keys (`a s d f …`, `q w e …`) and press Enter to play them; `:help`
//! lists the commands.
//!
//! # Environment variable overrides
//!
//! | Variable            | Overrides        |
//! |---------------------|------------------|
//! | `PIANO_CONFIG`      | `--config`       |
//! | `PIANO_SOUNDS_DIR`  | `--sounds-dir`   |
//! | `PIANO_EXPORT_DIR`  | `--export-dir`   |
//! | `RUST_LOG`          | `general.log_level` in the config file |
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ load_config_from()       -- TOML, defaults when absent
//!  ├─ AppState::new()          -- session + sample player + console view
//!  └─ event loop
//!       ├─ ConsoleInputSource  (stdin reader thread)
//!       └─ dispatch_event()    (one event at a time)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use piano_app::application::dispatch_key::SamplePlayer;
use piano_app::application::view::PianoView;
use piano_app::infrastructure::audio::SampleFilePlayer;
use piano_app::infrastructure::input_capture::console::ConsoleInputSource;
use piano_app::infrastructure::input_capture::InputSource;
use piano_app::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};
use piano_app::infrastructure::ui_bridge::{dispatch_event, AppState, Flow, HELP_TEXT};
use piano_app::infrastructure::view::ConsoleView;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Virtual piano with recording and timed playback.
#[derive(Debug, Parser)]
#[command(
    name = "virtual-piano",
    about = "Play, record and replay piano key samples from the terminal",
    version
)]
struct Cli {
    /// Path of the TOML config file.
    ///
    /// Defaults to `config.toml` in the platform config directory.
    #[arg(long, env = "PIANO_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding one `<key>.<ext>` sample per key.
    #[arg(long, env = "PIANO_SOUNDS_DIR")]
    sounds_dir: Option<PathBuf>,

    /// Directory `:save` writes `recording.json` into.
    #[arg(long, env = "PIANO_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }

    /// Applies command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.sounds_dir {
            config.audio.sounds_dir = dir.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.storage.export_dir = dir.clone();
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = cli.config_path()?;
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the configured level applies.  Logs go to
    // stderr so they do not interleave with the piano's own output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        save_config_to(&config, &config_path)
            .with_context(|| format!("failed to write config to {}", config_path.display()))?;
        info!(path = %config_path.display(), "config written");
        return Ok(());
    }

    info!(config = %config_path.display(), "virtual piano starting");

    // ── Adapters and shared state ─────────────────────────────────────────────
    let player = Arc::new(SampleFilePlayer::from_config(&config.audio));
    player.preload().await;
    let view = Arc::new(ConsoleView::new(config.storage.export_dir.clone()));
    view.line(HELP_TEXT);

    let state = AppState::new(
        config,
        player as Arc<dyn SamplePlayer>,
        Arc::clone(&view) as Arc<dyn PianoView>,
    );

    // ── Event loop ────────────────────────────────────────────────────────────
    let source = ConsoleInputSource::new();
    let mut events = source.start().context("failed to start terminal input")?;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if dispatch_event(&state, event).await == Flow::Quit {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received");
                break;
            }
        }
    }

    source.stop();
    state.session.shutdown().await;
    info!("virtual piano stopped");
    Ok(())
}
