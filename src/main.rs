use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use unifilar_overlay::config::OverlaySettings;
use unifilar_overlay::overlay::ConnectionOverlay;
use unifilar_overlay::overlay::worker::spawn_overlay_worker_with_config;
use unifilar_overlay::scene::watch::{SceneReload, SceneWatchConfig, spawn_scene_watch_worker};
use unifilar_overlay::scene::{Scene, SharedScene};

#[derive(Debug, Parser)]
#[command(
    name = "unifilar_overlay",
    about = "Connection-line overlay for single-line diagrams"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a scene once and print the overlay SVG.
    Render {
        scene: PathBuf,
        /// Override the scene's `modoEdicao` flag.
        #[arg(long)]
        edit_mode: Option<bool>,
        /// Write the SVG to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Keep the overlay mounted and print the SVG whenever the scene file
    /// changes what is drawn.
    Watch {
        scene: PathBuf,
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
        /// Exit after this many published frames.
        #[arg(long)]
        max_frames: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = OverlaySettings::from_env().context("failed to load configuration")?;
    let _log_guard = init_tracing(&settings)?;

    match cli.command {
        Commands::Render {
            scene,
            edit_mode,
            output,
        } => render_scene(&settings, &scene, edit_mode, output.as_deref())?,
        Commands::Watch {
            scene,
            poll_ms,
            max_frames,
        } => watch_scene(&settings, scene, poll_ms, max_frames).await?,
    }

    Ok(())
}

fn render_scene(
    settings: &OverlaySettings,
    scene_path: &Path,
    edit_mode: Option<bool>,
    output: Option<&Path>,
) -> Result<()> {
    let mut scene = Scene::load(scene_path)
        .with_context(|| format!("failed to load scene `{}`", scene_path.display()))?;
    if let Some(flag) = edit_mode {
        scene.modo_edicao = flag;
    }

    let props = scene.props();
    let mut overlay = ConnectionOverlay::with_diagnostics(scene, settings.diagnostics.sink(), props);
    overlay.mount();
    let outcome = overlay.tick();
    info!(
        scene = %scene_path.display(),
        outcome = ?outcome,
        "scene rendered"
    );

    let Some(svg) = overlay.render_svg() else {
        return Ok(());
    };
    match output {
        Some(path) => fs::write(path, format!("{svg}\n"))
            .with_context(|| format!("failed to write `{}`", path.display()))?,
        None => println!("{svg}"),
    }
    Ok(())
}

async fn watch_scene(
    settings: &OverlaySettings,
    scene_path: PathBuf,
    poll_ms: u64,
    max_frames: Option<u64>,
) -> Result<()> {
    anyhow::ensure!(poll_ms > 0, "--poll-ms must be greater than 0");
    let scene = Scene::load(&scene_path)
        .with_context(|| format!("failed to load scene `{}`", scene_path.display()))?;
    let shared = SharedScene::new(scene.clone());
    let overlay =
        ConnectionOverlay::with_diagnostics(shared.clone(), settings.diagnostics.sink(), scene.props());

    let runtime = Handle::current();
    let (overlay_handle, mut frame_rx) =
        spawn_overlay_worker_with_config(&runtime, overlay, settings.worker_config());
    let (watch_handle, mut reload_rx) = spawn_scene_watch_worker(
        &runtime,
        scene_path.clone(),
        shared,
        overlay_handle.clone(),
        SceneWatchConfig {
            poll_interval: Duration::from_millis(poll_ms),
        },
    );
    info!(
        scene = %scene_path.display(),
        frame_interval_ms = settings.frame_interval_ms,
        diagnostics = %settings.diagnostics,
        "watching scene"
    );

    let mut printed: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            maybe_frame = frame_rx.recv() => {
                let Some(frame) = maybe_frame else {
                    break;
                };
                match frame.svg {
                    Some(svg) => println!("{svg}"),
                    None => info!(sequence = frame.sequence, "container not drawable; overlay cleared"),
                }
                printed = printed.saturating_add(1);
                if max_frames.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            Some(reload) = reload_rx.recv() => {
                if let SceneReload::Failed { error } = reload {
                    warn!(error = %error, "scene reload rejected");
                }
            }
        }
    }

    watch_handle.shutdown();
    overlay_handle.shutdown();
    Ok(())
}

fn init_tracing(settings: &OverlaySettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,unifilar_overlay=debug"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    let (file_layer, guard) = match &settings.log_dir {
        Some(log_dir) => {
            fs::create_dir_all(log_dir).with_context(|| {
                format!("failed to create log directory `{}`", log_dir.display())
            })?;
            let appender = tracing_appender::rolling::never(log_dir, "unifilar_overlay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new(&settings.file_log_filter));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(guard)
}
