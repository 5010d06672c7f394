use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval};
use tracing::{debug, warn};

use crate::overlay::observers::ObservedTarget;
use crate::overlay::worker::OverlayHandle;

use super::{Scene, SharedScene};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneWatchConfig {
    pub poll_interval: Duration,
}

impl Default for SceneWatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneWatchHandle {
    command_tx: UnboundedSender<SceneWatchCommand>,
}

impl SceneWatchHandle {
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(SceneWatchCommand::Shutdown);
    }
}

#[derive(Debug)]
enum SceneWatchCommand {
    Shutdown,
}

/// Reported once per reload attempt after the file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneReload {
    Applied { revision: u64 },
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SceneFingerprint {
    modified_ms: u128,
    byte_len: u64,
}

/// Polls `path` and, whenever it changes, swaps the new scene into `scene`
/// and tells the overlay: new props, structure changed, container resized.
/// A scene that fails to parse leaves the previous one in place.
pub fn spawn_scene_watch_worker(
    handle: &Handle,
    path: PathBuf,
    scene: SharedScene,
    overlay: OverlayHandle,
    config: SceneWatchConfig,
) -> (SceneWatchHandle, UnboundedReceiver<SceneReload>) {
    let (command_tx, command_rx) = unbounded_channel();
    let (reload_tx, reload_rx) = unbounded_channel();

    let _task = handle.spawn(run_scene_watch_loop(
        path, scene, overlay, config, command_rx, reload_tx,
    ));

    (SceneWatchHandle { command_tx }, reload_rx)
}

async fn run_scene_watch_loop(
    path: PathBuf,
    scene: SharedScene,
    overlay: OverlayHandle,
    config: SceneWatchConfig,
    mut command_rx: UnboundedReceiver<SceneWatchCommand>,
    reload_tx: UnboundedSender<SceneReload>,
) {
    let mut revision: u64 = 0;
    let mut ticker = interval(config.poll_interval);
    let mut last_fingerprint = match scene_fingerprint(&path) {
        Ok(fingerprint) => Some(fingerprint),
        Err(error) => {
            warn!(
                path = %path.display(),
                error = %error,
                "failed to compute initial scene fingerprint"
            );
            None
        }
    };

    loop {
        tokio::select! {
            maybe_command = command_rx.recv() => {
                match maybe_command {
                    Some(SceneWatchCommand::Shutdown) | None => break,
                }
            }
            _ = ticker.tick() => {
                if !overlay.is_alive() {
                    break;
                }

                let fingerprint = match scene_fingerprint(&path) {
                    Ok(fingerprint) => fingerprint,
                    Err(error) => {
                        warn!(
                            path = %path.display(),
                            error = %error,
                            "failed to collect scene fingerprint"
                        );
                        continue;
                    }
                };
                if last_fingerprint == Some(fingerprint) {
                    continue;
                }
                last_fingerprint = Some(fingerprint);

                let reload = match Scene::load(&path) {
                    Ok(next) => {
                        revision = revision.saturating_add(1);
                        let props = next.props();
                        scene.replace(next);
                        overlay.update_props(props);
                        overlay.notify_structure();
                        overlay.notify_resize(ObservedTarget::Container);
                        debug!(path = %path.display(), revision, "scene reloaded");
                        SceneReload::Applied { revision }
                    }
                    Err(error) => {
                        warn!(
                            path = %path.display(),
                            error = %error,
                            "scene reload failed; keeping previous scene"
                        );
                        SceneReload::Failed {
                            error: error.to_string(),
                        }
                    }
                };
                if reload_tx.send(reload).is_err() {
                    break;
                }
            }
        }
    }
}

fn scene_fingerprint(path: &Path) -> Result<SceneFingerprint> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to read metadata for `{}`", path.display()))?;
    let modified_ms = metadata
        .modified()
        .ok()
        .and_then(|value| value.duration_since(UNIX_EPOCH).ok())
        .map(|value| value.as_millis())
        .unwrap_or(0);

    Ok(SceneFingerprint {
        modified_ms,
        byte_len: metadata.len(),
    })
}
