use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::model::OverlayProps;

use super::anchor::AnchorHost;
use super::diagnostics::DiagnosticsSink;
use super::observers::ObservedTarget;
use super::scheduler::Liveness;
use super::{ConnectionOverlay, TickOutcome};

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayWorkerConfig {
    pub frame_interval: Duration,
}

impl Default for OverlayWorkerConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Published whenever the drawn output changes.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub sequence: u64,
    pub outcome: TickOutcome,
    /// `None` while the container has no drawable area.
    pub svg: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OverlayHandle {
    command_tx: UnboundedSender<OverlayCommand>,
    liveness: Liveness,
}

impl OverlayHandle {
    pub fn update_props(&self, props: OverlayProps) {
        let _ = self.command_tx.send(OverlayCommand::UpdateProps(props));
    }

    pub fn notify_resize(&self, target: ObservedTarget) {
        let _ = self.command_tx.send(OverlayCommand::Resize(target));
    }

    pub fn notify_structure(&self) {
        let _ = self.command_tx.send(OverlayCommand::Structure);
    }

    /// Stops the overlay. Liveness is cleared before the command is queued;
    /// a tick already measuring sees it once measurement returns and
    /// publishes nothing.
    pub fn shutdown(&self) {
        self.liveness.kill();
        let _ = self.command_tx.send(OverlayCommand::Shutdown);
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }
}

#[derive(Debug)]
enum OverlayCommand {
    UpdateProps(OverlayProps),
    Resize(ObservedTarget),
    Structure,
    Shutdown,
}

pub fn spawn_overlay_worker<H, D>(
    handle: &Handle,
    overlay: ConnectionOverlay<H, D>,
) -> (OverlayHandle, UnboundedReceiver<OverlayFrame>)
where
    H: AnchorHost + Send + 'static,
    D: DiagnosticsSink + Send + 'static,
{
    spawn_overlay_worker_with_config(handle, overlay, OverlayWorkerConfig::default())
}

pub fn spawn_overlay_worker_with_config<H, D>(
    handle: &Handle,
    overlay: ConnectionOverlay<H, D>,
    config: OverlayWorkerConfig,
) -> (OverlayHandle, UnboundedReceiver<OverlayFrame>)
where
    H: AnchorHost + Send + 'static,
    D: DiagnosticsSink + Send + 'static,
{
    let (command_tx, command_rx) = unbounded_channel();
    let (frame_tx, frame_rx) = unbounded_channel();
    let overlay_handle = OverlayHandle {
        command_tx,
        liveness: overlay.liveness(),
    };

    let _task = handle.spawn(run_overlay_loop(overlay, config, command_rx, frame_tx));

    (overlay_handle, frame_rx)
}

async fn run_overlay_loop<H, D>(
    mut overlay: ConnectionOverlay<H, D>,
    config: OverlayWorkerConfig,
    mut command_rx: UnboundedReceiver<OverlayCommand>,
    frame_tx: UnboundedSender<OverlayFrame>,
) where
    H: AnchorHost,
    D: DiagnosticsSink,
{
    let mut ticker = interval(config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut publisher = FramePublisher::new(frame_tx);
    let liveness = overlay.liveness();
    overlay.mount();

    loop {
        let outcome = tokio::select! {
            biased;
            maybe_command = command_rx.recv() => {
                let Some(command) = maybe_command else {
                    break;
                };
                if !apply_command(&mut overlay, command) {
                    break;
                }
                let mut shutdown = false;
                loop {
                    match command_rx.try_recv() {
                        Ok(command) => {
                            if !apply_command(&mut overlay, command) {
                                shutdown = true;
                                break;
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            shutdown = true;
                            break;
                        }
                    }
                }
                if shutdown {
                    break;
                }
                overlay.flush()
            }
            _ = ticker.tick() => overlay.tick(),
        };

        if outcome == TickOutcome::Dead || !liveness.is_alive() {
            break;
        }
        if !publisher.publish(outcome, &overlay) {
            warn!("overlay frame receiver dropped; stopping overlay worker");
            break;
        }
    }

    overlay.teardown();
    debug!(
        recomputes = overlay.recompute_count(),
        published = publisher.sequence,
        "overlay worker stopped"
    );
}

/// Returns `false` when the worker should stop.
fn apply_command<H, D>(overlay: &mut ConnectionOverlay<H, D>, command: OverlayCommand) -> bool
where
    H: AnchorHost,
    D: DiagnosticsSink,
{
    match command {
        OverlayCommand::UpdateProps(props) => overlay.update_props(props),
        OverlayCommand::Resize(target) => {
            overlay.notify_resize(&target);
        }
        OverlayCommand::Structure => {
            overlay.notify_structure();
        }
        OverlayCommand::Shutdown => return false,
    }
    true
}

struct FramePublisher {
    frame_tx: UnboundedSender<OverlayFrame>,
    sequence: u64,
    last_svg: Option<Option<String>>,
}

impl FramePublisher {
    fn new(frame_tx: UnboundedSender<OverlayFrame>) -> Self {
        Self {
            frame_tx,
            sequence: 0,
            last_svg: None,
        }
    }

    /// Sends a frame only when the drawn output differs from the last one
    /// sent. Returns `false` once the receiver is gone.
    fn publish<H, D>(&mut self, outcome: TickOutcome, overlay: &ConnectionOverlay<H, D>) -> bool {
        if !matches!(
            outcome,
            TickOutcome::Rendered { .. } | TickOutcome::NullRender
        ) {
            return true;
        }

        let svg = overlay.render_svg();
        if self.last_svg.as_ref() == Some(&svg) {
            return true;
        }

        self.sequence = self.sequence.saturating_add(1);
        self.last_svg = Some(svg.clone());
        self.frame_tx
            .send(OverlayFrame {
                sequence: self.sequence,
                outcome,
                svg,
            })
            .is_ok()
    }
}
