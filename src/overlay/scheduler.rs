use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What asked for a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefreshTrigger {
    Mount,
    Props,
    Resize,
    Structure,
    Frame,
}

impl RefreshTrigger {
    const ALL: [RefreshTrigger; 5] = [
        RefreshTrigger::Mount,
        RefreshTrigger::Props,
        RefreshTrigger::Resize,
        RefreshTrigger::Structure,
        RefreshTrigger::Frame,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::Props => "props",
            Self::Resize => "resize",
            Self::Structure => "structure",
            Self::Frame => "frame",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Triggers collected since the last recompute. However many land before
/// the next tick, they are serviced by a single recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingRefresh(u8);

impl PendingRefresh {
    pub fn insert(&mut self, trigger: RefreshTrigger) {
        self.0 |= trigger.bit();
    }

    pub fn contains(&self, trigger: RefreshTrigger) -> bool {
        self.0 & trigger.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Hands back the collected triggers and leaves `self` empty.
    pub fn take(&mut self) -> PendingRefresh {
        std::mem::take(self)
    }

    pub fn triggers(&self) -> impl Iterator<Item = RefreshTrigger> + '_ {
        RefreshTrigger::ALL
            .into_iter()
            .filter(|trigger| self.contains(*trigger))
    }

    /// `resize+frame` style label for logs.
    pub fn label(&self) -> String {
        if self.is_empty() {
            return "none".to_owned();
        }
        self.triggers()
            .map(RefreshTrigger::label)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl Display for PendingRefresh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    MountedActive,
    MountedInactive,
    TornDown,
}

impl LifecycleState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::MountedActive => "mounted_active",
            Self::MountedInactive => "mounted_inactive",
            Self::TornDown => "torn_down",
        }
    }

    pub fn is_mounted(self) -> bool {
        matches!(self, Self::MountedActive | Self::MountedInactive)
    }

    /// Applies a mount request. Only valid from `Uninitialized`.
    pub fn mounted(self) -> Self {
        match self {
            Self::Uninitialized => Self::MountedActive,
            other => other,
        }
    }

    /// Follows document visibility while mounted; no-op otherwise.
    pub fn with_visibility(self, visible: bool) -> Self {
        match (self, visible) {
            (Self::MountedActive, false) => Self::MountedInactive,
            (Self::MountedInactive, true) => Self::MountedActive,
            (other, _) => other,
        }
    }

    /// Teardown is reachable from every state and never left.
    pub fn torn_down(self) -> Self {
        Self::TornDown
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared "still mounted" flag. Cleared once, synchronously, at teardown;
/// every tick reads it before touching the surface.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The continuous per-frame loop. Stays armed while hidden; only teardown
/// cancels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameLoop {
    armed: bool,
    cancelled: bool,
}

impl FrameLoop {
    pub fn arm(&mut self) {
        if !self.cancelled {
            self.armed = true;
        }
    }

    pub fn cancel(&mut self) {
        self.armed = false;
        self.cancelled = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameLoop, LifecycleState, Liveness, PendingRefresh, RefreshTrigger};

    #[test]
    fn pending_refresh_coalesces_repeated_triggers() {
        let mut pending = PendingRefresh::default();
        pending.insert(RefreshTrigger::Resize);
        pending.insert(RefreshTrigger::Resize);
        pending.insert(RefreshTrigger::Structure);
        pending.insert(RefreshTrigger::Resize);

        assert_eq!(pending.label(), "resize+structure");
        let taken = pending.take();
        assert!(pending.is_empty());
        assert_eq!(taken.triggers().count(), 2);
    }

    #[test]
    fn pending_label_is_order_independent() {
        let mut one = PendingRefresh::default();
        one.insert(RefreshTrigger::Frame);
        one.insert(RefreshTrigger::Props);
        let mut two = PendingRefresh::default();
        two.insert(RefreshTrigger::Props);
        two.insert(RefreshTrigger::Frame);

        assert_eq!(one, two);
        assert_eq!(one.label(), "props+frame");
        assert_eq!(PendingRefresh::default().label(), "none");
    }

    #[test]
    fn lifecycle_follows_visibility_only_while_mounted() {
        let state = LifecycleState::default();
        assert_eq!(state.with_visibility(false), LifecycleState::Uninitialized);

        let mounted = state.mounted();
        assert_eq!(mounted, LifecycleState::MountedActive);
        assert_eq!(
            mounted.with_visibility(false),
            LifecycleState::MountedInactive
        );
        assert_eq!(
            mounted.with_visibility(false).with_visibility(true),
            LifecycleState::MountedActive
        );
    }

    #[test]
    fn torn_down_is_terminal() {
        let torn = LifecycleState::MountedInactive.torn_down();

        assert_eq!(torn.mounted(), LifecycleState::TornDown);
        assert_eq!(torn.with_visibility(true), LifecycleState::TornDown);
        assert!(!torn.is_mounted());
        assert_eq!(
            LifecycleState::Uninitialized.torn_down(),
            LifecycleState::TornDown
        );
    }

    #[test]
    fn liveness_clones_share_one_flag() {
        let liveness = Liveness::default();
        let queued_tick_view = liveness.clone();
        assert!(queued_tick_view.is_alive());

        liveness.kill();
        assert!(!queued_tick_view.is_alive());
    }

    #[test]
    fn cancelled_frame_loop_cannot_be_rearmed() {
        let mut frame_loop = FrameLoop::default();
        frame_loop.arm();
        assert!(frame_loop.is_armed());

        frame_loop.cancel();
        frame_loop.arm();
        assert!(!frame_loop.is_armed());
    }
}
