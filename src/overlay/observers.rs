use std::collections::BTreeSet;

/// Something the resize observer can be watching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObservedTarget {
    Container,
    Anchor(String),
}

impl ObservedTarget {
    pub fn anchor(node_id: impl Into<String>) -> Self {
        Self::Anchor(node_id.into())
    }
}

/// Watches the container plus every anchor that resolved on the last
/// recompute. Once disconnected it accepts nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResizeObserver {
    connected: bool,
    targets: BTreeSet<ObservedTarget>,
}

impl ResizeObserver {
    pub fn connect(&mut self) {
        self.connected = true;
        self.targets.insert(ObservedTarget::Container);
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
        self.targets.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Re-targets to the container plus `anchor_ids`.
    pub fn observe_anchors<I>(&mut self, anchor_ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        if !self.connected {
            return;
        }
        self.targets.clear();
        self.targets.insert(ObservedTarget::Container);
        self.targets
            .extend(anchor_ids.into_iter().map(ObservedTarget::Anchor));
    }

    pub fn observes(&self, target: &ObservedTarget) -> bool {
        self.connected && self.targets.contains(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &ObservedTarget> {
        self.targets.iter()
    }
}

/// Watches the surrounding subtree for anchor insertion and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StructureObserver {
    connected: bool,
}

impl StructureObserver {
    pub fn connect(&mut self) {
        self.connected = true;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}
