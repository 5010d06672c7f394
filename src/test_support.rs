use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::model::{Componente, Connection, OverlayProps, Port, Posicao};
use crate::overlay::anchor::AnchorHost;
use crate::overlay::geometry::Rect;

pub fn temp_path(prefix: &str) -> PathBuf {
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "unifilar_overlay_{prefix}_{}_{}",
        std::process::id(),
        now_ns
    ))
}

pub fn remove_dir_if_exists(path: &Path) {
    let _ = std::fs::remove_dir_all(path);
}

pub fn connection(id: &str, from: &str, from_port: Port, to: &str, to_port: Port) -> Connection {
    Connection {
        id: id.to_owned(),
        from: from.to_owned(),
        to: to.to_owned(),
        from_port,
        to_port,
    }
}

pub fn componente(id: &str) -> Componente {
    Componente {
        id: id.to_owned(),
        tipo: "barramento".to_owned(),
        nome: id.to_owned(),
        posicao: Posicao::default(),
        status: "normal".to_owned(),
        dados: Value::Null,
    }
}

/// Props for the reference two-node diagram: `node1.right -> node2.left`.
pub fn two_node_props(modo_edicao: bool) -> OverlayProps {
    OverlayProps {
        connections: vec![connection("c1", "node1", Port::Right, "node2", Port::Left)],
        componentes: vec![componente("node1"), componente("node2")],
        modo_edicao,
    }
}

/// Host for the reference diagram: an 800x500 container at the viewport
/// origin with two 64px anchors.
pub fn two_node_host() -> FakeHost {
    FakeHost::new(Rect::new(0.0, 0.0, 800.0, 500.0))
        .with_anchor("node1", Rect::new(68.0, 68.0, 64.0, 64.0))
        .with_anchor("node2", Rect::new(218.0, 68.0, 64.0, 64.0))
}

#[derive(Debug, Default)]
struct FakeHostState {
    container: Option<Rect>,
    anchors: BTreeMap<String, Rect>,
    hidden: bool,
    measurements: BTreeMap<String, usize>,
}

/// In-memory host view. Clones share state, so a test can keep one handle
/// and move geometry around while the overlay owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<FakeHostState>>,
}

impl FakeHost {
    pub fn new(container: Rect) -> Self {
        let host = Self::default();
        host.set_container(Some(container));
        host
    }

    pub fn with_anchor(self, node_id: &str, rect: Rect) -> Self {
        self.set_anchor(node_id, rect);
        self
    }

    pub fn set_container(&self, container: Option<Rect>) {
        self.lock().container = container;
    }

    pub fn set_anchor(&self, node_id: &str, rect: Rect) {
        self.lock().anchors.insert(node_id.to_owned(), rect);
    }

    pub fn remove_anchor(&self, node_id: &str) {
        self.lock().anchors.remove(node_id);
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().hidden = !visible;
    }

    pub fn measure_count(&self, node_id: &str) -> usize {
        self.lock()
            .measurements
            .get(node_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_measurements(&self) -> usize {
        self.lock().measurements.values().sum()
    }

    fn lock(&self) -> MutexGuard<'_, FakeHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnchorHost for FakeHost {
    fn container_box(&self) -> Option<Rect> {
        self.lock().container
    }

    fn anchor_box(&self, node_id: &str) -> Option<Rect> {
        let mut state = self.lock();
        *state.measurements.entry(node_id.to_owned()).or_default() += 1;
        state.anchors.get(node_id).copied()
    }

    fn is_visible(&self) -> bool {
        !self.lock().hidden
    }
}
