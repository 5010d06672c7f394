use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::model::{Componente, Connection, OverlayProps};
use crate::overlay::anchor::AnchorHost;
use crate::overlay::geometry::Rect;

pub mod watch;

/// A frozen host view: measured boxes plus the host's data, as read from a
/// JSON or YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub container: Option<Rect>,
    #[serde(default)]
    pub anchors: BTreeMap<String, Rect>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub modo_edicao: bool,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub componentes: Vec<Componente>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Json,
    Yaml,
}

impl SceneFormat {
    /// YAML for `.yaml`/`.yml`, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON scene: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML scene: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, SceneFormat::from_path(path))
    }

    pub fn parse(text: &str, format: SceneFormat) -> Result<Self, SceneError> {
        match format {
            SceneFormat::Json => Ok(serde_json::from_str(text)?),
            SceneFormat::Yaml => Ok(serde_yaml::from_str(text)?),
        }
    }

    pub fn props(&self) -> OverlayProps {
        OverlayProps {
            connections: self.connections.clone(),
            componentes: self.componentes.clone(),
            modo_edicao: self.modo_edicao,
        }
    }
}

impl AnchorHost for Scene {
    fn container_box(&self) -> Option<Rect> {
        self.container
    }

    fn anchor_box(&self, node_id: &str) -> Option<Rect> {
        self.anchors.get(node_id).copied()
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

/// A scene the overlay can read while something else swaps it out.
#[derive(Debug, Clone)]
pub struct SharedScene(Arc<Mutex<Scene>>);

impl SharedScene {
    pub fn new(scene: Scene) -> Self {
        Self(Arc::new(Mutex::new(scene)))
    }

    pub fn replace(&self, scene: Scene) {
        *self.lock() = scene;
    }

    pub fn snapshot(&self) -> Scene {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Scene> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnchorHost for SharedScene {
    fn container_box(&self) -> Option<Rect> {
        self.lock().container_box()
    }

    fn anchor_box(&self, node_id: &str) -> Option<Rect> {
        self.lock().anchor_box(node_id)
    }

    fn is_visible(&self) -> bool {
        self.lock().is_visible()
    }

    /// Holds the lock for the whole recompute, so a `replace` lands either
    /// before or after it and never between the container and its anchors.
    fn with_view<R>(&self, measure: impl FnOnce(&dyn AnchorHost) -> R) -> R {
        let scene = self.lock();
        measure(&*scene)
    }
}
