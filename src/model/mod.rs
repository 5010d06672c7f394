use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cardinal attachment point on an anchor's measured box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    Left,
    Right,
    Top,
    Bottom,
}

/// A line between two diagram nodes, owned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from: String,
    pub to: String,
    pub from_port: Port,
    pub to_port: Port,
}

/// Percentage-based placement hint. Only the host reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Posicao {
    pub x: f64,
    pub y: f64,
}

/// A diagram node as the host describes it.
///
/// The drawn geometry never comes from `posicao`; the overlay measures the
/// node's anchor box through [`crate::overlay::anchor::AnchorHost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Componente {
    pub id: String,
    pub tipo: String,
    pub nome: String,
    #[serde(default)]
    pub posicao: Posicao,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dados: Value,
}

/// Everything the host hands to the overlay on mount and on every update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayProps {
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub componentes: Vec<Componente>,
    #[serde(default)]
    pub modo_edicao: bool,
}
