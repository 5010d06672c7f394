use super::geometry::{PathDescriptor, Rect};

pub const SURFACE_CLASS: &str = "connection-overlay";
pub const CONNECTIONS_LAYER_ID: &str = "connections";
pub const CONNECTION_PATH_CLASS: &str = "connection-line";

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnPath {
    pub connection_id: String,
    pub path: PathDescriptor,
}

/// Grouping node for connection lines. Other layers can sit next to it
/// later without renumbering what is already drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionsLayer {
    paths: Vec<DrawnPath>,
}

impl ConnectionsLayer {
    pub fn id(&self) -> &'static str {
        CONNECTIONS_LAYER_ID
    }

    pub fn paths(&self) -> &[DrawnPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// The single drawing surface of a mounted overlay. Its coordinate space
/// is the container's pixel box, `[0, width] x [0, height]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: f64,
    height: f64,
    edit_mode: bool,
    connections: ConnectionsLayer,
}

impl Surface {
    /// Returns `None` unless both sides are finite and strictly positive.
    pub fn create(width: f64, height: f64, edit_mode: bool) -> Option<Self> {
        if !is_drawable_size(width, height) {
            return None;
        }

        Some(Self {
            width,
            height,
            edit_mode,
            connections: ConnectionsLayer::default(),
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn connections(&self) -> &ConnectionsLayer {
        &self.connections
    }

    pub fn coordinate_space(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn view_box(&self) -> String {
        format!("0 0 {} {}", self.width, self.height)
    }

    /// Resizes in place. Returns `false`, leaving the surface untouched, if
    /// the new size is not drawable.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if !is_drawable_size(width, height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        self.edit_mode = edit_mode;
    }

    /// Replaces the drawn set wholesale with one path per valid connection.
    pub fn replace_paths(&mut self, paths: Vec<DrawnPath>) {
        self.connections.paths = paths;
    }

    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            "<svg xmlns=\"{SVG_NAMESPACE}\" class=\"{SURFACE_CLASS}\" data-edit-mode=\"{}\" width=\"{}\" height=\"{}\" viewBox=\"{}\" pointer-events=\"none\">",
            self.edit_mode,
            self.width,
            self.height,
            self.view_box()
        );
        svg.push_str(&format!("<g data-layer=\"{}\">", self.connections.id()));
        for drawn in &self.connections.paths {
            svg.push_str(&format!(
                "<path class=\"{CONNECTION_PATH_CLASS}\" data-connection-id=\"{}\" d=\"{}\" fill=\"none\"/>",
                escape_xml(&drawn.connection_id),
                drawn.path
            ));
        }
        svg.push_str("</g></svg>");
        svg
    }
}

fn is_drawable_size(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
