use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::Port;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box. Coordinates are viewport-relative when they come from
/// the host and container-local once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box is measurable when every component is finite and both sides
    /// are strictly positive.
    pub fn is_measurable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Re-express this box relative to `origin`'s top-left corner.
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect {
            x: self.x - origin.x,
            y: self.y - origin.y,
            width: self.width,
            height: self.height,
        }
    }
}

pub fn port_point(rect: &Rect, port: Port) -> Point {
    match port {
        Port::Right => Point::new(rect.x + rect.width, rect.y + rect.height / 2.0),
        Port::Left => Point::new(rect.x, rect.y + rect.height / 2.0),
        Port::Top => Point::new(rect.x + rect.width / 2.0, rect.y),
        Port::Bottom => Point::new(rect.x + rect.width / 2.0, rect.y + rect.height),
    }
}

/// A single straight segment. No curvature and no rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathDescriptor {
    pub from: Point,
    pub to: Point,
}

impl PathDescriptor {
    /// SVG path data, `M x y L x y`.
    pub fn to_svg_d(&self) -> String {
        self.to_string()
    }
}

impl Display for PathDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "M {} {} L {} {}",
            self.from.x, self.from.y, self.to.x, self.to.y
        )
    }
}

pub fn path_for(from: Point, to: Point) -> PathDescriptor {
    PathDescriptor { from, to }
}
