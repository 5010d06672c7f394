use std::collections::{HashMap, HashSet};

use super::geometry::Rect;

/// Measurement seam onto the host view. Every box is reported relative to
/// the viewport; the overlay never writes through this trait.
pub trait AnchorHost {
    /// Current box of the container that defines the drawing space.
    fn container_box(&self) -> Option<Rect>;

    /// Current box of the anchor element for `node_id`, if one is present.
    fn anchor_box(&self, node_id: &str) -> Option<Rect>;

    /// Whether the hosting document is currently shown.
    fn is_visible(&self) -> bool {
        true
    }

    /// Runs one recompute's worth of measurement against a single view of
    /// the host. Hosts whose layout can be swapped between calls hold that
    /// view for the whole of `measure`.
    fn with_view<R>(&self, measure: impl FnOnce(&dyn AnchorHost) -> R) -> R
    where
        Self: Sized,
    {
        measure(self)
    }
}

/// Per-tick resolver. Each node id is measured at most once; misses are
/// cached as well. Drop it at the end of the tick.
pub struct AnchorResolver<'a, H: AnchorHost + ?Sized> {
    host: &'a H,
    origin: Rect,
    known_nodes: Option<HashSet<&'a str>>,
    cache: HashMap<String, Option<Rect>>,
}

impl<'a, H: AnchorHost + ?Sized> AnchorResolver<'a, H> {
    /// `origin` is the container's viewport-relative box for this tick.
    pub fn new(host: &'a H, origin: Rect) -> Self {
        Self {
            host,
            origin,
            known_nodes: None,
            cache: HashMap::new(),
        }
    }

    /// Limits resolution to ids present in the current node snapshot. An
    /// anchor the host still shows for a node that left the snapshot does
    /// not resolve.
    pub fn with_known_nodes<I>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.known_nodes = Some(node_ids.into_iter().collect());
        self
    }

    /// Container-local box for `node_id`, or `None` when the anchor is
    /// absent or degenerate.
    pub fn resolve(&mut self, node_id: &str) -> Option<Rect> {
        if let Some(cached) = self.cache.get(node_id) {
            return *cached;
        }

        let known = self
            .known_nodes
            .as_ref()
            .is_none_or(|known| known.contains(node_id));
        let resolved = if known {
            self.host
                .anchor_box(node_id)
                .filter(Rect::is_measurable)
                .map(|rect| rect.relative_to(&self.origin))
        } else {
            None
        };
        self.cache.insert(node_id.to_owned(), resolved);
        resolved
    }

    /// Ids that resolved to a measurable box so far, sorted.
    pub fn resolved_ids(&self) -> Vec<String> {
        let mut ids = self
            .cache
            .iter()
            .filter(|(_, rect)| rect.is_some())
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }
}
