use crate::model::Connection;

use super::anchor::{AnchorHost, AnchorResolver};
use super::diagnostics::{DiagnosticsSink, Endpoint, OverlayFault};
use super::geometry::Rect;

/// A connection whose endpoints both resolved this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedConnection<'c> {
    pub connection: &'c Connection,
    pub from_box: Rect,
    pub to_box: Rect,
}

/// Keeps only connections with two measurable endpoints, in input order.
/// Every dropped connection is reported once on `diagnostics`; the `from`
/// endpoint wins when both are missing.
pub fn filter_connections<'c, H, D>(
    connections: &'c [Connection],
    resolver: &mut AnchorResolver<'_, H>,
    diagnostics: &D,
) -> Vec<ResolvedConnection<'c>>
where
    H: AnchorHost + ?Sized,
    D: DiagnosticsSink + ?Sized,
{
    let mut valid = Vec::with_capacity(connections.len());

    for connection in connections {
        let from_box = resolver.resolve(&connection.from);
        let to_box = resolver.resolve(&connection.to);

        match (from_box, to_box) {
            (Some(from_box), Some(to_box)) => valid.push(ResolvedConnection {
                connection,
                from_box,
                to_box,
            }),
            (None, _) => diagnostics.record(&OverlayFault::MissingAnchor {
                connection_id: connection.id.clone(),
                endpoint: Endpoint::From,
                node_id: connection.from.clone(),
            }),
            (Some(_), None) => diagnostics.record(&OverlayFault::MissingAnchor {
                connection_id: connection.id.clone(),
                endpoint: Endpoint::To,
                node_id: connection.to.clone(),
            }),
        }
    }

    valid
}
