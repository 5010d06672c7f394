use tracing::{debug, info, trace};

use crate::model::OverlayProps;

pub mod anchor;
pub mod diagnostics;
pub mod filter;
pub mod geometry;
pub mod observers;
pub mod scheduler;
pub mod surface;
pub mod worker;

use self::anchor::{AnchorHost, AnchorResolver};
use self::diagnostics::{DiagnosticsSink, NoopDiagnostics, OverlayFault};
use self::filter::filter_connections;
use self::geometry::{Rect, path_for, port_point};
use self::observers::{ObservedTarget, ResizeObserver, StructureObserver};
use self::scheduler::{FrameLoop, LifecycleState, Liveness, PendingRefresh, RefreshTrigger};
use self::surface::{DrawnPath, Surface};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The surface now holds `paths` drawn connections.
    Rendered {
        paths: usize,
        reason: PendingRefresh,
    },
    /// Container has no drawable area; there is no surface.
    NullRender,
    /// Document hidden; geometry work skipped, loop still armed.
    Hidden,
    /// Nothing was pending.
    Idle,
    /// The overlay is torn down; nothing was touched.
    Dead,
}

/// Draws straight lines between host-owned diagram nodes.
///
/// The overlay keeps no geometry between ticks: every recompute measures
/// the anchors again, filters out connections whose endpoints are missing
/// and replaces the drawn path set wholesale.
pub struct ConnectionOverlay<H, D = NoopDiagnostics> {
    host: H,
    diagnostics: D,
    props: OverlayProps,
    lifecycle: LifecycleState,
    liveness: Liveness,
    frame_loop: FrameLoop,
    resize_observer: ResizeObserver,
    structure_observer: StructureObserver,
    pending: PendingRefresh,
    surface: Option<Surface>,
    container_degenerate: bool,
    recompute_count: u64,
}

impl<H: AnchorHost> ConnectionOverlay<H> {
    pub fn new(host: H, props: OverlayProps) -> Self {
        Self::with_diagnostics(host, NoopDiagnostics, props)
    }
}

impl<H, D> ConnectionOverlay<H, D> {
    pub fn state(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn props(&self) -> &OverlayProps {
        &self.props
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn pending(&self) -> PendingRefresh {
        self.pending
    }

    pub fn resize_observer(&self) -> &ResizeObserver {
        &self.resize_observer
    }

    pub fn structure_observer(&self) -> &StructureObserver {
        &self.structure_observer
    }

    pub fn is_frame_loop_armed(&self) -> bool {
        self.frame_loop.is_armed()
    }

    /// Number of recomputes performed so far.
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// Shared flag a driver can clear to stop ticks already on their way.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn render_svg(&self) -> Option<String> {
        self.surface.as_ref().map(Surface::to_svg)
    }

    /// Unmounts. Safe to call any number of times, from any state,
    /// including when the container never had a drawable size.
    pub fn teardown(&mut self) {
        self.liveness.kill();
        self.frame_loop.cancel();
        self.resize_observer.disconnect();
        self.structure_observer.disconnect();
        self.pending = PendingRefresh::default();
        self.surface = None;

        let previous = self.lifecycle;
        self.lifecycle = previous.torn_down();
        if previous != LifecycleState::TornDown {
            info!(
                previous = previous.label(),
                recomputes = self.recompute_count,
                "connection overlay torn down"
            );
        }
    }
}

impl<H: AnchorHost, D: DiagnosticsSink> ConnectionOverlay<H, D> {
    pub fn with_diagnostics(host: H, diagnostics: D, props: OverlayProps) -> Self {
        Self {
            host,
            diagnostics,
            props,
            lifecycle: LifecycleState::default(),
            liveness: Liveness::default(),
            frame_loop: FrameLoop::default(),
            resize_observer: ResizeObserver::default(),
            structure_observer: StructureObserver::default(),
            pending: PendingRefresh::default(),
            surface: None,
            container_degenerate: false,
            recompute_count: 0,
        }
    }

    /// Arms the frame loop, connects both observers and schedules the first
    /// recompute. Ignored unless the overlay is still uninitialized.
    pub fn mount(&mut self) {
        if self.lifecycle != LifecycleState::Uninitialized || !self.liveness.is_alive() {
            return;
        }

        self.lifecycle = self.lifecycle.mounted();
        self.frame_loop.arm();
        self.resize_observer.connect();
        self.structure_observer.connect();
        self.pending.insert(RefreshTrigger::Mount);
        info!(
            connections = self.props.connections.len(),
            componentes = self.props.componentes.len(),
            modo_edicao = self.props.modo_edicao,
            "connection overlay mounted"
        );
    }

    /// Replaces the host snapshot. The edit-mode attribute follows at once;
    /// lines follow on the next tick.
    pub fn update_props(&mut self, props: OverlayProps) {
        if self.lifecycle == LifecycleState::TornDown {
            return;
        }

        if let Some(surface) = self.surface.as_mut() {
            surface.set_edit_mode(props.modo_edicao);
        }
        self.props = props;
        if self.lifecycle.is_mounted() {
            self.pending.insert(RefreshTrigger::Props);
        }
    }

    /// Resize notification for `target`. Returns whether it was accepted;
    /// targets the observer is not watching are ignored.
    pub fn notify_resize(&mut self, target: &ObservedTarget) -> bool {
        if !self.resize_observer.observes(target) {
            return false;
        }
        self.pending.insert(RefreshTrigger::Resize);
        true
    }

    /// Anchor insertion/removal somewhere in the surrounding subtree.
    pub fn notify_structure(&mut self) -> bool {
        if !self.structure_observer.is_connected() {
            return false;
        }
        self.pending.insert(RefreshTrigger::Structure);
        true
    }

    /// One iteration of the frame loop. Always recomputes while visible.
    pub fn tick(&mut self) -> TickOutcome {
        self.run_tick(Some(RefreshTrigger::Frame))
    }

    /// Services pending observer and prop triggers without waiting for the
    /// next frame. Returns [`TickOutcome::Idle`] when nothing is pending.
    pub fn flush(&mut self) -> TickOutcome {
        self.run_tick(None)
    }

    fn run_tick(&mut self, trigger: Option<RefreshTrigger>) -> TickOutcome {
        if !self.liveness.is_alive() {
            self.teardown();
            return TickOutcome::Dead;
        }
        if self.lifecycle == LifecycleState::TornDown {
            return TickOutcome::Dead;
        }
        if !self.lifecycle.is_mounted() {
            return TickOutcome::Idle;
        }
        if let Some(trigger) = trigger {
            if !self.frame_loop.is_armed() {
                return TickOutcome::Dead;
            }
            self.pending.insert(trigger);
        }

        let visible = self.host.is_visible();
        let next_state = self.lifecycle.with_visibility(visible);
        if next_state != self.lifecycle {
            debug!(
                from = self.lifecycle.label(),
                to = next_state.label(),
                "connection overlay visibility changed"
            );
            self.lifecycle = next_state;
        }
        if !visible {
            return TickOutcome::Hidden;
        }
        if self.pending.is_empty() {
            return TickOutcome::Idle;
        }

        let reason = self.pending.take();
        self.recompute(reason)
    }

    fn recompute(&mut self, reason: PendingRefresh) -> TickOutcome {
        self.recompute_count = self.recompute_count.saturating_add(1);

        let props = &self.props;
        let diagnostics = &self.diagnostics;
        let measurement = self
            .host
            .with_view(|view| measure(view, props, diagnostics));

        // Teardown can be requested from another thread while the host is
        // being measured; nothing from this tick may land after that.
        if !self.liveness.is_alive() {
            self.teardown();
            return TickOutcome::Dead;
        }

        let (container, paths, observed_anchors) = match measurement {
            Measurement::Degenerate { width, height } => {
                if !self.container_degenerate {
                    self.diagnostics
                        .record(&OverlayFault::DegenerateContainer { width, height });
                }
                self.container_degenerate = true;
                self.surface = None;
                self.resize_observer.observe_anchors(Vec::new());
                return TickOutcome::NullRender;
            }
            Measurement::Drawable {
                container,
                paths,
                observed_anchors,
            } => (container, paths, observed_anchors),
        };
        self.container_degenerate = false;

        self.resize_observer.observe_anchors(observed_anchors);
        match self.surface.as_mut() {
            Some(surface) => {
                surface.resize(container.width, container.height);
                surface.set_edit_mode(self.props.modo_edicao);
            }
            None => {
                self.surface =
                    Surface::create(container.width, container.height, self.props.modo_edicao);
            }
        }
        let Some(surface) = self.surface.as_mut() else {
            return TickOutcome::NullRender;
        };
        surface.replace_paths(paths);

        let drawn = surface.connections().len();
        let skipped = self.props.connections.len() - drawn;
        if reason == frame_only() {
            trace!(drawn, skipped, "connection overlay recomputed");
        } else {
            debug!(
                reason = %reason,
                drawn,
                skipped,
                width = container.width,
                height = container.height,
                "connection overlay recomputed"
            );
        }

        TickOutcome::Rendered {
            paths: drawn,
            reason,
        }
    }
}

/// Everything one recompute reads from the host.
enum Measurement {
    Degenerate {
        width: f64,
        height: f64,
    },
    Drawable {
        container: Rect,
        paths: Vec<DrawnPath>,
        observed_anchors: Vec<String>,
    },
}

fn measure<D: DiagnosticsSink>(
    host: &dyn AnchorHost,
    props: &OverlayProps,
    diagnostics: &D,
) -> Measurement {
    let container = host.container_box();
    let Some(container) = container.filter(Rect::is_measurable) else {
        let (width, height) = container
            .map(|rect| (rect.width, rect.height))
            .unwrap_or_default();
        return Measurement::Degenerate { width, height };
    };

    let mut resolver = AnchorResolver::new(host, container).with_known_nodes(
        props
            .componentes
            .iter()
            .map(|componente| componente.id.as_str()),
    );
    let valid = filter_connections(&props.connections, &mut resolver, diagnostics);
    let paths = valid
        .iter()
        .map(|resolved| DrawnPath {
            connection_id: resolved.connection.id.clone(),
            path: path_for(
                port_point(&resolved.from_box, resolved.connection.from_port),
                port_point(&resolved.to_box, resolved.connection.to_port),
            ),
        })
        .collect();

    Measurement::Drawable {
        container,
        paths,
        observed_anchors: resolver.resolved_ids(),
    }
}

impl<H, D> Drop for ConnectionOverlay<H, D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn frame_only() -> PendingRefresh {
    let mut pending = PendingRefresh::default();
    pending.insert(RefreshTrigger::Frame);
    pending
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, OnceLock};

    use crate::model::Port;
    use crate::overlay::anchor::AnchorHost;
    use crate::overlay::diagnostics::{Endpoint, OverlayFault, RecordingDiagnostics};
    use crate::overlay::geometry::{Point, Rect, path_for};
    use crate::overlay::observers::ObservedTarget;
    use crate::overlay::scheduler::{LifecycleState, Liveness, RefreshTrigger};
    use crate::test_support::{
        FakeHost, componente, connection, two_node_host, two_node_props,
    };

    use super::{ConnectionOverlay, TickOutcome};

    /// Clears the overlay's liveness the moment an anchor is measured, the
    /// way a shutdown from another thread would.
    struct ShutdownWhileMeasuring {
        inner: FakeHost,
        liveness: OnceLock<Liveness>,
    }

    impl AnchorHost for ShutdownWhileMeasuring {
        fn container_box(&self) -> Option<Rect> {
            self.inner.container_box()
        }

        fn anchor_box(&self, node_id: &str) -> Option<Rect> {
            if let Some(liveness) = self.liveness.get() {
                liveness.kill();
            }
            self.inner.anchor_box(node_id)
        }
    }

    fn mounted(host: &FakeHost) -> ConnectionOverlay<FakeHost, Arc<RecordingDiagnostics>> {
        let mut overlay = ConnectionOverlay::with_diagnostics(
            host.clone(),
            Arc::new(RecordingDiagnostics::default()),
            two_node_props(false),
        );
        overlay.mount();
        overlay
    }

    #[test]
    fn reference_diagram_draws_one_segment_between_ports() {
        let host = two_node_host();
        let mut overlay = mounted(&host);

        let outcome = overlay.tick();

        assert!(matches!(outcome, TickOutcome::Rendered { paths: 1, .. }));
        let surface = overlay.surface().expect("surface should exist");
        assert_eq!(surface.view_box(), "0 0 800 500");
        let drawn = &surface.connections().paths()[0];
        assert_eq!(drawn.connection_id, "c1");
        assert_eq!(
            drawn.path,
            path_for(Point::new(132.0, 100.0), Point::new(218.0, 100.0))
        );
        assert!(overlay.diagnostics().faults().is_empty());
    }

    #[test]
    fn connection_with_unknown_from_does_not_change_drawn_count() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();
        let baseline = overlay.surface().map(|surface| surface.connections().len());

        let mut props = two_node_props(false);
        props
            .connections
            .push(connection("c2", "node-inexistente", Port::Right, "node2", Port::Left));
        overlay.update_props(props);
        overlay.tick();

        assert_eq!(baseline, Some(1));
        assert_eq!(
            overlay.surface().map(|surface| surface.connections().len()),
            Some(1)
        );
        assert_eq!(
            overlay.diagnostics().faults(),
            vec![OverlayFault::MissingAnchor {
                connection_id: "c2".to_owned(),
                endpoint: Endpoint::From,
                node_id: "node-inexistente".to_owned(),
            }]
        );
    }

    #[test]
    fn drawn_set_is_exactly_connections_with_two_resolved_endpoints() {
        let host = two_node_host().with_anchor("node3", Rect::new(400.0, 300.0, 50.0, 20.0));
        let mut overlay = mounted(&host);
        let mut props = two_node_props(false);
        props.componentes.push(componente("node3"));
        props.connections = vec![
            connection("a", "node1", Port::Bottom, "node3", Port::Top),
            connection("b", "node3", Port::Left, "ghost", Port::Right),
            connection("c", "node2", Port::Right, "node3", Port::Left),
            connection("d", "ghost", Port::Left, "node1", Port::Left),
        ];
        overlay.update_props(props);
        overlay.tick();

        let ids = overlay
            .surface()
            .expect("surface should exist")
            .connections()
            .paths()
            .iter()
            .map(|drawn| drawn.connection_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["a", "c"]);

        host.remove_anchor("node3");
        overlay.notify_structure();
        overlay.tick();
        assert_eq!(
            overlay.surface().map(|surface| surface.connections().len()),
            Some(0)
        );

        host.set_anchor("node3", Rect::new(400.0, 300.0, 50.0, 20.0));
        overlay.tick();
        assert_eq!(
            overlay.surface().map(|surface| surface.connections().len()),
            Some(2)
        );
    }

    #[test]
    fn node_removed_from_snapshot_drops_its_lines_even_if_anchor_lingers() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();

        let mut props = two_node_props(false);
        props.componentes.retain(|componente| componente.id != "node2");
        overlay.update_props(props);
        overlay.tick();

        assert_eq!(
            overlay.surface().map(|surface| surface.connections().len()),
            Some(0)
        );
    }

    #[test]
    fn identical_inputs_produce_identical_svg() {
        let host = two_node_host().with_anchor("node2", Rect::new(218.25, 68.5, 64.0, 63.5));
        let mut overlay = mounted(&host);

        overlay.tick();
        let first = overlay.render_svg().expect("svg should exist");
        overlay.tick();
        let second = overlay.render_svg().expect("svg should exist");

        assert_eq!(first, second);
        assert!(first.contains("d=\"M 132 100 L 218.25 100.25\""));
    }

    #[test]
    fn lines_follow_container_offset_and_moving_anchors() {
        let host = FakeHost::new(Rect::new(100.0, 50.0, 800.0, 500.0))
            .with_anchor("node1", Rect::new(168.0, 118.0, 64.0, 64.0))
            .with_anchor("node2", Rect::new(318.0, 118.0, 64.0, 64.0));
        let mut overlay = mounted(&host);
        overlay.tick();
        assert_eq!(
            overlay.surface().expect("surface").connections().paths()[0].path,
            path_for(Point::new(132.0, 100.0), Point::new(218.0, 100.0))
        );

        host.set_anchor("node2", Rect::new(318.0, 218.0, 64.0, 64.0));
        overlay.tick();
        assert_eq!(
            overlay.surface().expect("surface").connections().paths()[0].path,
            path_for(Point::new(132.0, 100.0), Point::new(218.0, 200.0))
        );
    }

    #[test]
    fn degenerate_container_renders_nothing_and_recovers() {
        let host = two_node_host();
        host.set_container(Some(Rect::new(0.0, 0.0, 0.0, 500.0)));
        let mut overlay = mounted(&host);

        assert_eq!(overlay.tick(), TickOutcome::NullRender);
        assert!(overlay.surface().is_none());
        assert!(overlay.render_svg().is_none());
        assert!(overlay.diagnostics().faults().contains(
            &OverlayFault::DegenerateContainer {
                width: 0.0,
                height: 500.0,
            }
        ));

        host.set_container(None);
        assert_eq!(overlay.tick(), TickOutcome::NullRender);
        assert_eq!(overlay.tick(), TickOutcome::NullRender);
        assert_eq!(overlay.diagnostics().faults().len(), 1);

        host.set_container(Some(Rect::new(0.0, 0.0, 640.0, 480.0)));
        overlay.notify_resize(&ObservedTarget::Container);
        assert!(matches!(overlay.tick(), TickOutcome::Rendered { paths: 1, .. }));
        assert_eq!(
            overlay.surface().map(|surface| surface.view_box()),
            Some("0 0 640 480".to_owned())
        );

        host.set_container(Some(Rect::new(0.0, 0.0, 640.0, 0.0)));
        assert_eq!(overlay.tick(), TickOutcome::NullRender);
        assert_eq!(
            overlay.diagnostics().faults(),
            vec![
                OverlayFault::DegenerateContainer {
                    width: 0.0,
                    height: 500.0,
                },
                OverlayFault::DegenerateContainer {
                    width: 640.0,
                    height: 0.0,
                },
            ]
        );
    }

    #[test]
    fn teardown_requested_during_measurement_discards_the_tick() {
        let host = ShutdownWhileMeasuring {
            inner: two_node_host(),
            liveness: OnceLock::new(),
        };
        let mut overlay = ConnectionOverlay::new(host, two_node_props(false));
        assert!(overlay.host().liveness.set(overlay.liveness()).is_ok());
        overlay.mount();

        assert_eq!(overlay.tick(), TickOutcome::Dead);
        assert_eq!(overlay.recompute_count(), 1);
        assert!(overlay.surface().is_none());
        assert!(overlay.render_svg().is_none());
        assert_eq!(overlay.state(), LifecycleState::TornDown);
        assert!(!overlay.resize_observer().is_connected());
        assert_eq!(overlay.tick(), TickOutcome::Dead);
    }

    #[test]
    fn surface_shrinks_away_when_container_collapses() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();
        assert!(overlay.surface().is_some());

        host.set_container(Some(Rect::new(0.0, 0.0, 800.0, -2.0)));
        assert_eq!(overlay.tick(), TickOutcome::NullRender);
        assert!(overlay.surface().is_none());
        assert_eq!(overlay.resize_observer().targets().count(), 1);
    }

    #[test]
    fn edit_mode_attribute_tracks_latest_flag() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();

        for modo_edicao in [false, true, false] {
            overlay.update_props(two_node_props(modo_edicao));
            assert_eq!(
                overlay.surface().map(|surface| surface.edit_mode()),
                Some(modo_edicao)
            );
            overlay.tick();
            let svg = overlay.render_svg().expect("svg should exist");
            assert!(svg.contains(&format!("data-edit-mode=\"{modo_edicao}\"")));
        }
    }

    #[test]
    fn hidden_document_skips_geometry_but_stays_armed() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();
        let measured = host.total_measurements();
        let recomputes = overlay.recompute_count();

        host.set_visible(false);
        overlay.notify_resize(&ObservedTarget::anchor("node1"));
        assert_eq!(overlay.tick(), TickOutcome::Hidden);
        assert_eq!(overlay.tick(), TickOutcome::Hidden);
        assert_eq!(overlay.state(), LifecycleState::MountedInactive);
        assert_eq!(host.total_measurements(), measured);
        assert_eq!(overlay.recompute_count(), recomputes);
        assert!(overlay.is_frame_loop_armed());
        assert!(overlay.pending().contains(RefreshTrigger::Resize));

        host.set_visible(true);
        let outcome = overlay.tick();
        assert_eq!(overlay.state(), LifecycleState::MountedActive);
        let TickOutcome::Rendered { reason, .. } = outcome else {
            panic!("expected a render after visibility returned, got {outcome:?}");
        };
        assert!(reason.contains(RefreshTrigger::Resize));
        assert!(reason.contains(RefreshTrigger::Frame));
    }

    #[test]
    fn notifications_in_one_frame_coalesce_into_one_recompute() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();
        let recomputes = overlay.recompute_count();

        assert!(overlay.notify_resize(&ObservedTarget::Container));
        assert!(overlay.notify_resize(&ObservedTarget::anchor("node2")));
        assert!(overlay.notify_structure());
        overlay.update_props(two_node_props(true));
        let outcome = overlay.flush();

        assert_eq!(overlay.recompute_count(), recomputes + 1);
        let TickOutcome::Rendered { reason, .. } = outcome else {
            panic!("expected render, got {outcome:?}");
        };
        assert_eq!(reason.label(), "props+resize+structure");
        assert_eq!(overlay.flush(), TickOutcome::Idle);
    }

    #[test]
    fn resize_observer_watches_container_and_resolved_anchors_only() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        let mut props = two_node_props(false);
        props
            .connections
            .push(connection("c2", "node1", Port::Top, "ghost", Port::Top));
        overlay.update_props(props);
        overlay.tick();

        let targets = overlay
            .resize_observer()
            .targets()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(
            targets,
            vec![
                ObservedTarget::Container,
                ObservedTarget::anchor("node1"),
                ObservedTarget::anchor("node2"),
            ]
        );
        assert!(!overlay.notify_resize(&ObservedTarget::anchor("ghost")));
    }

    #[test]
    fn signals_after_teardown_have_no_effect() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();

        overlay.teardown();
        let recomputes = overlay.recompute_count();
        let measured = host.total_measurements();

        assert!(!overlay.notify_resize(&ObservedTarget::Container));
        assert!(!overlay.notify_resize(&ObservedTarget::anchor("node1")));
        assert!(!overlay.notify_structure());
        overlay.update_props(two_node_props(true));
        assert_eq!(overlay.tick(), TickOutcome::Dead);
        assert_eq!(overlay.flush(), TickOutcome::Dead);

        assert_eq!(overlay.recompute_count(), recomputes);
        assert_eq!(host.total_measurements(), measured);
        assert!(overlay.pending().is_empty());
        assert!(overlay.surface().is_none());
        assert!(!overlay.props().modo_edicao);
        assert_eq!(overlay.state(), LifecycleState::TornDown);
    }

    #[test]
    fn teardown_is_idempotent_and_works_before_attach() {
        let host = two_node_host();
        host.set_container(Some(Rect::new(0.0, 0.0, 0.0, 0.0)));
        let mut overlay = mounted(&host);
        overlay.tick();
        assert!(overlay.surface().is_none());

        overlay.teardown();
        overlay.teardown();

        assert_eq!(overlay.state(), LifecycleState::TornDown);
        assert!(!overlay.is_frame_loop_armed());
        assert!(!overlay.resize_observer().is_connected());
        assert!(!overlay.structure_observer().is_connected());

        overlay.mount();
        assert_eq!(overlay.state(), LifecycleState::TornDown);
    }

    #[test]
    fn teardown_of_never_mounted_overlay_is_terminal() {
        let mut overlay = ConnectionOverlay::new(two_node_host(), two_node_props(false));
        assert_eq!(overlay.tick(), TickOutcome::Idle);

        overlay.teardown();
        overlay.mount();

        assert_eq!(overlay.state(), LifecycleState::TornDown);
        assert_eq!(overlay.tick(), TickOutcome::Dead);
    }

    #[test]
    fn tick_queued_before_teardown_sees_cleared_liveness() {
        let host = two_node_host();
        let mut overlay = mounted(&host);
        overlay.tick();
        let recomputes = overlay.recompute_count();
        let liveness = overlay.liveness();

        liveness.kill();
        host.set_anchor("node2", Rect::new(500.0, 68.0, 64.0, 64.0));

        assert_eq!(overlay.tick(), TickOutcome::Dead);
        assert_eq!(overlay.recompute_count(), recomputes);
        assert_eq!(overlay.state(), LifecycleState::TornDown);
        assert!(overlay.surface().is_none());
    }
}
