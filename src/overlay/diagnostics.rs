use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::anyhow;
use tracing::debug;

/// Which end of a connection failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    From,
    To,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recoverable conditions observed while recomputing the overlay. They are
/// recorded on a [`DiagnosticsSink`] and never returned to the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OverlayFault {
    #[error("connection `{connection_id}` has no anchor for {endpoint} node `{node_id}`")]
    MissingAnchor {
        connection_id: String,
        endpoint: Endpoint,
        node_id: String,
    },

    #[error("container box {width}x{height} is not drawable")]
    DegenerateContainer { width: f64, height: f64 },
}

pub trait DiagnosticsSink {
    fn record(&self, fault: &OverlayFault);
}

/// Production sink: drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn record(&self, _fault: &OverlayFault) {}
}

/// Development sink: one structured `debug!` event per fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, fault: &OverlayFault) {
        match fault {
            OverlayFault::MissingAnchor {
                connection_id,
                endpoint,
                node_id,
            } => debug!(
                connection_id = %connection_id,
                endpoint = endpoint.as_str(),
                node_id = %node_id,
                "skipping connection without anchor"
            ),
            OverlayFault::DegenerateContainer { width, height } => debug!(
                width,
                height,
                "container is degenerate; overlay not drawn"
            ),
        }
    }
}

/// Keeps every fault in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    faults: Mutex<Vec<OverlayFault>>,
}

impl RecordingDiagnostics {
    pub fn faults(&self) -> Vec<OverlayFault> {
        self.faults
            .lock()
            .map(|faults| faults.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn record(&self, fault: &OverlayFault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(fault.clone());
        }
    }
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for std::sync::Arc<T> {
    fn record(&self, fault: &OverlayFault) {
        (**self).record(fault);
    }
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for Box<T> {
    fn record(&self, fault: &OverlayFault) {
        (**self).record(fault);
    }
}

/// Selects the sink installed by [`crate::config::OverlaySettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsMode {
    #[default]
    Off,
    Tracing,
}

impl DiagnosticsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Tracing => "tracing",
        }
    }

    pub fn sink(self) -> Box<dyn DiagnosticsSink + Send + Sync> {
        match self {
            Self::Off => Box::new(NoopDiagnostics),
            Self::Tracing => Box::new(TracingDiagnostics),
        }
    }
}

impl Display for DiagnosticsMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagnosticsMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "false" | "0" => Ok(Self::Off),
            "tracing" | "debug" | "true" | "1" => Ok(Self::Tracing),
            other => Err(anyhow!(
                "invalid OVERLAY_DIAGNOSTICS `{other}`; expected `off` or `tracing`"
            )),
        }
    }
}
