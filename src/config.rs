use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, ensure};

use crate::overlay::diagnostics::DiagnosticsMode;
use crate::overlay::worker::OverlayWorkerConfig;

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const DEFAULT_FILE_LOG_FILTER: &str = "debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySettings {
    pub frame_interval_ms: u64,
    pub diagnostics: DiagnosticsMode,
    pub log_dir: Option<PathBuf>,
    pub file_log_filter: String,
}

impl OverlaySettings {
    pub fn from_env() -> Result<Self> {
        // Load .env if present, but do not fail if file does not exist.
        let _ = dotenvy::dotenv();

        let frame_interval_ms =
            parse_u64_env("OVERLAY_FRAME_INTERVAL_MS", DEFAULT_FRAME_INTERVAL_MS)?;
        ensure!(
            frame_interval_ms > 0,
            "OVERLAY_FRAME_INTERVAL_MS must be greater than 0"
        );

        let diagnostics = match read_optional_env("OVERLAY_DIAGNOSTICS") {
            Some(raw) => raw
                .parse::<DiagnosticsMode>()
                .context("failed to parse OVERLAY_DIAGNOSTICS")?,
            None => DiagnosticsMode::default(),
        };

        let log_dir = read_optional_env("OVERLAY_LOG_DIR").map(PathBuf::from);
        let file_log_filter = read_optional_env("OVERLAY_FILE_LOG")
            .unwrap_or_else(|| DEFAULT_FILE_LOG_FILTER.to_owned());

        Ok(Self {
            frame_interval_ms,
            diagnostics,
            log_dir,
            file_log_filter,
        })
    }

    pub fn worker_config(&self) -> OverlayWorkerConfig {
        OverlayWorkerConfig {
            frame_interval: Duration::from_millis(self.frame_interval_ms),
        }
    }
}

fn read_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn parse_u64_env(name: &str, default: u64) -> Result<u64> {
    match read_optional_env(name) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("failed to parse {name} as u64")),
        None => Ok(default),
    }
}
