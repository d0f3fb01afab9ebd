//! Logging setup and the per-component logging context
//!
//! The subscriber is installed once by the binary. Components never reach for
//! an implicit global logger; they are handed a [`LogContext`] at construction
//! and emit their events under its span.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{BeeswarmError, BeeswarmResult};

/// Install the process subscriber: stderr plus an append-only log file.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug`
/// when `verbose` is set.
pub fn init(verbose: bool, log_file: &Path) -> BeeswarmResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| BeeswarmError::LogFile {
            path: log_file.to_path_buf(),
            reason: e.to_string(),
        })?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| BeeswarmError::LogFile {
            path: log_file.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Logging context injected into each component
#[derive(Debug, Clone)]
pub struct LogContext {
    span: Span,
}

impl LogContext {
    /// Root context for the process lifetime
    pub fn root() -> Self {
        Self {
            span: tracing::info_span!("beeswarm"),
        }
    }

    /// Child context for a named component
    pub fn component(&self, name: &'static str) -> Self {
        Self {
            span: tracing::info_span!(parent: &self.span, "component", component = name),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
