//! Error types for the bootstrap and supervision layer
//!
//! Everything in [`BeeswarmError`] is fatal at startup and terminates the
//! process with [`BeeswarmError::exit_code`]. Runtime configuration fetches
//! triggered by a marker file only ever produce a [`FetchError`], which the
//! supervisor logs and discards.

use std::path::PathBuf;

use thiserror::Error;

use crate::mode::Mode;

/// Fatal startup errors
#[derive(Error, Debug)]
pub enum BeeswarmError {
    /// `--workdir` was given as a relative path
    #[error("working directory must be an absolute path, got {0:?}")]
    WorkDirNotAbsolute(PathBuf),

    /// The log file could not be opened or the subscriber could not be installed
    #[error("cannot use log file {path:?}: {reason}")]
    LogFile {
        /// Resolved log file path
        path: PathBuf,
        /// Human readable cause
        reason: String,
    },

    /// Refusing to run a privileged mode as the superuser
    #[error("refusing to run in {mode} mode as root")]
    Privilege {
        /// The mode that was about to start
        mode: Mode,
    },

    /// The explicit `--config` URL could not be turned into a configuration
    #[error("could not acquire configuration from {url}: {source}")]
    Acquisition {
        /// URL supplied by the operator
        url: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// The persisted configuration file exists but does not parse
    #[error("could not parse configuration file {path:?}: {source}")]
    Configuration {
        /// Path of the configuration file
        path: PathBuf,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A collaborator could not be constructed or failed while running
    #[error("instance failed: {0:#}")]
    Instance(#[from] anyhow::Error),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BeeswarmError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Result type alias for startup operations
pub type BeeswarmResult<T> = Result<T, BeeswarmError>;

/// Errors raised while pulling a configuration document from a URL
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, body read)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),

    /// The body was not a JSON object
    #[error("malformed configuration payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document lacks a section the drone cannot run without
    #[error("configuration is missing the '{0}' section")]
    MissingSection(&'static str),

    /// The string handed over is not an http(s) URL
    #[error("not a valid url: {0:?}")]
    InvalidUrl(String),

    /// Persisting the fetched document failed
    #[error("could not persist configuration: {0}")]
    Io(#[from] std::io::Error),
}
