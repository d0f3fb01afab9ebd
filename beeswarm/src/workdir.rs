//! Working directory and the fixed file layout inside it

use std::path::{Path, PathBuf};

use crate::error::{BeeswarmError, BeeswarmResult};

/// Persisted configuration document
pub const CONFIG_FILE_NAME: &str = "beeswarmcfg.json";

/// One-line marker file carrying a configuration URL
pub const MARKER_FILE_NAME: &str = "API_CONFIG_URL";

/// Default log file name, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "beeswarm.log";

/// Absolute directory every other path of the process is rooted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Validate `root`. Relative paths are rejected rather than resolved.
    pub fn new(root: impl Into<PathBuf>) -> BeeswarmResult<Self> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(BeeswarmError::WorkDirNotAbsolute(root));
        }
        Ok(Self { root })
    }

    /// Use `root` if given, otherwise the current directory
    pub fn from_arg(root: Option<&Path>) -> BeeswarmResult<Self> {
        match root {
            Some(path) => Self::new(path),
            None => Self::new(std::env::current_dir()?),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn marker_file(&self) -> PathBuf {
        self.root.join(MARKER_FILE_NAME)
    }

    /// Resolve a possibly relative path against the working directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
