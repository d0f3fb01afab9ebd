//! One-shot mailbox for configuration URLs
//!
//! An external dropper writes a single URL line into the marker file; the
//! drone supervisor takes it. Taking always deletes the file before the URL is
//! acted on, so one dropped marker yields at most one fetch attempt.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::workdir::WorkDir;

/// Marker file inside the working directory
#[derive(Debug, Clone)]
pub struct ConfigMarker {
    path: PathBuf,
}

impl ConfigMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Marker at its fixed location inside `work_dir`
    pub fn in_workdir(work_dir: &WorkDir) -> Self {
        Self::new(work_dir.marker_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the marker.
    ///
    /// Returns `Ok(None)` when no marker is present. Otherwise the file is
    /// removed and its first line, trimmed, is returned. A marker that cannot
    /// be read or is not UTF-8 is still removed before the error is returned.
    pub async fn take(&self) -> std::io::Result<Option<String>> {
        let read = match tokio::fs::read(&self.path).await {
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            read => read,
        };

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let content =
            String::from_utf8(read?).map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        let url = content.lines().next().unwrap_or_default().trim().to_string();
        Ok(Some(url))
    }

    /// Drop a URL into the mailbox, as an external dropper would
    pub async fn drop_url(&self, url: &str) -> std::io::Result<()> {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");

        tokio::fs::write(&tmp, format!("{url}\n")).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }

    pub fn is_present(&self) -> bool {
        self.path.exists()
    }
}
