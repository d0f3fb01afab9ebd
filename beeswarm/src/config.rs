//! Configuration document
//!
//! The configuration is an opaque JSON object handed verbatim to the drone or
//! server. Only `general.mode` steers the bootstrap; everything else belongs
//! to the collaborators.

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BeeswarmError, BeeswarmResult};
use crate::mode::DRONE_MODE;

/// Mode assumed when a `general` section is present but its `mode` is
/// missing, null or empty.
pub const DEFAULT_MODE: &str = DRONE_MODE;

/// Top-level configuration (from beeswarmcfg.json or a configuration URL)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    /// Parse a JSON object. Non-object documents are rejected.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Load from a specific path. A missing file is `Ok(None)`.
    pub fn load_from_path(path: &Path) -> BeeswarmResult<Option<Self>> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("Loading configuration from: {}", path.display());
        Self::from_slice(&content)
            .map(Some)
            .map_err(|source| BeeswarmError::Configuration {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Replace the file at `path` with this document.
    ///
    /// The document is written next to the target and renamed over it, so a
    /// reader never observes a half-written file.
    pub async fn persist(&self, path: &Path) -> std::io::Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        tokio::fs::write(&tmp, self.to_pretty_json()?).await?;
        tokio::fs::rename(&tmp, path).await
    }

    fn to_pretty_json(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }

    /// Get a top-level section
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    /// Mode requested by this document.
    ///
    /// `None` when there is no `general` section at all. A present section
    /// without a usable `mode` yields [`DEFAULT_MODE`].
    pub fn persisted_mode(&self) -> Option<&str> {
        let general = self.section("general")?;
        match general.get("mode").and_then(Value::as_str) {
            Some(mode) if !mode.is_empty() => Some(mode),
            _ => Some(DEFAULT_MODE),
        }
    }

    /// Drone identifier from `general.id`, if any
    pub fn drone_id(&self) -> Option<String> {
        match self.section("general")?.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Names of the configured capabilities
    pub fn capability_names(&self) -> Vec<&str> {
        self.section("capabilities")
            .map(|caps| caps.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
