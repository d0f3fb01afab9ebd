//! Configuration acquisition
//!
//! Two paths lead to a configuration:
//!
//! - at startup, [`ConfigAcquirer::acquire_initial`] prefers an explicit
//!   `--config` URL, then the persisted file, and treats failures as fatal;
//! - at runtime, [`ConfigAcquirer::fetch_from_marker`] follows a URL taken
//!   from the marker file and only ever logs failures.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Configuration;
use crate::error::{BeeswarmError, BeeswarmResult, FetchError};
use crate::logging::LogContext;

/// Timeout for a single configuration download
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Section a fetched document must carry to be usable
const REQUIRED_SECTION: &str = "general";

/// True for absolute http(s) URLs with a host
pub fn is_url(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Pulls a configuration from a URL and persists it to `destination`
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<Configuration, FetchError>;
}

/// reqwest-backed fetcher
pub struct HttpConfigFetcher {
    client: reqwest::Client,
}

impl HttpConfigFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigFetcher for HttpConfigFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<Configuration, FetchError> {
        if !is_url(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        let config = Configuration::from_slice(&body)?;
        if config.section(REQUIRED_SECTION).is_none() {
            return Err(FetchError::MissingSection(REQUIRED_SECTION));
        }

        config.persist(destination).await?;
        Ok(config)
    }
}

/// Resolves configurations for the bootstrap and the drone supervisor
#[derive(Clone)]
pub struct ConfigAcquirer {
    fetcher: Arc<dyn ConfigFetcher>,
    config_file: PathBuf,
    log: LogContext,
}

impl ConfigAcquirer {
    pub fn new(fetcher: Arc<dyn ConfigFetcher>, config_file: impl Into<PathBuf>, log: LogContext) -> Self {
        Self {
            fetcher,
            config_file: config_file.into(),
            log,
        }
    }

    /// Startup acquisition: explicit URL, then persisted file, then nothing.
    ///
    /// A failing explicit URL is fatal since the operator asked for it.
    pub async fn acquire_initial(&self, explicit_url: Option<&str>) -> BeeswarmResult<Option<Configuration>> {
        match explicit_url.map(str::trim) {
            Some(url) if is_url(url) => {
                tracing::info!(parent: self.log.span(), "Fetching configuration from {}", url);
                return match self.fetcher.fetch(url, &self.config_file).await {
                    Ok(config) => Ok(Some(config)),
                    Err(source) => {
                        tracing::error!(
                            parent: self.log.span(),
                            "Could not extract configuration from {}: {}",
                            url,
                            source
                        );
                        Err(BeeswarmError::Acquisition {
                            url: url.to_string(),
                            source,
                        })
                    }
                };
            }
            Some(other) if !other.is_empty() => {
                tracing::warn!(
                    parent: self.log.span(),
                    "Ignoring --config {:?}: not an http(s) url",
                    other
                );
            }
            _ => {}
        }

        let config = Configuration::load_from_path(&self.config_file)?;
        if config.is_some() {
            tracing::info!(
                parent: self.log.span(),
                "Loaded configuration from {}",
                self.config_file.display()
            );
        }
        Ok(config)
    }

    /// Runtime fetch for a URL taken from the marker file. Never fails.
    pub async fn fetch_from_marker(&self, url: &str) -> Option<Configuration> {
        match self.fetcher.fetch(url, &self.config_file).await {
            Ok(config) => {
                tracing::info!(parent: self.log.span(), "Received new configuration from {}", url);
                Some(config)
            }
            Err(e) => {
                tracing::warn!(
                    parent: self.log.span(),
                    "Could not fetch configuration from {}: {}",
                    url,
                    e
                );
                None
            }
        }
    }
}
