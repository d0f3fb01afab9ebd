//! Drone collaborator
//!
//! Protocol emulation is not part of this crate. The drone here owns the
//! resources a configured drone would hold (its local control socket) and
//! releases them when stopped, which is what the supervisor relies on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::{UnixListener, UnixStream};

use crate::config::Configuration;
use crate::instance::{Service, ServiceFactory, ShutdownSignal};
use crate::logging::LogContext;
use crate::workdir::WorkDir;

/// A drone instance, configured or waiting for configuration
pub struct Drone {
    work_dir: WorkDir,
    config: Option<Configuration>,
    local_socket: Option<PathBuf>,
    log: LogContext,
}

impl Drone {
    pub fn new(
        work_dir: WorkDir,
        config: Option<Configuration>,
        local_socket: Option<PathBuf>,
        log: LogContext,
    ) -> Self {
        Self {
            work_dir,
            config,
            local_socket,
            log,
        }
    }

    fn announce(&self) {
        match &self.config {
            None => {
                tracing::info!(
                    parent: self.log.span(),
                    "Drone has not been configured, awaiting configuration"
                );
            }
            Some(config) => {
                let id = config.drone_id().unwrap_or_else(|| "unassigned".to_string());
                tracing::info!(
                    parent: self.log.span(),
                    "Drone configured and running ({}) in {}, capabilities: [{}]",
                    id,
                    self.work_dir.path().display(),
                    config.capability_names().join(", ")
                );
            }
        }
    }
}

#[async_trait]
impl Service for Drone {
    fn name(&self) -> &str {
        "drone"
    }

    async fn run(self: Box<Self>, mut shutdown: ShutdownSignal) -> Result<()> {
        self.announce();

        let listener = match &self.local_socket {
            Some(path) => Some(bind_local(path).await?),
            None => None,
        };

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                accepted = accept_local(listener.as_ref()) => match accepted {
                    Ok(_stream) => {
                        tracing::debug!(parent: self.log.span(), "Accepted local connection");
                    }
                    Err(e) => {
                        tracing::warn!(parent: self.log.span(), "Local socket accept error: {}", e);
                    }
                },
            }
        }

        if let (Some(listener), Some(path)) = (listener, &self.local_socket) {
            drop(listener);
            let _ = tokio::fs::remove_file(path).await;
        }
        tracing::debug!(parent: self.log.span(), "Drone shut down");
        Ok(())
    }
}

/// Bind the local socket, replacing a stale socket file
async fn bind_local(path: &Path) -> Result<UnixListener> {
    let _ = tokio::fs::remove_file(path).await;
    UnixListener::bind(path).context(format!("Failed to bind local socket: {:?}", path))
}

async fn accept_local(listener: Option<&UnixListener>) -> std::io::Result<UnixStream> {
    match listener {
        Some(listener) => listener.accept().await.map(|(stream, _)| stream),
        None => std::future::pending().await,
    }
}

/// Builds drones rooted in one working directory
pub struct DroneFactory {
    work_dir: WorkDir,
    local_socket: Option<PathBuf>,
    log: LogContext,
}

impl DroneFactory {
    pub fn new(work_dir: WorkDir, local_socket: Option<PathBuf>, log: LogContext) -> Self {
        Self {
            work_dir,
            local_socket,
            log,
        }
    }
}

impl ServiceFactory for DroneFactory {
    fn create(&self, config: Option<Configuration>) -> Result<Box<dyn Service>> {
        Ok(Box::new(Drone::new(
            self.work_dir.clone(),
            config,
            self.local_socket.clone(),
            self.log.clone(),
        )))
    }
}
