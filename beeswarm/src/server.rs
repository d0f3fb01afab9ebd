//! Server mode
//!
//! The server collaborator aggregates drone traffic and serves the web UI;
//! none of that lives here. This module starts exactly one server instance,
//! hands it its options verbatim and blocks until it ends.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Configuration;
use crate::instance::{RunningInstance, Service, ServiceFactory, ShutdownSignal};
use crate::logging::LogContext;
use crate::workdir::WorkDir;

/// Server options taken from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    /// Drop all recorded sessions on start
    pub clear_sessions: bool,
    /// Reset the admin password on start
    pub reset_password: bool,
    /// Upper bound of stored sessions
    pub max_sessions: Option<u32>,
    /// Serve the web interface
    pub webui: bool,
    /// Interactive customization of a fresh server config
    pub customize: bool,
}

/// Server instance
pub struct Server {
    work_dir: WorkDir,
    config: Option<Configuration>,
    options: ServerOptions,
    log: LogContext,
}

impl Server {
    pub fn new(
        work_dir: WorkDir,
        config: Option<Configuration>,
        options: ServerOptions,
        log: LogContext,
    ) -> Self {
        Self {
            work_dir,
            config,
            options,
            log,
        }
    }
}

#[async_trait]
impl Service for Server {
    fn name(&self) -> &str {
        "server"
    }

    async fn run(self: Box<Self>, mut shutdown: ShutdownSignal) -> Result<()> {
        tracing::info!(
            parent: self.log.span(),
            "Beeswarm server running in {} (configured: {}, webui: {}, max sessions: {})",
            self.work_dir.path().display(),
            self.config.is_some(),
            self.options.webui,
            self.options
                .max_sessions
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unlimited".to_string())
        );
        if self.options.clear_sessions {
            tracing::info!(parent: self.log.span(), "Clearing sessions requested");
        }
        if self.options.reset_password {
            tracing::info!(parent: self.log.span(), "Password reset requested");
        }

        shutdown.triggered().await;
        Ok(())
    }
}

/// Builds the server with fixed options
pub struct ServerFactory {
    work_dir: WorkDir,
    options: ServerOptions,
    log: LogContext,
}

impl ServerFactory {
    pub fn new(work_dir: WorkDir, options: ServerOptions, log: LogContext) -> Self {
        Self {
            work_dir,
            options,
            log,
        }
    }
}

impl ServiceFactory for ServerFactory {
    fn create(&self, config: Option<Configuration>) -> Result<Box<dyn Service>> {
        Ok(Box::new(Server::new(
            self.work_dir.clone(),
            config,
            self.options.clone(),
            self.log.clone(),
        )))
    }
}

/// Runs the single server instance
pub struct ServerSupervisor {
    factory: Arc<dyn ServiceFactory>,
    log: LogContext,
}

impl ServerSupervisor {
    pub fn new(factory: Arc<dyn ServiceFactory>, log: LogContext) -> Self {
        Self { factory, log }
    }

    /// Start the server and wait until it exits or `shutdown` resolves
    pub async fn run<F>(&self, config: Option<Configuration>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let service = self.factory.create(config.clone())?;
        let mut instance = RunningInstance::start(service, config, self.log.clone());

        let finished = tokio::select! {
            outcome = instance.join() => Some(outcome),
            _ = shutdown => None,
        };

        match finished {
            Some(outcome) => outcome,
            None => {
                tracing::info!(parent: self.log.span(), "Shutdown requested");
                instance.stop().await;
                Ok(())
            }
        }
    }
}
