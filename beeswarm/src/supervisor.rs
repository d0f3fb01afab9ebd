//! Drone supervisor - hot-swaps the running drone when a marker is dropped
//!
//! The supervisor owns the only [`RunningInstance`] of the drone. Each
//! iteration of its poll loop:
//!
//! 1. reaps an instance whose task ended on its own,
//! 2. takes the marker file if present (deleting it before anything else),
//! 3. fetches the configuration the marker points at,
//! 4. on success stops the current instance and only then starts the new one.
//!
//! A failed fetch leaves the running instance untouched until the next
//! marker is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::acquire::ConfigAcquirer;
use crate::config::Configuration;
use crate::error::BeeswarmResult;
use crate::instance::{RunningInstance, ServiceFactory};
use crate::logging::LogContext;
use crate::marker::ConfigMarker;

/// Pause between two marker checks
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Supervisor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No running instance
    Idle,
    /// Exactly one running instance, configured or waiting
    Active,
    /// Replacing the running instance
    Swapping,
}

/// What a single poll iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No marker was present
    NoMarker,
    /// A marker was consumed and the instance replaced
    Swapped,
    /// A marker was consumed but no configuration came of it
    FetchFailed,
    /// A configuration was fetched but the replacement could not be built
    StartFailed,
}

/// Supervises the drone instance and its configuration
pub struct DroneSupervisor {
    acquirer: ConfigAcquirer,
    marker: ConfigMarker,
    factory: Arc<dyn ServiceFactory>,
    instance: Option<RunningInstance>,
    state: SupervisorState,
    poll_interval: Duration,
    log: LogContext,
}

impl DroneSupervisor {
    pub fn new(
        acquirer: ConfigAcquirer,
        marker: ConfigMarker,
        factory: Arc<dyn ServiceFactory>,
        log: LogContext,
    ) -> Self {
        Self {
            acquirer,
            marker,
            factory,
            instance: None,
            state: SupervisorState::Idle,
            poll_interval: POLL_INTERVAL,
            log,
        }
    }

    /// Override the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start the first instance, with or without configuration
    pub fn start(&mut self, initial: Option<Configuration>) -> BeeswarmResult<()> {
        if initial.is_none() {
            tracing::info!(
                parent: self.log.span(),
                "No configuration found, waiting for url dropper at {}",
                self.marker.path().display()
            );
        }
        self.spawn(initial)?;
        Ok(())
    }

    /// Run one poll iteration, without the trailing wait
    pub async fn tick(&mut self) -> TickOutcome {
        self.reap_finished().await;

        let url = match self.marker.take().await {
            Ok(Some(url)) => url,
            Ok(None) => return TickOutcome::NoMarker,
            Err(e) => {
                tracing::warn!(
                    parent: self.log.span(),
                    "Discarding unreadable marker {}: {}",
                    self.marker.path().display(),
                    e
                );
                return TickOutcome::FetchFailed;
            }
        };
        tracing::info!(parent: self.log.span(), "Found configuration url in marker: {}", url);

        let Some(config) = self.acquirer.fetch_from_marker(&url).await else {
            tracing::warn!(
                parent: self.log.span(),
                "Keeping current drone, configuration from {} was not usable",
                url
            );
            return TickOutcome::FetchFailed;
        };

        self.swap(config).await
    }

    /// Poll until `shutdown` resolves, then stop the running instance
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut shutdown => break,
            }
        }

        tracing::info!(parent: self.log.span(), "Shutdown requested");
        self.shutdown().await;
    }

    /// Stop the running instance, if any
    pub async fn shutdown(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            instance.stop().await;
        }
        self.state = SupervisorState::Idle;
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    /// Configuration of the running instance
    pub fn current_config(&self) -> Option<&Configuration> {
        self.instance.as_ref().and_then(RunningInstance::config)
    }

    async fn swap(&mut self, config: Configuration) -> TickOutcome {
        self.state = SupervisorState::Swapping;

        // Stop strictly before start: both instances may want the same sockets.
        if let Some(mut previous) = self.instance.take() {
            previous.stop().await;
        }

        match self.spawn(Some(config)) {
            Ok(()) => TickOutcome::Swapped,
            Err(e) => {
                tracing::error!(parent: self.log.span(), "Could not start reconfigured drone: {}", e);
                TickOutcome::StartFailed
            }
        }
    }

    fn spawn(&mut self, config: Option<Configuration>) -> BeeswarmResult<()> {
        debug_assert!(self.instance.is_none());

        let service = match self.factory.create(config.clone()) {
            Ok(service) => service,
            Err(e) => {
                self.state = SupervisorState::Idle;
                return Err(e.into());
            }
        };
        self.instance = Some(RunningInstance::start(service, config, self.log.clone()));
        self.state = SupervisorState::Active;
        Ok(())
    }

    async fn reap_finished(&mut self) {
        let finished = self
            .instance
            .as_ref()
            .map(RunningInstance::is_finished)
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(mut instance) = self.instance.take() {
            match instance.join().await {
                Ok(()) => tracing::error!(
                    parent: self.log.span(),
                    "{} exited unexpectedly, waiting for a new configuration",
                    instance.name()
                ),
                Err(e) => tracing::error!(
                    parent: self.log.span(),
                    "{} died: {:#}, waiting for a new configuration",
                    instance.name(),
                    e
                ),
            }
        }
        self.state = SupervisorState::Idle;
    }
}
