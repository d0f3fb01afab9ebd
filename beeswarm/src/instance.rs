//! Supervised drone/server instances
//!
//! A [`Service`] is a collaborator that runs until told to stop. Starting one
//! yields a [`RunningInstance`], the only handle to the spawned task. Stopping
//! is signal-then-join with a bound, so a replacement is never started while
//! the previous instance may still hold its sockets.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::Configuration;
use crate::logging::LogContext;

/// How long a stopping instance gets before its task is aborted
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Receiving side of an instance's stop signal
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait until a stop is requested.
    ///
    /// Also resolves when the owning handle is gone.
    pub async fn triggered(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Create a connected stop flag and signal
pub fn shutdown_channel() -> (watch::Sender<bool>, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (tx, ShutdownSignal { rx })
}

/// A drone or server collaborator
#[async_trait]
pub trait Service: Send + 'static {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Run until `shutdown` is triggered or the service fails
    async fn run(self: Box<Self>, shutdown: ShutdownSignal) -> Result<()>;
}

/// Builds services for a given configuration
pub trait ServiceFactory: Send + Sync {
    fn create(&self, config: Option<Configuration>) -> Result<Box<dyn Service>>;
}

/// Lifecycle state of an instance handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Running,
    Stopped,
}

/// Handle to the single spawned task of a service
pub struct RunningInstance {
    name: String,
    config: Option<Configuration>,
    state: InstanceState,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<Result<()>>>,
    log: LogContext,
}

impl RunningInstance {
    /// Spawn `service` on the current runtime
    pub fn start(service: Box<dyn Service>, config: Option<Configuration>, log: LogContext) -> Self {
        let name = service.name().to_string();
        let (stop_tx, signal) = shutdown_channel();

        tracing::info!(parent: log.span(), "Starting {}", name);
        let task = tokio::spawn(service.run(signal).instrument(log.span().clone()));

        Self {
            name,
            config,
            state: InstanceState::Running,
            stop_tx,
            task: Some(task),
            log,
        }
    }

    /// Signal the service and wait for it to finish.
    ///
    /// Safe to call more than once and on an instance whose task already
    /// ended. If the service ignores the signal for [`STOP_TIMEOUT`] its task
    /// is aborted and joined.
    pub async fn stop(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };

        tracing::info!(parent: self.log.span(), "Stopping {}", self.name);
        let _ = self.stop_tx.send(true);

        match tokio::time::timeout(STOP_TIMEOUT, &mut task).await {
            Ok(outcome) => self.log_outcome(outcome),
            Err(_) => {
                tracing::warn!(
                    parent: self.log.span(),
                    "{} did not stop within {:?}, aborting",
                    self.name,
                    STOP_TIMEOUT
                );
                task.abort();
                let _ = task.await;
            }
        }
        self.state = InstanceState::Stopped;
    }

    /// Wait for the service to end on its own.
    ///
    /// Cancel safe: if this future is dropped the handle still owns the task
    /// and [`stop`](Self::stop) works as usual.
    pub async fn join(&mut self) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let outcome = task.await;
        self.task = None;
        self.state = InstanceState::Stopped;
        outcome?
    }

    /// True once the task has ended without being stopped through this handle
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(JoinHandle::is_finished).unwrap_or(false)
    }

    fn log_outcome(&self, outcome: std::result::Result<Result<()>, tokio::task::JoinError>) {
        match outcome {
            Ok(Ok(())) => {
                tracing::info!(parent: self.log.span(), "{} stopped", self.name);
            }
            Ok(Err(e)) => {
                tracing::warn!(parent: self.log.span(), "{} exited with error: {:#}", self.name, e);
            }
            Err(e) => {
                tracing::warn!(parent: self.log.span(), "{} task failed: {}", self.name, e);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> Option<&Configuration> {
        self.config.as_ref()
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }
}

impl Drop for RunningInstance {
    fn drop(&mut self) {
        // Never leave a detached task behind.
        if let Some(task) = self.task.take() {
            let _ = self.stop_tx.send(true);
            task.abort();
        }
    }
}
