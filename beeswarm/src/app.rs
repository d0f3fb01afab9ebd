//! Bootstrap: acquire configuration, pick a mode and hand over to a supervisor

use std::future::Future;
use std::sync::Arc;

use clap::CommandFactory;

use crate::acquire::{ConfigAcquirer, ConfigFetcher};
use crate::cli::Cli;
use crate::drone::DroneFactory;
use crate::error::BeeswarmResult;
use crate::instance::ServiceFactory;
use crate::logging::LogContext;
use crate::marker::ConfigMarker;
use crate::mode::{select_mode, Mode};
use crate::privilege::RootGuard;
use crate::server::{ServerFactory, ServerSupervisor};
use crate::supervisor::DroneSupervisor;
use crate::workdir::WorkDir;

/// Wired-up process, ready to run in whichever mode applies
pub struct App {
    cli: Cli,
    work_dir: WorkDir,
    root_guard: RootGuard,
    fetcher: Arc<dyn ConfigFetcher>,
    drone_factory: Arc<dyn ServiceFactory>,
    server_factory: Arc<dyn ServiceFactory>,
    supervisor_hook: Option<Box<dyn FnOnce(DroneSupervisor) -> DroneSupervisor + Send>>,
    log: LogContext,
}

impl App {
    /// Production wiring for the given command line
    pub fn new(cli: Cli, work_dir: WorkDir, fetcher: Arc<dyn ConfigFetcher>, log: LogContext) -> Self {
        let drone_factory = Arc::new(DroneFactory::new(
            work_dir.clone(),
            cli.local_socket.clone(),
            log.component("drone"),
        ));
        let server_factory = Arc::new(ServerFactory::new(
            work_dir.clone(),
            cli.server_options(),
            log.component("server"),
        ));

        Self {
            cli,
            work_dir,
            root_guard: RootGuard::current(),
            fetcher,
            drone_factory,
            server_factory,
            supervisor_hook: None,
            log,
        }
    }

    pub fn with_root_guard(mut self, guard: RootGuard) -> Self {
        self.root_guard = guard;
        self
    }

    pub fn with_drone_factory(mut self, factory: Arc<dyn ServiceFactory>) -> Self {
        self.drone_factory = factory;
        self
    }

    pub fn with_server_factory(mut self, factory: Arc<dyn ServiceFactory>) -> Self {
        self.server_factory = factory;
        self
    }

    /// Adjust the drone supervisor before it starts (poll interval, mostly)
    pub fn with_supervisor_hook<H>(mut self, hook: H) -> Self
    where
        H: FnOnce(DroneSupervisor) -> DroneSupervisor + Send + 'static,
    {
        self.supervisor_hook = Some(Box::new(hook));
        self
    }

    /// Run until the selected mode ends or `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> BeeswarmResult<Mode>
    where
        F: Future<Output = ()>,
    {
        let acquirer = ConfigAcquirer::new(
            self.fetcher.clone(),
            self.work_dir.config_file(),
            self.log.component("acquire"),
        );
        let config = acquirer.acquire_initial(self.cli.config.as_deref()).await?;

        let mode = select_mode(
            self.cli.server,
            self.cli.waitingdrone,
            config.as_ref().and_then(|c| c.persisted_mode()),
        );
        tracing::debug!(parent: self.log.span(), "Selected {} mode", mode);

        match mode {
            Mode::Help => {
                Cli::command().print_help()?;
                println!();
            }
            Mode::Server => {
                self.guard(mode)?;
                let supervisor =
                    ServerSupervisor::new(self.server_factory.clone(), self.log.component("server"));
                supervisor.run(config, shutdown).await?;
            }
            Mode::Drone => {
                self.guard(mode)?;
                let marker = ConfigMarker::in_workdir(&self.work_dir);
                let mut supervisor = DroneSupervisor::new(
                    acquirer,
                    marker,
                    self.drone_factory.clone(),
                    self.log.component("supervisor"),
                );
                if let Some(hook) = self.supervisor_hook {
                    supervisor = hook(supervisor);
                }
                supervisor.start(config)?;
                supervisor.run_until(shutdown).await;
            }
        }

        Ok(mode)
    }

    fn guard(&self, mode: Mode) -> BeeswarmResult<()> {
        self.root_guard.check(mode).inspect_err(|e| {
            tracing::error!(parent: self.log.span(), "{}", e);
        })
    }
}
