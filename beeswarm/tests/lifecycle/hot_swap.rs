//! In-process bootstrap scenarios with marker-driven reconfiguration

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tokio::sync::oneshot;

use beeswarm::cli::Cli;
use beeswarm::logging::LogContext;
use beeswarm::marker::ConfigMarker;
use beeswarm::privilege::RootGuard;
use beeswarm::workdir::WorkDir;
use beeswarm::{App, BeeswarmError, Configuration, Mode};

use crate::common::{config, eventually, Event, Journal, RecorderFactory, StaticFetcher};

const DROPPED_URL: &str = "http://10.0.0.1:5000/api/drone/config/d-1";
const BROKEN_URL: &str = "http://10.0.0.1:5000/api/drone/config/missing";

fn dropped_config() -> Configuration {
    config(json!({
        "general": {"mode": "drone", "id": "d-1"},
        "capabilities": {"ssh": {"port": 2222}, "http": {"port": 8080}}
    }))
}

struct Setup {
    dir: tempfile::TempDir,
    drones: Journal,
    servers: Journal,
}

impl Setup {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            drones: Journal::default(),
            servers: Journal::default(),
        }
    }

    fn work_dir(&self) -> WorkDir {
        WorkDir::new(self.dir.path()).unwrap()
    }

    fn marker(&self) -> ConfigMarker {
        ConfigMarker::in_workdir(&self.work_dir())
    }

    fn app(&self, args: &[&str], uid: u32) -> App {
        let mut argv = vec!["beeswarm"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();

        let fetcher = StaticFetcher {
            documents: HashMap::from([(DROPPED_URL.to_string(), dropped_config())]),
        };

        App::new(cli, self.work_dir(), Arc::new(fetcher), LogContext::root())
            .with_root_guard(RootGuard::for_uid(uid))
            .with_drone_factory(Arc::new(RecorderFactory {
                journal: self.drones.clone(),
            }))
            .with_server_factory(Arc::new(RecorderFactory {
                journal: self.servers.clone(),
            }))
            .with_supervisor_hook(|s| s.with_poll_interval(Duration::from_millis(10)))
    }
}

#[tokio::test]
async fn test_waiting_drone_picks_up_dropped_configuration() {
    let setup = Setup::new();
    let app = setup.app(&["--waitingdrone"], 1000);
    let marker = setup.marker();
    let drones = setup.drones.clone();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let operator = async {
        assert!(eventually(|| drones.events() == vec![Event::Started(None)]).await);

        marker.drop_url(DROPPED_URL).await.unwrap();
        assert!(
            eventually(|| drones.events().contains(&Event::Started(Some(dropped_config())))).await
        );
        assert!(!marker.is_present());

        let _ = stop_tx.send(());
    };
    let run = app.run(async {
        let _ = stop_rx.await;
    });

    let (mode, ()) = tokio::join!(run, operator);
    assert_eq!(mode.unwrap(), Mode::Drone);

    assert_eq!(
        setup.drones.events(),
        vec![
            Event::Started(None),
            Event::Stopped(None),
            Event::Started(Some(dropped_config())),
            Event::Stopped(Some(dropped_config())),
        ]
    );
    assert!(setup.servers.events().is_empty());

    // The fetched document replaced the persisted configuration.
    let persisted = Configuration::load_from_path(&setup.work_dir().config_file()).unwrap();
    assert_eq!(persisted, Some(dropped_config()));
}

#[tokio::test]
async fn test_broken_marker_leaves_running_drone_alone() {
    let setup = Setup::new();
    let initial = config(json!({"general": {"mode": "drone", "id": "d-0"}}));
    initial.persist(&setup.work_dir().config_file()).await.unwrap();

    let app = setup.app(&[], 1000);
    let marker = setup.marker();
    let drones = setup.drones.clone();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let operator = async {
        assert!(eventually(|| !drones.events().is_empty()).await);

        marker.drop_url(BROKEN_URL).await.unwrap();
        assert!(eventually(|| !marker.is_present()).await);
        // Give the supervisor a few more iterations.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let _ = stop_tx.send(());
    };
    let run = app.run(async {
        let _ = stop_rx.await;
    });

    let (mode, ()) = tokio::join!(run, operator);
    assert_eq!(mode.unwrap(), Mode::Drone);
    assert_eq!(
        setup.drones.events(),
        vec![
            Event::Started(Some(initial.clone())),
            Event::Stopped(Some(initial)),
        ]
    );
}

#[tokio::test]
async fn test_persisted_server_mode_runs_one_server() {
    let setup = Setup::new();
    config(json!({"general": {"mode": "server"}}))
        .persist(&setup.work_dir().config_file())
        .await
        .unwrap();

    let app = setup.app(&["--waitingdrone"], 1000);
    let servers = setup.servers.clone();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let operator = async {
        assert!(eventually(|| !servers.events().is_empty()).await);
        let _ = stop_tx.send(());
    };
    let run = app.run(async {
        let _ = stop_rx.await;
    });

    let (mode, ()) = tokio::join!(run, operator);
    assert_eq!(mode.unwrap(), Mode::Server);
    assert_eq!(setup.servers.events().len(), 2);
    assert!(setup.drones.events().is_empty());
}

#[tokio::test]
async fn test_root_is_refused_before_any_instance_starts() {
    for args in [&["--server"][..], &["--waitingdrone"][..]] {
        let setup = Setup::new();
        let app = setup.app(args, 0);

        let err = app.run(std::future::pending::<()>()).await.unwrap_err();
        assert!(matches!(err, BeeswarmError::Privilege { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(setup.drones.events().is_empty());
        assert!(setup.servers.events().is_empty());
    }
}

#[tokio::test]
async fn test_help_starts_nothing() {
    let setup = Setup::new();
    let app = setup.app(&[], 1000);

    let mode = app.run(std::future::pending::<()>()).await.unwrap();
    assert_eq!(mode, Mode::Help);
    assert!(setup.drones.events().is_empty());
    assert!(setup.servers.events().is_empty());
}
