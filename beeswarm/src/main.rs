use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use beeswarm::acquire::HttpConfigFetcher;
use beeswarm::cli::Cli;
use beeswarm::logging::{self, LogContext};
use beeswarm::workdir::WorkDir;
use beeswarm::{App, BeeswarmError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging needs the working directory, so these two report on stderr.
    let work_dir = match WorkDir::from_arg(cli.workdir.as_deref()) {
        Ok(work_dir) => work_dir,
        Err(e) => return fail_early(e),
    };
    let log_file = work_dir.resolve(&cli.logfile);
    if let Err(e) = logging::init(cli.verbose, &log_file) {
        return fail_early(e);
    }

    let fetcher = match HttpConfigFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("Could not build http client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let log = LogContext::root();
    let app = App::new(cli, work_dir, Arc::new(fetcher), log);

    match app.run(shutdown_signal()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn fail_early(e: BeeswarmError) -> ExitCode {
    eprintln!("Error: {}", e);
    ExitCode::from(e.exit_code())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
