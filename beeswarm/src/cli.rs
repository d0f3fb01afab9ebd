//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;

use crate::server::ServerOptions;
use crate::workdir::DEFAULT_LOG_FILE;

#[derive(Parser, Debug, Clone)]
#[command(name = "beeswarm")]
#[command(about = "Beeswarm drone and server bootstrap")]
pub struct Cli {
    /// Run as the central beeswarm server
    #[arg(long)]
    pub server: bool,

    /// Fetch the configuration from this URL before starting
    #[arg(long, value_name = "URL")]
    pub config: Option<String>,

    /// Start a drone without configuration and wait for a configuration url
    #[arg(long)]
    pub waitingdrone: bool,

    /// Local socket the drone accepts control connections on
    #[arg(long = "local_socket", value_name = "PATH")]
    pub local_socket: Option<PathBuf>,

    /// Absolute working directory (default: current directory)
    #[arg(long, value_name = "ABS_PATH")]
    pub workdir: Option<PathBuf>,

    /// Maximum number of sessions the server keeps
    #[arg(long = "max_sessions", value_name = "N")]
    pub max_sessions: Option<u32>,

    /// Debug level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Customize the server configuration interactively
    #[arg(long)]
    pub customize: bool,

    /// Delete all sessions on server start
    #[arg(long)]
    pub clearsessions: bool,

    /// Reset the admin password on server start
    #[arg(long)]
    pub resetpw: bool,

    /// Do not start the web interface
    #[arg(long = "no_webui")]
    pub no_webui: bool,

    /// Log file, relative to the working directory unless absolute
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub logfile: PathBuf,
}

impl Cli {
    /// Options handed verbatim to the server
    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            clear_sessions: self.clearsessions,
            reset_password: self.resetpw,
            max_sessions: self.max_sessions,
            webui: !self.no_webui,
            customize: self.customize,
        }
    }
}
