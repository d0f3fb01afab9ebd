//! Operating mode selection
//!
//! The process runs as exactly one of a central server, a drone, or prints its
//! usage and exits. The choice is made once at startup from the command line
//! flags and whatever `general.mode` the persisted configuration carries.

use std::fmt;

/// Mode value a persisted configuration uses to request server mode
pub const SERVER_MODE: &str = "server";

/// Mode value a persisted configuration uses to request drone mode
pub const DRONE_MODE: &str = "drone";

/// Operating mode of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Central coordinator
    Server,
    /// Sensor agent under supervision
    Drone,
    /// Nothing selected a mode; print usage and exit
    Help,
}

impl Mode {
    /// Get the mode name
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Server => SERVER_MODE,
            Mode::Drone => DRONE_MODE,
            Mode::Help => "help",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decide the operating mode. First match wins:
///
/// 1. `--server`
/// 2. persisted mode `server`
/// 3. `--waitingdrone`
/// 4. persisted mode `drone`
/// 5. help
///
/// `persisted_mode` is expected to already be normalised by
/// [`Configuration::persisted_mode`](crate::config::Configuration::persisted_mode),
/// so an empty mode in a present `general` section arrives here as `drone`.
pub fn select_mode(server_flag: bool, waiting_drone_flag: bool, persisted_mode: Option<&str>) -> Mode {
    if server_flag || persisted_mode == Some(SERVER_MODE) {
        return Mode::Server;
    }
    if waiting_drone_flag || persisted_mode == Some(DRONE_MODE) {
        return Mode::Drone;
    }
    Mode::Help
}
