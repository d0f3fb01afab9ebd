//! Beeswarm bootstrap and runtime supervision
//!
//! Decides whether the process runs as a server or a drone, acquires its
//! configuration, and keeps exactly one drone instance running while new
//! configurations are dropped into the working directory.

pub mod acquire;
pub mod app;
pub mod cli;
pub mod config;
pub mod drone;
pub mod error;
pub mod instance;
pub mod logging;
pub mod marker;
pub mod mode;
pub mod privilege;
pub mod server;
pub mod supervisor;
pub mod workdir;

pub use app::App;
pub use config::Configuration;
pub use error::{BeeswarmError, BeeswarmResult, FetchError};
pub use mode::Mode;
