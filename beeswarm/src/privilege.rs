//! Superuser guard for modes that open listening sockets

use crate::error::{BeeswarmError, BeeswarmResult};
use crate::mode::Mode;

const ROOT_UID: u32 = 0;

/// Refuses to enter server or drone mode as the superuser
#[derive(Debug, Clone, Copy)]
pub struct RootGuard {
    euid: u32,
}

impl RootGuard {
    /// Guard for the effective user of this process
    pub fn current() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let euid = unsafe { libc::geteuid() };
        Self::for_uid(euid)
    }

    /// Guard for an explicit effective uid
    pub fn for_uid(euid: u32) -> Self {
        Self { euid }
    }

    pub fn is_root(&self) -> bool {
        self.euid == ROOT_UID
    }

    /// Fail if `mode` would run with superuser privileges.
    ///
    /// Applies to both server and drone mode; help needs no privileges check.
    pub fn check(&self, mode: Mode) -> BeeswarmResult<()> {
        match mode {
            Mode::Server | Mode::Drone if self.is_root() => Err(BeeswarmError::Privilege { mode }),
            _ => Ok(()),
        }
    }
}
