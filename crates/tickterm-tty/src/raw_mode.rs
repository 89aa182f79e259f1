#![forbid(unsafe_code)]

//! Raw-mode termios guard.

use std::fs::File;
use std::io;
use std::os::fd::AsFd;

use nix::sys::termios::{self, SetArg, Termios};

/// RAII guard that saves the original termios and restores it on drop.
///
/// The guard keeps its own duplicate of the terminal fd, so it stays valid
/// however the caller's handle is closed. Even if the application panics the
/// Drop impl runs (unless `panic = "abort"`) and the terminal returns to its
/// original line discipline.
#[derive(Debug)]
pub struct RawModeGuard {
    original_termios: Termios,
    tty: File,
}

impl RawModeGuard {
    /// Switch the terminal behind `fd` to raw mode.
    pub fn enter(fd: impl AsFd) -> io::Result<Self> {
        let tty = File::from(fd.as_fd().try_clone_to_owned()?);

        let original_termios = termios::tcgetattr(&tty).map_err(io::Error::from)?;

        let mut raw = original_termios.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(&tty, SetArg::TCSAFLUSH, &raw).map_err(io::Error::from)?;
        tickterm_core::debug!("entered raw mode");

        Ok(Self {
            original_termios,
            tty,
        })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort restore; errors during cleanup are ignored.
        let _ = termios::tcsetattr(&self.tty, SetArg::TCSAFLUSH, &self.original_termios);
        tickterm_core::debug!("restored terminal line discipline");
    }
}
