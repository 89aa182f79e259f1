#![forbid(unsafe_code)]

//! File-descriptor backed input and output channels.
//!
//! Both channels duplicate the descriptor they are given, so the session owns
//! its handles outright and the caller may close theirs.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use tickterm_core::output::OutputWriter;

use crate::raw_mode::RawModeGuard;

/// Result of waiting for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Bytes (or end of file) can be read without blocking.
    Ready,
    /// The timeout elapsed first.
    TimedOut,
    /// A signal interrupted the wait.
    Interrupted,
}

fn duplicate(fd: impl AsFd) -> io::Result<File> {
    Ok(File::from(fd.as_fd().try_clone_to_owned()?))
}

/// Poll timeout in whole milliseconds, rounded up so short waits still block.
///
/// Waits beyond `u16::MAX` milliseconds are clamped; callers re-poll until
/// their own deadline passes.
fn poll_timeout(timeout: Option<Duration>) -> PollTimeout {
    match timeout {
        None => PollTimeout::NONE,
        Some(t) => {
            let ms = t.as_micros().div_ceil(1000);
            PollTimeout::from(u16::try_from(ms).unwrap_or(u16::MAX))
        }
    }
}

// ── Input ────────────────────────────────────────────────────────────────

/// Readable side of a session.
#[derive(Debug)]
pub struct InputChannel {
    file: File,
    raw_mode: Option<RawModeGuard>,
    is_tty: bool,
}

impl InputChannel {
    /// Take a duplicate of `fd`, switching it to raw mode when it is a
    /// terminal and `raw_mode` is requested.
    pub fn open(fd: impl AsFd, raw_mode: bool) -> io::Result<Self> {
        let file = duplicate(fd)?;
        let is_tty = rustix::termios::isatty(&file);
        let raw_mode = if raw_mode && is_tty {
            Some(RawModeGuard::enter(&file)?)
        } else {
            None
        };
        tickterm_core::debug!(is_tty, raw = raw_mode.is_some(), "input channel opened");
        Ok(Self {
            file,
            raw_mode,
            is_tty,
        })
    }

    /// Whether the channel is a terminal.
    #[must_use]
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Whether the terminal was switched to raw mode.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.raw_mode.is_some()
    }

    /// Wait until input is readable. `None` waits indefinitely.
    pub fn poll(&self, timeout: Option<Duration>) -> io::Result<Readiness> {
        let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, poll_timeout(timeout)) {
            Ok(0) => Ok(Readiness::TimedOut),
            Ok(_) => Ok(Readiness::Ready),
            Err(Errno::EINTR) => Ok(Readiness::Interrupted),
            Err(e) => Err(io::Error::from(e)),
        }
    }

    /// Read available bytes. `Ok(0)` is end of file.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

// ── Output ───────────────────────────────────────────────────────────────

/// Writable side of a session.
#[derive(Debug)]
pub struct OutputChannel {
    file: File,
    is_tty: bool,
}

impl OutputChannel {
    /// Take a duplicate of `fd`.
    pub fn open(fd: impl AsFd) -> io::Result<Self> {
        let file = duplicate(fd)?;
        let is_tty = rustix::termios::isatty(&file);
        tickterm_core::debug!(is_tty, "output channel opened");
        Ok(Self { file, is_tty })
    }

    /// Whether the channel is a terminal.
    #[must_use]
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Window size as `(lines, columns)`; `None` when the terminal reports
    /// zero.
    pub fn size(&self) -> io::Result<Option<(u16, u16)>> {
        let ws = rustix::termios::tcgetwinsize(&self.file)?;
        if ws.ws_row == 0 || ws.ws_col == 0 {
            return Ok(None);
        }
        Ok(Some((ws.ws_row, ws.ws_col)))
    }

    /// Write everything buffered in `out`.
    ///
    /// Accepted bytes are consumed from the buffer as they are written, so on
    /// failure exactly the unwritten tail remains.
    pub fn write_from(&mut self, out: &mut OutputWriter) -> io::Result<()> {
        while !out.is_empty() {
            match self.file.write(out.as_bytes()) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => out.consume(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.file.flush()
    }
}
