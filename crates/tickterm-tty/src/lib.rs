#![forbid(unsafe_code)]
//! Unix terminal sessions for tickterm.
//!
//! This crate owns everything that touches a file descriptor: raw mode,
//! polling input with a timeout, window-size queries, `SIGWINCH`, and writing
//! buffered output. Decoding, dispatch, and rendering live in
//! `tickterm-core`.
//!
//! ## Escape Sequence Reference
//!
//! | Feature            | Enable                   | Disable                        |
//! |--------------------|--------------------------|--------------------------------|
//! | Alternate screen   | `CSI ? 1049 h`           | `CSI ? 1049 l`                 |
//! | Mouse (SGR)        | `CSI ? 1000/1002/1003;1006 h` | `CSI ? 1003;1002;1000;1006 l` |
//! | Keypad application | `ESC =`                  | `ESC >`                        |
//! | Cursor show/hide   | `CSI ? 25 h`             | `CSI ? 25 l`                   |
//! | Cursor shape       | `CSI n SP q`             | `CSI 0 SP q`                   |
//! | Title              | `CSI 22;2 t` + `OSC 2`   | `CSI 23;2 t`                   |
//! | Device attributes  | `CSI c`                  |                                |
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tickterm_core::{Event, EventMask, Flow, Setting, Term};
//! use tickterm_tty::{SessionOptions, TerminalSession, WaitOutcome};
//!
//! # fn main() -> tickterm_core::Result<()> {
//! let mut session = TerminalSession::open_stdio(SessionOptions::from_env())?;
//! session.await_started(Some(Duration::from_millis(50)))?;
//! session.setctl(Setting::AltScreen(true));
//! session.bind(EventMask::KEY, |term: &mut Term, event: &Event| {
//!     if let Event::Key(key) = event {
//!         term.goto(1, 1);
//!         term.print(&key.text);
//!     }
//!     Flow::Continue
//! });
//! while session.input_wait(None)? != WaitOutcome::Closed {}
//! session.destroy()
//! # }
//! ```

#[cfg(unix)]
pub mod channel;
pub mod options;
#[cfg(unix)]
pub mod raw_mode;
#[cfg(unix)]
pub mod session;

pub use options::SessionOptions;
#[cfg(unix)]
pub use session::{SessionState, TerminalSession, WaitOutcome};
