#![forbid(unsafe_code)]

//! The terminal session façade.
//!
//! A [`TerminalSession`] owns a pair of channels, the input decoder, the
//! binding list, and a [`Term`]. The application drives it by calling
//! [`TerminalSession::input_wait`] in a loop; bytes read there are decoded
//! and dispatched synchronously before the call returns.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed ──await_started──▶ Started ──setctl/bind/input_wait──▶ Active
//!      │                            │                                  │
//!      └────────────────────────────┴──────── destroy / drop ──────────┴──▶ Destroyed
//! ```
//!
//! Teardown unbinds every binding, restores every mode the session changed,
//! flushes once, and only then releases the channels. The input channel goes
//! last, so raw mode is restored after the final bytes are written.

use std::fmt;
use std::io;
use std::os::fd::AsFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use signal_hook::SigId;
use signal_hook::consts::signal::SIGWINCH;
use tickterm_core::ansi;
use tickterm_core::{
    BindingId, Direction, Event, EventDispatcher, EventHandler, EventMask, Extent, InputDecoder,
    Result, Setting, Term, TermCtl, TermError, TerminalReply,
};

use crate::channel::{InputChannel, OutputChannel, Readiness};
use crate::options::SessionOptions;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; channels may still be configured.
    Constructed,
    /// Size known and the terminal probe answered or timed out.
    Started,
    /// Modes changed, bindings added, or input awaited.
    Active,
    /// Torn down; every mode restored and the channels released.
    Destroyed,
}

/// Why [`TerminalSession::input_wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// This many events were delivered to bindings.
    Dispatched(usize),
    /// The timeout elapsed with nothing to deliver.
    TimedOut,
    /// A signal other than a window resize interrupted the wait.
    Interrupted,
    /// The input channel reached end of file. Anything still buffered was
    /// delivered first.
    Closed,
}

/// Result of one poll-and-read step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadStep {
    Data,
    TimedOut,
    Interrupted,
    Closed,
}

/// `SIGWINCH` registration; the flag is raised by the handler.
struct ResizeWatch {
    flag: Arc<AtomicBool>,
    id: SigId,
}

impl ResizeWatch {
    fn register() -> io::Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));
        let id = signal_hook::flag::register(SIGWINCH, Arc::clone(&flag))?;
        Ok(Self { flag, id })
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

impl Drop for ResizeWatch {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.id);
    }
}

/// An interactive session over an input and an output file descriptor.
///
/// Not meant to be shared between threads; handlers are plain closures.
pub struct TerminalSession {
    // Drop order matters: output before input, so the raw-mode guard held by
    // the input channel restores termios last.
    options: SessionOptions,
    state: SessionState,
    term: Term,
    decoder: InputDecoder,
    dispatcher: EventDispatcher,
    resize: Option<ResizeWatch>,
    escape_deadline: Option<Instant>,
    read_buf: Vec<u8>,
    output: Option<OutputChannel>,
    input: Option<InputChannel>,
}

impl fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalSession")
            .field("state", &self.state)
            .field("size", &self.term.size())
            .field("bindings", &self.dispatcher.len())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl TerminalSession {
    /// Create a session with no channels.
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        let decoder = InputDecoder::with_config(options.decoder_config());
        let read_buf = vec![0; options.read_chunk.max(1)];
        Self {
            options,
            state: SessionState::Constructed,
            term: Term::new(),
            decoder,
            dispatcher: EventDispatcher::new(),
            resize: None,
            escape_deadline: None,
            read_buf,
            output: None,
            input: None,
        }
    }

    /// Create a session on the process's standard input and output.
    pub fn open_stdio(options: SessionOptions) -> Result<Self> {
        let mut session = Self::new(options);
        session.set_input_fd(io::stdin())?;
        session.set_output_fd(io::stdout())?;
        Ok(session)
    }

    /// Read input from a duplicate of `fd`.
    ///
    /// A terminal is switched to raw mode when the options ask for it.
    /// Replacing an earlier input channel restores that channel's mode.
    pub fn set_input_fd(&mut self, fd: impl AsFd) -> Result<()> {
        let channel = InputChannel::open(fd, self.options.raw_mode)
            .map_err(|source| TermError::Construction { source })?;
        self.input = Some(channel);
        Ok(())
    }

    /// Write output to a duplicate of `fd`.
    ///
    /// For a terminal, the window size is read and, when enabled, size
    /// changes start being reported as resize events.
    pub fn set_output_fd(&mut self, fd: impl AsFd) -> Result<()> {
        let channel = OutputChannel::open(fd).map_err(|source| TermError::Construction { source })?;
        let is_tty = channel.is_tty();
        self.output = Some(channel);
        if is_tty {
            self.refresh_size();
            if self.options.watch_resize && self.resize.is_none() {
                match ResizeWatch::register() {
                    Ok(watch) => self.resize = Some(watch),
                    Err(err) => {
                        tickterm_core::warn!(%err, "resize notifications unavailable");
                    }
                }
            }
        }
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Options the session was created with.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Terminal size as `(lines, columns)`, when known.
    #[must_use]
    pub fn size(&self) -> Option<(u16, u16)> {
        self.term.size()
    }

    /// Finish the startup handshake.
    ///
    /// Reads the window size and, when both channels are terminals, sends a
    /// primary device-attributes probe and waits up to `timeout` for the
    /// reply. `None` waits until the reply arrives or input ends. No reply is
    /// not an error. Input typed meanwhile is kept for the next
    /// [`input_wait`](Self::input_wait).
    pub fn await_started(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.state != SessionState::Constructed {
            return Ok(());
        }
        self.refresh_size();

        let both_tty = self.input.as_ref().is_some_and(InputChannel::is_tty)
            && self.output.as_ref().is_some_and(OutputChannel::is_tty);
        if self.options.probe_on_start && both_tty {
            self.term.output_mut().write_raw(ansi::DEVICE_ATTRIBUTES_QUERY);
            self.flush()?;
            match self.await_reply(timeout)? {
                Some(reply) => tickterm_core::debug!(?reply, "terminal answered probe"),
                None => tickterm_core::debug!(?timeout, "terminal did not answer probe"),
            }
        }

        self.state = SessionState::Started;
        tickterm_core::info!(size = ?self.term.size(), "session started");
        Ok(())
    }

    // ── Modes ────────────────────────────────────────────────────────────

    /// Apply a mode setting; see [`Term::setctl`].
    ///
    /// The change event, if any, is delivered before this returns.
    pub fn setctl(&mut self, setting: Setting) -> bool {
        self.activate();
        let changed = self.term.setctl(setting);
        self.dispatcher.dispatch_queued(&mut self.term);
        changed
    }

    /// Current value of a mode.
    #[must_use]
    pub fn getctl(&self, ctl: TermCtl) -> Setting {
        self.term.getctl(ctl)
    }

    // ── Bindings ─────────────────────────────────────────────────────────

    /// Register a handler for events matching `mask`.
    pub fn bind<H>(&mut self, mask: EventMask, handler: H) -> BindingId
    where
        H: EventHandler + 'static,
    {
        self.activate();
        let id = self.term.bind(mask, handler);
        self.dispatcher.sync(&mut self.term);
        id
    }

    /// Remove a binding; its handler observes one [`Event::Unbind`] before
    /// this returns.
    pub fn unbind(&mut self, id: BindingId) {
        self.term.unbind(id);
        self.dispatcher.sync(&mut self.term);
        self.dispatcher.dispatch_queued(&mut self.term);
    }

    /// Whether `id` is an active binding.
    #[must_use]
    pub fn is_bound(&self, id: BindingId) -> bool {
        self.dispatcher.is_bound(id)
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Move the cursor to 1-indexed `(line, column)`.
    pub fn goto(&mut self, line: u16, column: u16) {
        self.term.goto(line, column);
    }

    /// Move the cursor relative to its position.
    pub fn move_by(&mut self, lines: i32, columns: i32) {
        self.term.move_by(lines, columns);
    }

    /// Write text at the cursor.
    pub fn print(&mut self, text: &str) {
        self.term.print(text);
    }

    /// Write formatted text at the cursor.
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.term.print_fmt(args);
    }

    /// Erase part of the current line.
    pub fn erase(&mut self, extent: Extent, direction: Direction) {
        self.term.erase(extent, direction);
    }

    /// Erase the whole screen.
    pub fn clear(&mut self) {
        self.term.clear();
    }

    /// The I/O-free half of the session.
    #[must_use]
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Mutable access to the I/O-free half of the session.
    pub fn term_mut(&mut self) -> &mut Term {
        &mut self.term
    }

    /// Write buffered output to the output channel.
    ///
    /// On failure the bytes the channel did not accept stay buffered.
    pub fn flush(&mut self) -> Result<()> {
        let output = self
            .output
            .as_mut()
            .ok_or(TermError::MissingChannel("output"))?;
        output
            .write_from(self.term.output_mut())
            .map_err(|source| TermError::Write { source })
    }

    // ── Input ────────────────────────────────────────────────────────────

    /// Block until input arrives and deliver it to bindings.
    ///
    /// Pending output is flushed before blocking. `None` waits indefinitely.
    /// Window resizes are handled inside the wait and delivered as events;
    /// any other signal returns [`WaitOutcome::Interrupted`] so the caller
    /// can check its own flags.
    pub fn input_wait(&mut self, timeout: Option<Duration>) -> Result<WaitOutcome> {
        if self.input.is_none() {
            return Err(TermError::MissingChannel("input"));
        }
        self.activate();
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            self.poll_resize();
            let dispatched = self.dispatch_pending();
            self.flush_if_configured()?;
            if dispatched > 0 {
                return Ok(WaitOutcome::Dispatched(dispatched));
            }

            if self.escape_deadline.is_none() {
                self.arm_escape_deadline();
            }
            let now = Instant::now();
            let wait_left = deadline.map(|d| d.saturating_duration_since(now));
            let escape_left = self.escape_deadline.map(|d| d.saturating_duration_since(now));
            let poll_for = match (wait_left, escape_left) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };

            match self.read_step(poll_for)? {
                ReadStep::Data => self.arm_escape_deadline(),
                ReadStep::Interrupted => {
                    if !self.poll_resize() {
                        return Ok(WaitOutcome::Interrupted);
                    }
                }
                ReadStep::TimedOut => {
                    let now = Instant::now();
                    if self.escape_deadline.is_some_and(|d| now >= d) {
                        let flushed = self.decoder.flush_pending();
                        tickterm_core::trace!(flushed, "ambiguous prefix timed out");
                        self.arm_escape_deadline();
                        continue;
                    }
                    if deadline.is_some_and(|d| now >= d) {
                        return Ok(WaitOutcome::TimedOut);
                    }
                }
                ReadStep::Closed => {
                    while self.decoder.is_pending() {
                        self.decoder.flush_pending();
                    }
                    self.escape_deadline = None;
                    self.dispatch_pending();
                    self.flush_if_configured()?;
                    tickterm_core::info!("input channel closed");
                    return Ok(WaitOutcome::Closed);
                }
            }
        }
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Tear the session down.
    ///
    /// Every binding receives its [`Event::Unbind`], modified modes are
    /// restored, buffered output is flushed once, and the channels are
    /// released. The first failure is returned; the channels are released
    /// regardless.
    pub fn destroy(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.state == SessionState::Destroyed {
            return Ok(());
        }
        self.dispatcher.unbind_all(&mut self.term);
        // Change events queued by departing handlers have no one to go to.
        while self.term.pop_queued_event().is_some() {}
        let restored = self.term.restore_modes();
        tickterm_core::info!(restored = restored.len(), "tearing down session");

        let result = if self.output.is_some() {
            self.flush()
        } else {
            Ok(())
        };
        if let Err(err) = &result {
            tickterm_core::warn!(%err, "final flush failed");
        }

        self.state = SessionState::Destroyed;
        self.resize = None;
        self.output = None;
        self.input = None;
        result
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn activate(&mut self) {
        if matches!(
            self.state,
            SessionState::Constructed | SessionState::Started
        ) {
            tickterm_core::debug!(from = ?self.state, "session active");
            self.state = SessionState::Active;
        }
    }

    fn flush_if_configured(&mut self) -> Result<()> {
        if self.output.is_some() && !self.term.output().is_empty() {
            self.flush()?;
        }
        Ok(())
    }

    fn arm_escape_deadline(&mut self) {
        self.escape_deadline = self
            .decoder
            .pending_timeout()
            .map(|timeout| Instant::now() + timeout);
    }

    /// Re-read the window size from the output channel.
    fn refresh_size(&mut self) -> Option<(u16, u16)> {
        let output = self.output.as_ref()?;
        match output.size() {
            Ok(Some((lines, columns))) => {
                self.term.set_size(lines, columns);
                Some((lines, columns))
            }
            Ok(None) => None,
            Err(err) => {
                tickterm_core::debug!(%err, "window size unavailable");
                None
            }
        }
    }

    /// Queue a resize event if `SIGWINCH` arrived. Returns whether it did.
    fn poll_resize(&mut self) -> bool {
        if !self.resize.as_ref().is_some_and(ResizeWatch::take) {
            return false;
        }
        if let Some((lines, columns)) = self.refresh_size() {
            tickterm_core::debug!(lines, columns, "window resized");
            self.decoder.push_resize(lines, columns);
        }
        true
    }

    /// Deliver term-generated and decoded events. Returns how many.
    fn dispatch_pending(&mut self) -> usize {
        let mut delivered = self.dispatcher.dispatch_queued(&mut self.term);
        while let Some(event) = self.decoder.next_event() {
            if let Event::Resize(resize) = &event {
                self.term.set_size(resize.lines, resize.columns);
            }
            self.dispatcher.dispatch(&mut self.term, &event);
            delivered += 1;
            delivered += self.dispatcher.dispatch_queued(&mut self.term);
        }
        delivered
    }

    /// Read until the decoder holds a terminal reply, the timeout passes, or
    /// input ends.
    fn await_reply(&mut self, timeout: Option<Duration>) -> Result<Option<TerminalReply>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(reply) = self.decoder.next_reply() {
                return Ok(Some(reply));
            }
            let left = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if left.is_some_and(|left| left.is_zero()) {
                return Ok(None);
            }
            if self.read_step(left)? == ReadStep::Closed {
                return Ok(None);
            }
        }
    }

    /// Poll the input channel once and feed whatever was read.
    fn read_step(&mut self, timeout: Option<Duration>) -> Result<ReadStep> {
        let input = self
            .input
            .as_mut()
            .ok_or(TermError::MissingChannel("input"))?;
        match input
            .poll(timeout)
            .map_err(|source| TermError::Read { source })?
        {
            Readiness::TimedOut => return Ok(ReadStep::TimedOut),
            Readiness::Interrupted => return Ok(ReadStep::Interrupted),
            Readiness::Ready => {}
        }
        match input.read(&mut self.read_buf) {
            Ok(0) => Ok(ReadStep::Closed),
            Ok(n) => {
                if let Err(overflow) = self.decoder.feed(&self.read_buf[..n]) {
                    tickterm_core::warn!(%overflow, "recovered from oversized input sequence");
                }
                Ok(ReadStep::Data)
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(ReadStep::Interrupted),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(ReadStep::Data),
            Err(source) => Err(TermError::Read { source }),
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        // Best-effort; `destroy` is the way to observe failures.
        let _ = self.teardown();
    }
}
