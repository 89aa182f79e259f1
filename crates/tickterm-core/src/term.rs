#![forbid(unsafe_code)]

//! The I/O-free half of a terminal session.
//!
//! A [`Term`] owns everything a handler may touch while an event is being
//! dispatched: the output buffer, the mode settings, and the queue of
//! binding changes. Handlers receive `&mut Term`; the session owns the
//! channels, the decoder, and the dispatcher, so a handler can render,
//! change modes, and bind or unbind, but can never re-enter the input wait.
//!
//! Binding changes made through a `Term` are deferred: [`Term::bind`] hands
//! out the new id immediately, and the dispatcher applies queued changes
//! once the event in flight has been delivered.

use std::collections::VecDeque;
use std::fmt;

use crate::control::{ControlSettings, Setting, TermCtl};
use crate::dispatcher::{BindingId, EventHandler};
use crate::event::{Event, EventMask};
use crate::output::{Direction, Extent, OutputWriter};

/// A queued change to the binding list.
pub(crate) enum BindingOp {
    Bind {
        id: BindingId,
        mask: EventMask,
        handler: Box<dyn EventHandler>,
    },
    Unbind(BindingId),
}

impl fmt::Debug for BindingOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { id, mask, .. } => f
                .debug_struct("Bind")
                .field("id", id)
                .field("mask", mask)
                .finish_non_exhaustive(),
            Self::Unbind(id) => f.debug_tuple("Unbind").field(id).finish(),
        }
    }
}

/// Output, mode state, and deferred binding changes.
#[derive(Debug, Default)]
pub struct Term {
    output: OutputWriter,
    controls: ControlSettings,
    ops: Vec<BindingOp>,
    next_binding: u64,
    queued: VecDeque<Event>,
}

impl Term {
    /// Create a term with an unknown size and default modes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Geometry ─────────────────────────────────────────────────────────

    /// Terminal size as `(lines, columns)`, when known.
    #[must_use]
    pub fn size(&self) -> Option<(u16, u16)> {
        self.output.size()
    }

    /// Record a new terminal size.
    pub fn set_size(&mut self, lines: u16, columns: u16) {
        self.output.set_size(lines, columns);
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Move the cursor to 1-indexed `(line, column)`.
    pub fn goto(&mut self, line: u16, column: u16) {
        self.output.goto(line, column);
    }

    /// Move the cursor relative to its position.
    pub fn move_by(&mut self, lines: i32, columns: i32) {
        self.output.move_by(lines, columns);
    }

    /// Write text at the cursor.
    pub fn print(&mut self, text: &str) {
        self.output.print(text);
    }

    /// Write formatted text at the cursor.
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.output.print_fmt(args);
    }

    /// Erase part of the current line.
    pub fn erase(&mut self, extent: Extent, direction: Direction) {
        self.output.erase(extent, direction);
    }

    /// Erase the whole screen.
    pub fn clear(&mut self) {
        self.output.clear();
    }

    /// The output buffer.
    #[must_use]
    pub fn output(&self) -> &OutputWriter {
        &self.output
    }

    /// Mutable access to the output buffer.
    pub fn output_mut(&mut self) -> &mut OutputWriter {
        &mut self.output
    }

    // ── Modes ────────────────────────────────────────────────────────────

    /// Apply a mode setting.
    ///
    /// The control sequence is always buffered. When the value changed, a
    /// [`Event::Change`] is queued for `CHANGE` bindings. Returns whether it
    /// changed.
    pub fn setctl(&mut self, setting: Setting) -> bool {
        // Writes into the output buffer cannot fail.
        let changed = self
            .controls
            .apply(&setting, &mut self.output)
            .unwrap_or(true);
        if setting.ctl() == TermCtl::AltScreen {
            self.output.forget_cursor();
        }
        crate::debug!(?setting, changed, "setctl");
        if changed {
            self.queued.push_back(Event::Change(setting));
        }
        changed
    }

    /// Current value of a mode.
    #[must_use]
    pub fn getctl(&self, ctl: TermCtl) -> Setting {
        self.controls.get(ctl)
    }

    /// All mode values.
    #[must_use]
    pub fn controls(&self) -> &ControlSettings {
        &self.controls
    }

    /// Buffer the sequences that return modified modes to their defaults.
    ///
    /// Returns the settings restored. No change events are queued.
    pub fn restore_modes(&mut self) -> Vec<Setting> {
        let restored = self
            .controls
            .restore(&mut self.output)
            .unwrap_or_default();
        if !restored.is_empty() {
            self.output.forget_cursor();
        }
        restored
    }

    // ── Bindings ─────────────────────────────────────────────────────────

    /// Register a handler for events matching `mask`.
    ///
    /// The id is valid immediately; the binding starts receiving events once
    /// the dispatcher applies queued changes, never during the dispatch in
    /// which it was created.
    pub fn bind<H>(&mut self, mask: EventMask, handler: H) -> BindingId
    where
        H: EventHandler + 'static,
    {
        self.next_binding += 1;
        let id = BindingId::new(self.next_binding);
        self.ops.push(BindingOp::Bind {
            id,
            mask,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a binding.
    ///
    /// From the moment this returns the binding receives no further events;
    /// it observes exactly one [`Event::Unbind`] when the removal is applied.
    pub fn unbind(&mut self, id: BindingId) {
        self.ops.push(BindingOp::Unbind(id));
    }

    /// Whether an unbind of `id` is queued.
    #[must_use]
    pub fn is_unbind_pending(&self, id: BindingId) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, BindingOp::Unbind(pending) if *pending == id))
    }

    pub(crate) fn take_binding_ops(&mut self) -> Vec<BindingOp> {
        std::mem::take(&mut self.ops)
    }

    // ── Queued events ────────────────────────────────────────────────────

    /// Pop the next event generated by the term itself (mode changes).
    pub fn pop_queued_event(&mut self) -> Option<Event> {
        self.queued.pop_front()
    }

    /// Whether generated events are waiting to be dispatched.
    #[must_use]
    pub fn has_queued_events(&self) -> bool {
        !self.queued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::MouseMode;
    use crate::dispatcher::Flow;

    #[test]
    fn setctl_queues_change_only_when_value_changes() {
        let mut term = Term::new();
        assert!(term.setctl(Setting::CursorVisible(false)));
        assert!(!term.setctl(Setting::CursorVisible(false)));
        assert_eq!(
            term.pop_queued_event(),
            Some(Event::Change(Setting::CursorVisible(false)))
        );
        assert_eq!(term.pop_queued_event(), None);
        assert_eq!(term.output().as_bytes(), b"\x1b[?25l\x1b[?25l");
    }

    #[test]
    fn getctl_reflects_last_setctl() {
        let mut term = Term::new();
        term.setctl(Setting::Mouse(MouseMode::Drag));
        assert_eq!(
            term.getctl(TermCtl::Mouse),
            Setting::Mouse(MouseMode::Drag)
        );
    }

    #[test]
    fn alt_screen_forces_cursor_reposition() {
        let mut term = Term::new();
        term.goto(2, 2);
        term.print("a");
        term.setctl(Setting::AltScreen(true));
        term.goto(2, 3);
        term.print("b");
        assert_eq!(
            term.output().as_bytes(),
            b"\x1b[2;2Ha\x1b[?1049h\x1b[2;3Hb"
        );
    }

    #[test]
    fn restore_modes_writes_and_resets() {
        let mut term = Term::new();
        term.setctl(Setting::AltScreen(true));
        term.output_mut().consume(usize::MAX);
        let restored = term.restore_modes();
        assert_eq!(restored, vec![Setting::AltScreen(false)]);
        assert_eq!(term.output().as_bytes(), b"\x1b[?1049l");
        assert!(term.controls().is_default());
    }

    #[test]
    fn bind_hands_out_distinct_ids() {
        let mut term = Term::new();
        let a = term.bind(EventMask::KEY, |_: &mut Term, _: &Event| Flow::Continue);
        let b = term.bind(EventMask::KEY, |_: &mut Term, _: &Event| Flow::Continue);
        assert_ne!(a, b);
        term.unbind(a);
        assert!(term.is_unbind_pending(a));
        assert!(!term.is_unbind_pending(b));
        assert_eq!(term.take_binding_ops().len(), 3);
    }
}
