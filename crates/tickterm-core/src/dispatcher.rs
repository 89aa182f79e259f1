#![forbid(unsafe_code)]

//! Event routing to registered handlers.
//!
//! An [`EventDispatcher`] holds an ordered list of bindings, each a mask of
//! event tags plus a handler. Events go to every binding whose mask
//! intersects the event's tag, in registration order.
//!
//! # Invariants
//!
//! 1. Bindings are invoked in the order they were registered.
//! 2. Binding changes requested while an event is being delivered take
//!    effect after that delivery completes. The list being iterated never
//!    changes underneath it.
//! 3. A binding with a pending unbind receives no further events, even later
//!    in the same delivery.
//! 4. Every removed binding observes exactly one [`Event::Unbind`], after
//!    which it is dropped.

use std::fmt;

use crate::event::{Event, EventMask};
use crate::term::{BindingOp, Term};

/// Identifier of a registered binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether delivery of an event continues to later bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Deliver to the remaining bindings.
    #[default]
    Continue,
    /// The event was consumed; skip the remaining bindings.
    Stop,
}

/// Receiver of dispatched events.
///
/// Implemented for every `FnMut(&mut Term, &Event) -> Flow` closure; state
/// the handler needs lives in the closure or the implementing type.
pub trait EventHandler {
    /// Handle one event.
    fn handle(&mut self, term: &mut Term, event: &Event) -> Flow;
}

impl<F> EventHandler for F
where
    F: FnMut(&mut Term, &Event) -> Flow,
{
    fn handle(&mut self, term: &mut Term, event: &Event) -> Flow {
        self(term, event)
    }
}

struct Binding {
    id: BindingId,
    mask: EventMask,
    handler: Box<dyn EventHandler>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of bindings.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    bindings: Vec<Binding>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no binding is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether `id` is an active binding.
    #[must_use]
    pub fn is_bound(&self, id: BindingId) -> bool {
        self.bindings.iter().any(|b| b.id == id)
    }

    /// Apply binding changes queued on `term`, in the order they were made.
    ///
    /// Removed bindings receive their [`Event::Unbind`] here. Changes queued
    /// by those handlers are applied too. Returns the number of changes
    /// applied.
    pub fn sync(&mut self, term: &mut Term) -> usize {
        let mut applied = 0;
        loop {
            let ops = term.take_binding_ops();
            if ops.is_empty() {
                return applied;
            }
            for op in ops {
                applied += 1;
                match op {
                    BindingOp::Bind { id, mask, handler } => {
                        crate::trace!(%id, ?mask, "binding added");
                        self.bindings.push(Binding { id, mask, handler });
                    }
                    BindingOp::Unbind(id) => {
                        let Some(pos) = self.bindings.iter().position(|b| b.id == id) else {
                            crate::trace!(%id, "unbind of inactive binding ignored");
                            continue;
                        };
                        let mut binding = self.bindings.remove(pos);
                        binding.handler.handle(term, &Event::Unbind(id));
                        crate::trace!(%id, "binding removed");
                    }
                }
            }
        }
    }

    /// Deliver `event` to every matching binding.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&mut self, term: &mut Term, event: &Event) -> usize {
        self.sync(term);
        let mask = event.mask();
        let mut invoked = 0;
        for binding in &mut self.bindings {
            if !binding.mask.intersects(mask) || term.is_unbind_pending(binding.id) {
                continue;
            }
            invoked += 1;
            if binding.handler.handle(term, event) == Flow::Stop {
                break;
            }
        }
        self.sync(term);
        invoked
    }

    /// Deliver every event the term generated itself (mode changes),
    /// including ones generated while delivering them.
    ///
    /// Returns the number of events delivered.
    pub fn dispatch_queued(&mut self, term: &mut Term) -> usize {
        let mut delivered = 0;
        while let Some(event) = term.pop_queued_event() {
            self.dispatch(term, &event);
            delivered += 1;
        }
        delivered
    }

    /// Remove every binding; each observes its [`Event::Unbind`].
    pub fn unbind_all(&mut self, term: &mut Term) {
        self.sync(term);
        while !self.bindings.is_empty() {
            for id in self.bindings.iter().map(|b| b.id).collect::<Vec<_>>() {
                term.unbind(id);
            }
            self.sync(term);
        }
    }
}
