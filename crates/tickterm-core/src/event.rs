#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Every event delivered to a binding is one of the tags of [`Event`]. All
//! types derive `Clone`, `PartialEq`, and `Eq` for use in tests and pattern
//! matching.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 1-indexed, exactly as the terminal reports them.
//! - Key identity is a string: the typed text for [`KeyEventKind::Text`], or a
//!   key name such as `"Up"`, `"C-c"`, `"M-Escape"` for [`KeyEventKind::Key`].
//! - Key names carry modifier prefixes in the order `C-`, `M-`, `S-`.
//! - Control bytes (`0x01..=0x1F`) produce `"C-<key>"` names with an empty
//!   modifier set: the terminal folded Ctrl into the byte itself.

use std::fmt;

use bitflags::bitflags;

use crate::control::Setting;
use crate::dispatcher::BindingId;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Terminal was resized.
    Resize(ResizeEvent),

    /// A terminal mode changed value through `setctl`.
    ///
    /// The setting carries both the mode id ([`Setting::ctl`]) and its new
    /// value.
    Change(Setting),

    /// The binding with this id was removed.
    ///
    /// Delivered exactly once, to the removed binding only, regardless of
    /// its mask. No further events reach that binding afterwards.
    Unbind(BindingId),
}

impl Event {
    /// The mask bit this event is routed by.
    #[must_use]
    pub const fn mask(&self) -> EventMask {
        match self {
            Self::Key(_) => EventMask::KEY,
            Self::Mouse(_) => EventMask::MOUSE,
            Self::Resize(_) => EventMask::RESIZE,
            Self::Change(_) => EventMask::CHANGE,
            Self::Unbind(_) => EventMask::UNBIND,
        }
    }
}

bitflags! {
    /// Set of event tags a binding subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u8 {
        /// Key events.
        const KEY = 0b0000_0001;
        /// Mouse events.
        const MOUSE = 0b0000_0010;
        /// Resize events.
        const RESIZE = 0b0000_0100;
        /// Mode-change events.
        const CHANGE = 0b0000_1000;
        /// Unbind notification for the binding itself.
        const UNBIND = 0b0001_0000;
    }
}

/// Whether a key event is typed text or a named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    /// Printable text; `text` holds the character.
    Text,
    /// A named key; `text` holds the key name.
    Key,
}

/// A keyboard event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Text or named key.
    pub kind: KeyEventKind,

    /// The typed text, or the key name with modifier prefixes.
    pub text: String,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a text event with no modifiers.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: KeyEventKind::Text,
            text: text.into(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a named-key event with no modifiers.
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            kind: KeyEventKind::Key,
            text: name.into(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Replace the modifier set.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if this is the named key `name`.
    #[must_use]
    pub fn is_key(&self, name: &str) -> bool {
        self.kind == KeyEventKind::Key && self.text == name
    }

    /// Check if this is typed text equal to `text`.
    #[must_use]
    pub fn is_text(&self, text: &str) -> bool {
        self.kind == KeyEventKind::Text && self.text == text
    }
}

bitflags! {
    /// Modifier keys that can be held during a key or mouse event.
    ///
    /// Bit values follow the xterm modifier parameter minus one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT = 0b0010;
        /// Control key.
        const CTRL = 0b0100;
    }
}

impl fmt::Display for Modifiers {
    /// Renders the set as `SHIFT|ALT|CTRL`, always in that order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Self::SHIFT, "SHIFT"),
            (Self::ALT, "ALT"),
            (Self::CTRL, "CTRL"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Button number reported for an upward wheel step.
pub const WHEEL_UP: u8 = 1;
/// Button number reported for a downward wheel step.
pub const WHEEL_DOWN: u8 = 2;

/// Mouse action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed.
    Press,
    /// Pointer moved with a button held (or any motion in move-tracking mode).
    Drag,
    /// Button released.
    Release,
    /// Wheel step; `button` is [`WHEEL_UP`] or [`WHEEL_DOWN`].
    Wheel,
}

/// Direction of a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelDirection {
    /// Scrolled up.
    Up,
    /// Scrolled down.
    Down,
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    /// Mouse action.
    pub kind: MouseEventKind,

    /// Button number (1 left, 2 middle, 3 right; 0 for motion without a
    /// button). For wheel events see [`WHEEL_UP`] / [`WHEEL_DOWN`].
    pub button: u8,

    /// Line (1-indexed).
    pub line: u16,

    /// Column (1-indexed).
    pub column: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event with no modifiers.
    #[must_use]
    pub const fn new(kind: MouseEventKind, button: u8, line: u16, column: u16) -> Self {
        Self {
            kind,
            button,
            line,
            column,
            modifiers: Modifiers::NONE,
        }
    }

    /// Replace the modifier set.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Wheel direction, for wheel events.
    #[must_use]
    pub const fn wheel_direction(&self) -> Option<WheelDirection> {
        match (self.kind, self.button) {
            (MouseEventKind::Wheel, WHEEL_UP) => Some(WheelDirection::Up),
            (MouseEventKind::Wheel, WHEEL_DOWN) => Some(WheelDirection::Down),
            _ => None,
        }
    }
}

/// New terminal dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeEvent {
    /// Number of lines.
    pub lines: u16,
    /// Number of columns.
    pub columns: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_display_in_fixed_order() {
        assert_eq!(Modifiers::NONE.to_string(), "");
        assert_eq!(Modifiers::CTRL.to_string(), "CTRL");
        assert_eq!(
            (Modifiers::CTRL | Modifiers::SHIFT).to_string(),
            "SHIFT|CTRL"
        );
        assert_eq!(Modifiers::all().to_string(), "SHIFT|ALT|CTRL");
    }

    #[test]
    fn event_mask_matches_tag() {
        assert_eq!(Event::Key(KeyEvent::text("a")).mask(), EventMask::KEY);
        assert_eq!(
            Event::Resize(ResizeEvent {
                lines: 24,
                columns: 80
            })
            .mask(),
            EventMask::RESIZE
        );
        assert_eq!(
            Event::Change(Setting::AltScreen(true)).mask(),
            EventMask::CHANGE
        );
    }

    #[test]
    fn key_event_predicates() {
        let key = KeyEvent::key("C-c");
        assert!(key.is_key("C-c"));
        assert!(!key.is_text("C-c"));
        assert!(KeyEvent::text("x").is_text("x"));
    }

    #[test]
    fn wheel_direction_only_for_wheel() {
        let up = MouseEvent::new(MouseEventKind::Wheel, WHEEL_UP, 1, 1);
        assert_eq!(up.wheel_direction(), Some(WheelDirection::Up));
        let press = MouseEvent::new(MouseEventKind::Press, 1, 1, 1);
        assert_eq!(press.wheel_direction(), None);
    }
}
