#![forbid(unsafe_code)]

//! Key naming and the lookup tables behind the input decoder.
//!
//! Names follow the libtermkey conventions: `Up`, `PageDown`, `F5`, `KP7`,
//! with modifier prefixes `C-`, `M-`, `S-` applied in that order.

use crate::event::{KeyEvent, Modifiers};

/// Build a key name with modifier prefixes.
///
/// ```
/// use tickterm_core::event::Modifiers;
/// use tickterm_core::keys::key_name;
///
/// assert_eq!(key_name("Up", Modifiers::CTRL | Modifiers::SHIFT), "C-S-Up");
/// assert_eq!(key_name("a", Modifiers::ALT), "M-a");
/// ```
#[must_use]
pub fn key_name(base: &str, modifiers: Modifiers) -> String {
    let mut name = String::with_capacity(base.len() + 6);
    if modifiers.contains(Modifiers::CTRL) {
        name.push_str("C-");
    }
    if modifiers.contains(Modifiers::ALT) {
        name.push_str("M-");
    }
    if modifiers.contains(Modifiers::SHIFT) {
        name.push_str("S-");
    }
    name.push_str(base);
    name
}

/// Named key with modifiers; the name carries the matching prefixes.
pub(crate) fn named(base: &str, modifiers: Modifiers) -> KeyEvent {
    KeyEvent::key(key_name(base, modifiers)).with_modifiers(modifiers)
}

/// Decode a single C0 control byte or DEL.
///
/// Ctrl-letter combinations are reported by name only (`"C-c"`) with an
/// empty modifier set. `extra` is OR-ed in for the ESC-prefixed (Alt) form.
pub(crate) fn control_key(byte: u8, extra: Modifiers) -> KeyEvent {
    let base = match byte {
        0x09 => return named("Tab", extra),
        0x0D => return named("Enter", extra),
        0x1B => return named("Escape", extra),
        0x7F => return named("Backspace", extra),
        0x00 => "Space".to_owned(),
        0x01..=0x1A => char::from(b'a' + byte - 1).to_string(),
        _ => char::from(byte | 0x40).to_string(),
    };
    KeyEvent::key(key_name(&base, Modifiers::CTRL | extra)).with_modifiers(extra)
}

/// Convert the xterm modifier parameter (`1 + bits`) to a modifier set.
///
/// Meta (bit 8) is folded into Alt.
pub(crate) fn modifiers_from_xterm(value: u32) -> Modifiers {
    let bits = value.saturating_sub(1);
    let mut mods = Modifiers::NONE;
    if bits & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if bits & (2 | 8) != 0 {
        mods |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

/// Key for a CSI sequence ending in a letter (`CSI 1;5 A`).
pub(crate) fn csi_letter_key(final_byte: u8) -> Option<&'static str> {
    Some(match final_byte {
        b'A' => "Up",
        b'B' => "Down",
        b'C' => "Right",
        b'D' => "Left",
        b'E' => "Begin",
        b'F' => "End",
        b'H' => "Home",
        b'P' => "F1",
        b'Q' => "F2",
        b'R' => "F3",
        b'S' => "F4",
        _ => return None,
    })
}

/// Key for a `CSI n ~` sequence.
pub(crate) fn csi_tilde_key(number: u32) -> Option<&'static str> {
    Some(match number {
        1 | 7 => "Home",
        2 => "Insert",
        3 => "Delete",
        4 | 8 => "End",
        5 => "PageUp",
        6 => "PageDown",
        11 => "F1",
        12 => "F2",
        13 => "F3",
        14 => "F4",
        15 => "F5",
        17 => "F6",
        18 => "F7",
        19 => "F8",
        20 => "F9",
        21 => "F10",
        23 => "F11",
        24 => "F12",
        25 => "F13",
        26 => "F14",
        28 => "F15",
        29 => "F16",
        31 => "F17",
        32 => "F18",
        33 => "F19",
        34 => "F20",
        _ => return None,
    })
}

/// Key for an SS3 sequence (`ESC O x`), including keypad application mode.
pub(crate) fn ss3_key(final_byte: u8) -> Option<&'static str> {
    Some(match final_byte {
        b'A' => "Up",
        b'B' => "Down",
        b'C' => "Right",
        b'D' => "Left",
        b'E' => "Begin",
        b'F' => "End",
        b'H' => "Home",
        b'P' => "F1",
        b'Q' => "F2",
        b'R' => "F3",
        b'S' => "F4",
        b'M' => "KPEnter",
        b'X' => "KPEquals",
        b'j' => "KPMult",
        b'k' => "KPPlus",
        b'l' => "KPComma",
        b'm' => "KPMinus",
        b'n' => "KPPeriod",
        b'o' => "KPDiv",
        b'p' => "KP0",
        b'q' => "KP1",
        b'r' => "KP2",
        b's' => "KP3",
        b't' => "KP4",
        b'u' => "KP5",
        b'v' => "KP6",
        b'w' => "KP7",
        b'x' => "KP8",
        b'y' => "KP9",
        _ => return None,
    })
}

/// Key for a `CSI code ; mods u` code point.
///
/// Returns `Err(ch)` for plain characters so the caller can decide between
/// text and a modified key.
pub(crate) fn csi_u_key(code: u32) -> Option<Result<&'static str, char>> {
    Some(Ok(match code {
        9 | 57_346 => "Tab",
        13 | 57_345 => "Enter",
        27 | 57_344 => "Escape",
        8 | 127 | 57_347 => "Backspace",
        57_348 => "Insert",
        57_349 => "Delete",
        57_350 => "Left",
        57_351 => "Right",
        57_352 => "Up",
        57_353 => "Down",
        57_354 => "PageUp",
        57_355 => "PageDown",
        57_356 => "Home",
        57_357 => "End",
        57_364..=57_383 => return Some(Ok(FUNCTION_KEYS[(code - 57_364) as usize])),
        57_399..=57_408 => return Some(Ok(KEYPAD_DIGITS[(code - 57_399) as usize])),
        57_409 => "KPPeriod",
        57_410 => "KPDiv",
        57_411 => "KPMult",
        57_412 => "KPMinus",
        57_413 => "KPPlus",
        57_414 => "KPEnter",
        57_415 => "KPEquals",
        57_358..=63_743 => return None,
        _ => return char::from_u32(code).filter(|c| !c.is_control()).map(Err),
    }))
}

const FUNCTION_KEYS: [&str; 20] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14",
    "F15", "F16", "F17", "F18", "F19", "F20",
];

const KEYPAD_DIGITS: [&str; 10] = [
    "KP0", "KP1", "KP2", "KP3", "KP4", "KP5", "KP6", "KP7", "KP8", "KP9",
];
