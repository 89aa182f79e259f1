#![forbid(unsafe_code)]

//! ANSI escape sequence generation helpers.
//!
//! Pure byte-generation functions for the control sequences the engine
//! emits. No state tracking happens here; [`crate::output::OutputWriter`]
//! and [`crate::control::ControlSettings`] decide *when* to emit.
//!
//! # Sequence Reference
//!
//! | Category | Sequence | Description |
//! |----------|----------|-------------|
//! | CSI | `ESC [ line ; col H` | CUP (Cursor Position, 1-indexed) |
//! | CSI | `ESC [ n X` | ECH (Erase Characters) |
//! | CSI | `ESC [ n K` | EL (Erase Line) |
//! | CSI | `ESC [ n J` | ED (Erase Display) |
//! | CSI | `ESC [ n SP q` | DECSCUSR (Cursor Style) |
//! | CSI | `ESC [ 22 ; 2 t` / `ESC [ 23 ; 2 t` | Title stack push/pop (XTWINOPS) |
//! | CSI | `ESC [ c` | Primary Device Attributes query |
//! | OSC | `ESC ] 2 ; text BEL` | Window title |
//! | DEC | `ESC =` / `ESC >` | Keypad application/numeric mode |

use std::io::{self, Write};

// =============================================================================
// Cursor Positioning
// =============================================================================

/// CUP (Cursor Position): `CSI line ; col H`
///
/// Both coordinates are 1-indexed, as the terminal expects them.
pub fn cup<W: Write>(w: &mut W, line: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", line.max(1), col.max(1))
}

/// Show cursor: `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Hide cursor: `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// DECSCUSR (Set Cursor Style): `CSI n SP q`
///
/// `0` restores the terminal's default shape.
pub fn cursor_style<W: Write>(w: &mut W, code: u8) -> io::Result<()> {
    write!(w, "\x1b[{code} q")
}

// =============================================================================
// Erase Operations
// =============================================================================

/// ECH (Erase Characters): `CSI n X`
///
/// Blanks `n` cells starting at the cursor without moving it.
pub fn erase_chars<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    match n {
        0 => Ok(()),
        1 => w.write_all(b"\x1b[X"),
        _ => write!(w, "\x1b[{n}X"),
    }
}

/// EL (Erase Line) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseLineMode {
    /// Erase from cursor to end of line.
    ToEnd = 0,
    /// Erase from start of line to cursor.
    ToStart = 1,
}

/// EL (Erase Line): `CSI n K`
pub fn erase_line<W: Write>(w: &mut W, mode: EraseLineMode) -> io::Result<()> {
    match mode {
        EraseLineMode::ToEnd => w.write_all(b"\x1b[K"),
        EraseLineMode::ToStart => w.write_all(b"\x1b[1K"),
    }
}

/// ED 2 (Erase Display, entire screen): `CSI 2 J`
pub fn erase_display<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

// =============================================================================
// Mode Control
// =============================================================================

/// Enable alternate screen: `CSI ? 1049 h`
pub const ALT_SCREEN_ENTER: &[u8] = b"\x1b[?1049h";

/// Disable alternate screen: `CSI ? 1049 l`
pub const ALT_SCREEN_LEAVE: &[u8] = b"\x1b[?1049l";

/// Report button presses and releases with SGR coordinates: `CSI ? 1000;1006 h`
pub const MOUSE_CLICK_ENABLE: &[u8] = b"\x1b[?1000;1006h";

/// Additionally report motion while a button is held: `CSI ? 1002;1006 h`
pub const MOUSE_DRAG_ENABLE: &[u8] = b"\x1b[?1002;1006h";

/// Report all motion: `CSI ? 1003;1006 h`
pub const MOUSE_MOVE_ENABLE: &[u8] = b"\x1b[?1003;1006h";

/// Disable every mouse tracking mode: `CSI ? 1003;1002;1000;1006 l`
pub const MOUSE_DISABLE: &[u8] = b"\x1b[?1003;1002;1000;1006l";

/// Keypad application mode (DECKPAM): `ESC =`
pub const KEYPAD_APPLICATION: &[u8] = b"\x1b=";

/// Keypad numeric mode (DECKPNM): `ESC >`
pub const KEYPAD_NUMERIC: &[u8] = b"\x1b>";

/// Save the window title on the terminal's title stack: `CSI 22 ; 2 t`
pub const TITLE_PUSH: &[u8] = b"\x1b[22;2t";

/// Restore the window title from the title stack: `CSI 23 ; 2 t`
pub const TITLE_POP: &[u8] = b"\x1b[23;2t";

/// Set the window title: `OSC 2 ; text BEL`
///
/// Control characters are stripped so the title cannot terminate the OSC
/// string early.
pub fn set_title<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    w.write_all(b"\x1b]2;")?;
    for ch in title.chars().filter(|c| !c.is_control()) {
        let mut buf = [0u8; 4];
        w.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
    }
    w.write_all(b"\x07")
}

// =============================================================================
// Queries
// =============================================================================

/// Primary Device Attributes query (DA1): `CSI c`
///
/// Every VT100-compatible terminal answers with `CSI ? ... c`.
pub const DEVICE_ATTRIBUTES_QUERY: &[u8] = b"\x1b[c";

// =============================================================================
// Tests
// =============================================================================
