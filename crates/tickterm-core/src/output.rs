#![forbid(unsafe_code)]

//! Buffered, coordinate-addressed terminal output.
//!
//! [`OutputWriter`] turns render calls into control sequences and text in an
//! in-memory buffer. Nothing here performs I/O: the session drains the buffer
//! into the output channel when it flushes.
//!
//! # Cursor Tracking
//!
//! The writer keeps two positions, both 1-indexed `(line, column)`:
//!
//! - the *logical* cursor, where the next print or erase happens;
//! - the *physical* cursor, where the terminal's cursor is known to be after
//!   the bytes buffered so far, or unknown.
//!
//! Moves only update the logical cursor. A single CUP is emitted lazily when
//! the next print or erase needs the cursor somewhere the terminal's cursor
//! is not, so consecutive `goto` calls cost nothing.
//!
//! # Erase Geometry
//!
//! With the cursor at column `k` on a line of width `w`:
//!
//! | Extent | Direction | Cells erased | Sequence |
//! |--------|-----------|--------------|----------|
//! | `Cells(n)` | Forward | `k ..= k+n-1` | `ECH n` |
//! | `ToLineEnd` | Forward | `k ..= w` | `EL 0` |
//! | `Cells(n)` | Backward | `k-n+1 ..= k` | `CUP`, `ECH n` |
//! | `ToLineEnd` | Backward | `1 ..= k` | `EL 1` |
//!
//! The logical cursor never moves as a result of an erase.

use std::fmt;
use std::io;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::ansi::{self, EraseLineMode};

/// How many cells an erase covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// A fixed number of cells.
    Cells(u16),
    /// Everything up to the line boundary in the erase direction.
    ToLineEnd,
}

impl Extent {
    /// Map the integer convention: any negative count means "to the line
    /// boundary".
    #[must_use]
    pub fn from_count(count: i32) -> Self {
        if count < 0 {
            Self::ToLineEnd
        } else {
            Self::Cells(u16::try_from(count).unwrap_or(u16::MAX))
        }
    }
}

/// Which way an erase extends from the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the end of the line.
    Forward,
    /// Towards the start of the line.
    Backward,
}

impl Direction {
    /// Map the integer convention: negative is backward, anything else is
    /// forward.
    #[must_use]
    pub const fn from_sign(direction: i32) -> Self {
        if direction < 0 {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

/// In-memory control-sequence writer with cursor tracking.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    buf: Vec<u8>,
    cursor: (u16, u16),
    physical: Option<(u16, u16)>,
    /// `(lines, columns)`, when known.
    size: Option<(u16, u16)>,
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputWriter {
    /// Create an empty writer with an unknown terminal size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(4096),
            cursor: (1, 1),
            physical: None,
            size: None,
        }
    }

    /// Record the terminal size; later moves are clamped to it.
    pub fn set_size(&mut self, lines: u16, columns: u16) {
        if lines == 0 || columns == 0 {
            self.size = None;
            return;
        }
        self.size = Some((lines, columns));
        self.cursor = self.clamp(self.cursor.0, self.cursor.1);
    }

    /// Terminal size as `(lines, columns)`, when known.
    #[must_use]
    pub const fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    /// Logical cursor as `(line, column)`.
    #[must_use]
    pub const fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    /// Move the logical cursor to an absolute position.
    pub fn goto(&mut self, line: u16, column: u16) {
        self.cursor = self.clamp(line, column);
    }

    /// Move the logical cursor relative to where it is.
    pub fn move_by(&mut self, lines: i32, columns: i32) {
        let line = offset(self.cursor.0, lines);
        let column = offset(self.cursor.1, columns);
        self.cursor = self.clamp(line, column);
    }

    /// Write text at the logical cursor and advance it by the text's display
    /// width.
    ///
    /// Control characters are dropped; text cannot smuggle in sequences.
    pub fn print(&mut self, text: &str) {
        self.commit();
        for grapheme in text.graphemes(true) {
            if grapheme.chars().any(char::is_control) {
                continue;
            }
            self.buf.extend_from_slice(grapheme.as_bytes());
            let width = u16::try_from(grapheme.width()).unwrap_or(u16::MAX);
            self.cursor.1 = self.cursor.1.saturating_add(width);
        }
        self.physical = match self.size {
            Some((_, columns)) if self.cursor.1 > columns => None,
            _ => Some(self.cursor),
        };
    }

    /// Write formatted text, as [`print`](Self::print).
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(text) => self.print(text),
            None => self.print(&args.to_string()),
        }
    }

    /// Erase part of the current line without moving the logical cursor.
    pub fn erase(&mut self, extent: Extent, direction: Direction) {
        self.commit();
        let (line, column) = self.cursor;
        match (extent, direction) {
            (Extent::Cells(0), _) => {}
            (Extent::Cells(n), Direction::Forward) => {
                self.emit(|w| ansi::erase_chars(w, n));
            }
            (Extent::ToLineEnd, Direction::Forward) => {
                self.emit(|w| ansi::erase_line(w, EraseLineMode::ToEnd));
            }
            (Extent::ToLineEnd, Direction::Backward) => {
                self.emit(|w| ansi::erase_line(w, EraseLineMode::ToStart));
            }
            (Extent::Cells(n), Direction::Backward) => {
                let start = column.saturating_sub(n - 1).max(1);
                self.emit(|w| ansi::cup(w, line, start));
                self.emit(|w| ansi::erase_chars(w, column - start + 1));
                self.physical = Some((line, start));
            }
        }
    }

    /// Erase the whole screen. The cursor does not move.
    pub fn clear(&mut self) {
        self.emit(ansi::erase_display);
    }

    /// Emit the pending cursor move, if the terminal's cursor is elsewhere.
    pub fn commit(&mut self) {
        if self.physical != Some(self.cursor) {
            let (line, column) = self.cursor;
            self.emit(|w| ansi::cup(w, line, column));
            self.physical = Some(self.cursor);
        }
    }

    /// Forget where the terminal's cursor is; the next output re-positions.
    pub fn forget_cursor(&mut self) {
        self.physical = None;
    }

    /// Append raw bytes, such as a mode sequence, to the buffer.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Buffered bytes not yet handed to the terminal.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop the first `n` buffered bytes, once the terminal accepted them.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.drain(..n);
    }

    /// Take the whole buffer, committing any pending cursor move first.
    pub fn take(&mut self) -> Vec<u8> {
        self.commit();
        std::mem::take(&mut self.buf)
    }

    /// Run an `ansi` helper against the buffer.
    ///
    /// Writes into a `Vec<u8>` never fail.
    fn emit(&mut self, f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) {
        let _ = f(&mut self.buf);
    }

    fn clamp(&self, line: u16, column: u16) -> (u16, u16) {
        let (line, column) = (line.max(1), column.max(1));
        match self.size {
            Some((lines, columns)) => (line.min(lines), column.min(columns)),
            None => (line, column),
        }
    }
}

impl io::Write for OutputWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for OutputWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s);
        Ok(())
    }
}

fn offset(value: u16, delta: i32) -> u16 {
    let moved = i32::from(value).saturating_add(delta).max(1);
    u16::try_from(moved).unwrap_or(u16::MAX)
}
