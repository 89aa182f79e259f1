#![forbid(unsafe_code)]

//! Screen model for output validation.
//!
//! A minimal terminal emulator that understands the subset of control
//! sequences the engine emits, so output can be checked by its effect on a
//! grid instead of by byte comparison.
//!
//! # Scope
//!
//! This is NOT a full VT emulator. It supports only:
//! - Cursor positioning (CUP)
//! - Erase operations (ECH, EL, ED)
//! - DEC private modes 25, 1000/1002/1003/1006, 1049 (tracked, the alternate
//!   buffer is not separate)
//! - Keypad mode (`ESC =` / `ESC >`)
//! - OSC 2 titles
//!
//! Coordinates in the public API are 1-indexed `(line, column)`, matching
//! [`crate::output::OutputWriter`].
//!
//! ```
//! use tickterm_core::screen_model::ScreenModel;
//!
//! let mut model = ScreenModel::new(4, 20);
//! model.process(b"\x1b[2;3Hhello");
//! assert_eq!(model.cursor(), (2, 8));
//! assert_eq!(model.row_text(2).as_deref(), Some("  hello"));
//! ```

use unicode_width::UnicodeWidthChar;

/// Mode flags tracked by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeFlags {
    /// Cursor visibility.
    pub cursor_visible: bool,
    /// Alternate screen buffer active.
    pub alt_screen: bool,
    /// Highest enabled mouse tracking mode (1000, 1002, or 1003).
    pub mouse_tracking: Option<u16>,
    /// SGR mouse encoding (1006) enabled.
    pub mouse_sgr: bool,
    /// Keypad application mode.
    pub keypad_app: bool,
    /// Last title set with OSC 2.
    pub title: Option<String>,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            cursor_visible: true,
            alt_screen: false,
            mouse_tracking: None,
            mouse_sgr: false,
            keypad_app: false,
            title: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Ground,
    Escape,
    Csi,
    Osc,
    OscEscape,
}

/// A minimal terminal grid driven by control sequences.
#[derive(Debug)]
pub struct ScreenModel {
    lines: usize,
    columns: usize,
    cells: Vec<char>,
    /// 0-indexed cursor.
    cursor_line: usize,
    cursor_col: usize,
    modes: ModeFlags,
    state: ParseState,
    params: Vec<u32>,
    intermediates: Vec<u8>,
    osc: Vec<u8>,
    utf8: Vec<u8>,
}

impl ScreenModel {
    /// Create a blank model with the given dimensions.
    #[must_use]
    pub fn new(lines: usize, columns: usize) -> Self {
        let lines = lines.max(1);
        let columns = columns.max(1);
        Self {
            lines,
            columns,
            cells: vec![' '; lines * columns],
            cursor_line: 0,
            cursor_col: 0,
            modes: ModeFlags::default(),
            state: ParseState::Ground,
            params: Vec::with_capacity(8),
            intermediates: Vec::with_capacity(2),
            osc: Vec::new(),
            utf8: Vec::with_capacity(4),
        }
    }

    /// Number of lines.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Cursor position as 1-indexed `(line, column)`.
    #[must_use]
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_line + 1, self.cursor_col + 1)
    }

    /// Current mode flags.
    #[must_use]
    pub fn modes(&self) -> &ModeFlags {
        &self.modes
    }

    /// Character at 1-indexed `(line, column)`.
    #[must_use]
    pub fn char_at(&self, line: usize, column: usize) -> Option<char> {
        if line == 0 || column == 0 || line > self.lines || column > self.columns {
            return None;
        }
        Some(self.cells[(line - 1) * self.columns + column - 1])
    }

    /// Text of a 1-indexed line, trailing blanks trimmed.
    #[must_use]
    pub fn row_text(&self, line: usize) -> Option<String> {
        if line == 0 || line > self.lines {
            return None;
        }
        let start = (line - 1) * self.columns;
        let text: String = self.cells[start..start + self.columns].iter().collect();
        Some(text.trim_end().to_owned())
    }

    /// Fill a 1-indexed line with `text`, leaving the cursor untouched.
    pub fn fill_row(&mut self, line: usize, text: &str) {
        if line == 0 || line > self.lines {
            return;
        }
        let start = (line - 1) * self.columns;
        let mut chars = text.chars();
        for cell in &mut self.cells[start..start + self.columns] {
            *cell = chars.next().unwrap_or(' ');
        }
    }

    /// Process a byte sequence, updating the grid.
    pub fn process(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.process_byte(b);
        }
    }

    fn process_byte(&mut self, b: u8) {
        match self.state {
            ParseState::Ground => self.ground_state(b),
            ParseState::Escape => self.escape_state(b),
            ParseState::Csi => self.csi_state(b),
            ParseState::Osc => self.osc_state(b),
            ParseState::OscEscape => {
                // ST (ESC \) or anything else ends the string.
                self.execute_osc();
                self.state = ParseState::Ground;
            }
        }
    }

    fn ground_state(&mut self, b: u8) {
        match b {
            0x1B => {
                self.utf8.clear();
                self.state = ParseState::Escape;
            }
            0x0D => self.cursor_col = 0,
            0x0A => self.cursor_line = (self.cursor_line + 1).min(self.lines - 1),
            0x08 => self.cursor_col = self.cursor_col.saturating_sub(1),
            0x00..=0x1F | 0x7F => {}
            0x20..=0x7E => self.put_char(char::from(b)),
            _ => {
                self.utf8.push(b);
                if let Ok(s) = std::str::from_utf8(&self.utf8) {
                    let chars: Vec<char> = s.chars().collect();
                    self.utf8.clear();
                    for ch in chars {
                        self.put_char(ch);
                    }
                } else if self.utf8.len() >= 4 {
                    self.utf8.clear();
                }
            }
        }
    }

    fn escape_state(&mut self, b: u8) {
        self.state = ParseState::Ground;
        match b {
            b'[' => {
                self.params.clear();
                self.intermediates.clear();
                self.state = ParseState::Csi;
            }
            b']' => {
                self.osc.clear();
                self.state = ParseState::Osc;
            }
            b'=' => self.modes.keypad_app = true,
            b'>' => self.modes.keypad_app = false,
            _ => {}
        }
    }

    fn csi_state(&mut self, b: u8) {
        match b {
            b'0'..=b'9' => {
                if self.params.is_empty() {
                    self.params.push(0);
                }
                if let Some(last) = self.params.last_mut() {
                    *last = last.saturating_mul(10).saturating_add(u32::from(b - b'0'));
                }
            }
            b';' => {
                if self.params.is_empty() {
                    self.params.push(0);
                }
                self.params.push(0);
            }
            b'?' | b'>' | b'<' | b'=' | 0x20..=0x2F => self.intermediates.push(b),
            0x40..=0x7E => {
                self.execute_csi(b);
                self.state = ParseState::Ground;
            }
            _ => self.state = ParseState::Ground,
        }
    }

    fn osc_state(&mut self, b: u8) {
        match b {
            0x07 => {
                self.execute_osc();
                self.state = ParseState::Ground;
            }
            0x1B => self.state = ParseState::OscEscape,
            _ => self.osc.push(b),
        }
    }

    fn execute_osc(&mut self) {
        let text = String::from_utf8_lossy(&self.osc);
        if let Some(title) = text.strip_prefix("2;") {
            self.modes.title = Some(title.to_owned());
        }
    }

    fn put_char(&mut self, ch: char) {
        let width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width == 0 {
            return;
        }
        if self.cursor_col >= self.columns {
            self.cursor_col = 0;
            self.cursor_line = (self.cursor_line + 1).min(self.lines - 1);
        }
        let row = self.cursor_line * self.columns;
        self.cells[row + self.cursor_col] = ch;
        if width == 2 && self.cursor_col + 1 < self.columns {
            self.cells[row + self.cursor_col + 1] = ' ';
        }
        // The cursor may rest one past the last column (pending wrap).
        self.cursor_col = (self.cursor_col + width).min(self.columns);
    }

    fn param(&self, index: usize, default: u32) -> u32 {
        match self.params.get(index).copied() {
            Some(0) | None => default,
            Some(v) => v,
        }
    }

    fn execute_csi(&mut self, final_byte: u8) {
        let private = self.intermediates.contains(&b'?');
        match final_byte {
            b'H' | b'f' => {
                let line = self.param(0, 1) as usize;
                let col = self.param(1, 1) as usize;
                self.cursor_line = (line - 1).min(self.lines - 1);
                self.cursor_col = (col - 1).min(self.columns - 1);
            }
            b'X' => {
                let col = self.cursor_col.min(self.columns - 1);
                let n = self.param(0, 1) as usize;
                let end = (col + n).min(self.columns);
                self.erase_cells(self.cursor_line, col, end);
            }
            b'K' => {
                let col = self.cursor_col.min(self.columns - 1);
                match self.params.first().copied().unwrap_or(0) {
                    0 => self.erase_cells(self.cursor_line, col, self.columns),
                    1 => self.erase_cells(self.cursor_line, 0, col + 1),
                    2 => self.erase_cells(self.cursor_line, 0, self.columns),
                    _ => {}
                }
            }
            b'J' => match self.params.first().copied().unwrap_or(0) {
                0 => {
                    let col = self.cursor_col.min(self.columns - 1);
                    self.erase_cells(self.cursor_line, col, self.columns);
                    for line in self.cursor_line + 1..self.lines {
                        self.erase_cells(line, 0, self.columns);
                    }
                }
                1 => {
                    for line in 0..self.cursor_line {
                        self.erase_cells(line, 0, self.columns);
                    }
                    let col = self.cursor_col.min(self.columns - 1);
                    self.erase_cells(self.cursor_line, 0, col + 1);
                }
                2 | 3 => self.cells.fill(' '),
                _ => {}
            },
            b'h' if private => self.set_private_modes(true),
            b'l' if private => self.set_private_modes(false),
            _ => {}
        }
    }

    fn erase_cells(&mut self, line: usize, from: usize, to: usize) {
        let row = line * self.columns;
        for cell in &mut self.cells[row + from..row + to] {
            *cell = ' ';
        }
    }

    fn set_private_modes(&mut self, on: bool) {
        for mode in self.params.clone() {
            match mode {
                25 => self.modes.cursor_visible = on,
                1049 => self.modes.alt_screen = on,
                1006 => self.modes.mouse_sgr = on,
                1000 | 1002 | 1003 => {
                    let mode = mode as u16;
                    self.modes.mouse_tracking = if on {
                        Some(self.modes.mouse_tracking.map_or(mode, |m| m.max(mode)))
                    } else if self.modes.mouse_tracking == Some(mode) {
                        None
                    } else {
                        self.modes.mouse_tracking
                    };
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cup_and_text() {
        let mut model = ScreenModel::new(3, 10);
        model.process(b"\x1b[3;4Habc");
        assert_eq!(model.row_text(3).as_deref(), Some("   abc"));
        assert_eq!(model.cursor(), (3, 7));
    }

    #[test]
    fn ech_blanks_without_moving() {
        let mut model = ScreenModel::new(1, 10);
        model.fill_row(1, "abcdefghij");
        model.process(b"\x1b[1;3H\x1b[4X");
        assert_eq!(model.row_text(1).as_deref(), Some("ab    ghij"));
        assert_eq!(model.cursor(), (1, 3));
    }

    #[test]
    fn el_modes() {
        let mut model = ScreenModel::new(1, 6);
        model.fill_row(1, "abcdef");
        model.process(b"\x1b[1;3H\x1b[1K");
        assert_eq!(model.row_text(1).as_deref(), Some("   def"));
        model.process(b"\x1b[1;5H\x1b[K");
        assert_eq!(model.row_text(1).as_deref(), Some("   d"));
    }

    #[test]
    fn ed_all_clears_grid() {
        let mut model = ScreenModel::new(2, 4);
        model.fill_row(1, "abcd");
        model.fill_row(2, "efgh");
        model.process(b"\x1b[2J");
        assert_eq!(model.row_text(1).as_deref(), Some(""));
        assert_eq!(model.row_text(2).as_deref(), Some(""));
    }

    #[test]
    fn private_modes_tracked() {
        let mut model = ScreenModel::new(1, 1);
        model.process(b"\x1b[?1049h\x1b[?25l\x1b[?1002;1006h\x1b=");
        assert!(model.modes().alt_screen);
        assert!(!model.modes().cursor_visible);
        assert_eq!(model.modes().mouse_tracking, Some(1002));
        assert!(model.modes().mouse_sgr);
        assert!(model.modes().keypad_app);

        model.process(b"\x1b[?1003;1002;1000;1006l\x1b>\x1b[?25h\x1b[?1049l");
        assert_eq!(model.modes(), &ModeFlags::default());
    }

    #[test]
    fn osc_title() {
        let mut model = ScreenModel::new(1, 1);
        model.process(b"\x1b]2;hello\x07");
        assert_eq!(model.modes().title.as_deref(), Some("hello"));
    }

    #[test]
    fn wide_and_multibyte_text() {
        let mut model = ScreenModel::new(1, 10);
        model.process("é日x".as_bytes());
        assert_eq!(model.char_at(1, 1), Some('é'));
        assert_eq!(model.char_at(1, 2), Some('日'));
        assert_eq!(model.char_at(1, 4), Some('x'));
        assert_eq!(model.cursor(), (1, 5));
    }
}
