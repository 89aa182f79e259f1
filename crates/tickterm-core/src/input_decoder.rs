#![forbid(unsafe_code)]

//! Input decoder state machine.
//!
//! Decodes terminal input bytes into [`crate::event::Event`] values. Bytes
//! arrive in arbitrary chunks; the decoder keeps any incomplete sequence in
//! an owned buffer and resumes on the next [`InputDecoder::feed`].
//!
//! # Design
//!
//! The decoder is a byte-at-a-time state machine that handles:
//! - ASCII text, UTF-8 multi-byte characters, and C0 control codes
//! - ESC-prefixed (Alt) keys
//! - CSI sequences: cursor keys, editing keys, function keys, `CSI u`
//!   and `CSI 27 ; m ; c ~` modified characters
//! - SS3 sequences: application cursor keys and the application keypad
//! - Mouse reports in SGR (`CSI < b ; x ; y M/m`) and legacy X10 encoding
//! - Primary device attribute replies (`CSI ? ... c`), queued separately
//!
//! # Invariants
//!
//! 1. Decoding is independent of chunk boundaries: any split of the same
//!    byte stream yields the same events in the same order.
//! 2. The sequence buffer never exceeds `max_sequence_len` bytes.
//! 3. Malformed or unknown sequences are dropped; the decoder always returns
//!    to a state that can decode the next well-formed sequence.
//!
//! # Ambiguity
//!
//! A lone `ESC` (or `ESC [`, `ESC O`) may be a complete key or the start of a
//! longer sequence. The decoder never guesses. While such a prefix is held,
//! [`InputDecoder::pending_timeout`] reports how long the caller should wait
//! for more bytes before calling [`InputDecoder::flush_pending`], which
//! commits the shortest interpretation.

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::DecodeOverflow;
use crate::event::{
    Event, KeyEvent, Modifiers, MouseEvent, MouseEventKind, ResizeEvent, WHEEL_DOWN, WHEEL_UP,
};
use crate::keys::{self, named};

/// Default bound on the length of a single buffered sequence.
pub const DEFAULT_MAX_SEQUENCE_LEN: usize = 256;

/// Default time to wait for the rest of an ambiguous prefix.
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

/// Decoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum length of one incomplete sequence, including its introducer.
    pub max_sequence_len: usize,
    /// How long an ambiguous prefix is held before it is flushed.
    pub escape_timeout: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
        }
    }
}

/// Replies the terminal sends in answer to a query.
///
/// These are not user input and are queued apart from events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalReply {
    /// Primary device attributes (`CSI ? Ps ; ... c`).
    DeviceAttributes(Vec<u32>),
}

/// Decoder states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecoderState {
    /// Between sequences.
    #[default]
    Ground,
    /// After ESC (0x1B).
    Escape,
    /// After ESC [ , collecting parameters and intermediates.
    Csi,
    /// After ESC O , collecting an optional modifier parameter.
    Ss3,
    /// After ESC [ M , collecting the three raw report bytes.
    LegacyMouse,
    /// Collecting a UTF-8 multi-byte character.
    Utf8 {
        /// Total bytes expected.
        expected: u8,
        /// Whether the character was ESC-prefixed.
        alt: bool,
    },
    /// Dropping the tail of an oversized sequence up to its final byte.
    Discard,
}

/// Resumable terminal input decoder.
///
/// ```
/// use tickterm_core::event::{Event, KeyEvent};
/// use tickterm_core::input_decoder::InputDecoder;
///
/// let mut decoder = InputDecoder::new();
/// assert_eq!(decoder.feed(b"\x1b[").unwrap(), 0);
/// assert_eq!(decoder.feed(b"A").unwrap(), 1);
/// assert_eq!(decoder.next_event(), Some(Event::Key(KeyEvent::key("Up"))));
/// ```
#[derive(Debug)]
pub struct InputDecoder {
    config: DecoderConfig,
    state: DecoderState,
    /// Bytes of the sequence in flight.
    buffer: Vec<u8>,
    events: VecDeque<Event>,
    replies: VecDeque<TerminalReply>,
    /// Last pressed mouse button, for encodings that do not repeat it.
    held_button: u8,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDecoder {
    /// Create a decoder with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit limits.
    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            state: DecoderState::Ground,
            buffer: Vec::with_capacity(64),
            events: VecDeque::new(),
            replies: VecDeque::new(),
            held_button: 0,
        }
    }

    /// Active limits.
    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a chunk of input.
    ///
    /// Returns the number of events completed by this chunk. Completed events
    /// are queued for [`next_event`](Self::next_event) even when an overflow
    /// is reported: the oversized sequence is dropped and decoding continues
    /// with the bytes after it.
    pub fn feed(&mut self, input: &[u8]) -> Result<usize, DecodeOverflow> {
        let before = self.events.len();
        let mut discarded = 0;
        for &byte in input {
            discarded += self.process_byte(byte);
        }
        let completed = self.events.len() - before;
        if discarded > 0 {
            crate::warn!(
                limit = self.config.max_sequence_len,
                discarded,
                "input sequence overflow"
            );
            return Err(DecodeOverflow {
                limit: self.config.max_sequence_len,
                discarded,
            });
        }
        Ok(completed)
    }

    /// Decode a chunk and collect every queued event.
    ///
    /// Overflows are recovered from silently.
    pub fn parse(&mut self, input: &[u8]) -> Vec<Event> {
        let _ = self.feed(input);
        self.events.drain(..).collect()
    }

    /// Pop the next decoded event.
    pub fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Drain decoded events lazily.
    pub fn events(&mut self) -> impl Iterator<Item = Event> + '_ {
        std::iter::from_fn(move || self.events.pop_front())
    }

    /// Pop the next terminal reply.
    pub fn next_reply(&mut self) -> Option<TerminalReply> {
        self.replies.pop_front()
    }

    /// Whether a prefix is buffered awaiting more bytes.
    ///
    /// The tail of an oversized sequence is not a prefix: it is dropped
    /// whenever it arrives, so it never arms the escape timeout.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, DecoderState::Ground | DecoderState::Discard)
    }

    /// How long to wait for more bytes before calling
    /// [`flush_pending`](Self::flush_pending), if anything is pending.
    #[must_use]
    pub fn pending_timeout(&self) -> Option<Duration> {
        self.is_pending().then_some(self.config.escape_timeout)
    }

    /// Commit the shortest interpretation of the buffered prefix.
    ///
    /// A lone `ESC` becomes the `Escape` key; `ESC [` and `ESC O` become
    /// `M-[` / `M-O` followed by the remaining bytes decoded as ordinary
    /// input. Incomplete UTF-8 is dropped. Returns the number of events
    /// produced.
    pub fn flush_pending(&mut self) -> usize {
        let before = self.events.len();
        let state = std::mem::take(&mut self.state);
        let pending = std::mem::take(&mut self.buffer);
        match state {
            DecoderState::Ground => {}
            DecoderState::Discard => self.state = DecoderState::Discard,
            DecoderState::Escape => self.emit_key(named("Escape", Modifiers::NONE)),
            DecoderState::Csi | DecoderState::Ss3 | DecoderState::LegacyMouse => {
                let introducer = pending.get(1).copied().unwrap_or(b'[');
                self.emit_key(named(
                    char::from(introducer).encode_utf8(&mut [0; 4]),
                    Modifiers::ALT,
                ));
                for &byte in pending.iter().skip(2) {
                    self.process_byte(byte);
                }
            }
            DecoderState::Utf8 { alt, .. } => {
                if alt {
                    self.emit_key(named("Escape", Modifiers::NONE));
                }
                crate::debug!(bytes = pending.len(), "dropping incomplete UTF-8");
            }
        }
        if self.buffer.capacity() == 0 {
            self.buffer = pending;
            self.buffer.clear();
        }
        self.events.len() - before
    }

    /// Queue a resize event in order with decoded input.
    pub fn push_resize(&mut self, lines: u16, columns: u16) {
        self.events
            .push_back(Event::Resize(ResizeEvent { lines, columns }));
    }

    /// Drop all buffered bytes, queued events, and replies.
    pub fn reset(&mut self) {
        self.state = DecoderState::Ground;
        self.buffer.clear();
        self.events.clear();
        self.replies.clear();
        self.held_button = 0;
    }

    /// Process a single byte; returns the number of bytes dropped by an
    /// overflow.
    fn process_byte(&mut self, byte: u8) -> usize {
        match self.state {
            DecoderState::Ground => self.process_ground(byte),
            DecoderState::Escape => self.process_escape(byte),
            DecoderState::Csi => self.process_csi(byte),
            DecoderState::Ss3 => self.process_ss3(byte),
            DecoderState::LegacyMouse => self.process_legacy_mouse(byte),
            DecoderState::Utf8 { expected, alt } => self.process_utf8(byte, expected, alt),
            DecoderState::Discard => self.process_discard(byte),
        }
    }

    fn process_ground(&mut self, byte: u8) -> usize {
        match byte {
            0x1B => {
                self.buffer.clear();
                self.buffer.push(byte);
                self.state = DecoderState::Escape;
            }
            0x20..=0x7E => self.emit_key(KeyEvent::text(char::from(byte))),
            0x00..=0x1F | 0x7F => self.emit_key(keys::control_key(byte, Modifiers::NONE)),
            _ => self.start_utf8(byte, false),
        }
        0
    }

    fn process_escape(&mut self, byte: u8) -> usize {
        match byte {
            b'[' => {
                self.buffer.push(byte);
                self.state = DecoderState::Csi;
            }
            b'O' => {
                self.buffer.push(byte);
                self.state = DecoderState::Ss3;
            }
            0x20..=0x7E => {
                self.clear_sequence();
                self.emit_key(named(char::from(byte).encode_utf8(&mut [0; 4]), Modifiers::ALT));
            }
            0x00..=0x1F | 0x7F => {
                self.clear_sequence();
                self.emit_key(keys::control_key(byte, Modifiers::ALT));
            }
            _ => {
                self.clear_sequence();
                self.start_utf8(byte, true);
            }
        }
        0
    }

    fn process_csi(&mut self, byte: u8) -> usize {
        match byte {
            b'M' if self.buffer.len() == 2 => {
                self.buffer.push(byte);
                self.state = DecoderState::LegacyMouse;
                0
            }
            0x20..=0x3F => self.push_param(byte),
            0x40..=0x7E => {
                let seq = std::mem::take(&mut self.buffer);
                self.state = DecoderState::Ground;
                self.parse_csi_sequence(&seq[2..], byte);
                self.recycle(seq);
                0
            }
            _ => self.resync(byte),
        }
    }

    fn process_ss3(&mut self, byte: u8) -> usize {
        match byte {
            b'0'..=b'9' | b';' => self.push_param(byte),
            0x40..=0x7E => {
                let seq = std::mem::take(&mut self.buffer);
                self.state = DecoderState::Ground;
                let params = std::str::from_utf8(&seq[2..]).unwrap_or("");
                let index = usize::from(params.contains(';'));
                match keys::ss3_key(byte) {
                    Some(name) => self.emit_key(named(name, modifier_param(params, index))),
                    None => {
                        crate::debug!(final_byte = byte, "unrecognized SS3 sequence");
                    }
                }
                self.recycle(seq);
                0
            }
            _ => self.resync(byte),
        }
    }

    fn process_legacy_mouse(&mut self, byte: u8) -> usize {
        self.buffer.push(byte);
        if self.buffer.len() == 6 {
            let code = u16::from(self.buffer[3].saturating_sub(32));
            let column = u16::from(self.buffer[4].saturating_sub(32));
            let line = u16::from(self.buffer[5].saturating_sub(32));
            self.clear_sequence();
            self.emit_mouse(code, line, column, false);
        }
        0
    }

    fn process_utf8(&mut self, byte: u8, expected: u8, alt: bool) -> usize {
        if byte & 0xC0 != 0x80 {
            crate::debug!("invalid UTF-8 continuation byte");
            return self.resync(byte);
        }
        self.buffer.push(byte);
        if self.buffer.len() == usize::from(expected) {
            self.state = DecoderState::Ground;
            let seq = std::mem::take(&mut self.buffer);
            match std::str::from_utf8(&seq) {
                Ok(text) if alt => self.emit_key(named(text, Modifiers::ALT)),
                Ok(text) => self.emit_key(KeyEvent::text(text)),
                Err(_) => {
                    crate::debug!("dropping malformed UTF-8");
                }
            }
            self.recycle(seq);
        }
        0
    }

    fn process_discard(&mut self, byte: u8) -> usize {
        match byte {
            0x20..=0x3F => {}
            0x40..=0x7E => self.state = DecoderState::Ground,
            _ => {
                self.state = DecoderState::Ground;
                return self.process_ground(byte);
            }
        }
        0
    }

    /// Start a UTF-8 character from its lead byte, or drop a stray byte.
    fn start_utf8(&mut self, lead: u8, alt: bool) {
        let expected = match lead {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => {
                crate::trace!(byte = lead, "dropping stray byte");
                return;
            }
        };
        self.buffer.clear();
        self.buffer.push(lead);
        self.state = DecoderState::Utf8 { expected, alt };
    }

    /// Append a parameter byte, enforcing the length limit.
    fn push_param(&mut self, byte: u8) -> usize {
        if self.buffer.len() >= self.config.max_sequence_len {
            let discarded = self.buffer.len() + 1;
            self.buffer.clear();
            self.state = DecoderState::Discard;
            return discarded;
        }
        self.buffer.push(byte);
        0
    }

    /// Abandon the sequence in flight and reprocess `byte` from ground.
    fn resync(&mut self, byte: u8) -> usize {
        crate::debug!(
            dropped = self.buffer.len(),
            byte,
            "malformed sequence, resynchronizing"
        );
        self.clear_sequence();
        self.process_ground(byte)
    }

    fn clear_sequence(&mut self) {
        self.buffer.clear();
        self.state = DecoderState::Ground;
    }

    /// Return a taken sequence buffer's allocation unless a new one started.
    fn recycle(&mut self, mut seq: Vec<u8>) {
        if self.buffer.is_empty() {
            seq.clear();
            self.buffer = seq;
        }
    }

    fn emit_key(&mut self, key: KeyEvent) {
        self.events.push_back(Event::Key(key));
    }

    /// Interpret a complete CSI sequence.
    fn parse_csi_sequence(&mut self, params: &[u8], final_byte: u8) {
        let Ok(params) = std::str::from_utf8(params) else {
            return;
        };
        match (params.as_bytes().first(), final_byte) {
            (Some(b'<'), b'M' | b'm') => self.parse_sgr_mouse(&params[1..], final_byte == b'm'),
            (Some(b'?'), b'c') => {
                let attributes = params[1..]
                    .split(';')
                    .filter_map(|p| p.parse().ok())
                    .collect();
                self.replies
                    .push_back(TerminalReply::DeviceAttributes(attributes));
            }
            (Some(b'<' | b'=' | b'>' | b'?'), _) => {
                crate::debug!(final_byte, "ignoring private CSI sequence");
            }
            (_, b'~') => self.parse_csi_tilde(params),
            (_, b'u') => match param(params, 0) {
                Some(code) => self.modified_char(code, modifier_param(params, 1)),
                None => {
                    crate::debug!("CSI u without key code");
                }
            },
            (_, b'Z') => self.emit_key(named(
                "Tab",
                Modifiers::SHIFT | modifier_param(params, 1),
            )),
            (_, _) => match keys::csi_letter_key(final_byte) {
                Some(name) => self.emit_key(named(name, modifier_param(params, 1))),
                None => {
                    crate::debug!(final_byte, "unrecognized CSI sequence");
                }
            },
        }
    }

    /// Parse CSI sequences ending in `~`.
    fn parse_csi_tilde(&mut self, params: &str) {
        let Some(number) = param(params, 0) else {
            return;
        };
        if number == 27 {
            // xterm modifyOtherKeys: CSI 27 ; mods ; code ~
            if let Some(code) = param(params, 2) {
                self.modified_char(code, modifier_param(params, 1));
            }
            return;
        }
        match keys::csi_tilde_key(number) {
            Some(name) => self.emit_key(named(name, modifier_param(params, 1))),
            None => {
                crate::debug!(number, "unrecognized CSI ~ sequence");
            }
        }
    }

    /// A key reported as a code point plus explicit modifiers.
    fn modified_char(&mut self, code: u32, modifiers: Modifiers) {
        match keys::csi_u_key(code) {
            Some(Ok(name)) => self.emit_key(named(name, modifiers)),
            Some(Err(ch)) if modifiers.is_empty() => self.emit_key(KeyEvent::text(ch)),
            Some(Err(ch)) if modifiers == Modifiers::SHIFT => {
                self.emit_key(KeyEvent::text(ch.to_uppercase().collect::<String>()));
            }
            Some(Err(' ')) => self.emit_key(named("Space", modifiers)),
            Some(Err(ch)) => self.emit_key(named(ch.encode_utf8(&mut [0; 4]), modifiers)),
            None => {
                crate::debug!(code, "unrecognized key code");
            }
        }
    }

    /// Parse the body of an SGR mouse report (`b ; x ; y`).
    fn parse_sgr_mouse(&mut self, params: &str, release: bool) {
        let mut parts = params.split(';').map(|p| p.parse::<u16>().ok());
        let (Some(Some(code)), Some(Some(column)), Some(Some(line))) =
            (parts.next(), parts.next(), parts.next())
        else {
            crate::debug!("malformed SGR mouse report");
            return;
        };
        self.emit_mouse(code, line, column, release);
    }

    /// Emit a mouse event from an xterm button code.
    ///
    /// Bits 0-1 select the button (3 means release in legacy encoding),
    /// 4/8/16 are Shift/Alt/Ctrl, 32 marks motion, 64 marks the wheel.
    fn emit_mouse(&mut self, code: u16, line: u16, column: u16, release: bool) {
        let low = (code & 0b11) as u8;
        let (kind, button) = if code & 64 != 0 {
            if release {
                return;
            }
            match low {
                0 => (MouseEventKind::Wheel, WHEEL_UP),
                1 => (MouseEventKind::Wheel, WHEEL_DOWN),
                _ => {
                    crate::debug!(code, "ignoring horizontal wheel");
                    return;
                }
            }
        } else if code & 32 != 0 {
            (MouseEventKind::Drag, if low == 3 { 0 } else { low + 1 })
        } else if release || low == 3 {
            let button = if low == 3 { self.held_button } else { low + 1 };
            self.held_button = 0;
            (MouseEventKind::Release, button)
        } else {
            self.held_button = low + 1;
            (MouseEventKind::Press, low + 1)
        };
        let event =
            MouseEvent::new(kind, button, line, column).with_modifiers(mouse_modifiers(code));
        self.events.push_back(Event::Mouse(event));
    }
}

/// Numeric parameter `index` of a `;`-separated list, ignoring `:` sub-parameters.
fn param(params: &str, index: usize) -> Option<u32> {
    params.split(';').nth(index)?.split(':').next()?.parse().ok()
}

fn modifier_param(params: &str, index: usize) -> Modifiers {
    param(params, index).map_or(Modifiers::NONE, keys::modifiers_from_xterm)
}

fn mouse_modifiers(code: u16) -> Modifiers {
    let mut mods = Modifiers::NONE;
    if code & 4 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if code & 8 != 0 {
        mods |= Modifiers::ALT;
    }
    if code & 16 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyEventKind;

    fn key(name: &str, modifiers: Modifiers) -> Event {
        Event::Key(KeyEvent::key(name).with_modifiers(modifiers))
    }

    fn text(s: &str) -> Event {
        Event::Key(KeyEvent::text(s))
    }

    #[test]
    fn ascii_characters_parsed() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"abc");
        assert_eq!(events, vec![text("a"), text("b"), text("c")]);
    }

    #[test]
    fn utf8_character_is_one_event() {
        let mut decoder = InputDecoder::new();
        // é (U+00E9) = 0xC3 0xA9, 日 = 0xE6 0x97 0xA5
        let events = decoder.parse("é日".as_bytes());
        assert_eq!(events, vec![text("é"), text("日")]);
    }

    #[test]
    fn ctrl_c_is_named_without_modifiers() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(&[0x03]);
        assert!(matches!(
            events.first(),
            Some(Event::Key(k)) if k.kind == KeyEventKind::Key
                && k.text == "C-c"
                && k.modifiers.is_empty()
        ));
    }

    #[test]
    fn control_characters() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(&[0x09, 0x0D, 0x7F, 0x00]);
        assert_eq!(
            events,
            vec![
                key("Tab", Modifiers::NONE),
                key("Enter", Modifiers::NONE),
                key("Backspace", Modifiers::NONE),
                key("C-Space", Modifiers::NONE),
            ]
        );
    }

    #[test]
    fn arrow_keys() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1bOA");
        let names: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Key(k) => Some(k.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["Up", "Down", "Right", "Left", "Up"]);
    }

    #[test]
    fn modifiers_in_csi() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.parse(b"\x1b[1;5A"),
            vec![key("C-Up", Modifiers::CTRL)]
        );
        assert_eq!(
            decoder.parse(b"\x1b[1;4D"),
            vec![key("M-S-Left", Modifiers::ALT | Modifiers::SHIFT)]
        );
        assert_eq!(
            decoder.parse(b"\x1b[15;2~"),
            vec![key("S-F5", Modifiers::SHIFT)]
        );
    }

    #[test]
    fn editing_and_function_keys() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1b[2~\x1b[3~\x1b[5~\x1b[6~\x1b[24~\x1b[34~\x1bOP\x1b[Z");
        assert_eq!(
            events,
            vec![
                key("Insert", Modifiers::NONE),
                key("Delete", Modifiers::NONE),
                key("PageUp", Modifiers::NONE),
                key("PageDown", Modifiers::NONE),
                key("F12", Modifiers::NONE),
                key("F20", Modifiers::NONE),
                key("F1", Modifiers::NONE),
                key("S-Tab", Modifiers::SHIFT),
            ]
        );
    }

    #[test]
    fn keypad_application_keys() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1bOp\x1bOy\x1bOM\x1bOk\x1bO5j");
        assert_eq!(
            events,
            vec![
                key("KP0", Modifiers::NONE),
                key("KP9", Modifiers::NONE),
                key("KPEnter", Modifiers::NONE),
                key("KPPlus", Modifiers::NONE),
                key("C-KPMult", Modifiers::CTRL),
            ]
        );
    }

    #[test]
    fn alt_key_escapes() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1ba"), vec![key("M-a", Modifiers::ALT)]);
        assert_eq!(
            decoder.parse(b"\x1b\x1b"),
            vec![key("M-Escape", Modifiers::ALT)]
        );
        assert_eq!(
            decoder.parse(b"\x1b\x01"),
            vec![key("C-M-a", Modifiers::ALT)]
        );
        assert_eq!(
            decoder.parse("\x1bé".as_bytes()),
            vec![key("M-é", Modifiers::ALT)]
        );
    }

    #[test]
    fn csi_u_keyboard() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1b[97u"), vec![text("a")]);
        assert_eq!(decoder.parse(b"\x1b[97;2u"), vec![text("A")]);
        assert_eq!(
            decoder.parse(b"\x1b[97;5u"),
            vec![key("C-a", Modifiers::CTRL)]
        );
        assert_eq!(
            decoder.parse(b"\x1b[32;3u"),
            vec![key("M-Space", Modifiers::ALT)]
        );
        assert_eq!(
            decoder.parse(b"\x1b[57364;1u"),
            vec![key("F1", Modifiers::NONE)]
        );
        assert_eq!(
            decoder.parse(b"\x1b[27;5;105~"),
            vec![key("C-i", Modifiers::CTRL)]
        );
    }

    #[test]
    fn sgr_mouse_press_release_drag() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1b[<0;10;5M\x1b[<32;11;5M\x1b[<0;11;5m");
        assert_eq!(
            events,
            vec![
                Event::Mouse(MouseEvent::new(MouseEventKind::Press, 1, 5, 10)),
                Event::Mouse(MouseEvent::new(MouseEventKind::Drag, 1, 5, 11)),
                Event::Mouse(MouseEvent::new(MouseEventKind::Release, 1, 5, 11)),
            ]
        );
    }

    #[test]
    fn sgr_mouse_wheel_and_modifiers() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1b[<64;3;4M\x1b[<65;3;4M\x1b[<18;1;1M");
        assert_eq!(
            events,
            vec![
                Event::Mouse(MouseEvent::new(MouseEventKind::Wheel, WHEEL_UP, 4, 3)),
                Event::Mouse(MouseEvent::new(MouseEventKind::Wheel, WHEEL_DOWN, 4, 3)),
                Event::Mouse(
                    MouseEvent::new(MouseEventKind::Press, 3, 1, 1)
                        .with_modifiers(Modifiers::CTRL)
                ),
            ]
        );
    }

    #[test]
    fn legacy_mouse_press_and_release() {
        let mut decoder = InputDecoder::new();
        // Right button press at column 3, line 7, then release (code 3).
        let events = decoder.parse(&[0x1B, b'[', b'M', 32 + 2, 32 + 3, 32 + 7]);
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(MouseEventKind::Press, 3, 7, 3))]
        );
        let events = decoder.parse(&[0x1B, b'[', b'M', 32 + 3, 32 + 4, 32 + 7]);
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(MouseEventKind::Release, 3, 7, 4))]
        );
    }

    #[test]
    fn device_attributes_are_replies_not_events() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.parse(b"\x1b[?62;22c").is_empty());
        assert_eq!(
            decoder.next_reply(),
            Some(TerminalReply::DeviceAttributes(vec![62, 22]))
        );
        assert_eq!(decoder.next_reply(), None);
    }

    #[test]
    fn lone_escape_waits_then_flushes() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"\x1b"), Ok(0));
        assert!(decoder.is_pending());
        assert_eq!(decoder.pending_timeout(), Some(DEFAULT_ESCAPE_TIMEOUT));
        assert_eq!(decoder.flush_pending(), 1);
        assert_eq!(decoder.next_event(), Some(key("Escape", Modifiers::NONE)));
        assert!(!decoder.is_pending());
        assert_eq!(decoder.pending_timeout(), None);
    }

    #[test]
    fn flushed_csi_prefix_becomes_alt_bracket() {
        let mut decoder = InputDecoder::new();
        decoder.feed(b"\x1b[1").unwrap();
        assert_eq!(decoder.flush_pending(), 2);
        let events: Vec<_> = decoder.events().collect();
        assert_eq!(events, vec![key("M-[", Modifiers::ALT), text("1")]);
    }

    #[test]
    fn sequence_split_across_chunks() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(b"\x1b[<0;1"), Ok(0));
        assert_eq!(decoder.feed(b"0;5"), Ok(0));
        assert_eq!(decoder.feed(b"M"), Ok(1));
        assert!(matches!(
            decoder.next_event(),
            Some(Event::Mouse(m)) if m.line == 5 && m.column == 10
        ));
    }

    #[test]
    fn overflow_reports_and_recovers() {
        let mut decoder = InputDecoder::new();
        let mut seq = vec![0x1B, b'['];
        seq.extend(std::iter::repeat_n(b'0', DEFAULT_MAX_SEQUENCE_LEN + 100));
        seq.push(b'A');
        seq.extend_from_slice(b"x");

        let err = decoder.feed(&seq).unwrap_err();
        assert_eq!(err.limit, DEFAULT_MAX_SEQUENCE_LEN);
        assert_eq!(err.discarded, DEFAULT_MAX_SEQUENCE_LEN + 1);
        // The tail up to the final byte is swallowed; the byte after it decodes.
        assert_eq!(decoder.events().collect::<Vec<_>>(), vec![text("x")]);

        assert_eq!(decoder.parse(b"\x1b[A"), vec![key("Up", Modifiers::NONE)]);
    }

    #[test]
    fn late_overflow_tail_is_still_swallowed() {
        let mut decoder = InputDecoder::new();
        let mut head = vec![0x1B, b'['];
        head.extend(std::iter::repeat_n(b'1', DEFAULT_MAX_SEQUENCE_LEN + 10));
        assert!(decoder.feed(&head).is_err());

        assert!(!decoder.is_pending());
        assert_eq!(decoder.pending_timeout(), None);
        assert_eq!(decoder.flush_pending(), 0);

        assert_eq!(decoder.parse(b"2;3Az"), vec![text("z")]);
        assert!(!decoder.is_pending());
    }

    #[test]
    fn escape_inside_csi_resynchronizes() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1b[1;\x1b[B");
        assert_eq!(events, vec![key("Down", Modifiers::NONE)]);
    }

    #[test]
    fn unknown_sequences_are_discarded() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(b"\x1b[99~\x1b[>1;2m\x1bOzq");
        assert_eq!(events, vec![text("q")]);
    }

    #[test]
    fn invalid_utf8_resynchronizes() {
        let mut decoder = InputDecoder::new();
        let events = decoder.parse(&[0xC3, b'a', 0xFF, b'b']);
        assert_eq!(events, vec![text("a"), text("b")]);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.feed(&[]), Ok(0));
        decoder.feed(b"\x1b").unwrap();
        assert_eq!(decoder.feed(&[]), Ok(0));
        assert!(decoder.is_pending());
    }

    #[test]
    fn resize_is_ordered_with_input() {
        let mut decoder = InputDecoder::new();
        decoder.feed(b"a").unwrap();
        decoder.push_resize(40, 120);
        decoder.feed(b"b").unwrap();
        let events: Vec<_> = decoder.events().collect();
        assert_eq!(
            events,
            vec![
                text("a"),
                Event::Resize(ResizeEvent {
                    lines: 40,
                    columns: 120
                }),
                text("b"),
            ]
        );
    }

    #[test]
    fn no_panic_on_invalid_input() {
        let mut decoder = InputDecoder::new();
        let garbage = [
            0xFF, 0xFE, 0x00, 0x1B, 0x1B, 0x1B, b'[', 0xFF, b']', 0x00, 0x1B, b'[', b'M',
        ];
        let _ = decoder.parse(&garbage);
        decoder.flush_pending();
        assert!(!decoder.is_pending());
    }

    #[test]
    fn custom_limits() {
        let config = DecoderConfig {
            max_sequence_len: 8,
            escape_timeout: Duration::from_millis(5),
        };
        let mut decoder = InputDecoder::with_config(config);
        assert!(decoder.feed(b"\x1b[1;2;3;4;5A").is_err());
        decoder.feed(b"\x1b").unwrap();
        assert_eq!(decoder.pending_timeout(), Some(Duration::from_millis(5)));
    }
}
