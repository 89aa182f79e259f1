#![forbid(unsafe_code)]

//! Terminal mode settings.
//!
//! [`ControlSettings`] is the registry of toggles the engine can change on
//! the terminal and the value each currently holds. Every change writes its
//! control sequence; teardown writes the sequences that return modified
//! modes to their defaults.
//!
//! # Escape Sequences
//!
//! | Setting | On | Off / default |
//! |---------|----|---------------|
//! | Alt screen | `CSI ? 1049 h` | `CSI ? 1049 l` |
//! | Cursor visible | `CSI ? 25 h` | `CSI ? 25 l` |
//! | Cursor shape | `CSI n SP q` | `CSI 0 SP q` |
//! | Mouse | `CSI ? 1000/1002/1003 ; 1006 h` | `CSI ? 1003;1002;1000;1006 l` |
//! | Keypad | `ESC =` | `ESC >` |
//! | Title | `OSC 2 ; text BEL` | title stack pop |
//!
//! # Restore Order
//!
//! Mouse off, keypad numeric, cursor shape default, cursor shown, alternate
//! screen left, title popped. Only modes that differ from their defaults are
//! written.

use std::io::{self, Write};

use crate::ansi;

/// Identifier of a terminal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermCtl {
    /// Alternate screen buffer.
    AltScreen,
    /// Cursor visibility.
    CursorVisible,
    /// Cursor shape.
    CursorShape,
    /// Mouse reporting mode.
    Mouse,
    /// Keypad application mode.
    KeypadApp,
    /// Window title.
    Title,
}

/// Mouse reporting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseMode {
    /// No mouse reports.
    #[default]
    Off,
    /// Button presses and releases.
    Click,
    /// Presses, releases, and motion while a button is held.
    Drag,
    /// Every pointer movement.
    Move,
}

/// Cursor shape (DECSCUSR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorShape {
    /// The terminal's configured shape.
    #[default]
    Default,
    /// Steady block.
    Block,
    /// Steady underline.
    Underline,
    /// Steady vertical bar.
    Bar,
}

impl CursorShape {
    const fn code(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::Block => 2,
            Self::Underline => 4,
            Self::Bar => 6,
        }
    }
}

/// A mode together with a value for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Setting {
    /// Use the alternate screen buffer.
    AltScreen(bool),
    /// Show the cursor.
    CursorVisible(bool),
    /// Cursor shape.
    CursorShape(CursorShape),
    /// Mouse reporting level.
    Mouse(MouseMode),
    /// Keypad application mode.
    KeypadApp(bool),
    /// Window title.
    Title(String),
}

impl Setting {
    /// The mode this setting applies to.
    #[must_use]
    pub const fn ctl(&self) -> TermCtl {
        match self {
            Self::AltScreen(_) => TermCtl::AltScreen,
            Self::CursorVisible(_) => TermCtl::CursorVisible,
            Self::CursorShape(_) => TermCtl::CursorShape,
            Self::Mouse(_) => TermCtl::Mouse,
            Self::KeypadApp(_) => TermCtl::KeypadApp,
            Self::Title(_) => TermCtl::Title,
        }
    }

    /// Write the control sequence that puts the terminal in this state.
    pub fn write_sequence<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Self::AltScreen(true) => w.write_all(ansi::ALT_SCREEN_ENTER),
            Self::AltScreen(false) => w.write_all(ansi::ALT_SCREEN_LEAVE),
            Self::CursorVisible(true) => w.write_all(ansi::CURSOR_SHOW),
            Self::CursorVisible(false) => w.write_all(ansi::CURSOR_HIDE),
            Self::CursorShape(shape) => ansi::cursor_style(w, shape.code()),
            Self::Mouse(MouseMode::Off) => w.write_all(ansi::MOUSE_DISABLE),
            Self::Mouse(MouseMode::Click) => w.write_all(ansi::MOUSE_CLICK_ENABLE),
            Self::Mouse(MouseMode::Drag) => w.write_all(ansi::MOUSE_DRAG_ENABLE),
            Self::Mouse(MouseMode::Move) => w.write_all(ansi::MOUSE_MOVE_ENABLE),
            Self::KeypadApp(true) => w.write_all(ansi::KEYPAD_APPLICATION),
            Self::KeypadApp(false) => w.write_all(ansi::KEYPAD_NUMERIC),
            Self::Title(title) => ansi::set_title(w, title),
        }
    }
}

/// Current value of every terminal mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    alt_screen: bool,
    cursor_visible: bool,
    cursor_shape: CursorShape,
    mouse: MouseMode,
    keypad_app: bool,
    /// `Some` once a title was set; the original title sits on the
    /// terminal's title stack.
    title: Option<String>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            alt_screen: false,
            cursor_visible: true,
            cursor_shape: CursorShape::Default,
            mouse: MouseMode::Off,
            keypad_app: false,
            title: None,
        }
    }
}

impl ControlSettings {
    /// Settings of a terminal nobody has touched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `ctl`.
    #[must_use]
    pub fn get(&self, ctl: TermCtl) -> Setting {
        match ctl {
            TermCtl::AltScreen => Setting::AltScreen(self.alt_screen),
            TermCtl::CursorVisible => Setting::CursorVisible(self.cursor_visible),
            TermCtl::CursorShape => Setting::CursorShape(self.cursor_shape),
            TermCtl::Mouse => Setting::Mouse(self.mouse),
            TermCtl::KeypadApp => Setting::KeypadApp(self.keypad_app),
            TermCtl::Title => Setting::Title(self.title.clone().unwrap_or_default()),
        }
    }

    /// Record `setting` and write its control sequence.
    ///
    /// The sequence is written even when the value is unchanged, so the
    /// terminal can be forced back in sync. Returns whether the value
    /// changed.
    pub fn apply<W: Write>(&mut self, setting: &Setting, w: &mut W) -> io::Result<bool> {
        let changed = self.get(setting.ctl()) != *setting;
        match setting {
            Setting::AltScreen(on) => self.alt_screen = *on,
            Setting::CursorVisible(on) => self.cursor_visible = *on,
            Setting::CursorShape(shape) => self.cursor_shape = *shape,
            Setting::Mouse(mode) => {
                if self.mouse != MouseMode::Off && *mode != MouseMode::Off && self.mouse != *mode
                {
                    w.write_all(ansi::MOUSE_DISABLE)?;
                }
                self.mouse = *mode;
            }
            Setting::KeypadApp(on) => self.keypad_app = *on,
            Setting::Title(title) => {
                if self.title.is_none() {
                    w.write_all(ansi::TITLE_PUSH)?;
                }
                self.title = Some(title.clone());
            }
        }
        setting.write_sequence(w)?;
        Ok(changed)
    }

    /// Whether every mode holds its default value.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Write the sequences returning modified modes to their defaults, and
    /// reset the recorded values.
    ///
    /// Returns the settings that were restored, in the order written.
    pub fn restore<W: Write>(&mut self, w: &mut W) -> io::Result<Vec<Setting>> {
        let mut restored = Vec::new();
        let defaults = [
            (self.mouse != MouseMode::Off, Setting::Mouse(MouseMode::Off)),
            (self.keypad_app, Setting::KeypadApp(false)),
            (
                self.cursor_shape != CursorShape::Default,
                Setting::CursorShape(CursorShape::Default),
            ),
            (!self.cursor_visible, Setting::CursorVisible(true)),
            (self.alt_screen, Setting::AltScreen(false)),
        ];
        for (modified, setting) in defaults {
            if modified {
                setting.write_sequence(w)?;
                restored.push(setting);
            }
        }
        if self.title.take().is_some() {
            w.write_all(ansi::TITLE_POP)?;
        }
        *self = Self::default();
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(settings: &mut ControlSettings, setting: Setting) -> (bool, Vec<u8>) {
        let mut out = Vec::new();
        let changed = settings.apply(&setting, &mut out).unwrap();
        (changed, out)
    }

    #[test]
    fn defaults() {
        let settings = ControlSettings::new();
        assert_eq!(
            settings.get(TermCtl::CursorVisible),
            Setting::CursorVisible(true)
        );
        assert_eq!(settings.get(TermCtl::Mouse), Setting::Mouse(MouseMode::Off));
        assert!(settings.is_default());
    }

    #[test]
    fn apply_reports_change_and_always_writes() {
        let mut settings = ControlSettings::new();
        let (changed, out) = apply(&mut settings, Setting::AltScreen(true));
        assert!(changed);
        assert_eq!(out, ansi::ALT_SCREEN_ENTER);

        let (changed, out) = apply(&mut settings, Setting::AltScreen(true));
        assert!(!changed);
        assert_eq!(out, ansi::ALT_SCREEN_ENTER);
        assert_eq!(settings.get(TermCtl::AltScreen), Setting::AltScreen(true));
    }

    #[test]
    fn switching_mouse_modes_disables_previous() {
        let mut settings = ControlSettings::new();
        let (_, out) = apply(&mut settings, Setting::Mouse(MouseMode::Drag));
        assert_eq!(out, ansi::MOUSE_DRAG_ENABLE);

        let (_, out) = apply(&mut settings, Setting::Mouse(MouseMode::Click));
        let mut expected = ansi::MOUSE_DISABLE.to_vec();
        expected.extend_from_slice(ansi::MOUSE_CLICK_ENABLE);
        assert_eq!(out, expected);
    }

    #[test]
    fn keypad_sequences() {
        let mut settings = ControlSettings::new();
        assert_eq!(apply(&mut settings, Setting::KeypadApp(true)).1, b"\x1b=");
        assert_eq!(apply(&mut settings, Setting::KeypadApp(false)).1, b"\x1b>");
    }

    #[test]
    fn title_pushes_once() {
        let mut settings = ControlSettings::new();
        let (changed, out) = apply(&mut settings, Setting::Title("one".into()));
        assert!(changed);
        assert_eq!(out, b"\x1b[22;2t\x1b]2;one\x07");
        let (_, out) = apply(&mut settings, Setting::Title("two".into()));
        assert_eq!(out, b"\x1b]2;two\x07");
        assert_eq!(
            settings.get(TermCtl::Title),
            Setting::Title("two".to_owned())
        );
    }

    #[test]
    fn restore_covers_only_modified_modes() {
        let mut settings = ControlSettings::new();
        apply(&mut settings, Setting::AltScreen(true));
        apply(&mut settings, Setting::Mouse(MouseMode::Drag));
        apply(&mut settings, Setting::CursorVisible(true));

        let mut out = Vec::new();
        let restored = settings.restore(&mut out).unwrap();
        assert_eq!(
            restored,
            vec![Setting::Mouse(MouseMode::Off), Setting::AltScreen(false)]
        );
        let mut expected = ansi::MOUSE_DISABLE.to_vec();
        expected.extend_from_slice(ansi::ALT_SCREEN_LEAVE);
        assert_eq!(out, expected);
        assert!(settings.is_default());
    }

    #[test]
    fn restore_order_matches_teardown() {
        let mut settings = ControlSettings::new();
        for setting in [
            Setting::AltScreen(true),
            Setting::CursorVisible(false),
            Setting::CursorShape(CursorShape::Bar),
            Setting::Mouse(MouseMode::Move),
            Setting::KeypadApp(true),
            Setting::Title("demo".into()),
        ] {
            apply(&mut settings, setting);
        }
        let mut out = Vec::new();
        settings.restore(&mut out).unwrap();
        let expected = [
            ansi::MOUSE_DISABLE,
            ansi::KEYPAD_NUMERIC,
            b"\x1b[0 q".as_slice(),
            ansi::CURSOR_SHOW,
            ansi::ALT_SCREEN_LEAVE,
            ansi::TITLE_POP,
        ]
        .concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn restore_of_untouched_settings_writes_nothing() {
        let mut settings = ControlSettings::new();
        let mut out = Vec::new();
        assert!(settings.restore(&mut out).unwrap().is_empty());
        assert!(out.is_empty());
    }
}
