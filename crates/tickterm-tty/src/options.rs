#![forbid(unsafe_code)]

//! Session configuration.
//!
//! Defaults suit an interactive terminal. Every field can be overridden from
//! the environment:
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `TICKTERM_ESC_TIMEOUT_MS` | `escape_timeout` | milliseconds |
//! | `TICKTERM_MAX_SEQUENCE` | `max_sequence_len` | bytes, at least 8 |
//! | `TICKTERM_NO_RAW` | `raw_mode` (inverted) | `1/0/true/false/yes/no/on/off` |
//! | `TICKTERM_NO_PROBE` | `probe_on_start` (inverted) | boolean |
//! | `TICKTERM_NO_RESIZE` | `watch_resize` (inverted) | boolean |
//!
//! Unparseable values are ignored and the default is kept.

use std::time::Duration;

use tickterm_core::input_decoder::{
    DEFAULT_ESCAPE_TIMEOUT, DEFAULT_MAX_SEQUENCE_LEN, DecoderConfig,
};

const ENV_ESC_TIMEOUT_MS: &str = "TICKTERM_ESC_TIMEOUT_MS";
const ENV_MAX_SEQUENCE: &str = "TICKTERM_MAX_SEQUENCE";
const ENV_NO_RAW: &str = "TICKTERM_NO_RAW";
const ENV_NO_PROBE: &str = "TICKTERM_NO_PROBE";
const ENV_NO_RESIZE: &str = "TICKTERM_NO_RESIZE";

/// Smallest accepted sequence limit; SGR mouse reports need more than this.
const MIN_SEQUENCE_LEN: usize = 8;

/// Default size of a single read from the input channel.
pub const DEFAULT_READ_CHUNK: usize = 4096;

/// Configuration for a [`TerminalSession`](crate::TerminalSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// How long a lone `ESC` (or other ambiguous prefix) waits for more
    /// bytes before it is reported on its own.
    pub escape_timeout: Duration,
    /// Longest incomplete sequence the decoder buffers.
    pub max_sequence_len: usize,
    /// Switch a terminal input channel to raw mode.
    pub raw_mode: bool,
    /// Report window size changes (`SIGWINCH`) as resize events.
    pub watch_resize: bool,
    /// Send a device-attributes probe in `await_started`.
    pub probe_on_start: bool,
    /// Bytes requested per read.
    pub read_chunk: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            escape_timeout: DEFAULT_ESCAPE_TIMEOUT,
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
            raw_mode: true,
            watch_resize: true,
            probe_on_start: true,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

impl SessionOptions {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through a custom environment lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(ms) = get_env(ENV_ESC_TIMEOUT_MS).and_then(|v| v.trim().parse::<u64>().ok())
        {
            options.escape_timeout = Duration::from_millis(ms);
        }
        if let Some(len) = get_env(ENV_MAX_SEQUENCE).and_then(|v| v.trim().parse::<usize>().ok())
        {
            options.max_sequence_len = len.max(MIN_SEQUENCE_LEN);
        }
        if let Some(off) = env_override_bool(&get_env, ENV_NO_RAW) {
            options.raw_mode = !off;
        }
        if let Some(off) = env_override_bool(&get_env, ENV_NO_PROBE) {
            options.probe_on_start = !off;
        }
        if let Some(off) = env_override_bool(&get_env, ENV_NO_RESIZE) {
            options.watch_resize = !off;
        }
        options
    }

    /// Decoder limits derived from these options.
    #[must_use]
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            max_sequence_len: self.max_sequence_len,
            escape_timeout: self.escape_timeout,
        }
    }

    /// Options for channels that are not terminals: no raw mode, no probe,
    /// no resize watching.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            raw_mode: false,
            watch_resize: false,
            probe_on_start: false,
            ..Self::default()
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_override_bool<F>(get_env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    get_env(key).and_then(|value| parse_bool(&value))
}
