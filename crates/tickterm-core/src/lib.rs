#![forbid(unsafe_code)]

//! Core: input decoding, event dispatch, control settings, and buffered output.
//!
//! Nothing in this crate performs I/O. Bytes go into an [`InputDecoder`],
//! events come out and are routed by an [`EventDispatcher`] to handlers that
//! render through a [`Term`]. A session crate owns the file descriptors and
//! drives the loop.

pub mod ansi;
pub mod control;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod input_decoder;
pub mod keys;
pub mod logging;
pub mod output;
pub mod term;

#[cfg(any(test, feature = "test-helpers"))]
pub mod screen_model;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};

pub use control::{ControlSettings, CursorShape, MouseMode, Setting, TermCtl};
pub use dispatcher::{BindingId, EventDispatcher, EventHandler, Flow};
pub use error::{DecodeOverflow, Result, TermError};
pub use event::{
    Event, EventMask, KeyEvent, KeyEventKind, Modifiers, MouseEvent, MouseEventKind, ResizeEvent,
    WHEEL_DOWN, WHEEL_UP, WheelDirection,
};
pub use input_decoder::{DecoderConfig, InputDecoder, TerminalReply};
pub use output::{Direction, Extent, OutputWriter};
pub use term::Term;
