//! Error types shared by the decoder and the session layer.

use std::io;

/// Errors surfaced by terminal session operations.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    /// An input or output channel could not be acquired or configured.
    #[error("terminal channel unavailable: {source}")]
    Construction {
        /// Underlying OS error.
        source: io::Error,
    },

    /// An incomplete input sequence outgrew the decoder buffer.
    #[error(transparent)]
    DecodeOverflow(#[from] DecodeOverflow),

    /// Writing buffered output to the terminal failed.
    ///
    /// Bytes the channel did not accept remain buffered.
    #[error("terminal write failed: {source}")]
    Write {
        /// Underlying OS error.
        source: io::Error,
    },

    /// Polling or reading the input channel failed.
    #[error("terminal read failed: {source}")]
    Read {
        /// Underlying OS error.
        source: io::Error,
    },

    /// The operation needs a channel that was never configured.
    #[error("no {0} channel configured")]
    MissingChannel(&'static str),
}

/// An incomplete sequence exceeded the decoder's buffer limit.
///
/// The decoder has already recovered when this is returned: the oversized
/// prefix was dropped and decoding continued with the following bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("input sequence exceeded {limit} bytes ({discarded} bytes discarded)")]
pub struct DecodeOverflow {
    /// Configured maximum sequence length.
    pub limit: usize,
    /// Number of buffered bytes dropped during the feed that overflowed.
    pub discarded: usize,
}

/// Convenience alias for results carrying a [`TermError`].
pub type Result<T> = std::result::Result<T, TermError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_converts_into_term_error() {
        let err: TermError = DecodeOverflow {
            limit: 256,
            discarded: 256,
        }
        .into();
        assert!(matches!(err, TermError::DecodeOverflow(o) if o.limit == 256));
        assert_eq!(
            err.to_string(),
            "input sequence exceeded 256 bytes (256 bytes discarded)"
        );
    }

    #[test]
    fn missing_channel_names_the_side() {
        assert_eq!(
            TermError::MissingChannel("input").to_string(),
            "no input channel configured"
        );
    }
}
