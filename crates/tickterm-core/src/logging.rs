#![forbid(unsafe_code)]

//! Logging support.
//!
//! Re-exports the `tracing` event macros when the `tracing` feature is
//! enabled. Without the feature the same macro names expand to `()`, so
//! call sites never need their own `cfg` guards and a macro can stand
//! wherever the `tracing` one could, including a match arm.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {
            ()
        };
    }

    /// No-op error macro when tracing is disabled.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {
            ()
        };
    }

    /// No-op info macro when tracing is disabled.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {
            ()
        };
    }

    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {
            ()
        };
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {
            ()
        };
    }
}

#[cfg(test)]
mod tests {
    fn is_high(code: Option<u8>) -> bool {
        let mut high = false;
        match code {
            Some(code) if code > 0x7F => {
                crate::debug!(code, "high byte");
                high = true;
            }
            Some(code) => crate::trace!(code, "low byte"),
            None => crate::warn!("no byte"),
        }
        high
    }

    #[test]
    fn macros_stand_in_match_arms() {
        assert!(is_high(Some(0xFF)));
        assert!(!is_high(Some(1)));
        assert!(!is_high(None));
    }
}
