//! Error plumbing: fatal errors abort the current operation, non-fatal
//! errors are logged and recorded on a shared exit flag so the process
//! can still return a non-zero status once the run otherwise completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Malformed archive content. Always fatal.
#[derive(Debug)]
pub enum FormatError {
    BadMagic,
    BadEndMarker,
    /// A `DATA` tag's length was neither 0 nor 12.
    BadDataTagLength(u16),
    UnexpectedEof,
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::BadMagic => write!(f, "not a car archive (bad magic)"),
            FormatError::BadEndMarker => write!(f, "malformed end marker"),
            FormatError::BadDataTagLength(len) => {
                write!(f, "invalid DATA tag length {len} (expected 0 or 12)")
            }
            FormatError::UnexpectedEof => write!(f, "unexpected end of archive"),
        }
    }
}

impl std::error::Error for FormatError {}

/// A process-wide, cheaply cloneable flag raised whenever a non-fatal
/// error is swallowed (skipped socket, failed chown, unreadable symlink).
/// Owned by the run, not a global — threaded through by clone.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag(Arc<AtomicBool>);

impl ExitFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_flag_starts_clear() {
        let flag = ExitFlag::new();
        assert!(!flag.is_raised());
    }

    #[test]
    fn exit_flag_shares_state_across_clones() {
        let flag = ExitFlag::new();
        let clone = flag.clone();
        clone.raise();
        assert!(flag.is_raised());
    }

    #[test]
    fn format_error_messages_are_human_readable() {
        assert_eq!(
            FormatError::BadDataTagLength(7).to_string(),
            "invalid DATA tag length 7 (expected 0 or 12)"
        );
    }
}
