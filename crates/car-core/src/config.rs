//! Immutable run configuration threaded through the walker, encoder,
//! decoder and extractor. There is no global mutable state for a run:
//! everything the core needs to know about how it was invoked lives here.

use std::path::PathBuf;

/// The three exclusive top-level operations `car` can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Extract,
    List,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    /// Echo each visited/extracted path (create), or print `ls -l`-style
    /// detail per entry (list).
    pub verbose: bool,
    /// `None` means stdio: stdout for create, stdin for extract/list.
    pub archive_path: Option<PathBuf>,
    /// Effective uid is 0 — enables `lchown` during extraction.
    pub privileged: bool,
}

impl RunConfig {
    pub fn new(mode: Mode, verbose: bool, archive_path: Option<PathBuf>) -> Self {
        Self {
            mode,
            verbose,
            archive_path,
            privileged: current_process_is_privileged(),
        }
    }
}

#[cfg(unix)]
fn current_process_is_privileged() -> bool {
    // SAFETY: geteuid takes no arguments and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn current_process_is_privileged() -> bool {
    false
}
