//! Thin wrapper around the Linux block-clone ioctl (`FICLONERANGE`).
//!
//! The ioctl shares physical extents between two open files instead of
//! copying bytes. It is the only primitive in this crate that is
//! genuinely platform-specific: everywhere outside Linux, [`clone_range`]
//! reports [`CloneOutcome::Unsupported`] unconditionally and callers fall
//! back to a byte copy. No functionality is lost on those targets, only
//! the zero-copy performance win.

use std::fs::File;
use std::io;

/// Result of attempting a block clone.
#[derive(Debug)]
pub enum CloneOutcome {
    /// The clone succeeded; the requested range is now shared.
    Cloned,
    /// The underlying filesystem or kernel cannot service this clone
    /// (no ioctl, cross-device, wrong filesystem, compressed/encrypted
    /// extents, etc). Callers must fall back to a byte copy; this is
    /// not reported as an error.
    Unsupported,
}

/// Issues a single block-clone from `(src_fd, src_off, len)` in `src` to
/// `(dst_fd, dst_off)` in `dst`.
///
/// `len`, `src_off` and `dst_off` must all be multiples of
/// [`crate::align::GRANULARITY`]; this is the caller's responsibility,
/// not re-validated here. Neither file's seek offset is advanced by the
/// ioctl — callers must re-seek both descriptors explicitly afterward.
///
/// Returns `Ok(CloneOutcome::Unsupported)` for any recoverable failure
/// class; returns `Err` only for I/O errors that indicate something
/// genuinely wrong rather than "this filesystem can't clone".
#[cfg(target_os = "linux")]
pub fn clone_range(
    src: &File,
    src_off: u64,
    len: u64,
    dst: &File,
    dst_off: u64,
) -> io::Result<CloneOutcome> {
    use std::os::unix::io::AsRawFd;

    #[repr(C)]
    struct FileCloneRange {
        src_fd: i64,
        src_offset: u64,
        src_length: u64,
        dest_offset: u64,
    }

    // _IOW(0x94, 13, struct file_clone_range) — Linux's FICLONERANGE.
    const FICLONERANGE: libc::c_ulong = 0x4020_940d;

    let mut range = FileCloneRange {
        src_fd: src.as_raw_fd() as i64,
        src_offset: src_off,
        src_length: len,
        dest_offset: dst_off,
    };

    // SAFETY: `range` is a valid, correctly sized argument for
    // FICLONERANGE and outlives the call; `dst`'s fd is valid for the
    // duration of the ioctl.
    let rc = unsafe { libc::ioctl(dst.as_raw_fd(), FICLONERANGE, &mut range) };
    if rc == 0 {
        return Ok(CloneOutcome::Cloned);
    }

    let err = io::Error::last_os_error();
    if is_recoverable(&err) {
        return Ok(CloneOutcome::Unsupported);
    }
    Err(err)
}

#[cfg(target_os = "linux")]
fn is_recoverable(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EXDEV)
            | Some(libc::EOPNOTSUPP)
            | Some(libc::ENOTTY)
            | Some(libc::EINVAL)
            | Some(libc::ETXTBSY)
            | Some(libc::EPERM)
    )
}

#[cfg(not(target_os = "linux"))]
pub fn clone_range(
    _src: &File,
    _src_off: u64,
    _len: u64,
    _dst: &File,
    _dst_off: u64,
) -> io::Result<CloneOutcome> {
    Ok(CloneOutcome::Unsupported)
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom, Write};

    #[test]
    fn clone_or_graceful_fallback_on_tmpfs() {
        // tmpfs (where test tempdirs usually live) doesn't support
        // FICLONERANGE; this must come back Unsupported, never Err.
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("src");
        let dst_path = dir.path().join("dst");

        let mut src = File::create(&src_path).unwrap();
        src.write_all(&vec![b'x'; 4096]).unwrap();
        src.seek(SeekFrom::Start(0)).unwrap();

        let dst = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(&dst_path)
            .unwrap();

        let outcome = clone_range(&src, 0, 4096, &dst, 0).unwrap();
        assert!(matches!(
            outcome,
            CloneOutcome::Cloned | CloneOutcome::Unsupported
        ));
    }
}
