//! The archive's own file handle: either a real file, opened by path,
//! or stdio wrapped as a `File` so the same clone/copy machinery works
//! whether the archive is a path argument or a pipe.

use eyre::{Context, Result};
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::Path;

pub struct ArchiveHandle {
    pub file: File,
    pub seekable: bool,
}

impl ArchiveHandle {
    /// Opens (creating/truncating) the archive for writing. `None` means
    /// "write to stdout".
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::create(p).with_context(|| format!("creating {}", p.display()))?,
            None => stdio_as_file(StdioStream::Stdout),
        };
        let seekable = probe_seekable(&file);
        Ok(Self { file, seekable })
    }

    /// Opens the archive for reading. `None` means "read from stdin".
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::open(p).with_context(|| format!("opening {}", p.display()))?,
            None => stdio_as_file(StdioStream::Stdin),
        };
        let seekable = probe_seekable(&file);
        Ok(Self { file, seekable })
    }

    /// Current byte offset. Only meaningful when `seekable`; callers
    /// must check that first.
    pub fn tell(&mut self) -> io::Result<u64> {
        self.file.seek(SeekFrom::Current(0))
    }
}

enum StdioStream {
    Stdin,
    Stdout,
}

#[cfg(unix)]
fn stdio_as_file(which: StdioStream) -> File {
    use std::os::unix::io::FromRawFd;
    let fd = match which {
        StdioStream::Stdin => 0,
        StdioStream::Stdout => 1,
    };
    // SAFETY: fd 0/1 are valid for the lifetime of the process; we take
    // ownership of a dup'd descriptor so dropping this File doesn't
    // interfere with the real stdio streams used for logging.
    unsafe {
        let dup = libc::dup(fd);
        File::from_raw_fd(dup)
    }
}

fn probe_seekable(file: &File) -> bool {
    let mut probe = match file.try_clone() {
        Ok(f) => f,
        Err(_) => return false,
    };
    probe.seek(SeekFrom::Current(0)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_file_is_seekable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.car");
        let handle = ArchiveHandle::create(Some(&path)).unwrap();
        assert!(handle.seekable);
    }
}
