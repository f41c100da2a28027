//! The clone-or-copy engine: moves a regular file's payload between an
//! open source/destination descriptor and the archive, cloning whatever
//! is 4 KiB-aligned and byte-copying the unaligned remainder.

use crate::align::{round_up, split, GRANULARITY};
use crate::clone::{clone_range, CloneOutcome};
use crate::stream::ArchiveHandle;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Writes `size` bytes from `src` (positioned at its start) into the
/// archive, cloning the 4 KiB-aligned prefix when the archive is
/// seekable and the filesystem supports it, and byte-copying the rest.
pub fn write_payload(src: &File, archive: &mut ArchiveHandle, size: u64) -> Result<()> {
    if !archive.seekable {
        return stream_copy(src, &mut archive.file, size).context("streaming payload to archive");
    }

    let (aligned, tail) = split(size);
    if aligned > 0 {
        let dst_off = archive.tell().context("reading archive offset")?;
        let outcome =
            clone_range(src, 0, aligned, &archive.file, dst_off).context("cloning payload")?;
        match outcome {
            CloneOutcome::Cloned => {
                seek(src, aligned)?;
                archive.file.seek(SeekFrom::End(0)).context("seeking archive to end")?;
            }
            CloneOutcome::Unsupported => {
                seek(src, 0)?;
                return stream_copy(src, &mut archive.file, size)
                    .context("streaming payload to archive after clone fallback");
            }
        }
    }

    if tail > 0 {
        stream_copy(src, &mut archive.file, tail).context("streaming payload tail to archive")?;
    }

    Ok(())
}

/// Reads `size` bytes of payload out of the archive (positioned at the
/// start of the payload) into `dst`, cloning the rounded-up region when
/// possible and truncating away any over-read tail.
pub fn read_payload(archive: &mut ArchiveHandle, dst: &File, size: u64) -> Result<()> {
    if !archive.seekable {
        return stream_copy(&archive.file, dst, size).context("streaming payload from archive");
    }

    let start = archive.tell().context("reading archive offset")?;
    let rounded = round_up(size);

    if rounded > 0 {
        let outcome =
            clone_range(&archive.file, start, rounded, dst, 0).context("cloning payload")?;
        match outcome {
            CloneOutcome::Cloned => {
                if size % GRANULARITY != 0 {
                    dst.set_len(size).context("truncating cloned payload tail")?;
                }
            }
            CloneOutcome::Unsupported => {
                archive
                    .file
                    .seek(SeekFrom::Start(start))
                    .context("seeking archive back to payload start")?;
                stream_copy(&archive.file, dst, size)
                    .context("streaming payload from archive after clone fallback")?;
            }
        }
    }

    archive
        .file
        .seek(SeekFrom::Start(start + size))
        .context("seeking archive past payload")?;
    Ok(())
}

fn seek(file: &File, offset: u64) -> Result<()> {
    let mut f = file;
    f.seek(SeekFrom::Start(offset)).context("seeking file")?;
    Ok(())
}

fn stream_copy(src: &File, dst: &File, size: u64) -> io::Result<()> {
    let mut src_ref = src;
    let mut dst_ref = dst;
    let mut limited = (&mut src_ref).take(size);
    let copied = io::copy(&mut limited, &mut dst_ref)?;
    if copied != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected to copy {size} bytes, copied {copied}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn make_file(dir: &std::path::Path, name: &str, contents: &[u8]) -> File {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        File::open(&path).unwrap()
    }

    #[test]
    fn write_then_read_round_trips_unaligned_payload() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![b'p'; 4300];
        let src = make_file(dir.path(), "src", &content);

        let archive_path = dir.path().join("archive.car");
        let mut archive = ArchiveHandle::create(Some(&archive_path)).unwrap();
        write_payload(&src, &mut archive, 4300).unwrap();
        drop(archive);

        let mut archive = ArchiveHandle::open(Some(&archive_path)).unwrap();
        let dst_path = dir.path().join("dst");
        let dst = File::create(&dst_path).unwrap();
        read_payload(&mut archive, &dst, 4300).unwrap();
        drop(dst);

        let roundtripped = std::fs::read(&dst_path).unwrap();
        assert_eq!(roundtripped, content);
    }

    #[test]
    fn write_then_read_round_trips_exact_block() {
        let dir = tempfile::tempdir().unwrap();
        let content = vec![b'x'; 16];
        let src = make_file(dir.path(), "src", &content);

        let archive_path = dir.path().join("archive.car");
        let mut archive = ArchiveHandle::create(Some(&archive_path)).unwrap();
        let before = archive.tell().unwrap();
        write_payload(&src, &mut archive, 16).unwrap();
        let after = archive.tell().unwrap();
        assert_eq!(after - before, 16, "sub-block payload is byte-copied, not padded here");
        drop(archive);

        let mut archive = ArchiveHandle::open(Some(&archive_path)).unwrap();
        let dst_path = dir.path().join("dst");
        let dst = File::create(&dst_path).unwrap();
        read_payload(&mut archive, &dst, 16).unwrap();

        let roundtripped = std::fs::read(&dst_path).unwrap();
        assert_eq!(roundtripped, content);
    }

    #[test]
    fn zero_size_payload_never_clones() {
        let dir = tempfile::tempdir().unwrap();
        let src = make_file(dir.path(), "src", b"");
        let archive_path = dir.path().join("archive.car");
        let mut archive = ArchiveHandle::create(Some(&archive_path)).unwrap();
        write_payload(&src, &mut archive, 0).unwrap();
        assert_eq!(std::fs::metadata(&archive_path).unwrap().len(), 0);
    }
}
