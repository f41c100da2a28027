use crate::entry::Entry;
use crate::errors::FormatError;
use crate::format::tags::*;
use crate::stream::ArchiveHandle;
use eyre::{Context, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// Reads one entry from the archive. Returns `Ok(None)` once the `END`
/// marker has been consumed.
pub fn read_entry(archive: &mut ArchiveHandle) -> Result<Option<Entry>> {
    let mut marker = [0u8; 4];
    if read_exact_or_clean_eof(&mut archive.file, &mut marker)?.is_none() {
        return Err(FormatError::UnexpectedEof.into());
    }
    if marker == END {
        return Ok(None);
    }
    if marker != MAGIC {
        return Err(FormatError::BadMagic.into());
    }

    let mut entry = Entry::default();
    loop {
        let tag_type = read_u16(&mut archive.file).context("reading tag type")?;
        let length = read_u16(&mut archive.file).context("reading tag length")?;

        match tag_type {
            TAG_HEADER => {
                let mut buf = [0u8; HEADER_LEN];
                archive
                    .file
                    .read_exact(&mut buf)
                    .context("reading HEADER tag")?;
                entry.mode = u32::from_be_bytes(buf[0..4].try_into().unwrap());
                entry.uid = u32::from_be_bytes(buf[4..8].try_into().unwrap());
                entry.gid = u32::from_be_bytes(buf[8..12].try_into().unwrap());
                entry.mtime = i64::from_be_bytes(buf[12..20].try_into().unwrap());
            }
            TAG_NAME => {
                let mut buf = vec![0u8; length as usize];
                archive
                    .file
                    .read_exact(&mut buf)
                    .context("reading NAME tag")?;
                entry.name = String::from_utf8_lossy(&buf).into_owned();
            }
            TAG_LINK_TARGET => {
                let mut buf = vec![0u8; length as usize];
                archive
                    .file
                    .read_exact(&mut buf)
                    .context("reading LINK_TARGET tag")?;
                entry.link = String::from_utf8_lossy(&buf).into_owned();
            }
            TAG_DEVICE => {
                let mut buf = [0u8; 4];
                archive
                    .file
                    .read_exact(&mut buf)
                    .context("reading DEVICE tag")?;
                entry.dev = u32::from_be_bytes(buf);
            }
            TAG_DATA => {
                let padding = match length {
                    0 => 0,
                    DATA_LEN_U16 => {
                        let mut buf = [0u8; DATA_LEN];
                        archive
                            .file
                            .read_exact(&mut buf)
                            .context("reading DATA tag")?;
                        entry.size = u64::from_be_bytes(buf[0..8].try_into().unwrap());
                        u32::from_be_bytes(buf[8..12].try_into().unwrap())
                    }
                    other => return Err(FormatError::BadDataTagLength(other).into()),
                };
                if padding > 0 {
                    archive
                        .file
                        .seek(SeekFrom::Current(padding as i64))
                        .context("skipping data padding")?;
                }
                return Ok(Some(entry));
            }
            unknown => {
                let mut buf = vec![0u8; length as usize];
                archive
                    .file
                    .read_exact(&mut buf)
                    .context("skipping unrecognised tag")?;
                log::debug!("skipping unknown tag type {unknown} ({length} bytes)");
            }
        }
    }
}

// `match` needs a named constant, not a cast expression, for the pattern.
const DATA_LEN_U16: u16 = DATA_LEN as u16;

/// Advances past a regular file's payload without materialising it
/// (used by the listing printer).
pub fn skip_payload(archive: &mut ArchiveHandle, size: u64) -> Result<()> {
    if archive.seekable {
        archive
            .file
            .seek(SeekFrom::Current(size as i64))
            .context("skipping payload")?;
        return Ok(());
    }
    let mut limited = (&mut archive.file).take(size);
    io::copy(&mut limited, &mut io::sink()).context("discarding payload")?;
    Ok(())
}

fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Like `read_exact`, but distinguishes "stream ended exactly at a
/// record boundary" (`Ok(None)`) from a truncated read (`Err`).
fn read_exact_or_clean_eof(r: &mut impl Read, buf: &mut [u8]) -> io::Result<Option<()>> {
    let mut read = 0;
    while read < buf.len() {
        match r.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive truncated mid-record",
                ))
            }
            Ok(n) => read += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(Some(()))
}
