use crate::align::{round_up, GRANULARITY};
use crate::engine;
use crate::entry::{is_device, is_regular, is_symlink, Entry};
use crate::format::tags::*;
use crate::stream::ArchiveHandle;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

/// Writes one complete entry — magic, metadata tags, data tag and
/// (for a non-empty regular file) the payload — to the archive.
pub fn write_entry(archive: &mut ArchiveHandle, entry: &Entry) -> Result<()> {
    archive
        .file
        .write_all(&MAGIC)
        .with_context(|| format!("writing entry magic for {}", entry.name))?;

    write_tag(archive, TAG_HEADER, &encode_header(entry))?;
    write_tag(archive, TAG_NAME, entry.name.as_bytes())?;

    if is_symlink(entry.mode) {
        write_tag(archive, TAG_LINK_TARGET, entry.link.as_bytes())?;
    }
    if is_device(entry.mode) {
        write_tag(archive, TAG_DEVICE, &entry.dev.to_be_bytes())?;
    }

    write_data_tag(archive, entry.size)?;

    if entry.size > 0 && is_regular(entry.mode) {
        let src = File::open(&entry.local_name)
            .with_context(|| format!("opening {}", entry.local_name.display()))?;
        engine::write_payload(&src, archive, entry.size)
            .with_context(|| format!("writing payload for {}", entry.name))?;
    }

    Ok(())
}

/// Writes the archive trailer (`END` marker) and pads the archive file
/// up to the next 4 KiB boundary.
pub fn write_end_marker(archive: &mut ArchiveHandle) -> Result<()> {
    archive.file.write_all(&END).context("writing end marker")?;

    if archive.seekable {
        let end = archive
            .file
            .seek(SeekFrom::End(0))
            .context("seeking to archive end")?;
        let padded = round_up(end);
        archive
            .file
            .set_len(padded)
            .context("padding archive to a 4 KiB boundary")?;
    } else {
        let block = [0u8; GRANULARITY as usize];
        archive
            .file
            .write_all(&block)
            .context("padding non-seekable archive")?;
    }

    Ok(())
}

fn encode_header(entry: &Entry) -> [u8; HEADER_LEN] {
    let mut buf = [0u8; HEADER_LEN];
    buf[0..4].copy_from_slice(&entry.mode.to_be_bytes());
    buf[4..8].copy_from_slice(&entry.uid.to_be_bytes());
    buf[8..12].copy_from_slice(&entry.gid.to_be_bytes());
    buf[12..20].copy_from_slice(&entry.mtime.to_be_bytes());
    buf
}

fn write_tag(archive: &mut ArchiveHandle, tag_type: u16, value: &[u8]) -> Result<()> {
    let length: u16 = value
        .len()
        .try_into()
        .context("tag value exceeds 65535 bytes")?;
    archive
        .file
        .write_all(&tag_type.to_be_bytes())
        .context("writing tag type")?;
    archive
        .file
        .write_all(&length.to_be_bytes())
        .context("writing tag length")?;
    archive.file.write_all(value).context("writing tag value")?;
    Ok(())
}

/// A `DATA` tag closes every entry. Directories, symlinks, fifos and
/// devices (size always 0) get a zero-length tag. Regular files get a
/// `(size, padding)` pair so the payload that follows starts 4 KiB
/// aligned — when the archive is seekable; on non-seekable output
/// `padding` is always 0 and the engine never clones.
fn write_data_tag(archive: &mut ArchiveHandle, size: u64) -> Result<()> {
    if size == 0 {
        return write_tag(archive, TAG_DATA, &[]);
    }

    let mut padding: u32 = 0;
    if archive.seekable {
        let offset = archive.tell().context("reading archive offset")?;
        const OVERHEAD: u64 = 4 + DATA_LEN as u64; // tag header + (size, padding)
        let new_offset = round_up(offset + OVERHEAD);
        padding = (new_offset - (offset + OVERHEAD)) as u32;
    }

    let mut value = [0u8; DATA_LEN];
    value[0..8].copy_from_slice(&size.to_be_bytes());
    value[8..12].copy_from_slice(&padding.to_be_bytes());
    write_tag(archive, TAG_DATA, &value)?;

    if archive.seekable && padding > 0 {
        archive
            .file
            .seek(SeekFrom::Current(padding as i64))
            .context("seeking past data padding")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::S_IFREG;
    use std::io::Write as _;

    fn regular_entry(name: &str, local: &std::path::Path, size: u64, mode: u32) -> Entry {
        Entry {
            mode: S_IFREG | mode,
            uid: 0,
            gid: 0,
            mtime: 0,
            name: name.to_string(),
            size,
            link: String::new(),
            dev: 0,
            local_name: local.to_path_buf(),
        }
    }

    #[test]
    fn sixteen_byte_file_produces_an_8192_byte_archive() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("small");
        std::fs::File::create(&src_path)
            .unwrap()
            .write_all(b"xxxxxxxxxxxxxxxx")
            .unwrap();

        let archive_path = dir.path().join("out.car");
        let mut archive = ArchiveHandle::create(Some(&archive_path)).unwrap();
        let entry = regular_entry("small", &src_path, 16, 0o755);
        write_entry(&mut archive, &entry).unwrap();
        write_end_marker(&mut archive).unwrap();
        drop(archive);

        let bytes = std::fs::read(&archive_path).unwrap();
        assert_eq!(bytes.len(), 8192);
        assert_eq!(&bytes[4096..4112], b"xxxxxxxxxxxxxxxx");
        assert!(bytes[4112..8192].iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_length_entries_emit_an_empty_data_tag() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("out.car");
        let mut archive = ArchiveHandle::create(Some(&archive_path)).unwrap();
        let entry = Entry {
            mode: crate::entry::S_IFDIR | 0o755,
            name: "dir".to_string(),
            ..Default::default()
        };
        write_entry(&mut archive, &entry).unwrap();
        write_end_marker(&mut archive).unwrap();
        drop(archive);

        let bytes = std::fs::read(&archive_path).unwrap();
        // magic(4) + HEADER tag(4+20) + NAME tag(4+3) + DATA tag(4+0)
        assert_eq!(&bytes[0..4], &MAGIC);
        let data_tag_offset = 4 + (4 + HEADER_LEN) + (4 + 3);
        assert_eq!(
            u16::from_be_bytes(bytes[data_tag_offset..data_tag_offset + 2].try_into().unwrap()),
            TAG_DATA
        );
        assert_eq!(
            u16::from_be_bytes(
                bytes[data_tag_offset + 2..data_tag_offset + 4]
                    .try_into()
                    .unwrap()
            ),
            0
        );
    }
}
