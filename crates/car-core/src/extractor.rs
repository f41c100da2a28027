//! Materialises decoded entries back onto the filesystem, including the
//! deferred-permission handling that lets a read-only directory still
//! be populated before being locked down.

use crate::engine;
use crate::entry::{self, Entry};
use crate::errors::ExitFlag;
use crate::stream::ArchiveHandle;
use eyre::{Context, Result};
use std::os::unix::fs::{chown, lchown, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Accumulates directories whose final mode must be applied after their
/// contents have been written, and applies them in reverse insertion
/// order once the whole archive has been processed.
#[derive(Default)]
pub struct Extractor {
    deferred: Vec<(PathBuf, u32)>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialises a single decoded entry under `dest_root`.
    pub fn extract_entry(
        &mut self,
        archive: &mut ArchiveHandle,
        entry: &Entry,
        dest_root: &Path,
        privileged: bool,
        exit_flag: &ExitFlag,
    ) -> Result<()> {
        let path = dest_root.join(&entry.name);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }

        if !entry::is_dir(entry.mode) {
            let _ = std::fs::remove_file(&path);
        }

        match entry::object_kind(entry.mode) {
            m if m == entry::S_IFREG => self.extract_regular(archive, entry, &path)?,
            m if m == entry::S_IFDIR => self.extract_dir(entry, &path)?,
            m if m == entry::S_IFLNK => extract_symlink(entry, &path)?,
            m if m == entry::S_IFBLK || m == entry::S_IFCHR => extract_device(entry, &path)?,
            m if m == entry::S_IFIFO => extract_fifo(entry, &path)?,
            _ => {
                log::warn!("skipping unsupported object kind for {}", entry.name);
                exit_flag.raise();
                return Ok(());
            }
        }

        apply_ownership_and_special_bits(entry, &path, privileged, exit_flag);
        Ok(())
    }

    fn extract_regular(
        &mut self,
        archive: &mut ArchiveHandle,
        entry: &Entry,
        path: &Path,
    ) -> Result<()> {
        let dst = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(entry.mode & 0o777)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;

        if entry.size > 0 {
            engine::read_payload(archive, &dst, entry.size)
                .with_context(|| format!("writing payload for {}", path.display()))?;
        }
        Ok(())
    }

    fn extract_dir(&mut self, entry: &Entry, path: &Path) -> Result<()> {
        let final_mode = entry.mode & 0o7777;
        let owner_rwx = final_mode & 0o700 == 0o700;

        let create_mode = if owner_rwx { final_mode } else { 0o300 };
        match std::fs::create_dir(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e).with_context(|| format!("creating {}", path.display())),
        }
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(create_mode))
            .with_context(|| format!("setting initial mode on {}", path.display()))?;

        if !owner_rwx {
            self.deferred.push((path.to_path_buf(), final_mode));
        }
        Ok(())
    }

    /// Applies every deferred directory mode, children-first.
    pub fn finish(self) -> Result<()> {
        for (path, mode) in self.deferred.into_iter().rev() {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("restoring final mode on {}", path.display()))?;
        }
        Ok(())
    }
}

fn extract_symlink(entry: &Entry, path: &Path) -> Result<()> {
    std::os::unix::fs::symlink(&entry.link, path)
        .with_context(|| format!("creating symlink {}", path.display()))
}

fn extract_device(entry: &Entry, path: &Path) -> Result<()> {
    mknod(path, entry.mode, entry.dev as libc::dev_t)
        .with_context(|| format!("creating device node {}", path.display()))
}

fn extract_fifo(entry: &Entry, path: &Path) -> Result<()> {
    mkfifo(path, entry.mode & 0o777).with_context(|| format!("creating fifo {}", path.display()))
}

fn mknod(path: &Path, mode: u32, dev: libc::dev_t) -> std::io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    let c_path = CString::new(path.as_os_str().as_bytes())?;
    // SAFETY: c_path is NUL-terminated and valid for the duration of the call.
    let rc = unsafe { libc::mknod(c_path.as_ptr(), mode, dev) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

fn mkfifo(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    let c_path = CString::new(path.as_os_str().as_bytes())?;
    // SAFETY: c_path is NUL-terminated and valid for the duration of the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

fn apply_ownership_and_special_bits(
    entry: &Entry,
    path: &Path,
    privileged: bool,
    exit_flag: &ExitFlag,
) {
    if privileged {
        let result = if entry::is_symlink(entry.mode) {
            lchown(path, Some(entry.uid), Some(entry.gid))
        } else {
            chown(path, Some(entry.uid), Some(entry.gid))
        };
        if let Err(e) = result {
            log::warn!("failed to set ownership on {}: {e}", path.display());
            exit_flag.raise();
        }
    }

    let special = entry::S_ISUID | entry::S_ISGID | entry::S_ISVTX;
    if entry.mode & special != 0 && !entry::is_symlink(entry.mode) {
        let mode = std::fs::Permissions::from_mode(entry.mode & 0o7777);
        if let Err(e) = std::fs::set_permissions(path, mode) {
            log::warn!("failed to reapply mode on {}: {e}", path.display());
            exit_flag.raise();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::encoder::{write_end_marker, write_entry};
    use std::io::Write as _;

    fn make_src_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents)
            .unwrap();
        path
    }

    #[test]
    fn locked_directory_is_populated_then_locked_down() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("src");
        std::fs::create_dir(&src_dir).unwrap();
        let inner = make_src_file(&src_dir, "inside", b"hi");

        let archive_path = dir.path().join("out.car");
        let mut archive = ArchiveHandle::create(Some(&archive_path)).unwrap();
        write_entry(
            &mut archive,
            &Entry {
                mode: entry::S_IFDIR | 0o400,
                name: "locked".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        write_entry(
            &mut archive,
            &Entry {
                mode: entry::S_IFREG | 0o644,
                name: "locked/inside".to_string(),
                size: 2,
                local_name: inner,
                ..Default::default()
            },
        )
        .unwrap();
        write_end_marker(&mut archive).unwrap();
        drop(archive);

        let dst_dir = dir.path().join("dst");
        std::fs::create_dir(&dst_dir).unwrap();

        let mut archive = ArchiveHandle::open(Some(&archive_path)).unwrap();
        let mut extractor = Extractor::new();
        let exit_flag = ExitFlag::new();
        while let Some(entry) = crate::format::decoder::read_entry(&mut archive).unwrap() {
            extractor
                .extract_entry(&mut archive, &entry, &dst_dir, false, &exit_flag)
                .unwrap();
        }
        extractor.finish().unwrap();

        let meta = std::fs::metadata(dst_dir.join("locked")).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o400);
        assert_eq!(
            std::fs::read(dst_dir.join("locked/inside")).unwrap(),
            b"hi"
        );
    }
}
