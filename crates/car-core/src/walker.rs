//! Translates live filesystem metadata into the [`Entry`] the encoder
//! writes. Built atop `walkdir`, matching the rest of the ambient
//! stack's traversal idiom.

use crate::entry::{self, Entry};
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks `roots` in order, yielding one [`Entry`] per supported
/// filesystem object. Sockets and other irregular kinds are logged at
/// `warn` and skipped rather than propagated.
pub fn walk(roots: &[PathBuf]) -> Vec<Entry> {
    let mut out = Vec::new();
    for root in roots {
        walk_one(root, &mut out);
    }
    out
}

fn walk_one(root: &Path, out: &mut Vec<Entry>) {
    let strip_prefix = root.parent().unwrap_or_else(|| Path::new(""));

    for dirent in WalkDir::new(root).follow_links(false).into_iter() {
        let dirent = match dirent {
            Ok(d) => d,
            Err(e) => {
                log::warn!("skipping unreadable path during walk: {e}");
                continue;
            }
        };

        let path = dirent.path();
        let metadata = match dirent.metadata() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                continue;
            }
        };

        match build_entry(path, strip_prefix, &metadata) {
            Some(entry) => out.push(entry),
            None => continue,
        }
    }
}

fn build_entry(path: &Path, strip_prefix: &Path, metadata: &Metadata) -> Option<Entry> {
    let mode = entry::mode_from_raw(metadata.mode());

    if entry::is_socket(mode) {
        log::warn!("skipping socket {}", path.display());
        return None;
    }
    if !(entry::is_regular(mode)
        || entry::is_dir(mode)
        || entry::is_symlink(mode)
        || entry::is_fifo(mode)
        || entry::is_device(mode))
    {
        log::warn!("skipping unsupported object kind at {}", path.display());
        return None;
    }

    let link = if entry::is_symlink(mode) {
        match std::fs::read_link(path) {
            Ok(target) => target.to_string_lossy().into_owned(),
            Err(e) => {
                log::warn!("skipping unreadable symlink {}: {e}", path.display());
                return None;
            }
        }
    } else {
        String::new()
    };

    Some(Entry {
        mode,
        uid: metadata.uid(),
        gid: metadata.gid(),
        mtime: metadata.mtime() * 1_000_000_000 + metadata.mtime_nsec(),
        name: archive_name(path, strip_prefix),
        size: if entry::is_regular(mode) {
            metadata.len()
        } else {
            0
        },
        link,
        dev: if entry::is_device(mode) {
            metadata.rdev() as u32
        } else {
            0
        },
        local_name: path.to_path_buf(),
    })
}

fn archive_name(path: &Path, strip_prefix: &Path) -> String {
    let relative = path.strip_prefix(strip_prefix).unwrap_or(path);
    let name = relative.to_string_lossy().into_owned();
    name.trim_start_matches('/').to_string()
}
