//! Core of the `car` archival tool: an on-disk tag-length-value format
//! paired with a copy-on-write clone-or-copy engine, so that both
//! archive creation and extraction avoid copying file data whenever the
//! underlying filesystem supports block cloning.

pub mod align;
pub mod clone;
pub mod config;
pub mod engine;
pub mod entry;
pub mod errors;
pub mod extractor;
pub mod format;
pub mod list;
pub mod stream;
pub mod walker;

use crate::config::RunConfig;
use crate::errors::ExitFlag;
use crate::extractor::Extractor;
use crate::format::{decoder, encoder};
use crate::stream::ArchiveHandle;
use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// Walks `roots` and writes an archive of every supported object found.
pub fn create(config: &RunConfig, roots: &[PathBuf]) -> Result<ExitFlag> {
    let exit_flag = ExitFlag::new();
    let mut archive = ArchiveHandle::create(config.archive_path.as_deref())
        .context("opening archive for writing")?;

    for entry in walker::walk(roots) {
        if config.verbose {
            println!("{}", entry.name);
        }
        encoder::write_entry(&mut archive, &entry)
            .with_context(|| format!("writing entry {}", entry.name))?;
    }
    encoder::write_end_marker(&mut archive).context("writing archive trailer")?;

    Ok(exit_flag)
}

/// Decodes the archive and materialises every entry under `dest_root`.
pub fn extract(config: &RunConfig, dest_root: &Path) -> Result<ExitFlag> {
    let exit_flag = ExitFlag::new();
    let mut archive = ArchiveHandle::open(config.archive_path.as_deref())
        .context("opening archive for reading")?;

    let mut extractor = Extractor::new();
    while let Some(entry) = decoder::read_entry(&mut archive).context("decoding entry")? {
        if config.verbose {
            println!("{}", entry.name);
        }
        extractor
            .extract_entry(&mut archive, &entry, dest_root, config.privileged, &exit_flag)
            .with_context(|| format!("extracting {}", entry.name))?;
    }
    extractor.finish().context("restoring deferred directory modes")?;

    Ok(exit_flag)
}

/// Decodes the archive and prints one listing line per entry, never
/// materialising payloads.
pub fn list(config: &RunConfig) -> Result<ExitFlag> {
    let exit_flag = ExitFlag::new();
    let mut archive = ArchiveHandle::open(config.archive_path.as_deref())
        .context("opening archive for reading")?;

    while let Some(entry) = decoder::read_entry(&mut archive).context("decoding entry")? {
        if config.verbose {
            println!("{}", list::format_verbose(&entry));
        } else {
            println!("{}", list::format_name(&entry));
        }
        if entry.size > 0 {
            decoder::skip_payload(&mut archive, entry.size)
                .with_context(|| format!("skipping payload for {}", entry.name))?;
        }
    }

    Ok(exit_flag)
}
