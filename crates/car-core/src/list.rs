//! Renders one line per archive entry; never required for extraction
//! correctness, only for `-t`/`--list` output.

use crate::entry::{self, Entry};

/// Formats one non-verbose listing line: just the name.
pub fn format_name(entry: &Entry) -> String {
    entry.name.clone()
}

/// Formats one `ls -l`-style verbose listing line.
pub fn format_verbose(entry: &Entry) -> String {
    let perm = permission_string(entry.mode);
    let size_or_dev = if entry::is_device(entry.mode) {
        let major = (entry.dev >> 8) & 0xff;
        let minor = entry.dev & 0xff;
        format!("{major},{minor}")
    } else {
        entry.size.to_string()
    };
    let mtime = format_mtime(entry.mtime);
    let mut line = format!(
        "{perm} {uid:>5} {gid:>5} {size_or_dev:>8} {mtime} {name}",
        uid = entry.uid,
        gid = entry.gid,
        name = entry.name,
    );
    if entry::is_symlink(entry.mode) {
        line.push_str(" -> ");
        line.push_str(&entry.link);
    }
    line
}

fn permission_string(mode: u32) -> String {
    let mut bytes = [b'-'; 10];
    bytes[0] = entry::type_letter(mode) as u8;

    let bits: [(u32, u8); 9] = [
        (0o400, b'r'),
        (0o200, b'w'),
        (0o100, b'x'),
        (0o040, b'r'),
        (0o020, b'w'),
        (0o010, b'x'),
        (0o004, b'r'),
        (0o002, b'w'),
        (0o001, b'x'),
    ];
    for (i, (mask, ch)) in bits.into_iter().enumerate() {
        if mode & mask != 0 {
            bytes[1 + i] = ch;
        }
    }

    apply_special_bit(&mut bytes, 3, mode, entry::S_ISUID, b'x', b's', b'S');
    apply_special_bit(&mut bytes, 6, mode, entry::S_ISGID, b'x', b's', b'S');
    apply_special_bit(&mut bytes, 9, mode, entry::S_ISVTX, b'x', b't', b'T');
    String::from_utf8(bytes.to_vec()).expect("permission string is always ASCII")
}

/// Overlays a setuid/setgid/sticky bit onto the execute-bit position at
/// byte index `pos` in the permission string: lowercase when execute is
/// also set, uppercase otherwise.
fn apply_special_bit(
    bytes: &mut [u8; 10],
    pos: usize,
    mode: u32,
    special_mask: u32,
    exec_char: u8,
    lower: u8,
    upper: u8,
) {
    if mode & special_mask == 0 {
        return;
    }
    bytes[pos] = if bytes[pos] == exec_char { lower } else { upper };
}

fn format_mtime(mtime_ns: i64) -> String {
    let secs = mtime_ns.div_euclid(1_000_000_000);
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "????-??-?? ??:??".to_string(),
    }
}
