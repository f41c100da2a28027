//! Wire constants for the archive format. See the module-level docs on
//! [`crate::format`] for the full grammar.

pub const MAGIC: [u8; 4] = *b"CAR!";
pub const END: [u8; 4] = *b"!RAC";

pub const TAG_HEADER: u16 = 1;
pub const TAG_NAME: u16 = 2;
pub const TAG_DATA: u16 = 3;
pub const TAG_LINK_TARGET: u16 = 4;
pub const TAG_DEVICE: u16 = 5;

/// Byte length of a `HEADER` tag's value: mode(4) + uid(4) + gid(4) + mtime(8).
pub const HEADER_LEN: usize = 20;
/// Byte length of a non-empty `DATA` tag's value: size(8) + padding(4).
pub const DATA_LEN: usize = 12;
