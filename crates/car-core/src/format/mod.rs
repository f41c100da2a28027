//! The on-disk archive format: a stream of self-delimiting,
//! tag-length-value entries.
//!
//! ```text
//! archive     := entry* END
//! entry       := MAGIC tag* DATA_TAG payload?
//! MAGIC       := "CAR!"
//! END         := "!RAC"
//! tag         := type:u16 length:u16 value:bytes[length]
//! type        := 1 HEADER | 2 NAME | 3 DATA | 4 LINK_TARGET | 5 DEVICE
//! HEADER.value:= mode:u32 uid:u32 gid:u32 mtime:i64
//! DATA_TAG    := type=3 length∈{0,12} (size:u64 padding:u32)?
//! payload     := <padding zero bytes><size bytes of file content>
//! ```
//!
//! Every entry re-emits the magic (rather than the stream carrying one
//! leading magic for the whole archive) so the decoder can distinguish
//! "one more entry" from "end of stream" by reading a single 4-byte
//! marker at each entry boundary.

pub mod decoder;
pub mod encoder;
pub mod tags;
