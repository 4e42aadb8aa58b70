//! Git index file format
//!
//! ## File Format (Versions 2 and 3)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 or 3 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 62 bytes of stat data, object id and flags
//!   - 2 bytes of extended flags (version 3, when the extended bit is set)
//!   - NUL-terminated path, padded with NULs to 8-byte alignment
//!
//! Extensions (optional):
//!   - 4-byte signature, 4-byte length, payload
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index versions this crate reads and writes
pub const SUPPORTED_VERSIONS: [u32; 2] = [2, 3];

/// Version written for freshly created indexes
pub const DEFAULT_VERSION: u32 = 2;

/// Size of an extension header (signature and payload length)
pub const EXTENSION_HEADER_SIZE: usize = 8;

/// Cache extensions git regenerates; they go stale once entries change
pub const VOLATILE_EXTENSIONS: [&[u8; 4]; 2] = [b"TREE", b"UNTR"];
