//! Index entry representation
//!
//! Each entry in the index represents a tracked file with:
//! - File path, and merge stage (non-zero while a conflict is unresolved)
//! - Content hash (object ID)
//! - File metadata (mode, size, timestamps)
//!
//! Metadata enables fast change detection without reading file content.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::io::{BufRead, Write};
use std::os::unix::prelude::MetadataExt;
use std::path::{Path, PathBuf};

/// Name lengths at or above this are stored as the sentinel value
pub const MAX_PATH_SIZE: usize = 0x0fff;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Stat data, object id and flags preceding the name
pub const ENTRY_FIXED_SIZE: usize = 62;

/// Size of the version 3 extended flags field
pub const EXTENDED_FLAGS_SIZE: usize = 2;

bitflags! {
    /// High bits of the 16-bit entry flags field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct EntryFlags: u16 {
        const ASSUME_VALID = 0x8000;
        const EXTENDED = 0x4000;
    }
}

bitflags! {
    /// Version 3 extended flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ExtendedFlags: u16 {
        const SKIP_WORKTREE = 0x4000;
        const INTENT_TO_ADD = 0x2000;
    }
}

const STAGE_MASK: u16 = 0x3000;
const STAGE_SHIFT: u16 = 12;

/// Index entry representing a tracked file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: PathBuf,
    /// SHA-1 hash of file content
    pub oid: ObjectId,
    /// File metadata (mode, size, timestamps)
    pub metadata: EntryMetadata,
    /// Merge stage: 0 for normal entries, 1-3 for conflict sides
    #[new(default)]
    pub stage: u8,
    #[new(default)]
    pub flags: EntryFlags,
    #[new(default)]
    pub extended_flags: ExtendedFlags,
}

impl IndexEntry {
    pub fn basename(&self) -> anyhow::Result<&str> {
        self.name
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name"))
    }

    /// Ancestor directories, outermost first, excluding the empty root
    pub fn parent_dirs(&self) -> anyhow::Result<Vec<&Path>> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        Ok(dirs)
    }

    pub fn path_str(&self) -> anyhow::Result<&str> {
        self.name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name {:?}", self.name))
    }

    pub fn is_conflicted(&self) -> bool {
        self.stage != 0
    }

    pub fn stat_match(&self, other: &EntryMetadata) -> bool {
        (self.metadata.size == 0 || self.metadata.size == other.size)
            && self.metadata.mode == other.mode
    }

    pub fn times_match(&self, other: &EntryMetadata) -> bool {
        self.metadata.ctime == other.ctime
            && self.metadata.ctime_nsec == other.ctime_nsec
            && self.metadata.mtime == other.mtime
            && self.metadata.mtime_nsec == other.mtime_nsec
    }

    /// Serialized size including padding, for a given index version
    pub fn on_disk_size(&self, version: u32) -> anyhow::Result<usize> {
        let fixed = ENTRY_FIXED_SIZE + self.extended_size(version);
        let unpadded = fixed + self.path_str()?.len();
        Ok(unpadded + padding_for(unpadded))
    }

    fn extended_size(&self, version: u32) -> usize {
        if version >= 3 && !self.extended_flags.is_empty() {
            EXTENDED_FLAGS_SIZE
        } else {
            0
        }
    }

    fn raw_flags(&self, version: u32) -> anyhow::Result<u16> {
        let name_len = self.path_str()?.len().min(MAX_PATH_SIZE) as u16;
        let mut flags = self.flags - EntryFlags::EXTENDED;
        if self.extended_size(version) > 0 {
            flags |= EntryFlags::EXTENDED;
        }

        Ok(flags.bits() | (u16::from(self.stage) << STAGE_SHIFT) & STAGE_MASK | name_len)
    }
}

/// NUL padding after a name: at least one byte, up to the next 8-byte boundary
pub fn padding_for(unpadded: usize) -> usize {
    ENTRY_BLOCK - unpadded % ENTRY_BLOCK
}

/// File metadata stored in index entries
///
/// Timestamps are truncated to 32 bits on disk, as git does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
}

impl EntryMetadata {
    /// Metadata for content that has no file on disk: everything but mode and size is
    /// zeroed, so status checks fall through to comparing content hashes
    pub fn detached(mode: EntryMode, size: u64) -> Self {
        EntryMetadata {
            mode,
            size,
            ..Default::default()
        }
    }
}

impl IndexEntry {
    pub fn serialize_for(&self, version: u32) -> anyhow::Result<Bytes> {
        let entry_name = self.path_str()?;

        let mut entry_bytes = Vec::with_capacity(self.on_disk_size(version)?);
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.dev as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.ino as u32)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.mode.as_u32())?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.uid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.gid)?;
        entry_bytes.write_u32::<byteorder::NetworkEndian>(self.metadata.size as u32)?;
        self.oid.write_h40_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(self.raw_flags(version)?)?;
        if self.extended_size(version) > 0 {
            entry_bytes.write_u16::<byteorder::NetworkEndian>(self.extended_flags.bits())?;
        }
        entry_bytes.write_all(entry_name.as_bytes())?;

        let padding = padding_for(entry_bytes.len());
        entry_bytes.resize(entry_bytes.len() + padding, 0);

        Ok(Bytes::from(entry_bytes))
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        self.serialize_for(3)
    }
}

impl Unpackable for IndexEntry {
    /// Parse one complete entry, padding included
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.len() < ENTRY_FIXED_SIZE + 1 {
            return Err(anyhow::anyhow!("Invalid index entry size"));
        }

        let ctime = byteorder::NetworkEndian::read_u32(&bytes[0..4]) as i64;
        let ctime_nsec = byteorder::NetworkEndian::read_u32(&bytes[4..8]) as i64;
        let mtime = byteorder::NetworkEndian::read_u32(&bytes[8..12]) as i64;
        let mtime_nsec = byteorder::NetworkEndian::read_u32(&bytes[12..16]) as i64;
        let dev = byteorder::NetworkEndian::read_u32(&bytes[16..20]) as u64;
        let ino = byteorder::NetworkEndian::read_u32(&bytes[20..24]) as u64;
        let mode = EntryMode::try_from(byteorder::NetworkEndian::read_u32(&bytes[24..28]))?;
        let uid = byteorder::NetworkEndian::read_u32(&bytes[28..32]);
        let gid = byteorder::NetworkEndian::read_u32(&bytes[32..36]);
        let size = byteorder::NetworkEndian::read_u32(&bytes[36..40]) as u64;
        let oid = ObjectId::read_h40_from(&mut &bytes[40..60])?;
        let raw_flags = byteorder::NetworkEndian::read_u16(&bytes[60..62]);

        let flags = EntryFlags::from_bits_truncate(raw_flags);
        let stage = ((raw_flags & STAGE_MASK) >> STAGE_SHIFT) as u8;

        let (extended_flags, name_start) = if flags.contains(EntryFlags::EXTENDED) {
            let raw = byteorder::NetworkEndian::read_u16(&bytes[62..64]);
            (
                ExtendedFlags::from_bits_retain(raw),
                ENTRY_FIXED_SIZE + EXTENDED_FLAGS_SIZE,
            )
        } else {
            (ExtendedFlags::empty(), ENTRY_FIXED_SIZE)
        };

        let name_end = bytes[name_start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow::anyhow!("Missing null terminator in entry name"))?;
        let name_bytes = &bytes[name_start..name_start + name_end];
        let name = PathBuf::from(
            std::str::from_utf8(name_bytes)
                .map_err(|_| anyhow::anyhow!("Invalid UTF-8 in entry name"))?,
        );

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
            },
            stage,
            flags: flags - EntryFlags::EXTENDED,
            extended_flags,
        })
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    /// Build metadata from an absolute workspace path and its `lstat` result
    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        let mode = if metadata.is_dir() {
            EntryMode::Directory
        } else if metadata.file_type().is_symlink() {
            EntryMode::Symlink
        } else if file_path.is_executable() {
            EntryMode::File(FileMode::Executable)
        } else {
            EntryMode::File(FileMode::Regular)
        };

        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
        })
    }
}
