//! Git index (staging area)
//!
//! The index tracks which content is staged for the next commit, one entry
//! per (path, stage). Stage 0 is the normal entry; stages 1-3 hold the sides
//! of an unresolved merge conflict.
//!
//! ## Persistence
//!
//! - Reads take a shared lock on `.git/index` and verify the trailing checksum
//! - Writes go to `.git/index.lock` under an exclusive lock and are renamed over
//!   `.git/index`, so readers see either the old or the new file
//! - Extensions are carried over byte-for-byte; the `TREE` and `UNTR` caches
//!   are dropped once entries change since they would describe stale state

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    ENTRY_FIXED_SIZE, EXTENDED_FLAGS_SIZE, EntryFlags, IndexEntry, MAX_PATH_SIZE,
    padding_for,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{
    CHECKSUM_SIZE, EXTENSION_HEADER_SIZE, HEADER_SIZE, VOLATILE_EXTENSIONS,
};
use crate::artifacts::objects::object::{Packable, Unpackable};
use anyhow::{Context, anyhow};
use byteorder::ByteOrder;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_SUFFIX: &str = "lock";

/// Optional trailing section of the index, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub signature: [u8; 4],
    pub data: Bytes,
}

impl Extension {
    fn is_volatile(&self) -> bool {
        VOLATILE_EXTENSIONS.contains(&&self.signature)
    }
}

type EntryKey = (String, u8);

/// Git index (staging area)
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    /// Keyed by (name, stage) so iteration follows git's on-disk order
    entries: BTreeMap<EntryKey, IndexEntry>,
    extensions: Vec<Extension>,
    header: IndexHeader,
    /// Whether entries changed since the last load or save
    changed: bool,
}

fn key_name(path: &Path) -> anyhow::Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid index path {path:?}"))
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            extensions: Vec::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    /// A fresh index read from `path`; a missing file is an empty index
    pub fn load(path: Box<Path>) -> anyhow::Result<Self> {
        let mut index = Index::new(path);
        index.rehydrate()?;
        Ok(index)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension(LOCK_SUFFIX)
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.extensions.clear();
        self.header = IndexHeader::empty();
        self.changed = false;
    }

    /// Replace the in-memory state with the file on disk
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open index {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        let file_size = lock.deref_mut().metadata()?.len();
        if file_size == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        self.header = IndexHeader::parse(&reader.read(HEADER_SIZE)?)
            .with_context(|| format!("Corrupt index {}", self.path.display()))?;

        for _ in 0..self.header.entries_count {
            let entry = self.parse_entry(&mut reader)?;
            self.entries
                .insert((key_name(&entry.name)?, entry.stage), entry);
        }

        while file_size - reader.position() > CHECKSUM_SIZE as u64 {
            let extension_header = reader.read(EXTENSION_HEADER_SIZE)?;
            let mut signature = [0u8; 4];
            signature.copy_from_slice(&extension_header[0..4]);
            let size = byteorder::NetworkEndian::read_u32(&extension_header[4..8]) as usize;

            let data = reader.read(size)?;
            self.extensions.push(Extension { signature, data });
        }

        reader.verify()?;

        debug!(
            path = %self.path.display(),
            version = self.header.version,
            entries = self.entries.len(),
            extensions = self.extensions.len(),
            "index loaded"
        );

        Ok(())
    }

    /// Read one entry, sizing it from its name length so extended flags are never
    /// mistaken for padding
    fn parse_entry(&self, reader: &mut Checksum) -> anyhow::Result<IndexEntry> {
        let mut entry_bytes = reader.read(ENTRY_FIXED_SIZE)?.to_vec();
        let raw_flags = byteorder::NetworkEndian::read_u16(&entry_bytes[60..62]);

        if raw_flags & EntryFlags::EXTENDED.bits() != 0 {
            if self.header.version < 3 {
                return Err(anyhow!(
                    "Extended entry flags in a version {} index",
                    self.header.version
                ));
            }
            entry_bytes.extend_from_slice(&reader.read(EXTENDED_FLAGS_SIZE)?);
        }

        let name_length = (raw_flags as usize) & MAX_PATH_SIZE;
        if name_length < MAX_PATH_SIZE {
            entry_bytes.extend_from_slice(&reader.read(name_length)?);
            let padding = padding_for(entry_bytes.len());
            entry_bytes.extend_from_slice(&reader.read(padding)?);
        } else {
            // the length field saturated; the name runs to the first NUL
            loop {
                let byte = reader.read(1)?[0];
                entry_bytes.push(byte);
                if byte == 0 {
                    break;
                }
            }
            let padding = padding_for(entry_bytes.len() - 1) - 1;
            entry_bytes.extend_from_slice(&reader.read(padding)?);
        }

        IndexEntry::deserialize(std::io::Cursor::new(entry_bytes))
    }

    /// Write the index through `index.lock` and rename it into place
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let lock_path = self.lock_path();
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .with_context(|| {
                format!(
                    "Unable to create {}: another process may hold the index",
                    lock_path.display()
                )
            })?;

        let result = self.write_locked(&mut lock_file).and_then(|_| {
            std::fs::rename(&lock_path, &self.path)
                .with_context(|| format!("Unable to move {} into place", lock_path.display()))
        });

        if let Err(error) = result {
            let _ = std::fs::remove_file(&lock_path);
            return Err(error);
        }

        debug!(path = %self.path.display(), entries = self.entries.len(), "index saved");
        self.changed = false;
        Ok(())
    }

    fn write_locked(&mut self, lock_file: &mut std::fs::File) -> anyhow::Result<()> {
        // git switches to version 3 as soon as extended flags are needed
        let needs_extended = self
            .entries
            .values()
            .any(|entry| !entry.extended_flags.is_empty());
        let version = if needs_extended {
            self.header.version.max(3)
        } else {
            self.header.version
        };

        if self.changed {
            self.extensions.retain(|extension| !extension.is_volatile());
        }

        let lock = file_guard::lock(lock_file, file_guard::Lock::Exclusive, 0, 1)?;
        let mut writer = Checksum::new(lock);

        self.header = IndexHeader {
            version,
            entries_count: self.entries.len() as u32,
            ..self.header.clone()
        };
        writer.write(&self.header.serialize()?)?;

        for entry in self.entries.values() {
            writer.write(&entry.serialize_for(version)?)?;
        }

        for extension in &self.extensions {
            writer.write(&extension.signature)?;
            writer.write(&(extension.data.len() as u32).to_be_bytes())?;
            writer.write(&extension.data)?;
        }

        writer.write_checksum()
    }

    /// The stage 0 entry for `path`
    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        let name = path.to_str()?;
        self.entries.get(&(name.to_string(), 0))
    }

    /// Whether `path` has unresolved conflict stages
    pub fn is_conflicted(&self, path: &Path) -> bool {
        self.stages(path).any(|entry| entry.is_conflicted())
    }

    fn stages(&self, path: &Path) -> impl Iterator<Item = &IndexEntry> {
        let name = path.to_str().unwrap_or_default().to_string();
        self.entries
            .range((name.clone(), 0)..=(name, 3))
            .map(|(_, entry)| entry)
    }

    fn entries_under(&self, path: &Path) -> impl Iterator<Item = &IndexEntry> {
        let prefix = format!("{}/", path.to_str().unwrap_or_default());
        self.entries
            .range((prefix.clone(), 0)..)
            .take_while(move |((name, _), _)| name.starts_with(&prefix))
            .map(|(_, entry)| entry)
    }

    fn remove_key_range(&mut self, keys: Vec<EntryKey>) {
        for key in keys {
            self.entries.remove(&key);
        }
    }

    /// Drop entries that would clash with `entry`: a normal entry replaces every
    /// conflict stage and a conflict stage replaces the normal entry; files where
    /// `entry` needs a directory and files below `entry` go as well
    fn discard_conflicts(&mut self, entry: &IndexEntry) -> anyhow::Result<()> {
        let name = key_name(&entry.name)?;
        let mut doomed = if entry.stage == 0 {
            (0..=3).map(|stage| (name.clone(), stage)).collect::<Vec<_>>()
        } else {
            vec![(name.clone(), 0), (name.clone(), entry.stage)]
        };

        for child in self.entries_under(&entry.name) {
            doomed.push((key_name(&child.name)?, child.stage));
        }

        for parent in entry.parent_dirs()? {
            let parent = key_name(parent)?;
            doomed.extend((0..=3).map(|stage| (parent.clone(), stage)));
        }

        self.remove_key_range(doomed);
        Ok(())
    }

    pub fn add(&mut self, entry: IndexEntry) -> anyhow::Result<()> {
        self.discard_conflicts(&entry)?;
        self.entries
            .insert((key_name(&entry.name)?, entry.stage), entry);

        self.header.entries_count = self.entries.len() as u32;
        self.changed = true;

        Ok(())
    }

    /// Remove every stage of `path` and anything tracked below it
    pub fn remove(&mut self, path: &Path) -> anyhow::Result<()> {
        let doomed = self
            .stages(path)
            .chain(self.entries_under(path))
            .map(|entry| Ok((key_name(&entry.name)?, entry.stage)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        self.remove_key_range(doomed);

        self.header.entries_count = self.entries.len() as u32;
        self.changed = true;

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
