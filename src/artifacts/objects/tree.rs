//! Git tree object
//!
//! Trees represent directory snapshots. They contain entries for files
//! (blobs) and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Trees are read from the database (`readable_entries`) or built from the
//! index (`writeable_entries`) when committing.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone)]
enum TreeEntry {
    File(IndexEntry),
    Directory(Tree),
}

impl TreeEntry {
    fn mode(&self) -> EntryMode {
        match self {
            TreeEntry::File(entry) => entry.metadata.mode,
            TreeEntry::Directory(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            TreeEntry::File(entry) => Ok(entry.oid.clone()),
            TreeEntry::Directory(tree) => tree.object_id(),
        }
    }
}

/// Git tree object representing a directory snapshot
#[derive(Debug, Clone, Default)]
pub struct Tree {
    readable_entries: BTreeMap<String, DatabaseEntry>,
    // directories are keyed with a trailing '/' so they sort the way git sorts them
    writeable_entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build the root tree from the flat list of index entries
    pub fn build<'e>(entries: impl Iterator<Item = &'e IndexEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let parents = entry.parent_dirs()?;
            root.add_entry(&parents, entry)?;
        }

        Ok(root)
    }

    /// Post-order traversal, so child ids are known before their parent is stored
    pub fn traverse<F>(&self, func: &mut F) -> anyhow::Result<()>
    where
        F: FnMut(&Tree) -> anyhow::Result<()>,
    {
        for entry in self.writeable_entries.values() {
            if let TreeEntry::Directory(tree) = entry {
                tree.traverse(func)?;
            }
        }
        func(self)
    }

    fn add_entry(&mut self, parents: &[&Path], entry: &IndexEntry) -> anyhow::Result<()> {
        match parents.split_first() {
            None => {
                self.writeable_entries.insert(
                    entry.basename()?.to_string(),
                    TreeEntry::File(entry.clone()),
                );
            }
            Some((parent, rest)) => {
                let parent = parent
                    .file_name()
                    .and_then(|s| s.to_str())
                    .context("Invalid parent")?;
                let key = format!("{parent}/");

                let slot = self
                    .writeable_entries
                    .entry(key)
                    .or_insert_with(|| TreeEntry::Directory(Tree::default()));
                if let TreeEntry::File(_) = slot {
                    *slot = TreeEntry::Directory(Tree::default());
                }
                if let TreeEntry::Directory(tree) = slot {
                    tree.add_entry(rest, entry)?;
                }
            }
        }

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.readable_entries.iter()
    }

    pub fn entry(&self, name: &str) -> Option<&DatabaseEntry> {
        self.readable_entries.get(name)
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.readable_entries.into_iter()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();
        for (name, tree_entry) in &self.writeable_entries {
            let name = name.trim_end_matches('/');

            let header = format!("{:o} {}", tree_entry.mode().as_u32(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            tree_entry.oid()?.write_h40_to(&mut content_bytes)?;
        }

        let mut tree_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), content_bytes.len());
        tree_bytes.write_all(header.as_bytes())?;
        tree_bytes.write_all(&content_bytes)?;

        Ok(Bytes::from(tree_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree {
            readable_entries: entries,
            writeable_entries: BTreeMap::new(),
        })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
