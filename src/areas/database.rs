//! Loose object database
//!
//! Objects live zlib-compressed under `.git/objects/XX/YYYY...`, named by
//! the SHA-1 of their serialized form. Packfiles are not read.

use crate::artifacts::database::database_entry::{DatabaseEntry, TreeItem};
use crate::artifacts::diff::tree_diff::{ChangeSet, TreeDiff};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    /// Object files read through this handle
    reads: Cell<u64>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database {
            path,
            reads: Cell::new(0),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn reads(&self) -> u64 {
        self.reads.get()
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> anyhow::Result<ChangeSet> {
        let mut tree_diff = TreeDiff::new(self);
        tree_diff.compare_oids(old_oid, new_oid, "")?;
        Ok(tree_diff.into_changes())
    }

    /// Store an object unless it already exists, returning its id
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            let object_dir = object_path
                .parent()
                .context(format!("Invalid object path {}", object_path.display()))?;
            std::fs::create_dir_all(object_dir).context(format!(
                "Unable to create object directory {}",
                object_dir.display()
            ))?;

            self.write_object(object_path, object.serialize()?)?;
        }

        Ok(object_id)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
        }
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        match self.parse_object(object_id)? {
            ObjectBox::Blob(blob) => Ok(Some(*blob)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(Some(*commit)),
            _ => Ok(None),
        }
    }

    /// Load a tree, peeling commits to their root tree
    pub fn load_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            ObjectBox::Commit(commit) => self.load_tree(commit.tree_oid()),
            ObjectBox::Blob(_) => Err(anyhow::anyhow!("Invalid tree object {object_id}")),
        }
    }

    pub fn load_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        self.parse_object_as_blob(object_id)?
            .with_context(|| format!("Object {object_id} is not a blob"))
    }

    /// Resolve a `/`-separated path inside a tree to its entry
    pub fn tree_entry(
        &self,
        tree_oid: &ObjectId,
        path: &Path,
    ) -> anyhow::Result<Option<DatabaseEntry>> {
        let mut current = tree_oid.clone();
        let mut components = path.iter().peekable();

        while let Some(component) = components.next() {
            let name = component
                .to_str()
                .with_context(|| format!("Invalid path {}", path.display()))?;
            let tree = self.load_tree(&current)?;

            let Some(entry) = tree.entry(name).cloned() else {
                return Ok(None);
            };

            match (entry.item(), components.peek()) {
                (_, None) => return Ok(Some(entry)),
                (TreeItem::Subtree(oid), Some(_)) => current = oid,
                (TreeItem::Blob(_), Some(_)) => return Ok(None),
            }
        }

        Ok(None)
    }

    /// Every blob reachable from a tree, keyed by its full path
    pub fn flatten_tree(
        &self,
        tree_oid: &ObjectId,
    ) -> anyhow::Result<BTreeMap<PathBuf, DatabaseEntry>> {
        let mut entries = BTreeMap::new();
        self.collect_tree(tree_oid, Path::new(""), &mut entries)?;
        Ok(entries)
    }

    fn collect_tree(
        &self,
        tree_oid: &ObjectId,
        prefix: &Path,
        entries: &mut BTreeMap<PathBuf, DatabaseEntry>,
    ) -> anyhow::Result<()> {
        for (name, entry) in self.load_tree(tree_oid)?.into_entries() {
            let path = prefix.join(name);
            match entry.item() {
                TreeItem::Subtree(oid) => self.collect_tree(&oid, &path, entries)?,
                TreeItem::Blob(blob) => {
                    entries.insert(path, blob);
                }
            }
        }

        Ok(())
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let object_path = self.path.join(object_id.to_path());
        let object_content = self.read_object(object_path)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    fn read_object(&self, object_path: PathBuf) -> anyhow::Result<Bytes> {
        trace!(path = %object_path.display(), "reading object");
        self.reads.set(self.reads.get() + 1);

        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename into place so readers never see a partial object
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// All object ids starting with `prefix`, used to expand abbreviated ids
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() < 2 {
            return Ok(Vec::new());
        }

        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path = self.path.join(dir_name);
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path)? {
            let file_name = entry?.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(file_prefix)
                && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}"))
            {
                matches.push(oid);
            }
        }
        matches.sort();

        Ok(matches)
    }
}
