//! HEAD and branch references
//!
//! A ref file holds either a 40-character object id or `ref: <path>`, a
//! symbolic pointer to another ref. HEAD normally points at `refs/heads/<branch>`.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const HEAD_REF_NAME: &str = "HEAD";
pub const HEADS_PREFIX: &str = "refs/heads/";

#[derive(Debug, new)]
pub struct Refs {
    /// The `.git` directory
    path: Box<Path>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef(String),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read ref file {}", path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        match regex::Regex::new(SYMREF_REGEX)?.captures(content) {
            Some(symref) => Ok(Some(SymRefOrOid::SymRef(symref[1].to_string()))),
            None => Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(content.to_string())?))),
        }
    }
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.head_path())
    }

    /// Move whatever HEAD ultimately points at to `oid`
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        let target = self.current_ref(HEAD_REF_NAME)?;
        self.update_ref_file(&self.path.join(target), oid.as_ref())
    }

    /// The last ref in the symbolic chain starting at `source`, relative to `.git`
    pub fn current_ref(&self, source: &str) -> anyhow::Result<String> {
        match SymRefOrOid::read(&self.path.join(source))? {
            Some(SymRefOrOid::SymRef(target)) => self.current_ref(&target),
            Some(SymRefOrOid::Oid(_)) | None => Ok(source.to_string()),
        }
    }

    /// Resolve `HEAD` or a branch name; `Ok(None)` when no such ref exists
    pub fn read_ref(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        match self.find_path_to_ref(name) {
            Some(path) => self.read_symref(&path),
            None => Ok(None),
        }
    }

    fn find_path_to_ref(&self, name: &str) -> Option<PathBuf> {
        [self.path.to_path_buf(), self.refs_path(), self.heads_path()]
            .iter()
            .map(|base_path| base_path.join(name))
            .find(|path| path.is_file())
    }

    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        match SymRefOrOid::read(path)? {
            Some(SymRefOrOid::SymRef(target)) => self.read_symref(&self.path.join(target)),
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    pub fn update_ref_file(&self, path: &Path, raw_ref: &str) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .with_context(|| format!("Invalid ref path {}", path.display()))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create ref directory {}", parent.display()))?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Unable to open ref file {}", path.display()))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        writeln!(lock.deref_mut(), "{raw_ref}")
            .with_context(|| format!("Unable to write ref file {}", path.display()))?;

        Ok(())
    }
}
