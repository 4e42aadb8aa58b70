use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::delta::DeltaSide;
use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::path::{Path, PathBuf};

const NULL_PATH: &str = "/dev/null";

/// One side of a file comparison; a side that does not exist has no oid and empty content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffTarget {
    pub path: PathBuf,
    pub oid: Option<ObjectId>,
    pub mode: Option<EntryMode>,
    pub content: Bytes,
}

impl DiffTarget {
    pub fn nothing(path: &Path) -> Self {
        DiffTarget {
            path: path.to_path_buf(),
            oid: None,
            mode: None,
            content: Bytes::new(),
        }
    }

    /// A blob referenced from a tree
    pub fn from_tree_entry(
        path: &Path,
        entry: Option<&DatabaseEntry>,
        database: &Database,
    ) -> anyhow::Result<Self> {
        match entry {
            None => Ok(Self::nothing(path)),
            Some(entry) => Ok(DiffTarget {
                path: path.to_path_buf(),
                oid: Some(entry.oid.clone()),
                mode: Some(entry.mode),
                content: database.load_blob(&entry.oid)?.into_bytes(),
            }),
        }
    }

    pub fn from_index(
        path: &Path,
        entry: Option<&IndexEntry>,
        database: &Database,
    ) -> anyhow::Result<Self> {
        match entry {
            None => Ok(Self::nothing(path)),
            Some(entry) => Ok(DiffTarget {
                path: path.to_path_buf(),
                oid: Some(entry.oid.clone()),
                mode: Some(entry.metadata.mode),
                content: database.load_blob(&entry.oid)?.into_bytes(),
            }),
        }
    }

    /// Workspace bytes, hashed as the blob they would become
    pub fn from_workspace(
        path: &Path,
        content: Option<Bytes>,
        mode: Option<EntryMode>,
    ) -> anyhow::Result<Self> {
        match content {
            None => Ok(Self::nothing(path)),
            Some(content) => {
                let blob = Blob::new(content);
                Ok(DiffTarget {
                    path: path.to_path_buf(),
                    oid: Some(blob.object_id()?),
                    mode: Some(mode.unwrap_or(EntryMode::File(FileMode::Regular))),
                    content: blob.into_bytes(),
                })
            }
        }
    }

    pub fn exists(&self) -> bool {
        self.oid.is_some()
    }

    /// Content to classify, `None` for a missing side
    pub fn classified_content(&self) -> Option<&[u8]> {
        self.exists().then_some(self.content.as_ref())
    }

    pub fn side(&self) -> DeltaSide {
        DeltaSide::new(self.path.clone(), self.oid.clone(), self.mode)
    }

    pub fn same_as(&self, other: &DiffTarget) -> bool {
        self.oid == other.oid && self.mode == other.mode
    }

    /// `a/<path>` style header path, or `/dev/null` for a missing side
    pub fn diff_path(side: &DeltaSide, prefix: &str) -> PathBuf {
        if side.exists() {
            Path::new(prefix).join(&side.path)
        } else {
            PathBuf::from(NULL_PATH)
        }
    }
}
