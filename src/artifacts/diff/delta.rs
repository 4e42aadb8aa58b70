//! Diff results
//!
//! A [`Diff`] is an immutable comparison between two snapshots made of one
//! [`DiffDelta`] per changed path. Single-file requests answer with a
//! [`PatchResult`], which is [`PatchResult::Binary`] when no hunk data exists.

use crate::artifacts::diff::hunk::DiffHunk;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DeltaStatus {
    #[default]
    Unmodified,
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Untracked,
    Conflicted,
    /// Changed both in the index and in the workspace
    Mixed,
}

impl DeltaStatus {
    /// Porcelain status letter
    pub fn code(&self) -> &'static str {
        match self {
            DeltaStatus::Unmodified => " ",
            DeltaStatus::Added => "A",
            DeltaStatus::Deleted => "D",
            DeltaStatus::Modified => "M",
            DeltaStatus::Renamed => "R",
            DeltaStatus::Copied => "C",
            DeltaStatus::Untracked => "?",
            DeltaStatus::Conflicted => "U",
            DeltaStatus::Mixed => "X",
        }
    }

    pub fn is_unmodified(&self) -> bool {
        *self == DeltaStatus::Unmodified
    }
}

impl std::fmt::Display for DeltaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeltaStatus::Unmodified => "unmodified",
            DeltaStatus::Added => "new file",
            DeltaStatus::Deleted => "deleted",
            DeltaStatus::Modified => "modified",
            DeltaStatus::Renamed => "renamed",
            DeltaStatus::Copied => "copied",
            DeltaStatus::Untracked => "untracked",
            DeltaStatus::Conflicted => "both modified",
            DeltaStatus::Mixed => "mixed",
        };
        write!(f, "{label}")
    }
}

/// One side of a file change
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct DeltaSide {
    pub path: PathBuf,
    /// `None` when the file does not exist on this side
    pub oid: Option<ObjectId>,
    pub mode: Option<EntryMode>,
}

impl DeltaSide {
    pub fn exists(&self) -> bool {
        self.oid.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDelta {
    pub old: DeltaSide,
    pub new: DeltaSide,
    pub status: DeltaStatus,
    pub binary: bool,
    /// Empty for binary and unmodified deltas
    pub hunks: Vec<DiffHunk>,
}

impl DiffDelta {
    pub fn old_path(&self) -> &Path {
        &self.old.path
    }

    pub fn new_path(&self) -> &Path {
        &self.new.path
    }
}

/// Which snapshots a diff compares
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Comparison {
    Commits {
        commit: ObjectId,
        parent: Option<ObjectId>,
    },
    HeadToIndex,
    IndexToWorkspace,
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Diff {
    pub comparison: Comparison,
    /// Ordered by path
    pub deltas: Vec<DiffDelta>,
}

impl Diff {
    pub fn delta(&self, path: &Path) -> Option<&DiffDelta> {
        self.deltas
            .iter()
            .find(|delta| delta.new_path() == path || delta.old_path() == path)
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchResult {
    Binary,
    /// A diff holding exactly one delta
    Diff(Diff),
}

impl PatchResult {
    pub fn delta(&self) -> Option<&DiffDelta> {
        match self {
            PatchResult::Binary => None,
            PatchResult::Diff(diff) => diff.deltas.first(),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, PatchResult::Binary)
    }
}

/// Cache key of a commit diff: the commit and the parent it was compared against
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct DiffKey(pub ObjectId, pub Option<ObjectId>);
