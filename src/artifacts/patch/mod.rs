//! Hunk-level staging
//!
//! A hunk only describes a contiguous line range, yet it may be staged
//! against a file that is new, deleted or absent from the index. [`PatchPlan`]
//! picks what to do from the hunk, the direction and the file's status; the
//! repository then carries the plan out against a working copy of the index.
//!
//! Whole-file shortcuts are taken when the hunk touches line 1 of a file that
//! is added or deleted as a whole. They never look at the hunk's lines.

use crate::artifacts::diff::delta::DeltaStatus;
use crate::artifacts::diff::hunk::DiffHunk;
use crate::artifacts::status::file_status::FileStatus;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("patch does not apply to {}: {reason}", path.display())]
    PatchMismatch { path: PathBuf, reason: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl StageError {
    pub fn mismatch(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StageError::PatchMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, StageError::PatchMismatch { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchPlan {
    /// Drop the index entry of a file deleted from the workspace
    StageDeletion,
    /// Put the index entry back to what HEAD has, removing it when HEAD has none
    ResetToHead,
    /// Patch the index blob line by line
    ApplyHunk,
    /// Add an untracked file as it is in the workspace
    StageWholeFile,
    /// Bring HEAD's entry back into an index that lacks the path
    RestoreHead,
}

impl PatchPlan {
    /// The plan for `hunk`, or the reason it cannot be resolved
    pub fn decide(
        in_index: bool,
        hunk: &DiffHunk,
        stage: bool,
        status: FileStatus,
    ) -> Result<PatchPlan, String> {
        if in_index {
            if hunk.touches_file_start() {
                if stage && status.workspace == DeltaStatus::Deleted {
                    return Ok(PatchPlan::StageDeletion);
                }
                if !stage && matches!(status.index, DeltaStatus::Added | DeltaStatus::Deleted) {
                    return Ok(PatchPlan::ResetToHead);
                }
            }
            return Ok(PatchPlan::ApplyHunk);
        }

        if stage && hunk.new_start == 1 && status.workspace == DeltaStatus::Untracked {
            return Ok(PatchPlan::StageWholeFile);
        }

        if !stage
            && hunk.old_start == 1
            && (status.index == DeltaStatus::Deleted || status.workspace == DeltaStatus::Deleted)
        {
            return Ok(PatchPlan::RestoreHead);
        }

        Err(format!(
            "no index entry to {} a partial hunk against (index {}, workspace {})",
            if stage { "stage" } else { "unstage" },
            status.index,
            status.workspace
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn hunk(old_start: usize, new_start: usize) -> DiffHunk {
        DiffHunk {
            old_start,
            new_start,
            ..Default::default()
        }
    }

    fn status(index: DeltaStatus, workspace: DeltaStatus) -> FileStatus {
        FileStatus::new(index, workspace)
    }

    #[rstest]
    #[case(1, 1, true, status(DeltaStatus::Unmodified, DeltaStatus::Deleted), PatchPlan::StageDeletion)]
    #[case(1, 0, false, status(DeltaStatus::Added, DeltaStatus::Unmodified), PatchPlan::ResetToHead)]
    #[case(1, 1, true, status(DeltaStatus::Unmodified, DeltaStatus::Modified), PatchPlan::ApplyHunk)]
    #[case(5, 6, true, status(DeltaStatus::Unmodified, DeltaStatus::Deleted), PatchPlan::ApplyHunk)]
    #[case(5, 5, false, status(DeltaStatus::Added, DeltaStatus::Unmodified), PatchPlan::ApplyHunk)]
    fn plans_with_an_index_entry(
        #[case] old_start: usize,
        #[case] new_start: usize,
        #[case] stage: bool,
        #[case] status: FileStatus,
        #[case] expected: PatchPlan,
    ) {
        assert_eq!(
            PatchPlan::decide(true, &hunk(old_start, new_start), stage, status),
            Ok(expected)
        );
    }

    #[test]
    fn untracked_file_is_staged_whole() {
        let status = status(DeltaStatus::Unmodified, DeltaStatus::Untracked);

        assert_eq!(
            PatchPlan::decide(false, &hunk(0, 1), true, status),
            Ok(PatchPlan::StageWholeFile)
        );
    }

    #[rstest]
    #[case(status(DeltaStatus::Deleted, DeltaStatus::Unmodified))]
    #[case(status(DeltaStatus::Unmodified, DeltaStatus::Deleted))]
    fn deleted_file_is_restored_from_head(#[case] status: FileStatus) {
        assert_eq!(
            PatchPlan::decide(false, &hunk(1, 0), false, status),
            Ok(PatchPlan::RestoreHead)
        );
    }

    #[rstest]
    #[case(hunk(0, 3), true, status(DeltaStatus::Unmodified, DeltaStatus::Untracked))]
    #[case(hunk(0, 1), true, status(DeltaStatus::Unmodified, DeltaStatus::Unmodified))]
    #[case(hunk(3, 0), false, status(DeltaStatus::Deleted, DeltaStatus::Unmodified))]
    #[case(hunk(1, 0), false, status(DeltaStatus::Unmodified, DeltaStatus::Untracked))]
    fn partial_hunks_without_an_index_entry_are_rejected(
        #[case] hunk: DiffHunk,
        #[case] stage: bool,
        #[case] status: FileStatus,
    ) {
        assert!(PatchPlan::decide(false, &hunk, stage, status).is_err());
    }
}
