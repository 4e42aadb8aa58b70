use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::delta::PatchResult;
use crate::artifacts::diff::hunk::DiffHunk;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::patch::{PatchPlan, StageError};
use std::io::Write;
use std::path::Path;
use tracing::debug;

impl Repository {
    /// Stage (`stage`) or unstage one hunk of `path`
    ///
    /// The index file is rewritten only when the whole patch succeeds; a
    /// [`StageError::PatchMismatch`] leaves it byte for byte as it was.
    pub fn patch_index_file(
        &self,
        path: &Path,
        hunk: &DiffHunk,
        stage: bool,
    ) -> Result<(), StageError> {
        let path = self.relative_path(path)?;

        self.update_index(|index| {
            let status = self.file_status_in(index, &path)?;
            let in_index = index.entry_by_path(&path).is_some();
            let plan = PatchPlan::decide(in_index, hunk, stage, status)
                .map_err(|reason| StageError::mismatch(&path, reason))?;

            debug!(path = %path.display(), ?plan, stage, ?status, "patching index");

            match plan {
                PatchPlan::StageDeletion => index.remove(&path)?,
                PatchPlan::ResetToHead => match self.head_index_entry(&path)? {
                    Some(entry) => index.add(entry)?,
                    None => index.remove(&path)?,
                },
                PatchPlan::RestoreHead => match self.head_index_entry(&path)? {
                    Some(entry) => index.add(entry)?,
                    None => {
                        return Err(StageError::mismatch(&path, "HEAD has no such file to restore"));
                    }
                },
                PatchPlan::ApplyHunk => self.apply_hunk_to_index(index, &path, hunk, stage)?,
                PatchPlan::StageWholeFile => {
                    let (Some(content), Some(stat)) = (
                        self.workspace().read_file(&path)?,
                        self.workspace().stat_file(&path)?,
                    ) else {
                        return Err(StageError::mismatch(&path, "file vanished from the workspace"));
                    };
                    let oid = self.database().store(&Blob::new(content))?;
                    index.add(IndexEntry::new(path.clone(), oid, stat))?;
                }
            }

            Ok(())
        })
    }

    fn apply_hunk_to_index(
        &self,
        index: &mut Index,
        path: &Path,
        hunk: &DiffHunk,
        stage: bool,
    ) -> Result<(), StageError> {
        let Some(entry) = index.entry_by_path(path).cloned() else {
            return Err(StageError::mismatch(path, "not in the index"));
        };

        let blob = self.database().load_blob(&entry.oid)?;
        let text = blob
            .text()
            .ok_or_else(|| StageError::mismatch(path, "index content is not valid UTF-8"))?;
        // the side the hunk was cut from must decode as well
        if !self.hunk_source_is_text(path, stage)? {
            let source = if stage { "workspace" } else { "HEAD" };
            return Err(StageError::mismatch(
                path,
                format!("{source} content is not valid UTF-8"),
            ));
        }

        let patched = if stage {
            hunk.apply(text)
        } else {
            hunk.reverse(text)
        }
        .map_err(|error| StageError::mismatch(path, error.to_string()))?;

        let patched = Blob::from_text(&patched);
        let size = patched.len() as u64;
        let oid = self.database().store(&patched)?;

        let mut updated = entry;
        updated.metadata = EntryMetadata::detached(updated.metadata.mode, size);
        updated.oid = oid;
        index.add(updated)?;

        Ok(())
    }

    /// Whether the content a hunk of `path` was taken from is valid UTF-8
    ///
    /// Staged hunks come from the workspace file, unstaged ones from HEAD. An
    /// absent side has nothing to decode.
    fn hunk_source_is_text(&self, path: &Path, stage: bool) -> anyhow::Result<bool> {
        let content = if stage {
            self.workspace().read_file(path)?
        } else {
            let head_entry = match self.refs().read_head()? {
                Some(head) => self
                    .database()
                    .tree_entry(&head, path)?
                    .filter(|entry| !entry.is_tree()),
                None => None,
            };
            match head_entry {
                Some(entry) => Some(self.database().load_blob(&entry.oid)?.into_bytes()),
                None => None,
            }
        };

        Ok(content.is_none_or(|content| std::str::from_utf8(&content).is_ok()))
    }

    /// HEAD's version of `path` as an index entry with no workspace stat
    fn head_index_entry(&self, path: &Path) -> anyhow::Result<Option<IndexEntry>> {
        let Some(head) = self.refs().read_head()? else {
            return Ok(None);
        };
        let Some(entry) = self
            .database()
            .tree_entry(&head, path)?
            .filter(|entry| !entry.is_tree())
        else {
            return Ok(None);
        };

        let size = self.database().load_blob(&entry.oid)?.len() as u64;
        Ok(Some(IndexEntry::new(
            path.to_path_buf(),
            entry.oid,
            EntryMetadata::detached(entry.mode, size),
        )))
    }

    /// Stage or unstage the `number`th (1-based) hunk of the current diff of `path`
    pub fn stage_hunk(&self, path: &Path, number: usize, stage: bool) -> Result<(), StageError> {
        let result = if stage {
            self.unstaged_diff(path)?
        } else {
            self.staged_diff(path)?
        };

        let hunk = match result {
            Some(PatchResult::Binary) => {
                return Err(StageError::mismatch(path, "binary files have no hunks"));
            }
            Some(result) => result
                .delta()
                .and_then(|delta| number.checked_sub(1).and_then(|i| delta.hunks.get(i)))
                .cloned(),
            None => None,
        };
        let Some(hunk) = hunk else {
            return Err(StageError::mismatch(path, format!("no hunk #{number}")));
        };

        self.patch_index_file(path, &hunk, stage)?;

        writeln!(
            self.writer(),
            "{} {}",
            if stage { "staged" } else { "unstaged" },
            hunk.header()
        )
        .map_err(anyhow::Error::from)?;

        Ok(())
    }
}
