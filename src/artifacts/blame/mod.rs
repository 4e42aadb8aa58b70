//! Line attribution along first-parent history
//!
//! Starting from a commit, each line still unattributed is mapped into the
//! parent's version of the file through the `Equal` edits of a Myers diff.
//! Lines without a counterpart in the parent were introduced by the current
//! commit. The walk stops at the boundary commit, at a root commit, or at a
//! parent that does not have the file; whatever is left belongs to the commit
//! reached last.

use crate::areas::database::Database;
use crate::artifacts::diff::hunk::split_lines;
use crate::artifacts::diff::myers::{DiffAlgorithm, Edit, MyersDiff};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Consecutive lines last changed by the same commit
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct BlameHunk {
    pub commit: ObjectId,
    /// 1-based line number in the blamed revision
    pub start_line: usize,
    pub line_count: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blame {
    pub path: PathBuf,
    pub hunks: Vec<BlameHunk>,
}

impl Blame {
    pub fn line_count(&self) -> usize {
        self.hunks.iter().map(|hunk| hunk.line_count).sum()
    }

    /// Commit responsible for a 1-based line
    pub fn commit_for_line(&self, line: usize) -> Option<&ObjectId> {
        self.hunks
            .iter()
            .find(|hunk| (hunk.start_line..hunk.start_line + hunk.line_count).contains(&line))
            .map(|hunk| &hunk.commit)
    }
}

#[derive(Debug, new)]
pub struct Blamer<'r> {
    database: &'r Database,
}

/// A line of the commit being inspected, paired with its index in the blamed revision
type TrackedLine = (usize, usize);

impl<'r> Blamer<'r> {
    fn file_at(&self, commit: &ObjectId, path: &Path) -> anyhow::Result<Option<Bytes>> {
        match self.database.tree_entry(commit, path)? {
            Some(entry) if !entry.is_tree() => {
                Ok(Some(self.database.load_blob(&entry.oid)?.into_bytes()))
            }
            _ => Ok(None),
        }
    }

    /// Blame `path` as of `from`, walking back no further than `to`
    ///
    /// `Ok(None)` when `from` has no such file.
    pub fn blame(
        &self,
        path: &Path,
        from: &ObjectId,
        to: Option<&ObjectId>,
    ) -> anyhow::Result<Option<Blame>> {
        let Some(content) = self.file_at(from, path)? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&content).into_owned();
        let final_lines = split_lines(&text);

        let mut owners: Vec<Option<ObjectId>> = vec![None; final_lines.len()];
        let mut tracked: Vec<TrackedLine> = (0..final_lines.len()).map(|i| (i, i)).collect();
        let mut current_oid = from.clone();
        let mut current_text = text.clone();

        while !tracked.is_empty() {
            let commit = self
                .database
                .parse_object_as_commit(&current_oid)?
                .with_context(|| format!("object {current_oid} is not a commit"))?;

            let parent_text = match commit.parent() {
                Some(parent) if Some(&current_oid) != to => self
                    .file_at(parent, path)?
                    .map(|content| (parent.clone(), String::from_utf8_lossy(&content).into_owned())),
                _ => None,
            };

            let Some((parent_oid, parent_text)) = parent_text else {
                for (_, line) in tracked.drain(..) {
                    owners[line] = Some(current_oid.clone());
                }
                break;
            };

            let parent_lines = split_lines(&parent_text);
            let current_lines = split_lines(&current_text);
            let to_parent = MyersDiff::new(&parent_lines, &current_lines)
                .diff()
                .into_iter()
                .filter_map(|edit| match edit {
                    Edit::Equal { a, b, .. } => Some((b, a)),
                    _ => None,
                })
                .collect::<HashMap<_, _>>();

            let mut passed_on = Vec::with_capacity(tracked.len());
            for (current_line, line) in tracked.drain(..) {
                match to_parent.get(&current_line) {
                    Some(&parent_line) => passed_on.push((parent_line, line)),
                    None => owners[line] = Some(current_oid.clone()),
                }
            }

            trace!(
                commit = %current_oid.to_short_oid(),
                passed_on = passed_on.len(),
                "blame step"
            );

            tracked = passed_on;
            current_oid = parent_oid;
            current_text = parent_text;
        }

        let hunks = Self::group(&final_lines, owners)?;
        Ok(Some(Blame {
            path: path.to_path_buf(),
            hunks,
        }))
    }

    fn group(lines: &[&str], owners: Vec<Option<ObjectId>>) -> anyhow::Result<Vec<BlameHunk>> {
        let mut hunks: Vec<BlameHunk> = Vec::new();

        for (index, (line, owner)) in lines.iter().zip(owners).enumerate() {
            let owner = owner.with_context(|| format!("line {} left unattributed", index + 1))?;
            let line = line.trim_end_matches('\n').to_string();

            match hunks.last_mut() {
                Some(hunk) if hunk.commit == owner => {
                    hunk.line_count += 1;
                    hunk.lines.push(line);
                }
                _ => hunks.push(BlameHunk::new(owner, index + 1, 1, vec![line])),
            }
        }

        Ok(hunks)
    }
}
