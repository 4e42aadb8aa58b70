use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::delta::{
    Comparison, DeltaSide, DeltaStatus, Diff, DiffDelta, DiffKey, PatchResult,
};
use crate::artifacts::diff::delta_builder::DeltaBuilder;
use crate::artifacts::diff::diff_target::DiffTarget;
use crate::artifacts::diff::hunk::{DiffHunk, LineKind, NO_NEWLINE_MARKER};
use crate::artifacts::diff::tree_diff::TreeChangeType;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

impl Repository {
    /// Diff of a commit against one of its parents, memoized per (commit, parent)
    ///
    /// Without `parent` the first parent is used. A `parent` that is not one of
    /// the commit's parents yields a diff against an empty tree. `None` when
    /// `commit` does not name a commit.
    pub fn diff(
        &self,
        commit: &ObjectId,
        parent: Option<&ObjectId>,
    ) -> anyhow::Result<Option<Arc<Diff>>> {
        let requested = DiffKey::new(commit.clone(), parent.cloned());
        let cached = self.diff_cache().get(&requested);
        if let Some(diff) = cached {
            debug!(commit = %commit.to_short_oid(), "diff cache hit");
            return Ok(Some(diff));
        }

        if !self.database().contains(commit) {
            return Ok(None);
        }
        let Some(commit_object) = self.database().parse_object_as_commit(commit)? else {
            return Ok(None);
        };

        let resolved = match parent {
            None => commit_object.parent().cloned(),
            Some(parent) => commit_object
                .parents()
                .contains(parent)
                .then(|| parent.clone()),
        };
        // `(commit, None)` means "first parent", so an empty-tree diff is only
        // ever cached under the key it was requested with
        let resolved_key = resolved
            .clone()
            .map(|parent| DiffKey::new(commit.clone(), Some(parent)))
            .filter(|key| *key != requested);
        if let Some(key) = &resolved_key {
            let cached = self.diff_cache().get(key);
            if let Some(diff) = cached {
                debug!(commit = %commit.to_short_oid(), "diff cache hit on resolved parent");
                return Ok(Some(self.diff_cache().insert_shared(requested, diff)));
            }
        }

        debug!(
            commit = %commit.to_short_oid(),
            parent = ?resolved.as_ref().map(ObjectId::to_short_oid),
            "diff cache miss"
        );

        let builder = self.delta_builder();
        let changes = self
            .database()
            .tree_diff(resolved.as_ref(), Some(commit))?;

        let mut deltas = Vec::with_capacity(changes.len());
        for (path, change) in &changes {
            let path = Path::new(path);
            let old = DiffTarget::from_tree_entry(path, change.old_entry(), self.database())?;
            let new = DiffTarget::from_tree_entry(path, change.new_entry(), self.database())?;
            let status = match change {
                TreeChangeType::Added(_) => DeltaStatus::Added,
                TreeChangeType::Deleted(_) => DeltaStatus::Deleted,
                TreeChangeType::Modified { .. } => DeltaStatus::Modified,
            };
            deltas.push(builder.build(old, new, status));
        }

        let diff = Diff::new(
            Comparison::Commits {
                commit: commit.clone(),
                parent: resolved,
            },
            deltas,
        );

        let mut cache = self.diff_cache();
        let diff = cache.insert(requested, diff);
        if let Some(key) = resolved_key {
            cache.insert_shared(key, diff.clone());
        }

        Ok(Some(diff))
    }

    /// HEAD against the index for one path
    pub fn staged_diff(&self, path: &Path) -> anyhow::Result<Option<PatchResult>> {
        let path = self.relative_path(path)?;
        self.reload_index()?;
        let index = self.index();
        let head = self.refs().read_head()?;

        if index.is_conflicted(&path) {
            return Ok(Some(Self::conflicted_result(Comparison::HeadToIndex, &path)));
        }

        let (old, new) = self.staged_targets(&index, head.as_ref(), &path)?;
        Ok(Some(self.single_file_result(Comparison::HeadToIndex, old, new, false)))
    }

    /// The index against the workspace for one path; `None` when the file cannot be read
    pub fn unstaged_diff(&self, path: &Path) -> anyhow::Result<Option<PatchResult>> {
        let path = self.relative_path(path)?;
        self.reload_index()?;
        let index = self.index();

        if index.is_conflicted(&path) {
            return Ok(Some(Self::conflicted_result(Comparison::IndexToWorkspace, &path)));
        }

        let Some((old, new)) = self.unstaged_targets(&index, &path)? else {
            return Ok(None);
        };
        Ok(Some(self.single_file_result(Comparison::IndexToWorkspace, old, new, true)))
    }

    /// One path of a commit diff
    pub fn diff_maker(
        &self,
        path: &Path,
        commit: &ObjectId,
        parent: Option<&ObjectId>,
    ) -> anyhow::Result<Option<PatchResult>> {
        let path = self.relative_path(path)?;
        let Some(diff) = self.diff(commit, parent)? else {
            return Ok(None);
        };

        let delta = match diff.delta(&path) {
            Some(delta) if delta.binary => return Ok(Some(PatchResult::Binary)),
            Some(delta) => delta.clone(),
            None => {
                let entry = self
                    .database()
                    .tree_entry(commit, &path)?
                    .filter(|entry| !entry.is_tree());
                let side = DeltaSide::new(
                    path.clone(),
                    entry.as_ref().map(|entry| entry.oid.clone()),
                    entry.as_ref().map(|entry| entry.mode),
                );
                DiffDelta {
                    old: side.clone(),
                    new: side,
                    status: DeltaStatus::Unmodified,
                    binary: false,
                    hunks: Vec::new(),
                }
            }
        };

        Ok(Some(PatchResult::Diff(Diff::new(
            diff.comparison.clone(),
            vec![delta],
        ))))
    }

    /// Every path whose index content differs from HEAD
    pub fn staged_changes(&self) -> anyhow::Result<Diff> {
        let statuses = self.status_all()?;
        let index = self.index();
        let head = self.refs().read_head()?;
        let builder = self.delta_builder();

        let mut deltas = Vec::new();
        for (path, status) in statuses {
            match status.index {
                DeltaStatus::Unmodified => continue,
                DeltaStatus::Conflicted => deltas.push(DeltaBuilder::conflicted(&path)),
                status => {
                    let (old, new) = self.staged_targets(&index, head.as_ref(), &path)?;
                    deltas.push(builder.build(old, new, status));
                }
            }
        }

        Ok(Diff::new(Comparison::HeadToIndex, deltas))
    }

    /// Every path whose workspace content differs from the index
    pub fn unstaged_changes(&self) -> anyhow::Result<Diff> {
        let statuses = self.status_all()?;
        let index = self.index();
        let builder = self.delta_builder();

        let mut deltas = Vec::new();
        for (path, status) in statuses {
            match status.workspace {
                DeltaStatus::Unmodified => continue,
                DeltaStatus::Conflicted => deltas.push(DeltaBuilder::conflicted(&path)),
                status => match self.unstaged_targets(&index, &path)? {
                    Some((old, new)) => deltas.push(builder.build(old, new, status)),
                    None => continue,
                },
            }
        }

        Ok(Diff::new(Comparison::IndexToWorkspace, deltas))
    }

    fn staged_targets(
        &self,
        index: &Index,
        head: Option<&ObjectId>,
        path: &Path,
    ) -> anyhow::Result<(DiffTarget, DiffTarget)> {
        let head_entry = match head {
            Some(head) => self
                .database()
                .tree_entry(head, path)?
                .filter(|entry| !entry.is_tree()),
            None => None,
        };

        Ok((
            DiffTarget::from_tree_entry(path, head_entry.as_ref(), self.database())?,
            DiffTarget::from_index(path, index.entry_by_path(path), self.database())?,
        ))
    }

    fn unstaged_targets(
        &self,
        index: &Index,
        path: &Path,
    ) -> anyhow::Result<Option<(DiffTarget, DiffTarget)>> {
        let old = DiffTarget::from_index(path, index.entry_by_path(path), self.database())?;

        let workspace_side = self
            .workspace()
            .read_file(path)
            .and_then(|content| Ok((content, self.workspace().stat_file(path)?)));
        let (content, stat) = match workspace_side {
            Ok(side) => side,
            Err(error) => {
                warn!(path = %path.display(), %error, "unable to read workspace file");
                return Ok(None);
            }
        };

        let new = DiffTarget::from_workspace(path, content, stat.map(|stat| stat.mode))?;
        Ok(Some((old, new)))
    }

    fn single_file_result(
        &self,
        comparison: Comparison,
        old: DiffTarget,
        new: DiffTarget,
        untracked_when_added: bool,
    ) -> PatchResult {
        let builder = self.delta_builder();
        if builder.is_binary(&old, &new) {
            debug!(path = %new.path.display(), "binary content, skipping hunks");
            return PatchResult::Binary;
        }

        let status = match DeltaBuilder::status_of(&old, &new) {
            DeltaStatus::Added if untracked_when_added => DeltaStatus::Untracked,
            status => status,
        };

        PatchResult::Diff(Diff::new(comparison, vec![builder.build(old, new, status)]))
    }

    fn conflicted_result(comparison: Comparison, path: &Path) -> PatchResult {
        PatchResult::Diff(Diff::new(comparison, vec![DeltaBuilder::conflicted(path)]))
    }

    /// Print the staged (`cached`) or unstaged changes as a unified patch
    pub fn show_diff(&self, cached: bool, path: Option<&Path>) -> anyhow::Result<()> {
        let deltas = match path {
            Some(path) => {
                let result = if cached {
                    self.staged_diff(path)?
                } else {
                    self.unstaged_diff(path)?
                };
                match result {
                    Some(PatchResult::Diff(diff)) => diff.deltas,
                    Some(PatchResult::Binary) => {
                        let path = self.relative_path(path)?;
                        writeln!(self.writer(), "Binary files a/{0} and b/{0} differ", path.display())?;
                        return Ok(());
                    }
                    None => Vec::new(),
                }
            }
            None if cached => self.staged_changes()?.deltas,
            None => self.unstaged_changes()?.deltas,
        };

        for delta in &deltas {
            self.print_delta(delta)?;
        }

        Ok(())
    }

    /// Print a commit's changes, or just those of `path`
    pub fn show_commit(
        &self,
        commit: &ObjectId,
        parent: Option<&ObjectId>,
        path: Option<&Path>,
    ) -> anyhow::Result<()> {
        let deltas = match path {
            Some(path) => match self.diff_maker(path, commit, parent)? {
                Some(PatchResult::Diff(diff)) => diff.deltas,
                Some(PatchResult::Binary) => {
                    let path = self.relative_path(path)?;
                    writeln!(self.writer(), "Binary files a/{0} and b/{0} differ", path.display())?;
                    return Ok(());
                }
                None => anyhow::bail!("{commit} is not a commit"),
            },
            None => match self.diff(commit, parent)? {
                Some(diff) => diff.deltas.clone(),
                None => anyhow::bail!("{commit} is not a commit"),
            },
        };

        for delta in &deltas {
            self.print_delta(delta)?;
        }

        Ok(())
    }

    pub(crate) fn print_delta(&self, delta: &DiffDelta) -> anyhow::Result<()> {
        if delta.status.is_unmodified() {
            return Ok(());
        }

        if delta.status == DeltaStatus::Conflicted {
            writeln!(self.writer(), "* Unmerged path {}", delta.new_path().display())?;
            return Ok(());
        }

        let a_path = Path::new("a").join(delta.old_path());
        let b_path = Path::new("b").join(delta.new_path());
        writeln!(
            self.writer(),
            "{}",
            format!("diff --git {} {}", a_path.display(), b_path.display()).bold()
        )?;

        self.print_delta_mode(&delta.old, &delta.new)?;

        if delta.old.oid == delta.new.oid {
            return Ok(());
        }

        let null = ObjectId::null();
        let mut oid_range = format!(
            "index {}..{}",
            delta.old.oid.as_ref().unwrap_or(&null).to_short_oid(),
            delta.new.oid.as_ref().unwrap_or(&null).to_short_oid()
        );
        if let (Some(old_mode), Some(new_mode)) = (delta.old.mode, delta.new.mode)
            && old_mode == new_mode
        {
            oid_range.push_str(&format!(" {}", old_mode.as_str()));
        }
        writeln!(self.writer(), "{}", oid_range.bold())?;

        if delta.binary {
            writeln!(
                self.writer(),
                "Binary files {} and {} differ",
                DiffTarget::diff_path(&delta.old, "a").display(),
                DiffTarget::diff_path(&delta.new, "b").display()
            )?;
            return Ok(());
        }

        writeln!(
            self.writer(),
            "{}",
            format!("--- {}", DiffTarget::diff_path(&delta.old, "a").display()).bold()
        )?;
        writeln!(
            self.writer(),
            "{}",
            format!("+++ {}", DiffTarget::diff_path(&delta.new, "b").display()).bold()
        )?;

        for hunk in &delta.hunks {
            self.print_hunk(hunk)?;
        }

        Ok(())
    }

    fn print_delta_mode(&self, old: &DeltaSide, new: &DeltaSide) -> anyhow::Result<()> {
        match (old.mode, new.mode) {
            (None, Some(mode)) => {
                writeln!(self.writer(), "{}", format!("new file mode {}", mode.as_str()).bold())?
            }
            (Some(mode), None) => writeln!(
                self.writer(),
                "{}",
                format!("deleted file mode {}", mode.as_str()).bold()
            )?,
            (Some(old_mode), Some(new_mode)) if old_mode != new_mode => {
                writeln!(self.writer(), "{}", format!("old mode {}", old_mode.as_str()).bold())?;
                writeln!(self.writer(), "{}", format!("new mode {}", new_mode.as_str()).bold())?;
            }
            _ => {}
        }

        Ok(())
    }

    fn print_hunk(&self, hunk: &DiffHunk) -> anyhow::Result<()> {
        let mut writer = self.writer();
        writeln!(writer, "{}", hunk.header().cyan())?;

        for line in &hunk.lines {
            let text = format!("{}{}", line.kind.prefix(), line.content);
            match line.kind {
                LineKind::Context => writeln!(writer, "{text}")?,
                LineKind::Deletion => writeln!(writer, "{}", text.red())?,
                LineKind::Addition => writeln!(writer, "{}", text.green())?,
            }
            if !line.newline {
                writeln!(writer, "{NO_NEWLINE_MARKER}")?;
            }
        }

        Ok(())
    }
}
