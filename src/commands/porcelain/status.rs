use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::delta::DeltaStatus;
use crate::artifacts::status::file_status::FileStatus;
use crate::artifacts::status::inspector::Inspector;
use colored::Colorize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

pub type StatusMap = BTreeMap<PathBuf, FileStatus>;

impl Repository {
    /// Status of a single path, read fresh from disk
    pub fn status(&self, path: &Path) -> anyhow::Result<FileStatus> {
        let path = self.relative_path(path)?;
        self.reload_index()?;
        let index = self.index();

        self.file_status_in(&index, &path)
    }

    /// Every path whose status is not clean, in path order
    pub fn status_all(&self) -> anyhow::Result<StatusMap> {
        self.reload_index()?;
        let index = self.index();

        let head_tree = match self.refs().read_head()? {
            Some(head) => self.database().flatten_tree(&head)?,
            None => BTreeMap::new(),
        };

        let paths = index
            .entries()
            .map(|entry| entry.name.clone())
            .chain(head_tree.keys().cloned())
            .chain(self.workspace().list_files(None)?)
            .collect::<BTreeSet<_>>();

        let mut statuses = BTreeMap::new();
        for path in paths {
            let status = self.file_status_with(&index, &path, head_tree.get(&path))?;
            if !status.is_clean() {
                statuses.insert(path, status);
            }
        }

        Ok(statuses)
    }

    /// Status of `path` against an explicit index, which may be a working copy
    pub(crate) fn file_status_in(&self, index: &Index, path: &Path) -> anyhow::Result<FileStatus> {
        let head_entry = match self.refs().read_head()? {
            Some(head) => self
                .database()
                .tree_entry(&head, path)?
                .filter(|entry| !entry.is_tree()),
            None => None,
        };

        self.file_status_with(index, path, head_entry.as_ref())
    }

    fn file_status_with(
        &self,
        index: &Index,
        path: &Path,
        head_entry: Option<&DatabaseEntry>,
    ) -> anyhow::Result<FileStatus> {
        if index.is_conflicted(path) {
            return Ok(FileStatus::new(DeltaStatus::Conflicted, DeltaStatus::Conflicted));
        }

        let inspector = Inspector::new(self.workspace());
        let entry = index.entry_by_path(path);
        let stat = self.workspace().stat_file(path)?;

        Ok(FileStatus::new(
            inspector.check_index_against_head_tree(entry, head_entry),
            inspector.check_index_against_workspace(entry, stat.as_ref())?,
        ))
    }

    /// Print `XY path` lines, like `git status --porcelain`
    pub fn show_status(&self, path: Option<&Path>) -> anyhow::Result<()> {
        let statuses = match path {
            Some(path) => {
                let relative = self.relative_path(path)?;
                let status = self.status(&relative)?;
                BTreeMap::from([(relative, status)])
            }
            None => self.status_all()?,
        };

        for (path, status) in statuses {
            let code = status.porcelain_code();
            let code = match status.workspace {
                DeltaStatus::Untracked => code.red(),
                DeltaStatus::Unmodified => code.green(),
                _ => code.normal(),
            };
            writeln!(self.writer(), "{} {}", code, path.display())?;
        }

        Ok(())
    }
}
