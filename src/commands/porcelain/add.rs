use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

impl Repository {
    /// Stage files as they are in the workspace
    ///
    /// Directories expand to every file below them. Tracked paths that no
    /// longer exist in the workspace are removed from the index; paths that
    /// match nothing are skipped.
    pub fn add<P: AsRef<Path>>(&self, paths: &[P]) -> anyhow::Result<()> {
        let paths = paths
            .iter()
            .map(|path| self.relative_path(path.as_ref()))
            .collect::<anyhow::Result<Vec<_>>>()?;

        self.update_index(|index| {
            for path in &paths {
                self.add_path(index, path)?;
            }
            Ok::<_, anyhow::Error>(())
        })
    }

    fn add_path(&self, index: &mut Index, path: &Path) -> anyhow::Result<()> {
        let root = (!path.as_os_str().is_empty()).then_some(path);

        let vanished = index
            .entries()
            .filter(|entry| root.is_none_or(|root| entry.name.starts_with(root)))
            .map(|entry| entry.name.clone())
            .filter(|name| std::fs::symlink_metadata(self.workspace().path().join(name)).is_err())
            .collect::<Vec<PathBuf>>();
        for name in &vanished {
            debug!(path = %name.display(), "removing deleted file from index");
            index.remove(name)?;
        }

        let exists = std::fs::symlink_metadata(self.workspace().path().join(path)).is_ok();
        if !exists {
            if vanished.is_empty() {
                warn!(path = %path.display(), "pathspec did not match any files");
            }
            return Ok(());
        }

        for file in self.workspace().list_files(root)? {
            let (Some(content), Some(stat)) = (
                self.workspace().read_file(&file)?,
                self.workspace().stat_file(&file)?,
            ) else {
                continue;
            };

            let oid = self.database().store(&Blob::new(content))?;
            index.add(IndexEntry::new(file, oid, stat))?;
        }

        Ok(())
    }
}
