use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use bytes::Bytes;
use std::io::ErrorKind;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

/// The working tree; every path handed in or out is relative to its root
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
            } else {
                false
            }
        })
    }

    fn relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(self.path.as_ref())
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty() && !Self::is_ignored(relative))
            .map(Path::to_path_buf)
    }

    /// Files (and symlinks) at or below `root`, or below the workspace root
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root = match root {
            Some(path) => self.path.join(path),
            None => self.path.to_path_buf(),
        };

        if std::fs::symlink_metadata(&root).is_err() {
            anyhow::bail!("The specified path does not exist: {}", root.display());
        }

        Ok(WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(Path::new(entry.file_name())))
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(|entry| self.relative(entry.path()))
            .collect())
    }

    /// Raw bytes of a file, `None` when it does not exist; symlinks read as their target
    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Option<Bytes>> {
        let full_path = self.path.join(file_path);

        let metadata = match std::fs::symlink_metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Unable to stat {}", file_path.display()));
            }
        };

        if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&full_path)
                .with_context(|| format!("Unable to read link {}", file_path.display()))?;
            return Ok(Some(Bytes::copy_from_slice(target.as_os_str().as_bytes())));
        }

        if metadata.is_dir() {
            return Ok(None);
        }

        std::fs::read(&full_path)
            .map(|content| Some(Bytes::from(content)))
            .with_context(|| format!("Unable to read {}", file_path.display()))
    }

    /// `lstat` of a file, `None` when it does not exist or is a directory
    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<Option<EntryMetadata>> {
        let full_path = self.path.join(file_path);

        match std::fs::symlink_metadata(&full_path) {
            Ok(metadata) if metadata.is_dir() => Ok(None),
            Ok(metadata) => Ok(Some((full_path.as_path(), metadata).try_into()?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => {
                Err(error).with_context(|| format!("Unable to stat {}", file_path.display()))
            }
        }
    }
}
