//! The repository session
//!
//! Owns the four areas plus the in-memory index and the diff cache. Every
//! operation takes `&self`; interior state sits in `RefCell`s, so a session is
//! `!Sync` and callers serialize access to it.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::classify::{Classifier, ContentLookup, ContentSource};
use crate::artifacts::diff::cache::DiffCache;
use crate::artifacts::diff::delta_builder::DeltaBuilder;
use crate::config::Config;
use anyhow::Context;
use bytes::Bytes;
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    config: Config,
    classifier: Classifier,
    index: RefCell<Index>,
    diff_cache: RefCell<DiffCache>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open (or prepare to create) a repository at `path` with settings from the environment
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        Self::with_config(path, Config::from_env(), writer)
    }

    pub fn with_config(
        path: &Path,
        config: Config,
        writer: Box<dyn std::io::Write>,
    ) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Unable to create {}", path.display()))?;
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", path.display()))?;
        let git_path = path.join(".git");

        let index = Index::load(git_path.join("index").into_boxed_path())?;
        let database = Database::new(git_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(git_path.into_boxed_path());

        debug!(path = %path.display(), ?config, "repository opened");

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            config,
            classifier: Classifier::new(config.sniff_limit),
            index: RefCell::new(index),
            diff_cache: RefCell::new(DiffCache::default()),
            database,
            workspace,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn delta_builder(&self) -> DeltaBuilder {
        DeltaBuilder::new(self.classifier, self.config.context_lines)
    }

    pub fn index(&self) -> Ref<'_, Index> {
        self.index.borrow()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub(crate) fn diff_cache(&self) -> RefMut<'_, DiffCache> {
        self.diff_cache.borrow_mut()
    }

    /// Number of commit diffs currently memoized
    pub fn cached_diffs(&self) -> usize {
        self.diff_cache.borrow().len()
    }

    pub fn invalidate_cache(&self) {
        self.diff_cache.borrow_mut().invalidate();
    }

    /// Re-read the index from disk, dropping unsaved in-memory state
    pub fn reload_index(&self) -> anyhow::Result<()> {
        self.index.borrow_mut().rehydrate()
    }

    /// Run `mutate` on a fresh copy of the on-disk index and persist it
    ///
    /// The session's index is replaced only once the new file is in place; on
    /// any error the copy is dropped and both the file and the session keep
    /// their previous state.
    pub fn update_index<T, E>(
        &self,
        mutate: impl FnOnce(&mut Index) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let path = self.index.borrow().path().to_path_buf().into_boxed_path();
        let mut working = Index::load(path)?;

        let value = mutate(&mut working)?;

        if working.is_changed() {
            working.write_updates()?;
        }
        *self.index.borrow_mut() = working;

        Ok(value)
    }

    /// `path` relative to the workspace root; absolute paths must lie inside it
    pub fn relative_path(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.path).with_context(|| {
                format!("{} is outside repository {}", path.display(), self.path.display())
            })?
        } else {
            path
        };

        Ok(relative
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect())
    }

    /// Whether `path` in `source` should be diffed as text
    pub fn is_text_file(&self, path: &Path, source: &ContentSource) -> bool {
        self.classifier.is_text(path, source, self)
    }

    fn try_lookup_content(
        &self,
        path: &Path,
        source: &ContentSource,
    ) -> anyhow::Result<Option<Bytes>> {
        match source {
            ContentSource::Workspace => self.workspace.read_file(path),
            ContentSource::Index => match self.index().entry_by_path(path) {
                Some(entry) => Ok(Some(self.database.load_blob(&entry.oid)?.into_bytes())),
                None => Ok(None),
            },
            ContentSource::Commit(oid) => {
                match self.database.tree_entry(oid, path)? {
                    Some(entry) if !entry.is_tree() => {
                        Ok(Some(self.database.load_blob(&entry.oid)?.into_bytes()))
                    }
                    _ => Ok(None),
                }
            }
        }
    }
}

impl ContentLookup for Repository {
    fn lookup_content(&self, path: &Path, source: &ContentSource) -> Option<Bytes> {
        self.try_lookup_content(path, source).unwrap_or_else(|error| {
            warn!(path = %path.display(), ?source, %error, "content lookup failed");
            None
        })
    }
}
