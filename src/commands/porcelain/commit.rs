use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use std::io::Write;
use tracing::debug;

impl Repository {
    /// Record the index as a new commit on top of HEAD
    ///
    /// History changes, so every memoized commit diff is dropped.
    pub fn commit(&self, message: &str, author: Author) -> anyhow::Result<ObjectId> {
        self.reload_index()?;
        let index = self.index();

        if let Some(conflicted) = index.entries().find(|entry| entry.is_conflicted()) {
            anyhow::bail!(
                "Committing is not possible because {} is unmerged",
                conflicted.name.display()
            );
        }

        let tree = Tree::build(index.entries())?;
        let tree_id = tree.object_id()?;
        tree.traverse(&mut |tree: &Tree| self.database().store(tree).map(|_| ()))?;
        drop(index);

        let parent = self.refs().read_head()?;
        let is_root = if parent.is_some() { "" } else { "(root-commit) " };

        let commit = Commit::new(
            parent.into_iter().collect(),
            tree_id,
            author,
            message.trim().to_string(),
        );
        let commit_id = self.database().store(&commit)?;
        self.refs().update_head(&commit_id)?;
        self.invalidate_cache();

        debug!(commit = %commit_id, "commit created");
        writeln!(
            self.writer(),
            "[{}{}] {}",
            is_root,
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(commit_id)
    }
}
