use crate::areas::database::Database;
use crate::artifacts::database::database_entry::{DatabaseEntry, TreeItem};
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeChangeType {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
}

impl TreeChangeType {
    pub fn from_entries(old: Option<DatabaseEntry>, new: Option<DatabaseEntry>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(TreeChangeType::Added(new)),
            (Some(old), None) => Some(TreeChangeType::Deleted(old)),
            (Some(old), Some(new)) if old != new => Some(TreeChangeType::Modified { old, new }),
            _ => None,
        }
    }

    pub fn old_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChangeType::Deleted(entry) => Some(entry),
            TreeChangeType::Modified { old, .. } => Some(old),
            TreeChangeType::Added(_) => None,
        }
    }

    pub fn new_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChangeType::Added(entry) => Some(entry),
            TreeChangeType::Modified { new, .. } => Some(new),
            TreeChangeType::Deleted(_) => None,
        }
    }
}

/// Changed blob paths, `/`-separated, in git's byte order
pub type ChangeSet = BTreeMap<String, TreeChangeType>;
type TreeEntryMap = BTreeMap<String, DatabaseEntry>;

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Recursive comparison of two trees down to changed blobs
#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn into_changes(self) -> ChangeSet {
        self.change_set
    }

    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &str,
    ) -> anyhow::Result<()> {
        if old == new {
            return Ok(());
        }

        let old_tree_entries = self.inflate_tree_entries(old)?;
        let new_tree_entries = self.inflate_tree_entries(new)?;

        self.detect_deletions(&old_tree_entries, &new_tree_entries, prefix)?;
        self.detect_additions(&old_tree_entries, &new_tree_entries, prefix)?;

        Ok(())
    }

    fn inflate_tree_entries(&self, oid: Option<&ObjectId>) -> anyhow::Result<TreeEntryMap> {
        match oid {
            None => Ok(BTreeMap::new()),
            Some(oid) => Ok(self.database.load_tree(oid)?.into_entries().collect()),
        }
    }

    fn detect_deletions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &str,
    ) -> anyhow::Result<()> {
        for (name, entry) in old {
            let other = new.get(name);
            if other == Some(entry) {
                continue;
            }

            let path = join(prefix, name);
            let (old_subtree, old_blob) = split_item(Some(entry));
            let (new_subtree, new_blob) = split_item(other);

            self.compare_oids(old_subtree.as_ref(), new_subtree.as_ref(), &path)?;

            if let Some(change) = TreeChangeType::from_entries(old_blob, new_blob) {
                self.change_set.insert(path, change);
            }
        }

        Ok(())
    }

    fn detect_additions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &str,
    ) -> anyhow::Result<()> {
        for (name, entry) in new {
            if old.contains_key(name) {
                continue;
            }

            let path = join(prefix, name);
            match entry.item() {
                TreeItem::Subtree(oid) => self.compare_oids(None, Some(&oid), &path)?,
                TreeItem::Blob(blob) => {
                    self.change_set.insert(path, TreeChangeType::Added(blob));
                }
            }
        }

        Ok(())
    }
}

fn split_item(entry: Option<&DatabaseEntry>) -> (Option<ObjectId>, Option<DatabaseEntry>) {
    match entry.map(DatabaseEntry::item) {
        Some(TreeItem::Subtree(oid)) => (Some(oid), None),
        Some(TreeItem::Blob(blob)) => (None, Some(blob)),
        None => (None, None),
    }
}
