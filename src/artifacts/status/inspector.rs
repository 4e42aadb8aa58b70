use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::delta::DeltaStatus;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use derive_new::new;
use tracing::trace;

/// Change detection between HEAD, the index and the workspace for single paths
#[derive(new)]
pub struct Inspector<'r> {
    workspace: &'r Workspace,
}

impl<'r> Inspector<'r> {
    fn is_content_changed(&self, index_entry: &IndexEntry) -> anyhow::Result<bool> {
        let oid = match self.workspace.read_file(&index_entry.name)? {
            Some(content) => Blob::new(content).object_id()?,
            None => return Ok(true),
        };

        Ok(oid != index_entry.oid)
    }

    pub fn check_index_against_workspace(
        &self,
        entry: Option<&IndexEntry>,
        stat: Option<&EntryMetadata>,
    ) -> anyhow::Result<DeltaStatus> {
        match (entry, stat) {
            (None, None) => Ok(DeltaStatus::Unmodified),
            (None, Some(_)) => Ok(DeltaStatus::Untracked),
            (Some(_), None) => Ok(DeltaStatus::Deleted),
            (Some(entry), Some(stat)) if !entry.stat_match(stat) => Ok(DeltaStatus::Modified),
            (Some(entry), Some(stat)) if entry.times_match(stat) => Ok(DeltaStatus::Unmodified),
            (Some(entry), Some(_)) => {
                trace!(path = %entry.name.display(), "stat changed, hashing content");
                if self.is_content_changed(entry)? {
                    Ok(DeltaStatus::Modified)
                } else {
                    Ok(DeltaStatus::Unmodified)
                }
            }
        }
    }

    pub fn check_index_against_head_tree(
        &self,
        index_entry: Option<&IndexEntry>,
        head_entry: Option<&DatabaseEntry>,
    ) -> DeltaStatus {
        match (index_entry, head_entry) {
            (Some(index_entry), Some(head_entry))
                if head_entry.mode != index_entry.metadata.mode
                    || head_entry.oid != index_entry.oid =>
            {
                DeltaStatus::Modified
            }
            (Some(_), None) => DeltaStatus::Added,
            (None, Some(_)) => DeltaStatus::Deleted,
            _ => DeltaStatus::Unmodified,
        }
    }
}
