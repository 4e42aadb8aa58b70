use crate::artifacts::diff::delta::DeltaStatus;
use derive_new::new;

/// How a path differs between HEAD and the index, and between the index and the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, new)]
pub struct FileStatus {
    pub index: DeltaStatus,
    pub workspace: DeltaStatus,
}

impl FileStatus {
    pub fn is_clean(&self) -> bool {
        self.index.is_unmodified() && self.workspace.is_unmodified()
    }

    pub fn is_untracked(&self) -> bool {
        self.workspace == DeltaStatus::Untracked
    }

    /// Two-column code as printed by `status --porcelain`
    pub fn porcelain_code(&self) -> String {
        match (self.index, self.workspace) {
            (_, DeltaStatus::Untracked) => "??".to_string(),
            (DeltaStatus::Conflicted, _) | (_, DeltaStatus::Conflicted) => "UU".to_string(),
            (index, workspace) => format!("{}{}", index.code(), workspace.code()),
        }
    }
}
