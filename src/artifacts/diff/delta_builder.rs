use crate::artifacts::classify::Classifier;
use crate::artifacts::diff::delta::{DeltaSide, DeltaStatus, DiffDelta};
use crate::artifacts::diff::diff_target::DiffTarget;
use crate::artifacts::diff::hunk::DiffHunk;
use derive_new::new;
use std::path::Path;

/// Turns a pair of [`DiffTarget`]s into a [`DiffDelta`]
#[derive(Debug, Clone, Copy, new)]
pub struct DeltaBuilder {
    classifier: Classifier,
    context_lines: usize,
}

impl DeltaBuilder {
    pub fn status_of(old: &DiffTarget, new: &DiffTarget) -> DeltaStatus {
        match (old.exists(), new.exists()) {
            (false, false) => DeltaStatus::Unmodified,
            (false, true) => DeltaStatus::Added,
            (true, false) => DeltaStatus::Deleted,
            (true, true) if old.same_as(new) => DeltaStatus::Unmodified,
            (true, true) => DeltaStatus::Modified,
        }
    }

    /// Neither side classifies as text; a pair of missing sides is not binary
    pub fn is_binary(&self, old: &DiffTarget, new: &DiffTarget) -> bool {
        if !old.exists() && !new.exists() {
            return false;
        }

        let path = if new.exists() { &new.path } else { &old.path };
        !self
            .classifier
            .is_text_content(path, old.classified_content())
            && !self
                .classifier
                .is_text_content(path, new.classified_content())
    }

    pub fn build(&self, old: DiffTarget, new: DiffTarget, status: DeltaStatus) -> DiffDelta {
        let binary = self.is_binary(&old, &new);

        let hunks = if binary
            || matches!(status, DeltaStatus::Unmodified | DeltaStatus::Conflicted)
        {
            Vec::new()
        } else {
            DiffHunk::build(
                &String::from_utf8_lossy(&old.content),
                &String::from_utf8_lossy(&new.content),
                self.context_lines,
            )
        };

        DiffDelta {
            old: old.side(),
            new: new.side(),
            status,
            binary,
            hunks,
        }
    }

    /// Delta for a path with unmerged index stages
    pub fn conflicted(path: &Path) -> DiffDelta {
        DiffDelta {
            old: DeltaSide::new(path.to_path_buf(), None, None),
            new: DeltaSide::new(path.to_path_buf(), None, None),
            status: DeltaStatus::Conflicted,
            binary: false,
            hunks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    fn builder() -> DeltaBuilder {
        DeltaBuilder::new(Classifier::default(), 3)
    }

    fn workspace(path: &str, content: &'static [u8]) -> DiffTarget {
        DiffTarget::from_workspace(Path::new(path), Some(Bytes::from_static(content)), None)
            .unwrap()
    }

    #[test]
    fn added_file_gets_a_new_file_hunk() {
        let old = DiffTarget::nothing(Path::new("a.txt"));
        let new = workspace("a.txt", b"one\ntwo\n");

        let status = DeltaBuilder::status_of(&old, &new);
        let delta = builder().build(old, new, status);

        assert_eq!(delta.status, DeltaStatus::Added);
        assert_eq!(delta.hunks.len(), 1);
        assert_eq!(delta.hunks[0].header(), "@@ -0,0 +1,2 @@");
    }

    #[test]
    fn identical_sides_are_unmodified_without_hunks() {
        let old = workspace("a.txt", b"same\n");
        let new = workspace("a.txt", b"same\n");

        let status = DeltaBuilder::status_of(&old, &new);
        let delta = builder().build(old, new, status);

        assert_eq!(delta.status, DeltaStatus::Unmodified);
        assert!(delta.hunks.is_empty());
    }

    #[test]
    fn nul_bytes_make_the_delta_binary() {
        let old = DiffTarget::nothing(Path::new("data.bin"));
        let new = workspace("data.bin", b"\x00\x01\x02");

        let delta = builder().build(old, new, DeltaStatus::Added);

        assert!(delta.binary);
        assert!(delta.hunks.is_empty());
    }

    #[test]
    fn missing_on_both_sides_is_unmodified_text() {
        let old = DiffTarget::nothing(Path::new("ghost"));
        let new = DiffTarget::nothing(Path::new("ghost"));

        assert_eq!(DeltaBuilder::status_of(&old, &new), DeltaStatus::Unmodified);
        assert!(!builder().is_binary(&old, &new));
    }
}
