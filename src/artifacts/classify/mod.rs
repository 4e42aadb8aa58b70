//! Text/binary classification
//!
//! Decides whether a path should be diffed as text. Rules are tried in
//! order and the first that matches wins:
//!
//! 1. the file name is a well-known extension-less text name (`LICENSE`, `Makefile`, ...)
//! 2. the extension maps to a text media type in the static registry
//! 3. the content itself is sniffed over a bounded prefix
//!
//! Missing content classifies as binary, so callers degrade to "binary" instead of failing.

pub mod registry;
pub mod sniff;

use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use derive_new::new;
use std::path::Path;
use tracing::trace;

/// Where a path's content is read from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentSource {
    /// The tree of this commit
    Commit(ObjectId),
    Index,
    Workspace,
}

/// Content fetch used by the sniffing fallback
pub trait ContentLookup {
    /// Content of `path` in `source`, or `None` when absent or unreadable
    fn lookup_content(&self, path: &Path, source: &ContentSource) -> Option<Bytes>;
}

#[derive(Debug, Clone, Copy, new)]
pub struct Classifier {
    sniff_limit: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(sniff::DEFAULT_SNIFF_LIMIT)
    }
}

impl Classifier {
    pub fn sniff_limit(&self) -> usize {
        self.sniff_limit
    }

    /// Text verdict from the name alone, `None` when the content must decide
    pub fn classify_name(&self, path: &Path) -> Option<bool> {
        let file_name = path.file_name()?.to_str()?;

        if registry::KNOWN_TEXT_NAMES.contains(file_name)
            || registry::KNOWN_TEXT_NAMES.contains(file_name.to_ascii_uppercase().as_str())
        {
            return Some(true);
        }

        let extension = path.extension()?.to_str()?;
        registry::media_type(extension)
            .filter(|media_type| registry::is_text_type(media_type))
            .map(|_| true)
    }

    pub fn is_text(
        &self,
        path: &Path,
        source: &ContentSource,
        lookup: &impl ContentLookup,
    ) -> bool {
        if let Some(verdict) = self.classify_name(path) {
            return verdict;
        }

        trace!(path = %path.display(), ?source, "sniffing content");
        self.is_text_content(path, lookup.lookup_content(path, source).as_deref())
    }

    /// Same rules, for callers that already hold the content
    pub fn is_text_content(&self, path: &Path, content: Option<&[u8]>) -> bool {
        if let Some(verdict) = self.classify_name(path) {
            return verdict;
        }

        match content {
            Some(content) => !sniff::is_binary(content, self.sniff_limit),
            None => false,
        }
    }
}
