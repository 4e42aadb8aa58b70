//! Git blob object
//!
//! Blobs store file content. They contain only the raw file data, without any
//! metadata like filename or permissions (those are stored in trees and in the
//! index).
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`
//! In memory: the content bytes, shared rather than copied

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

/// Git blob object representing file content
///
/// Cloning a blob clones a reference-counted handle to its bytes, so content
/// may be handed to the differ and the patcher without duplication.
#[derive(Debug, Clone, PartialEq, Eq, Default, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn from_text(text: &str) -> Self {
        Blob::new(Bytes::copy_from_slice(text.as_bytes()))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.content
    }

    pub fn into_bytes(self) -> Bytes {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content as text, or `None` when it is not valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut blob_bytes = Vec::with_capacity(self.content.len() + 32);
        let header = format!("{} {}\0", self.object_type().as_str(), self.content.len());
        blob_bytes.write_all(header.as_bytes())?;
        blob_bytes.write_all(&self.content)?;

        Ok(Bytes::from(blob_bytes))
    }
}

impl Unpackable for Blob {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        Ok(Self::new(Bytes::from(content)))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}
