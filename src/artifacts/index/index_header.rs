use crate::artifacts::index::{DEFAULT_VERSION, HEADER_SIZE, SIGNATURE, SUPPORTED_VERSIONS};
use crate::artifacts::objects::object::Packable;
use anyhow::anyhow;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub(crate) marker: String,
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
}

impl IndexHeader {
    pub(crate) fn empty() -> Self {
        IndexHeader::new(String::from(SIGNATURE), DEFAULT_VERSION, 0)
    }

    /// Parse and validate the fixed 12-byte header
    pub(crate) fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(anyhow!("Invalid header size"));
        }

        let marker = String::from_utf8(bytes[0..4].to_vec())
            .map_err(|_| anyhow!("Invalid marker in index header"))?;
        if marker != SIGNATURE {
            return Err(anyhow!("Invalid index file signature"));
        }

        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(anyhow!("Unsupported index file version: {version}"));
        }

        let entries_count = byteorder::NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader::new(marker, version, entries_count))
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(self.marker.as_bytes())?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.entries_count)?;

        Ok(Bytes::from(bytes))
    }
}
