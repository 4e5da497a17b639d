use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::RepositoryError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub marker: String,
    pub version: u32,
    pub entries_count: u32,
}

impl IndexHeader {
    pub fn for_entries(entries_count: u32) -> Self {
        IndexHeader {
            marker: String::from(SIGNATURE),
            version: VERSION,
            entries_count,
        }
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

impl Unpackable for IndexHeader {
    /// Parse and validate the 12-byte header.
    fn deserialize(bytes: Bytes) -> anyhow::Result<Self> {
        let invalid = |reason: String| RepositoryError::InvalidRepositoryState(reason);

        if bytes.len() < HEADER_SIZE {
            return Err(invalid("index header is truncated".into()).into());
        }

        let marker = String::from_utf8(bytes[0..4].to_vec())
            .map_err(|_| invalid("invalid marker in index header".into()))?;
        if marker != SIGNATURE {
            return Err(invalid(format!("invalid index signature {marker:?}")).into());
        }

        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        if version != VERSION {
            return Err(invalid(format!("unsupported index version {version}")).into());
        }

        let entries_count = byteorder::NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            marker,
            version,
            entries_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_layout() {
        let bytes = IndexHeader::for_entries(3).serialize().unwrap();

        assert_eq!(bytes.as_ref(), b"DIRC\0\0\0\x02\0\0\0\x03");
        assert_eq!(IndexHeader::deserialize(bytes).unwrap().entries_count, 3);
    }

    #[test]
    fn rejects_other_versions() {
        let error = IndexHeader::deserialize(Bytes::from_static(b"DIRC\0\0\0\x04\0\0\0\0")).unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::InvalidRepositoryState(_))
        ));
    }
}
