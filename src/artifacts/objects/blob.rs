//! Blob object
//!
//! Blobs store file content only. Names and permissions live in trees.
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;

/// Opaque file content
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl From<&[u8]> for Blob {
    fn from(content: &[u8]) -> Self {
        Blob::new(Bytes::copy_from_slice(content))
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.content.clone())
    }
}

impl Unpackable for Blob {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        Ok(Self::new(payload))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encode_prefixes_type_and_length() {
        let blob = Blob::from(&b"hi\n"[..]);

        assert_eq!(blob.encode().unwrap().as_ref(), b"blob 3\0hi\n");
    }

    #[test]
    fn binary_content_survives() {
        let content = Bytes::from_static(&[0, 159, 146, 150, 255, 10]);
        let blob = Blob::new(content.clone());

        let decoded = Blob::deserialize(blob.serialize().unwrap()).unwrap();
        assert_eq!(decoded.content(), &content);
    }
}
