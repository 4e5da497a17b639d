use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::Write;
use std::path::PathBuf;

/// Payload encoding of an object (everything after the `<type> <len>\0` header).
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Payload decoding; the inverse of `Packable::serialize`.
pub trait Unpackable {
    fn deserialize(payload: Bytes) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Canonical form `<type> <byte-length>\0<payload>` that gets hashed and stored.
    fn encode(&self) -> Result<Bytes> {
        encode_payload(self.object_type(), &self.serialize()?)
    }

    fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::hash(&self.encode()?))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

pub fn encode_payload(object_type: ObjectType, payload: &[u8]) -> Result<Bytes> {
    let mut object_bytes = Vec::with_capacity(payload.len() + 32);
    write!(object_bytes, "{} {}\0", object_type.as_str(), payload.len())?;
    object_bytes.write_all(payload)?;

    Ok(Bytes::from(object_bytes))
}

/// Any object read back from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Box<Commit>),
    Tag(Box<Tag>),
}

impl GitObject {
    pub fn deserialize(object_type: ObjectType, payload: Bytes) -> Result<Self> {
        Ok(match object_type {
            ObjectType::Blob => GitObject::Blob(Blob::deserialize(payload)?),
            ObjectType::Tree => GitObject::Tree(Tree::deserialize(payload)?),
            ObjectType::Commit => GitObject::Commit(Box::new(Commit::deserialize(payload)?)),
            ObjectType::Tag => GitObject::Tag(Box::new(Tag::deserialize(payload)?)),
        })
    }
}

impl Packable for GitObject {
    fn serialize(&self) -> Result<Bytes> {
        match self {
            GitObject::Blob(blob) => blob.serialize(),
            GitObject::Tree(tree) => tree.serialize(),
            GitObject::Commit(commit) => commit.serialize(),
            GitObject::Tag(tag) => tag.serialize(),
        }
    }
}

impl Object for GitObject {
    fn object_type(&self) -> ObjectType {
        match self {
            GitObject::Blob(_) => ObjectType::Blob,
            GitObject::Tree(_) => ObjectType::Tree,
            GitObject::Commit(_) => ObjectType::Commit,
            GitObject::Tag(_) => ObjectType::Tag,
        }
    }
}

impl From<Blob> for GitObject {
    fn from(blob: Blob) -> Self {
        GitObject::Blob(blob)
    }
}

impl From<Tree> for GitObject {
    fn from(tree: Tree) -> Self {
        GitObject::Tree(tree)
    }
}

impl From<Commit> for GitObject {
    fn from(commit: Commit) -> Self {
        GitObject::Commit(Box::new(commit))
    }
}

impl From<Tag> for GitObject {
    fn from(tag: Tag) -> Self {
        GitObject::Tag(Box::new(tag))
    }
}
