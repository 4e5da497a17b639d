//! Loose object database
//!
//! Objects are stored zlib-compressed at `objects/<2 hex>/<38 hex>`. A file is
//! written once, through a temp file renamed into place, and never touched again.

use crate::artifacts::diff::tree_diff::TreeDiff;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{GitObject, Object, encode_payload};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::tree::tree_walker::TreeWalker;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Upper bound on tag -> tag -> ... hops while peeling.
const MAX_PEEL_DEPTH: usize = 32;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> anyhow::Result<TreeDiff<'_>> {
        let mut tree_diff = TreeDiff::new(self);
        tree_diff.compare_oids(old_oid, new_oid, Path::new(""))?;
        Ok(tree_diff)
    }

    /// Fresh pre-order traversal of the tree behind `oid` (a commit is followed to its tree).
    pub fn walk(&self, oid: &ObjectId) -> anyhow::Result<TreeWalker<'_>> {
        let tree_oid = self.peel(oid, ObjectType::Tree)?;
        TreeWalker::new(self, &tree_oid)
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).exists()
    }

    /// Store an object, returning its ID. Content that is already present is not rewritten.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        self.store_encoded(object.encode()?)
    }

    /// Store an arbitrary payload under the given type (`hash-object -w -t <type>`).
    pub fn store_payload(&self, object_type: ObjectType, payload: &[u8]) -> anyhow::Result<ObjectId> {
        self.store_encoded(encode_payload(object_type, payload)?)
    }

    fn store_encoded(&self, object_content: Bytes) -> anyhow::Result<ObjectId> {
        let object_id = ObjectId::hash(&object_content);
        let object_path = self.path.join(object_id.to_path());

        if object_path.exists() {
            tracing::debug!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        std::fs::create_dir_all(
            object_path
                .parent()
                .context(format!("Invalid object path {}", object_path.display()))?,
        )
        .context(format!(
            "Unable to create object directory {}",
            object_path.display()
        ))?;

        self.write_object(&object_path, object_content)?;
        tracing::debug!(oid = %object_id, "stored object");

        Ok(object_id)
    }

    /// Read and validate the raw payload of an object.
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_path = self.path.join(object_id.to_path());
        let object_content = self.read_object(object_id, &object_path)?;

        Self::split_header(object_id, object_content)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<GitObject> {
        let (object_type, payload) = self.load(object_id)?;

        GitObject::deserialize(object_type, payload)
            .with_context(|| format!("Unable to parse {object_type} {object_id}"))
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        match self.parse_object(object_id)? {
            GitObject::Blob(blob) => Ok(Some(blob)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        match self.parse_object(object_id)? {
            GitObject::Tree(tree) => Ok(Some(tree)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        match self.parse_object(object_id)? {
            GitObject::Commit(commit) => Ok(Some(*commit)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tag(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tag>> {
        match self.parse_object(object_id)? {
            GitObject::Tag(tag) => Ok(Some(*tag)),
            _ => Ok(None),
        }
    }

    pub fn get_object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _) = self.load(object_id)?;
        Ok(object_type)
    }

    /// Follow tags to their target and commits to their tree until an object
    /// of `wanted` type is reached.
    pub fn peel(&self, object_id: &ObjectId, wanted: ObjectType) -> anyhow::Result<ObjectId> {
        let mut current = object_id.clone();

        for _ in 0..MAX_PEEL_DEPTH {
            let object = self.parse_object(&current)?;
            if object.object_type() == wanted {
                return Ok(current);
            }

            current = match object {
                GitObject::Tag(tag) => tag.object().clone(),
                GitObject::Commit(commit) if wanted == ObjectType::Tree => commit.tree_oid().clone(),
                other => anyhow::bail!(
                    "object {object_id} is a {}, not a {wanted}",
                    other.object_type()
                ),
            };
        }

        anyhow::bail!("too many levels of tags while peeling {object_id}")
    }

    fn split_header(object_id: &ObjectId, content: Bytes) -> anyhow::Result<(ObjectType, Bytes)> {
        let corrupt = |reason: &str| -> anyhow::Error {
            RepositoryError::CorruptObject(format!("{object_id}: {reason}")).into()
        };

        let space = content
            .iter()
            .position(|b| *b == b' ')
            .ok_or_else(|| corrupt("missing type in header"))?;
        let nul = content[space..]
            .iter()
            .position(|b| *b == b'\0')
            .map(|offset| space + offset)
            .ok_or_else(|| corrupt("unterminated header"))?;

        let object_type = std::str::from_utf8(&content[..space])
            .map_err(|_| corrupt("type is not ASCII"))?;
        let object_type = ObjectType::try_from(object_type)?;

        let declared_len = std::str::from_utf8(&content[space + 1..nul])
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .ok_or_else(|| corrupt("invalid length in header"))?;
        let payload = content.slice(nul + 1..);

        if payload.len() != declared_len {
            return Err(corrupt(&format!(
                "header declares {declared_len} bytes, found {}",
                payload.len()
            )));
        }

        Ok((object_type, payload))
    }

    fn read_object(&self, object_id: &ObjectId, object_path: &Path) -> anyhow::Result<Bytes> {
        let object_content = match std::fs::read(object_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::ObjectNotFound(object_id.to_string()).into());
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Unable to read object file {}",
                    object_path.display()
                ));
            }
        };

        Self::decompress(object_content.into()).map_err(|e| {
            RepositoryError::CorruptObject(format!("{object_id}: {e}")).into()
        })
    }

    fn write_object(&self, object_path: &PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(&object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        let mut permissions = file.metadata()?.permissions();
        permissions.set_readonly(true);
        file.set_permissions(permissions)?;
        drop(file);

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}-{}", std::process::id(), rand::random::<u32>())
    }

    /// Find all objects whose ID starts with the given hex prefix.
    ///
    /// Used to resolve abbreviated IDs. More than one match means the prefix
    /// is ambiguous; the caller decides how to report that.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = Vec::new();

        if prefix.len() < 2 || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(matches);
        }

        let (dir_name, file_prefix) = prefix.split_at(2);
        let dir_path = self.path.join(dir_name);

        if dir_path.is_dir() {
            for entry in std::fs::read_dir(&dir_path)? {
                let file_name = entry?.file_name();
                let file_name_str = file_name.to_string_lossy();

                if file_name_str.starts_with(file_prefix)
                    && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name_str}"))
                {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }
}
