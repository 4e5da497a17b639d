//! References (HEAD, branches, tags)
//!
//! A ref file holds either a 40-hex object id (direct) or `ref: <name>`
//! (symbolic). Symbolic chains are followed for at most `MAX_SYMREF_DEPTH`
//! hops and never loop: a revisited name fails with `RefCycle`.
//!
//! ## Updates
//!
//! Every write goes through `<ref>.lock`, renamed over the ref file once the new
//! content is complete, so readers see either the old or the new value.

use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::branch::{HEADS_PREFIX, TAGS_PREFIX};
use crate::artifacts::core::lockfile::LockFile;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Symbolic hops allowed while resolving, as in git.
pub const MAX_SYMREF_DEPTH: usize = 5;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Content of a single ref file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    Symbolic(String),
    Direct(ObjectId),
}

impl RefValue {
    fn parse(name: &str, content: &str) -> anyhow::Result<Self> {
        let content = content.trim_end();

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            return Ok(RefValue::Symbolic(symref_match[1].trim().to_string()));
        }

        ObjectId::try_parse(content.to_string())
            .map(RefValue::Direct)
            .map_err(|_| {
                RepositoryError::InvalidRepositoryState(format!(
                    "ref {name} has malformed content {content:?}"
                ))
                .into()
            })
    }
}

#[derive(Debug)]
pub struct Refs {
    /// Path to the metadata directory (typically `.git`)
    path: Box<Path>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs { path }
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.path.join(HEADS_PREFIX).into_boxed_path()
    }

    pub fn tags_path(&self) -> Box<Path> {
        self.path.join(TAGS_PREFIX).into_boxed_path()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path.join(name).is_file()
    }

    /// One level of a ref: its raw value, or `None` when the file is absent.
    pub fn read(&self, name: &str) -> anyhow::Result<Option<RefValue>> {
        let ref_path = self.path.join(name);

        match std::fs::read_to_string(&ref_path) {
            Ok(content) => RefValue::parse(name, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            // `refs/heads` itself, or a name shadowed by a directory
            Err(_) if ref_path.is_dir() => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read ref file at {ref_path:?}")),
        }
    }

    /// Resolve a ref name (or a full hex id, returned as is) to an object id.
    ///
    /// Existence of the resulting object is not checked here.
    pub fn resolve(&self, name: &str) -> anyhow::Result<ObjectId> {
        if ObjectId::is_full_hex(name) {
            return ObjectId::try_parse(name.to_string());
        }

        let final_name = self.follow_symbolic(name)?;
        match self.read(&final_name)? {
            Some(RefValue::Direct(oid)) => Ok(oid),
            _ => Err(RepositoryError::DanglingRef(final_name).into()),
        }
    }

    /// Follow symbolic refs from `name` to the last name in the chain, which
    /// either holds an object id or does not exist yet.
    pub fn follow_symbolic(&self, name: &str) -> anyhow::Result<String> {
        let mut seen = vec![name.to_string()];

        loop {
            let current = seen.last().map(String::as_str).unwrap_or(name);

            match self.read(current)? {
                Some(RefValue::Symbolic(target)) => {
                    if seen.contains(&target) || seen.len() > MAX_SYMREF_DEPTH {
                        return Err(RepositoryError::RefCycle(name.to_string()).into());
                    }
                    seen.push(target);
                }
                Some(RefValue::Direct(_)) | None => return Ok(current.to_string()),
            }
        }
    }

    /// Branch HEAD points at, by short name; `None` when HEAD is detached.
    pub fn current_branch(&self) -> anyhow::Result<Option<String>> {
        match self.read(HEAD_REF_NAME)? {
            Some(RefValue::Symbolic(target)) => Ok(Some(
                target
                    .strip_prefix(HEADS_PREFIX)
                    .unwrap_or(&target)
                    .to_string(),
            )),
            Some(RefValue::Direct(_)) => Ok(None),
            None => Err(RepositoryError::InvalidRepositoryState("HEAD is missing".into()).into()),
        }
    }

    /// HEAD's object id, or `None` before the first commit.
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        match self.resolve(HEAD_REF_NAME) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if matches!(RepositoryError::classify(&e), Some(RepositoryError::DanglingRef(_))) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Point `name` directly at `oid`.
    pub fn update(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref(name, &format!("{oid}\n"))?;
        tracing::debug!(name, %oid, "updated ref");

        Ok(())
    }

    /// Move whatever HEAD stands for: the branch it names (created if needed),
    /// or HEAD itself when detached.
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        let target = self.follow_symbolic(HEAD_REF_NAME)?;
        self.update(&target, oid)
    }

    /// Attach HEAD to `target`, e.g. `refs/heads/master`.
    pub fn set_head_symbolic(&self, target: &RefName) -> anyhow::Result<()> {
        self.write_ref(HEAD_REF_NAME, &format!("ref: {target}\n"))
    }

    /// Create a new ref; an existing one is never overwritten.
    pub fn create(&self, name: &RefName, oid: &ObjectId) -> anyhow::Result<()> {
        if self.exists(name.as_ref()) {
            anyhow::bail!("ref '{}' already exists", name.short_name());
        }

        self.update(name.as_ref(), oid)
    }

    fn write_ref(&self, name: &str, content: &str) -> anyhow::Result<()> {
        if name != HEAD_REF_NAME {
            RefName::try_parse(name)?;
        }

        let ref_path = self.path.join(name);
        std::fs::create_dir_all(
            ref_path
                .parent()
                .with_context(|| format!("invalid ref path {ref_path:?}"))?,
        )?;

        let mut lock = LockFile::acquire(&ref_path)?;
        lock.write_all(content.as_bytes())?;
        lock.commit()
    }

    /// Look a short name up the way revisions do: as given, then under
    /// `refs/tags/`, then under `refs/heads/`. `None` if no such ref file exists.
    pub fn lookup(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        [
            name.to_string(),
            format!("{TAGS_PREFIX}{name}"),
            format!("{HEADS_PREFIX}{name}"),
        ]
        .into_iter()
        .find(|candidate| self.exists(candidate))
        .map(|candidate| self.resolve(&candidate))
        .transpose()
    }

    /// Every ref under `refs/` with its resolved id, sorted by name.
    /// Refs that do not resolve are skipped with a warning.
    pub fn list(&self) -> anyhow::Result<Vec<(String, ObjectId)>> {
        let mut names = WalkDir::new(self.refs_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                let name = relative_path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                (!name.ends_with(".lock")).then_some(name)
            })
            .collect::<Vec<_>>();
        names.sort();

        let mut refs = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve(&name) {
                Ok(oid) => refs.push((name, oid)),
                Err(e)
                    if matches!(
                        RepositoryError::classify(&e),
                        Some(RepositoryError::DanglingRef(_) | RepositoryError::RefCycle(_))
                    ) =>
                {
                    tracing::warn!(name, error = %e, "skipping unresolvable ref");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(refs)
    }
}
