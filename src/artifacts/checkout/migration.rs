use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Everything needed to materialize one tree: the directories to create and
/// the leaves to write, planned before the filesystem is touched.
pub struct Migration<'r> {
    database: &'r Database,
    workspace: Workspace,
    mkdirs: BTreeSet<PathBuf>,
    files: Vec<(PathBuf, DatabaseEntry)>,
}

impl<'r> Migration<'r> {
    /// Walk `tree_oid` and record what it takes to recreate it under the workspace root.
    pub fn plan(database: &'r Database, workspace: Workspace, tree_oid: &ObjectId) -> anyhow::Result<Self> {
        let mut mkdirs = BTreeSet::new();
        let mut files = Vec::new();

        for entry in database.walk(tree_oid)? {
            let entry = entry?;
            ensure_contained(&entry.path)?;
            if entry.is_tree() {
                mkdirs.insert(entry.path);
            } else {
                files.push((entry.path, DatabaseEntry::new(entry.oid, entry.mode)));
            }
        }

        Ok(Migration {
            database,
            workspace,
            mkdirs,
            files,
        })
    }

    pub fn mkdirs(&self) -> &BTreeSet<PathBuf> {
        &self.mkdirs
    }

    pub fn files(&self) -> &[(PathBuf, DatabaseEntry)] {
        &self.files
    }

    /// Directories first, parents before children, then every leaf.
    pub fn apply_changes(&self) -> anyhow::Result<usize> {
        for dir in &self.mkdirs {
            self.workspace.make_directory(dir)?;
        }

        for (path, entry) in &self.files {
            // gitlinks name a commit in another repository
            let data = match entry.mode {
                EntryMode::Gitlink => Vec::new(),
                _ => self.load_blob_data(&entry.oid)?,
            };
            self.workspace
                .write_file(path, &data, entry.mode)
                .with_context(|| format!("Unable to check out {}", path.display()))?;
            tracing::debug!(path = %path.display(), mode = %entry.mode, "checked out");
        }

        Ok(self.files.len())
    }

    fn load_blob_data(&self, oid: &ObjectId) -> anyhow::Result<Vec<u8>> {
        let blob = self
            .database
            .parse_object_as_blob(oid)?
            .with_context(|| format!("Object {oid} is not a blob"))?;

        Ok(blob.content().to_vec())
    }
}

/// Every planned path must land below the workspace root.
fn ensure_contained(path: &Path) -> anyhow::Result<()> {
    if path.components().all(|component| matches!(component, Component::Normal(_))) {
        return Ok(());
    }

    Err(RepositoryError::CorruptObject(format!(
        "tree entry {} points outside the checkout",
        path.display()
    ))
    .into())
}
