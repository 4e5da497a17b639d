use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::ChangeKind;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// A blob-level difference, with the entries on each side.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeChange {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified { old: DatabaseEntry, new: DatabaseEntry },
}

impl TreeChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            TreeChange::Added(_) => ChangeKind::Added,
            TreeChange::Deleted(_) => ChangeKind::Deleted,
            TreeChange::Modified { .. } => ChangeKind::Modified,
        }
    }
}

pub type ChangeSet = BTreeMap<PathBuf, TreeChange>;
type Level = BTreeMap<String, DatabaseEntry>;

/// Blob-level differences between two trees.
///
/// Subtrees with equal ids are skipped without being read. A path that is a
/// file on one side and a directory on the other shows up as the file being
/// deleted (or added) plus every blob under the directory being added (or deleted).
#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    /// `(path, kind)` pairs in path order.
    pub fn summary(&self) -> Vec<(PathBuf, ChangeKind)> {
        self.change_set
            .iter()
            .map(|(path, change)| (path.clone(), change.kind()))
            .collect()
    }

    /// Compare two tree-ish ids (commits are followed to their tree); `None` is the empty tree.
    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        if old == new {
            return Ok(());
        }

        let old_level = self.read_level(old)?;
        let new_level = self.read_level(new)?;
        let names = old_level.keys().chain(new_level.keys()).collect::<BTreeSet<_>>();

        for name in names {
            let before = old_level.get(name);
            let after = new_level.get(name);
            if before == after {
                continue;
            }

            let path = prefix.join(name);
            let subtree = |entry: Option<&DatabaseEntry>| {
                entry.filter(|entry| entry.is_tree()).map(|entry| entry.oid.clone())
            };
            let (old_subtree, new_subtree) = (subtree(before), subtree(after));
            if old_subtree.is_some() || new_subtree.is_some() {
                self.compare_oids(old_subtree.as_ref(), new_subtree.as_ref(), &path)?;
            }

            let blob = |entry: Option<&DatabaseEntry>| entry.filter(|entry| !entry.is_tree()).cloned();
            let change = match (blob(before), blob(after)) {
                (None, Some(new)) => TreeChange::Added(new),
                (Some(old), None) => TreeChange::Deleted(old),
                // entries compare both object id and mode
                (Some(old), Some(new)) if old != new => TreeChange::Modified { old, new },
                _ => continue,
            };
            self.change_set.insert(path, change);
        }

        Ok(())
    }

    fn read_level(&self, oid: Option<&ObjectId>) -> anyhow::Result<Level> {
        let Some(oid) = oid else {
            return Ok(Level::new());
        };

        let tree_oid = self.database.peel(oid, ObjectType::Tree)?;
        let tree = self
            .database
            .parse_object_as_tree(&tree_oid)?
            .ok_or_else(|| anyhow::anyhow!("object {tree_oid} is not a tree"))?;

        Ok(tree.into_entries().collect())
    }
}
