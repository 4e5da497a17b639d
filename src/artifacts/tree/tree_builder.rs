//! Nested tree construction from flat index entries
//!
//! Grouping is purely structural: `a/b/c.txt` lands in tree `b` inside tree `a`
//! inside the root, whatever the working tree currently looks like. Trees are
//! written deepest first since a parent's payload embeds its children's ids.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone)]
enum BuildNode {
    Leaf(DatabaseEntry),
    Directory(TreeBuilder),
}

#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    entries: BTreeMap<String, BuildNode>,
}

impl TreeBuilder {
    /// Group entries into nested directories. The result does not depend on the
    /// order the entries arrive in.
    pub fn build<'e>(entries: impl IntoIterator<Item = &'e IndexEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let parents = entry.parent_dirs();
            root.add_entry(&parents, entry)?;
        }

        Ok(root)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add_entry(&mut self, parents: &[&Path], entry: &IndexEntry) -> anyhow::Result<()> {
        let conflict = || RepositoryError::PathConflict(entry.name.clone());

        match parents.split_first() {
            None => {
                let name = entry.basename()?.to_string();
                if self.entries.contains_key(&name) {
                    return Err(conflict().into());
                }
                self.entries.insert(
                    name,
                    BuildNode::Leaf(DatabaseEntry::new(entry.oid.clone(), entry.metadata.mode)),
                );
            }
            Some((parent, rest)) => {
                let dir_name = parent
                    .file_name()
                    .and_then(|s| s.to_str())
                    .context("Invalid parent directory")?
                    .to_string();

                let node = self
                    .entries
                    .entry(dir_name)
                    .or_insert_with(|| BuildNode::Directory(TreeBuilder::default()));
                match node {
                    BuildNode::Directory(subtree) => subtree.add_entry(rest, entry)?,
                    BuildNode::Leaf(_) => return Err(conflict().into()),
                }
            }
        }

        Ok(())
    }

    /// Store every tree, children before parents, and return the root tree id.
    pub fn write(&self, database: &Database) -> anyhow::Result<ObjectId> {
        let tree = self.to_tree(&mut |tree| database.store(tree))?;
        database.store(&tree)
    }

    /// Root tree id without touching the database.
    pub fn object_id(&self) -> anyhow::Result<ObjectId> {
        self.to_tree(&mut |tree| tree.object_id())?.object_id()
    }

    /// Materialize this level, handing each subtree to `store` first.
    fn to_tree<F>(&self, store: &mut F) -> anyhow::Result<Tree>
    where
        F: FnMut(&Tree) -> anyhow::Result<ObjectId>,
    {
        let mut tree = Tree::default();

        for (name, node) in &self.entries {
            let entry = match node {
                BuildNode::Leaf(entry) => entry.clone(),
                BuildNode::Directory(subtree) => {
                    let child = subtree.to_tree(store)?;
                    DatabaseEntry::new(store(&child)?, EntryMode::Directory)
                }
            };
            tree.insert(name.clone(), entry)
                .with_context(|| format!("Unable to add {name} to tree"))?;
        }

        Ok(tree)
    }
}
