use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One node visited by a `TreeWalker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub mode: EntryMode,
    pub oid: ObjectId,
}

impl WalkEntry {
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }
}

type Level = (PathBuf, std::vec::IntoIter<(String, DatabaseEntry)>);

/// Lazy pre-order traversal of a stored tree.
///
/// A directory is yielded before its contents and its subtree is only read once
/// the walk reaches it. After the first error the walker yields nothing more.
#[derive(Debug)]
pub struct TreeWalker<'d> {
    database: &'d Database,
    stack: Vec<Level>,
}

impl<'d> TreeWalker<'d> {
    pub fn new(database: &'d Database, tree_oid: &ObjectId) -> anyhow::Result<Self> {
        let mut walker = TreeWalker {
            database,
            stack: Vec::new(),
        };
        walker.descend(PathBuf::new(), tree_oid)?;

        Ok(walker)
    }

    fn descend(&mut self, prefix: PathBuf, tree_oid: &ObjectId) -> anyhow::Result<()> {
        let tree = self
            .database
            .parse_object_as_tree(tree_oid)?
            .ok_or_else(|| anyhow::anyhow!("Object {tree_oid} is not a tree"))?;

        self.stack
            .push((prefix, tree.into_entries().collect::<Vec<_>>().into_iter()));
        Ok(())
    }

    /// Blob (and gitlink) leaves keyed by path; trees themselves are left out.
    pub fn flatten(self) -> anyhow::Result<BTreeMap<PathBuf, DatabaseEntry>> {
        let mut leaves = BTreeMap::new();

        for entry in self {
            let entry = entry?;
            if !entry.is_tree() {
                leaves.insert(entry.path, DatabaseEntry::new(entry.oid, entry.mode));
            }
        }

        Ok(leaves)
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = anyhow::Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, level) = self.stack.last_mut()?;

            let Some((name, entry)) = level.next() else {
                self.stack.pop();
                continue;
            };

            let path = prefix.join(&name);
            if entry.is_tree()
                && let Err(e) = self.descend(path.clone(), &entry.oid)
            {
                self.stack.clear();
                return Some(Err(e));
            }

            return Some(Ok(WalkEntry {
                path,
                mode: entry.mode,
                oid: entry.oid,
            }));
        }
    }
}
