//! Materializing a tree into a directory
//!
//! Checkout never merges: the destination must be missing or empty, and is
//! filled from scratch.
//!
//! - `migration`: plans the directories and files of a tree, then writes them

pub mod migration;

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::path::Path;

/// Write the tree behind `tree_oid` (commits are followed to their tree) into
/// `destination`. Returns the number of files written.
pub fn checkout(database: &Database, tree_oid: &ObjectId, destination: &Path) -> anyhow::Result<usize> {
    match std::fs::symlink_metadata(destination) {
        Ok(metadata) if metadata.is_dir() => {
            let populated = std::fs::read_dir(destination)?.next().is_some();
            if populated {
                return Err(RepositoryError::UnsafeCheckout(destination.to_path_buf()).into());
            }
        }
        Ok(_) => return Err(RepositoryError::UnsafeCheckout(destination.to_path_buf()).into()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            std::fs::create_dir_all(destination)
                .with_context(|| format!("Unable to create {}", destination.display()))?;
        }
        Err(e) => return Err(e.into()),
    }

    let workspace = Workspace::new(destination.into());
    let migration = Migration::plan(database, workspace, tree_oid)?;
    migration.apply_changes()
}
