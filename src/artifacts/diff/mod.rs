//! Structural comparison of trees and the index
//!
//! - `tree_diff`: recursive tree-to-tree comparison reporting blob-level changes
//!
//! Diffs report which paths changed, never what changed inside a file.

pub mod tree_diff;

/// How a path differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Added,
    Deleted,
    /// Content ObjectID or mode differs
    Modified,
    Unchanged,
}

impl ChangeKind {
    pub fn status_char(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
            ChangeKind::Unchanged => ' ',
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeKind::Added => "new file",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
            ChangeKind::Unchanged => "unchanged",
        };
        write!(f, "{label}")
    }
}
