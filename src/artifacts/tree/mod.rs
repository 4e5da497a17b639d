//! Tree construction and traversal
//!
//! - `tree_builder`: nested trees from flat index entries, written deepest first
//! - `tree_walker`: lazy, restartable pre-order walk over a stored tree
//!
//! Tree-to-tree comparison lives in `artifacts::diff::tree_diff`.

pub mod tree_builder;
pub mod tree_walker;
