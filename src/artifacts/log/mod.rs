//! Commit history traversal
//!
//! - `commit_log`: lazy first-parent walk from a starting commit

pub mod commit_log;
