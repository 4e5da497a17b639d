//! Working tree status
//!
//! Two independent comparisons, reported separately:
//!
//! - staged: HEAD tree vs index (`Index::diff_against_tree`)
//! - unstaged: index vs working tree (`inspector`), stat data first, content hash second
//!
//! plus the untracked paths found by scanning the working tree.

pub mod inspector;
pub mod status_info;
