//! Data structures and algorithms behind the repository areas
//!
//! - `branch`: ref names and revision expressions
//! - `checkout`: materializing a tree into an empty directory
//! - `core`: lock files and the pager writer
//! - `database`: tree entry type shared by trees, walks and diffs
//! - `diff`: structural tree comparison
//! - `index`: on-disk index format (header, entries, checksum)
//! - `log`: first-parent history traversal
//! - `objects`: object ids, types and the four object kinds
//! - `status`: working tree status
//! - `tree`: building and walking trees

pub mod branch;
pub mod checkout;
pub mod core;
pub mod database;
pub mod diff;
pub mod index;
pub mod log;
pub mod objects;
pub mod status;
pub mod tree;
