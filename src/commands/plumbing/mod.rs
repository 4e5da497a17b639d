//! Plumbing commands
//!
//! Direct access to objects, the index and refs; output is meant for scripts.

pub mod cat_file;
pub mod hash_object;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod show_ref;
