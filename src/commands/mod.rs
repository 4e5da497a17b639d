//! Command layer
//!
//! A thin shell over the repository areas. `registry` maps command names to
//! handlers; each handler owns a `clap` argument struct and writes its output
//! to the writer in its `CommandContext`.
//!
//! - `plumbing`: object- and ref-level commands (cat-file, hash-object, ls-files, ls-tree, rev-parse, show-ref)
//! - `porcelain`: everyday workflow commands (init, add, rm, commit, status, log, tag, checkout)

pub mod plumbing;
pub mod porcelain;
pub mod registry;
