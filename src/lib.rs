//! twig: a small content-addressed version control tool
//!
//! - `areas`: object store, refs, index, config and working tree
//! - `artifacts`: object formats, tree building and walking, status, checkout, history
//! - `commands`: command registry and the command handlers built on the areas
//! - `errors`: typed repository failures

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
