//! Repository areas
//!
//! Each area owns one part of the on-disk layout under the metadata directory
//! or the working tree:
//!
//! - `config`: the INI `config` file and its format version
//! - `database`: loose object store (`objects/`)
//! - `index`: staging area (`index`)
//! - `refs`: HEAD, branches and tags (`HEAD`, `refs/`)
//! - `repository`: opening, finding and initializing a repository
//! - `workspace`: working tree file system access

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
