//! Object types and their encodings
//!
//! Every piece of content is an object identified by the SHA-1 of its canonical form:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata (tree, parents, author, message)
//! - **Tag**: Annotated, named pointer to another object
//!
//! Canonical form: `<type> <size>\0<payload>`

pub mod blob;
pub mod commit;
pub mod kvlm;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
