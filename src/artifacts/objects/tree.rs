//! Tree object
//!
//! Trees are directory snapshots: a sorted list of named entries, each pointing
//! at a blob, another tree, or (for submodules) a commit.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! ## Ordering
//!
//! Entries are sorted bytewise by name, where a directory sorts as if its name
//! ended in `/`. Entries are keyed by that sort key internally, so iteration
//! order is always the serialization order.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use bytes::{Buf, Bytes};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

fn sort_key(name: &str, mode: &EntryMode) -> String {
    if mode.is_tree() {
        format!("{name}/")
    } else {
        name.to_string()
    }
}

/// A name that stays a single component inside the directory it is written to.
pub fn is_valid_entry_name(name: &str) -> bool {
    !(name.is_empty()
        || name == "."
        || name == ".."
        || name.eq_ignore_ascii_case(".git")
        || name.contains(['/', '\0']))
}

fn corrupt(reason: impl Into<String>) -> anyhow::Error {
    RepositoryError::CorruptObject(format!("malformed tree: {}", reason.into())).into()
}

impl Tree {
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, DatabaseEntry)>,
    ) -> anyhow::Result<Self> {
        let mut tree = Self::default();
        for (name, entry) in entries {
            tree.insert(name, entry)?;
        }

        Ok(tree)
    }

    /// Add an entry; a name may appear only once regardless of its mode.
    pub fn insert(&mut self, name: String, entry: DatabaseEntry) -> anyhow::Result<()> {
        if !is_valid_entry_name(&name) {
            anyhow::bail!("invalid tree entry name {name:?}");
        }
        if self.get(&name).is_some() {
            return Err(RepositoryError::PathConflict(PathBuf::from(name)).into());
        }

        self.entries.insert(sort_key(&name, &entry.mode), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(&format!("{name}/")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in serialization order, with plain names.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &DatabaseEntry)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.trim_end_matches('/'), entry))
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter().map(|(mut key, entry)| {
            if entry.is_tree() {
                key.pop();
            }
            (key, entry)
        })
    }

    /// `ls-tree` style listing, one entry per line.
    pub fn display(&self) -> String {
        self.entries()
            .map(|(name, entry)| {
                format!(
                    "{} {} {}\t{}",
                    entry.mode,
                    entry.mode.object_kind(),
                    entry.oid,
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (name, entry) in self.entries() {
            write!(content_bytes, "{} {}", entry.mode.as_str(), name)?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        Ok(Bytes::from(content_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = payload.reader();
        let mut previous_key: Option<String> = None;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(corrupt("unexpected EOF in mode"));
            }

            let mode_str = std::str::from_utf8(&mode_bytes).map_err(|_| corrupt("mode is not ASCII"))?;
            let mode = EntryMode::from_octal_str(mode_str).map_err(|e| corrupt(e.to_string()))?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(corrupt("unexpected EOF in name"));
            }
            let name = std::str::from_utf8(&name_bytes)
                .map_err(|_| corrupt("entry name is not UTF-8"))?
                .to_owned();
            if !is_valid_entry_name(&name) {
                return Err(corrupt(format!("invalid entry name {name:?}")));
            }

            let oid = ObjectId::read_h40_from(&mut reader)
                .map_err(|_| corrupt("unexpected EOF in object id"))?;

            let key = sort_key(&name, &mode);
            if previous_key.as_ref().is_some_and(|previous| *previous >= key) {
                return Err(corrupt(format!("entry {name:?} is out of order")));
            }
            previous_key = Some(key.clone());

            entries.insert(key, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        ObjectId::hash(b"blob 0\0")
    }

    fn file(oid: &ObjectId) -> DatabaseEntry {
        DatabaseEntry::new(oid.clone(), EntryMode::File(FileMode::Regular))
    }

    fn dir(oid: &ObjectId) -> DatabaseEntry {
        DatabaseEntry::new(oid.clone(), EntryMode::Directory)
    }

    #[rstest]
    fn directories_sort_as_if_suffixed_with_slash(oid: ObjectId) {
        // "foo.txt" < "foo/" because '.' (0x2e) < '/' (0x2f), while "foo0" > "foo/"
        let tree = Tree::from_entries([
            ("foo0".to_string(), file(&oid)),
            ("foo".to_string(), dir(&oid)),
            ("foo.txt".to_string(), file(&oid)),
        ])
        .unwrap();

        let names = tree.entries().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, vec!["foo.txt", "foo", "foo0"]);
    }

    #[rstest]
    fn round_trip_preserves_entries(oid: ObjectId) {
        let tree = Tree::from_entries([
            ("a".to_string(), dir(&oid)),
            ("b.txt".to_string(), file(&oid)),
            (
                "run.sh".to_string(),
                DatabaseEntry::new(oid.clone(), EntryMode::File(FileMode::Executable)),
            ),
        ])
        .unwrap();

        let decoded = Tree::deserialize(tree.serialize().unwrap()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[rstest]
    fn serialized_entry_layout(oid: ObjectId) {
        let tree = Tree::from_entries([("a".to_string(), dir(&oid))]).unwrap();

        let mut expected = b"40000 a\0".to_vec();
        oid.write_h40_to(&mut expected).unwrap();
        assert_eq!(tree.serialize().unwrap().to_vec(), expected);
    }

    #[rstest]
    #[case::parent("..")]
    #[case::current(".")]
    #[case::metadata(".git")]
    #[case::metadata_upper(".GIT")]
    fn names_that_leave_the_directory_are_corrupt(oid: ObjectId, #[case] name: &str) {
        let mut payload = format!("100644 {name}\0").into_bytes();
        oid.write_h40_to(&mut payload).unwrap();

        let error = Tree::deserialize(Bytes::from(payload)).unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::CorruptObject(_))
        ));
        assert!(Tree::from_entries([(name.to_string(), file(&oid))]).is_err());
    }

    #[rstest]
    fn duplicate_names_conflict(oid: ObjectId) {
        let error = Tree::from_entries([
            ("a".to_string(), file(&oid)),
            ("a".to_string(), dir(&oid)),
        ])
        .unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::PathConflict(_))
        ));
    }

    #[rstest]
    fn unsorted_payload_is_corrupt(oid: ObjectId) {
        let mut payload = Vec::new();
        for name in ["b", "a"] {
            payload.extend_from_slice(format!("100644 {name}\0").as_bytes());
            oid.write_h40_to(&mut payload).unwrap();
        }

        let error = Tree::deserialize(Bytes::from(payload)).unwrap_err();
        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::CorruptObject(_))
        ));
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let error = Tree::deserialize(Bytes::from_static(b"100644 a\0abc")).unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::CorruptObject(_))
        ));
    }
}
