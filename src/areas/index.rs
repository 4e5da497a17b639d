//! Index (staging area)
//!
//! The index records what the next commit's tree will contain. It is loaded
//! whole into memory, mutated, and written back as a fresh file through
//! `index.lock`; the file on disk is never edited in place.
//!
//! ## Index File Format
//!
//! - Header: signature, version and entry count
//! - Entries: sorted bytewise by `/`-separated path
//! - Checksum: SHA-1 of everything before it
//!
//! ## Data Structures
//!
//! - `entries`: tracked files keyed by path
//! - `children`: directory -> tracked descendants, for file/directory replacement

use crate::areas::database::Database;
use crate::artifacts::core::lockfile::LockFile;
use crate::artifacts::diff::ChangeKind;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    ENTRY_BLOCK, ENTRY_MIN_SIZE, EntryMetadata, IndexEntry, path_key,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::tree_builder::TreeBuilder;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    entries: BTreeMap<String, IndexEntry>,
    children: BTreeMap<Box<Path>, BTreeSet<Box<Path>>>,
    /// Set when the in-memory state differs from what was loaded
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Take `index.lock`. Hold it across load, mutation and `write_updates`
    /// so no other writer can interleave.
    pub fn lock(&self) -> anyhow::Result<LockFile> {
        LockFile::acquire(&self.path)
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        path_key(path)
            .ok()
            .and_then(|key| self.entries.get(&key))
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = false;
    }

    /// Load the index from disk. A missing or empty file is an empty index.
    ///
    /// # Locking
    ///
    /// Holds a shared lock on the index file while reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();

        let mut index_file = match std::fs::File::open(self.path()) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).context(format!("Unable to open index {}", self.path.display()));
            }
        };

        let mut content = Vec::new();
        {
            let mut guard = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;
            guard.deref_mut().read_to_end(&mut content)?;
        }

        if content.is_empty() {
            return Ok(());
        }

        let mut reader = Checksum::new(content.as_slice());
        let entries_count = Self::parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;
        reader.verify()?;

        tracing::debug!(entries = self.entries.len(), "loaded index");
        Ok(())
    }

    fn parse_header(reader: &mut Checksum<&[u8]>) -> anyhow::Result<u32> {
        let header = IndexHeader::deserialize(reader.read(HEADER_SIZE)?)?;
        Ok(header.entries_count)
    }

    /// Entries are variable length: read the fixed part, then whole blocks
    /// until one ends in the path's NUL padding.
    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum<&[u8]>) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(entry_bytes.into())?;
            let key = entry.key()?;
            if self.entries.contains_key(&key) {
                return Err(RepositoryError::PathConflict(entry.name).into());
            }

            self.store_entry(key, entry);
        }

        Ok(())
    }

    pub fn is_directly_tracked(&self, path: &Path) -> bool {
        self.entry_by_path(path).is_some() || self.children.contains_key(path)
    }

    /// Remove entries that would clash with `entry`: a file where one of its
    /// parent directories should be, or files below a path that becomes a file.
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, key: String, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_path_buf().into_boxed_path())
                .or_default()
                .insert(entry.name.clone().into_boxed_path());
        }

        self.entries.insert(key, entry);
    }

    fn remove_children(&mut self, path_name: &Path) {
        if let Some(children) = self.children.remove(path_name) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path_name: &Path) -> bool {
        let Some(entry) = path_key(path_name)
            .ok()
            .and_then(|key| self.entries.remove(&key))
        else {
            return false;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path_name);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }

        true
    }

    /// Insert or replace an entry, evicting file/directory conflicts like `git add`.
    pub fn add(&mut self, entry: IndexEntry) -> anyhow::Result<()> {
        let key = entry.key()?;
        if key.is_empty() || entry.name.is_absolute() {
            anyhow::bail!("Invalid index path {}", entry.name.display());
        }

        self.discard_conflicts(&entry);
        self.store_entry(key, entry);
        self.changed = true;

        Ok(())
    }

    /// Store `contents` as a blob and stage it under `path` with the given stat data.
    pub fn stage(
        &mut self,
        database: &Database,
        path: &Path,
        contents: &[u8],
        metadata: EntryMetadata,
    ) -> anyhow::Result<ObjectId> {
        let oid = database.store(&Blob::from(contents))?;
        self.add(IndexEntry::new(path.to_path_buf(), oid.clone(), metadata))?;

        Ok(oid)
    }

    /// Untrack a file, or every file below a directory; the empty path is
    /// the workspace root. Returns the untracked paths in order. The working
    /// tree is left alone.
    pub fn remove(&mut self, path: &Path) -> Vec<PathBuf> {
        let matched = self
            .entries()
            .filter(|entry| entry.name.starts_with(path))
            .map(|entry| entry.name.clone())
            .collect::<Vec<_>>();

        for name in &matched {
            self.remove_entry(name);
        }

        self.changed |= !matched.is_empty();
        matched
    }

    /// Replace the whole index with the blobs of a stored tree.
    pub fn read_tree(&mut self, database: &Database, tree_oid: &ObjectId) -> anyhow::Result<()> {
        let leaves = database.walk(tree_oid)?.flatten()?;

        self.clear();
        for (path, entry) in leaves {
            self.add(IndexEntry::from_tree(path, entry.oid, entry.mode))?;
        }
        self.changed = true;

        Ok(())
    }

    /// Compare staged content with a tree (`None` is the empty tree). Every
    /// path on either side is reported, unchanged ones included.
    pub fn diff_against_tree(
        &self,
        database: &Database,
        tree_oid: Option<&ObjectId>,
    ) -> anyhow::Result<Vec<(PathBuf, ChangeKind)>> {
        let mut tree_entries = match tree_oid {
            Some(oid) => database.walk(oid)?.flatten()?,
            None => BTreeMap::new(),
        };

        let mut changes = BTreeMap::new();
        for entry in self.entries() {
            let kind = match tree_entries.remove(&entry.name) {
                None => ChangeKind::Added,
                Some(tree_entry)
                    if tree_entry.oid != entry.oid || tree_entry.mode != entry.metadata.mode =>
                {
                    ChangeKind::Modified
                }
                Some(_) => ChangeKind::Unchanged,
            };
            changes.insert(entry.name.clone(), kind);
        }
        for path in tree_entries.into_keys() {
            changes.insert(path, ChangeKind::Deleted);
        }

        Ok(changes.into_iter().collect())
    }

    /// Tree builder over the staged entries.
    pub fn tree_builder(&self) -> anyhow::Result<TreeBuilder> {
        TreeBuilder::build(self.entries())
    }

    /// Write the in-memory entries into the held lock and move it over the index.
    pub fn write_updates(&mut self, lock: LockFile) -> anyhow::Result<()> {
        anyhow::ensure!(
            lock.target() == self.path(),
            "Lock for {} does not guard the index",
            lock.target().display()
        );

        let mut writer = Checksum::new(lock);
        writer.write(&IndexHeader::for_entries(self.entries.len() as u32).serialize()?)?;

        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?.commit()?;
        self.changed = false;
        tracing::debug!(entries = self.entries.len(), "saved index");

        Ok(())
    }

    pub fn update_entry_stat(&mut self, entry: &IndexEntry, stat: EntryMetadata) {
        let Ok(key) = entry.key() else { return };
        if let Some(existing_entry) = self.entries.get_mut(&key) {
            existing_entry.metadata = EntryMetadata {
                flags: existing_entry.metadata.flags,
                ..stat
            };
            self.changed = true;
        }
    }

    /// Entries in index order (bytewise by path).
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Fixture {
        _dir: TempDir,
        database: Database,
        index: Index,
    }

    #[fixture]
    fn repo() -> Fixture {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let index = Index::new(dir.path().join("index").into_boxed_path());
        Fixture {
            _dir: dir,
            database,
            index,
        }
    }

    fn stat(size: u64) -> EntryMetadata {
        EntryMetadata {
            mode: EntryMode::File(FileMode::Regular),
            size,
            mtime: 1_700_000_000,
            ..Default::default()
        }
    }

    fn paths(index: &Index) -> Vec<String> {
        index.entries().map(|e| e.key().unwrap()).collect()
    }

    #[rstest]
    fn staged_blob_uses_the_canonical_id(mut repo: Fixture) {
        let oid = repo
            .index
            .stage(&repo.database, Path::new("hello.txt"), b"hi\n", stat(3))
            .unwrap();

        assert_eq!(oid, ObjectId::hash(b"blob 3\0hi\n"));
        assert_eq!(repo.index.len(), 1);
        assert!(repo.database.exists(&oid));
    }

    #[rstest]
    fn save_and_reload_preserves_entries(mut repo: Fixture) {
        for name in ["b.txt", "a/z.txt", "a.txt"] {
            repo.index
                .stage(&repo.database, Path::new(name), name.as_bytes(), stat(5))
                .unwrap();
        }
        let lock = repo.index.lock().unwrap();
        repo.index.write_updates(lock).unwrap();

        let mut reloaded = Index::new(repo.index.path().into());
        reloaded.rehydrate().unwrap();

        // bytewise order: '.' sorts before '/'
        assert_eq!(paths(&reloaded), vec!["a.txt", "a/z.txt", "b.txt"]);
        assert!(!repo.index.path().with_file_name("index.lock").exists());
    }

    #[rstest]
    fn held_lock_blocks_a_second_writer(repo: Fixture) {
        let _lock = repo.index.lock().unwrap();

        let error = repo.index.lock().unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::LockHeld(_))
        ));
    }

    #[rstest]
    fn corrupted_file_is_rejected(mut repo: Fixture) {
        repo.index
            .stage(&repo.database, Path::new("a"), b"a", stat(1))
            .unwrap();
        let lock = repo.index.lock().unwrap();
        repo.index.write_updates(lock).unwrap();

        let mut bytes = std::fs::read(repo.index.path()).unwrap();
        bytes[HEADER_SIZE + 40] ^= 0x01;
        std::fs::write(repo.index.path(), bytes).unwrap();

        let error = repo.index.rehydrate().unwrap_err();
        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::InvalidRepositoryState(_))
        ));
    }

    #[rstest]
    fn duplicate_paths_on_disk_conflict(mut repo: Fixture) {
        let entry = IndexEntry::new(PathBuf::from("dup"), ObjectId::hash(b"x"), stat(1));
        let mut writer = Checksum::new(Vec::new());
        writer.write(&IndexHeader::for_entries(2).serialize().unwrap()).unwrap();
        writer.write(&entry.serialize().unwrap()).unwrap();
        writer.write(&entry.serialize().unwrap()).unwrap();
        std::fs::write(repo.index.path(), writer.write_checksum().unwrap()).unwrap();

        let error = repo.index.rehydrate().unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::PathConflict(path)) if path == Path::new("dup")
        ));
    }

    #[rstest]
    fn file_replaces_directory_and_back(mut repo: Fixture) {
        repo.index
            .stage(&repo.database, Path::new("a/b.txt"), b"1", stat(1))
            .unwrap();
        repo.index
            .stage(&repo.database, Path::new("a/c/d.txt"), b"2", stat(1))
            .unwrap();

        repo.index
            .stage(&repo.database, Path::new("a"), b"now a file", stat(10))
            .unwrap();
        assert_eq!(paths(&repo.index), vec!["a"]);

        repo.index
            .stage(&repo.database, Path::new("a/e.txt"), b"3", stat(1))
            .unwrap();
        assert_eq!(paths(&repo.index), vec!["a/e.txt"]);
    }

    #[rstest]
    fn removing_a_directory_untracks_its_files(mut repo: Fixture) {
        for name in ["keep.txt", "dir/a", "dir/sub/b"] {
            repo.index
                .stage(&repo.database, Path::new(name), b"x", stat(1))
                .unwrap();
        }

        assert_eq!(
            repo.index.remove(Path::new("dir")),
            vec![PathBuf::from("dir/a"), PathBuf::from("dir/sub/b")]
        );
        assert!(repo.index.remove(Path::new("missing")).is_empty());
        assert_eq!(paths(&repo.index), vec!["keep.txt"]);
    }

    #[rstest]
    fn removing_the_root_untracks_everything(mut repo: Fixture) {
        for name in ["a.txt", "sub/b.txt"] {
            repo.index
                .stage(&repo.database, Path::new(name), b"x", stat(1))
                .unwrap();
        }

        assert_eq!(repo.index.remove(Path::new("")).len(), 2);
        assert!(repo.index.is_empty());
        assert!(repo.index.is_changed());
    }

    #[rstest]
    fn removing_a_name_prefix_is_not_a_directory_match(mut repo: Fixture) {
        for name in ["dir", "dir2/a"] {
            repo.index
                .stage(&repo.database, Path::new(name), b"x", stat(1))
                .unwrap();
        }

        assert_eq!(repo.index.remove(Path::new("dir")), vec![PathBuf::from("dir")]);
        assert_eq!(paths(&repo.index), vec!["dir2/a"]);
    }

    #[rstest]
    fn diff_against_tree_covers_every_kind(mut repo: Fixture) {
        for (name, content) in [("same", "s"), ("edit", "v1"), ("gone", "g")] {
            repo.index
                .stage(&repo.database, Path::new(name), content.as_bytes(), stat(1))
                .unwrap();
        }
        let tree = repo.index.tree_builder().unwrap().write(&repo.database).unwrap();

        repo.index
            .stage(&repo.database, Path::new("edit"), b"v2", stat(2))
            .unwrap();
        repo.index.remove(Path::new("gone"));
        repo.index
            .stage(&repo.database, Path::new("new"), b"n", stat(1))
            .unwrap();

        let diff = repo.index.diff_against_tree(&repo.database, Some(&tree)).unwrap();

        assert_eq!(
            diff,
            vec![
                (PathBuf::from("edit"), ChangeKind::Modified),
                (PathBuf::from("gone"), ChangeKind::Deleted),
                (PathBuf::from("new"), ChangeKind::Added),
                (PathBuf::from("same"), ChangeKind::Unchanged),
            ]
        );
    }

    #[rstest]
    fn read_tree_round_trips_through_the_builder(mut repo: Fixture) {
        for name in ["x/y/z", "x/w", "top"] {
            repo.index
                .stage(&repo.database, Path::new(name), name.as_bytes(), stat(3))
                .unwrap();
        }
        let tree = repo.index.tree_builder().unwrap().write(&repo.database).unwrap();

        let mut rebuilt = Index::new(repo.index.path().into());
        rebuilt.read_tree(&repo.database, &tree).unwrap();

        assert_eq!(paths(&rebuilt), paths(&repo.index));
        assert!(rebuilt.entries().all(|entry| entry.metadata.size == 0));
        assert_eq!(rebuilt.tree_builder().unwrap().object_id().unwrap(), tree);
    }
}
