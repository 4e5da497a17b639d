//! Working tree access
//!
//! Paths handed in and out are relative to the workspace root. The metadata
//! directory (`.git`) is never listed.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 1] = [".git"];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| match component {
            std::path::Component::Normal(name) => IGNORED_PATHS.iter().any(|ignored| name == *ignored),
            _ => false,
        })
    }

    fn relative(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(self.path.as_ref()).ok()?;
        (!Self::is_ignored(relative)).then(|| relative.to_path_buf())
    }

    /// Direct children of a directory (the root when `dir_path` is `None`), sorted.
    pub fn list_dir(&self, dir_path: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let dir_path = match dir_path {
            Some(p) => self.path.join(p),
            None => self.path.to_path_buf(),
        };

        let mut children = std::fs::read_dir(&dir_path)
            .with_context(|| format!("Unable to list directory {}", dir_path.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| self.relative(&entry.path()))
            .collect::<Vec<_>>();
        children.sort();

        Ok(children)
    }

    /// Every file and symlink below `root` (the whole workspace by default), sorted.
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root = match root {
            Some(p) => self.path.join(p),
            None => self.path.to_path_buf(),
        };

        let metadata = std::fs::symlink_metadata(&root)
            .with_context(|| format!("pathspec '{}' did not match any files", root.display()))?;
        if !metadata.is_dir() {
            return Ok(self.relative(&root).into_iter().collect());
        }

        let mut files = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry.path().strip_prefix(&root).unwrap_or(entry.path())))
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(|entry| self.relative(entry.path()))
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    /// Whether a directory holds at least one file somewhere below it.
    pub fn contains_files(&self, dir_path: &Path) -> bool {
        WalkDir::new(self.path.join(dir_path))
            .into_iter()
            .filter_map(|entry| entry.ok())
            .any(|entry| !entry.file_type().is_dir())
    }

    /// Content as it would be stored in a blob: file bytes, or the link
    /// target for a symbolic link.
    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Vec<u8>> {
        use std::os::unix::ffi::OsStrExt;

        let full_path = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("Unable to stat {}", file_path.display()))?;

        if metadata.is_symlink() {
            let target = std::fs::read_link(&full_path)?;
            return Ok(target.as_os_str().as_bytes().to_vec());
        }

        std::fs::read(&full_path).with_context(|| format!("Unable to read {}", file_path.display()))
    }

    /// Stat data without following symlinks; `None` if the path is gone.
    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<Option<EntryMetadata>> {
        let full_path = self.path.join(file_path);

        match std::fs::symlink_metadata(&full_path) {
            Ok(metadata) => EntryMetadata::try_from((full_path.as_path(), metadata)).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            // a parent turned into a file
            Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Unable to stat {}", file_path.display())),
        }
    }

    pub fn make_directory(&self, dir_path: &Path) -> anyhow::Result<()> {
        let full_path = self.path.join(dir_path);
        std::fs::create_dir_all(&full_path)
            .with_context(|| format!("Unable to create directory {}", full_path.display()))
    }

    /// Materialize a blob at `file_path` with the permissions of `mode`.
    pub fn write_file(&self, file_path: &Path, data: &[u8], mode: EntryMode) -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let full_path = self.path.join(file_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match mode {
            EntryMode::Symlink => {
                use std::os::unix::ffi::OsStrExt;
                let target = std::ffi::OsStr::from_bytes(data);
                std::os::unix::fs::symlink(target, &full_path)
                    .with_context(|| format!("Unable to create symlink {}", file_path.display()))?;
            }
            EntryMode::File(file_mode) => {
                let mut file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&full_path)
                    .with_context(|| format!("Unable to create file {}", file_path.display()))?;
                file.write_all(data)?;

                let permissions = match file_mode {
                    FileMode::Regular => 0o644,
                    FileMode::Executable => 0o755,
                };
                std::fs::set_permissions(&full_path, std::fs::Permissions::from_mode(permissions))
                    .with_context(|| format!("Unable to set permissions on {}", file_path.display()))?;
            }
            EntryMode::Gitlink | EntryMode::Directory => self.make_directory(file_path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        dir.child("b.txt").write_str("b").unwrap();
        dir.child("a/z.txt").write_str("z").unwrap();
        dir.child(".git/HEAD").write_str("ref: refs/heads/master\n").unwrap();
        dir.child("empty").create_dir_all().unwrap();
        dir
    }

    #[rstest]
    fn list_files_skips_metadata_dir(dir: TempDir) {
        let workspace = Workspace::new(dir.path().into());

        assert_eq!(
            workspace.list_files(None).unwrap(),
            vec![PathBuf::from("a/z.txt"), PathBuf::from("b.txt")]
        );
    }

    #[rstest]
    fn list_dir_is_shallow(dir: TempDir) {
        let workspace = Workspace::new(dir.path().into());

        assert_eq!(
            workspace.list_dir(None).unwrap(),
            vec![PathBuf::from("a"), PathBuf::from("b.txt"), PathBuf::from("empty")]
        );
        assert!(workspace.contains_files(Path::new("a")));
        assert!(!workspace.contains_files(Path::new("empty")));
    }

    #[rstest]
    fn write_file_restores_modes(dir: TempDir) {
        let workspace = Workspace::new(dir.path().into());

        workspace
            .write_file(Path::new("bin/run"), b"#!/bin/sh\n", EntryMode::File(FileMode::Executable))
            .unwrap();
        workspace
            .write_file(Path::new("link"), b"b.txt", EntryMode::Symlink)
            .unwrap();

        let run = workspace.stat_file(Path::new("bin/run")).unwrap().unwrap();
        let link = workspace.stat_file(Path::new("link")).unwrap().unwrap();
        assert_eq!(run.mode, EntryMode::File(FileMode::Executable));
        assert_eq!(link.mode, EntryMode::Symlink);
        assert_eq!(workspace.read_file(Path::new("link")).unwrap(), b"b.txt".to_vec());
    }

    #[rstest]
    fn missing_file_has_no_stat(dir: TempDir) {
        let workspace = Workspace::new(dir.path().into());

        assert!(workspace.stat_file(Path::new("nope")).unwrap().is_none());
        assert!(workspace.stat_file(Path::new("b.txt/child")).unwrap().is_none());
    }
}
