//! Repository context
//!
//! A `Repository` owns its working-tree root and its metadata directory;
//! nothing is shared between instances. Path handling is split in two:
//! `metadata_path` only computes, `ensure_dir` touches the filesystem.

use crate::areas::config::Config;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::{HEAD_REF_NAME, Refs};
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub const GIT_DIR_NAME: &str = ".git";
pub const DEFAULT_BRANCH: &str = "master";

const DESCRIPTION: &str = "Unnamed repository; edit this file 'description' to name the repository.\n";

#[derive(Debug)]
pub struct Repository {
    worktree: Box<Path>,
    git_dir: Box<Path>,
    config: Config,
    database: Database,
    refs: Refs,
    workspace: Workspace,
}

impl Repository {
    /// `<git_dir>/<parts...>`; no I/O.
    pub fn metadata_path(git_dir: &Path, parts: &[&str]) -> PathBuf {
        parts.iter().fold(git_dir.to_path_buf(), |path, part| path.join(part))
    }

    /// Check that `path` is a directory, creating it (and its parents) when
    /// `create_if_missing` is set. A file in the way is always an error.
    pub fn ensure_dir(path: &Path, create_if_missing: bool) -> anyhow::Result<PathBuf> {
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(path.to_path_buf()),
            Ok(_) => anyhow::bail!("{} exists and is not a directory", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && create_if_missing => {
                std::fs::create_dir_all(path)
                    .with_context(|| format!("Unable to create directory {}", path.display()))?;
                Ok(path.to_path_buf())
            }
            Err(e) => Err(e).with_context(|| format!("Missing directory {}", path.display())),
        }
    }

    fn assemble(worktree: Box<Path>, git_dir: Box<Path>, config: Config) -> Self {
        Repository {
            database: Database::new(Self::metadata_path(&git_dir, &["objects"]).into_boxed_path()),
            refs: Refs::new(git_dir.clone()),
            workspace: Workspace::new(worktree.clone()),
            worktree,
            git_dir,
            config,
        }
    }

    /// Open the repository whose working tree is exactly `worktree`.
    pub fn open(worktree: &Path) -> anyhow::Result<Self> {
        let not_found = || RepositoryError::RepositoryNotFound(worktree.to_path_buf());
        let worktree = worktree.canonicalize().map_err(|_| not_found())?;
        let git_dir = worktree.join(GIT_DIR_NAME);
        if !git_dir.is_dir() {
            return Err(not_found().into());
        }

        let config = Config::load(&Self::metadata_path(&git_dir, &["config"]))?;

        Ok(Self::assemble(
            worktree.into_boxed_path(),
            git_dir.into_boxed_path(),
            config,
        ))
    }

    /// Open the closest repository at or above `start`.
    pub fn find(start: &Path) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .map_err(|_| RepositoryError::RepositoryNotFound(start.to_path_buf()))?;

        let worktree = start
            .ancestors()
            .find(|dir| dir.join(GIT_DIR_NAME).is_dir())
            .ok_or_else(|| RepositoryError::RepositoryNotFound(start.clone()))?;

        Self::open(worktree)
    }

    /// Create a new repository at `path`. The directory may already hold
    /// files, but its metadata directory must be absent or empty.
    /// HEAD points at `refs/heads/master`, which does not exist until the
    /// first commit.
    pub fn init(path: &Path) -> anyhow::Result<Self> {
        let worktree = Self::ensure_dir(path, true)?.canonicalize()?;
        let git_dir = worktree.join(GIT_DIR_NAME);

        if git_dir.exists() {
            let populated = std::fs::read_dir(&git_dir)
                .with_context(|| format!("{} is not a directory", git_dir.display()))?
                .next()
                .is_some();
            if populated {
                anyhow::bail!("{} is not empty", git_dir.display());
            }
        }

        let layout: [&[&str]; 4] = [&["objects"], &["refs", "heads"], &["refs", "tags"], &["branches"]];
        for dir in layout {
            Self::ensure_dir(&Self::metadata_path(&git_dir, dir), true)?;
        }

        std::fs::write(Self::metadata_path(&git_dir, &["description"]), DESCRIPTION)?;

        let config = Config::default_for_init(&Self::metadata_path(&git_dir, &["config"]));
        config.save()?;

        let repository = Self::assemble(worktree.into_boxed_path(), git_dir.into_boxed_path(), config);
        repository
            .refs
            .set_head_symbolic(&RefName::branch(DEFAULT_BRANCH)?)?;
        tracing::debug!(path = %repository.worktree.display(), "initialized repository");

        Ok(repository)
    }

    pub fn path(&self) -> &Path {
        &self.worktree
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index_path(&self) -> PathBuf {
        Self::metadata_path(&self.git_dir, &["index"])
    }

    /// A fresh, not yet loaded index handle.
    pub fn index(&self) -> Index {
        Index::new(self.index_path().into_boxed_path())
    }

    /// Tree of the commit HEAD points at; `None` on an unborn branch.
    pub fn head_tree(&self) -> anyhow::Result<Option<ObjectId>> {
        self.refs
            .read_head()?
            .map(|oid| self.database.peel(&oid, ObjectType::Tree))
            .transpose()
    }

    pub fn head_ref_path(&self) -> PathBuf {
        Self::metadata_path(&self.git_dir, &[HEAD_REF_NAME])
    }

    /// Identity for new commits and tags: environment first, then `[user]`.
    pub fn author(&self) -> anyhow::Result<Author> {
        Author::load_from_env(self.config.user())
    }

    /// Workspace-relative form of a user-supplied path (relative to the
    /// current directory or absolute).
    pub fn relative_path(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let normalized = absolute
            .components()
            .fold(PathBuf::new(), |mut acc, component| {
                match component {
                    std::path::Component::CurDir => {}
                    std::path::Component::ParentDir => {
                        acc.pop();
                    }
                    other => acc.push(other),
                }
                acc
            });

        // The worktree was canonicalized; canonicalize whatever prefix exists.
        let resolved = normalized
            .ancestors()
            .find_map(|ancestor| {
                let canonical = ancestor.canonicalize().ok()?;
                let rest = normalized.strip_prefix(ancestor).ok()?;
                Some(if rest.as_os_str().is_empty() {
                    canonical
                } else {
                    canonical.join(rest)
                })
            })
            .unwrap_or(normalized);

        resolved
            .strip_prefix(&self.worktree)
            .map(Path::to_path_buf)
            .with_context(|| format!("{} is outside repository", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn metadata_path_is_pure() {
        assert_eq!(
            Repository::metadata_path(Path::new("/repo/.git"), &["refs", "heads", "main"]),
            PathBuf::from("/repo/.git/refs/heads/main")
        );
        assert!(!Path::new("/repo/.git").exists());
    }

    #[test]
    fn ensure_dir_only_creates_when_asked() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b");

        assert!(Repository::ensure_dir(&target, false).is_err());
        assert_eq!(Repository::ensure_dir(&target, true).unwrap(), target);
        assert!(target.is_dir());

        dir.child("file").write_str("x").unwrap();
        assert!(Repository::ensure_dir(&dir.path().join("file"), true).is_err());
    }

    #[test]
    fn init_creates_layout_with_unborn_master() {
        let dir = TempDir::new().unwrap();

        let repository = Repository::init(dir.path()).unwrap();

        for path in ["objects", "refs/heads", "refs/tags", "branches"] {
            assert!(repository.git_dir().join(path).is_dir(), "{path}");
        }
        assert_eq!(repository.config().format_version().unwrap(), 0);
        assert_eq!(
            std::fs::read_to_string(repository.head_ref_path()).unwrap(),
            "ref: refs/heads/master\n"
        );
        assert_eq!(repository.refs().read_head().unwrap(), None);
        assert_eq!(repository.head_tree().unwrap(), None);
    }

    #[test]
    fn init_refuses_populated_metadata_dir() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();

        assert!(Repository::init(dir.path()).is_err());
    }

    #[test]
    fn find_walks_up_from_subdirectories() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        dir.child("src/nested").create_dir_all().unwrap();

        let repository = Repository::find(&dir.path().join("src/nested")).unwrap();

        assert_eq!(repository.path(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn open_without_metadata_dir_fails() {
        let dir = TempDir::new().unwrap();

        let error = Repository::open(dir.path()).unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn open_rejects_unknown_format_version() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        dir.child(".git/config")
            .write_str("[core]\nrepositoryformatversion = 1\n")
            .unwrap();

        let error = Repository::open(dir.path()).unwrap_err();

        assert!(matches!(
            RepositoryError::classify(&error),
            Some(RepositoryError::UnsupportedFormatVersion(1))
        ));
    }

    #[test]
    fn relative_path_strips_worktree() {
        let dir = TempDir::new().unwrap();
        let repository = Repository::init(dir.path()).unwrap();

        let relative = repository
            .relative_path(&repository.path().join("src/./lib/../main.rs"))
            .unwrap();

        assert_eq!(relative, PathBuf::from("src/main.rs"));
    }

    #[test]
    fn relative_path_of_worktree_itself_is_empty() {
        let dir = TempDir::new().unwrap();
        let repository = Repository::init(dir.path()).unwrap();

        let relative = repository.relative_path(&repository.path().join(".")).unwrap();

        assert_eq!(relative, PathBuf::new());
    }
}
