//! Lock files guarding mutable repository state
//!
//! To replace `<target>`, a writer creates `<target>.lock` exclusively, writes the
//! new content into it and renames it over the target. The rename is the only
//! mutation a concurrent reader can observe. A second writer finds the lock
//! present and fails with `LockHeld` instead of waiting.

use crate::errors::RepositoryError;
use anyhow::Context;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const LOCK_SUFFIX: &str = ".lock";

#[derive(Debug)]
pub struct LockFile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
}

impl LockFile {
    /// `<target>.lock`, next to the target so the final rename stays on one filesystem.
    pub fn lock_path_for(target: &Path) -> anyhow::Result<PathBuf> {
        let mut file_name: OsString = target
            .file_name()
            .with_context(|| format!("Cannot lock {}", target.display()))?
            .to_os_string();
        file_name.push(LOCK_SUFFIX);

        Ok(target.with_file_name(file_name))
    }

    pub fn acquire(target: &Path) -> anyhow::Result<Self> {
        let lock_path = Self::lock_path_for(target)?;

        let file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RepositoryError::LockHeld(lock_path).into());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Unable to create lock file {}", lock_path.display())
                });
            }
        };

        tracing::debug!(lock = %lock_path.display(), "acquired lock");

        Ok(LockFile {
            target: target.to_path_buf(),
            lock_path,
            file: Some(file),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush the new content and atomically move it over the target.
    pub fn commit(mut self) -> anyhow::Result<()> {
        let file = self.file.take().context("Lock file already committed")?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&self.lock_path, &self.target).with_context(|| {
            format!(
                "Unable to move {} into place",
                self.lock_path.display()
            )
        })?;
        tracing::debug!(target = %self.target.display(), "committed lock");

        Ok(())
    }
}

impl Write for LockFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Err(std::io::Error::other("lock file already committed")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for LockFile {
    /// An abandoned lock leaves the target untouched.
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.lock_path);
            tracing::debug!(lock = %self.lock_path.display(), "released lock without committing");
        }
    }
}
