//! Repository configuration (`<gitdir>/config`)
//!
//! INI text as git writes it. Only `core.repositoryformatversion` is
//! enforced; `user.name` / `user.email` supply the commit identity when the
//! environment does not.

use crate::artifacts::core::lockfile::LockFile;
use crate::errors::RepositoryError;
use ini::Ini;
use std::path::Path;

/// The only repository format this crate reads and writes.
pub const REPOSITORY_FORMAT_VERSION: i64 = 0;

const CORE_SECTION: &str = "core";
const USER_SECTION: &str = "user";

#[derive(Debug)]
pub struct Config {
    path: Box<Path>,
    ini: Ini,
}

impl Config {
    /// Read and validate the config of an existing repository.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Err(RepositoryError::InvalidRepositoryState(format!(
                "configuration file missing at {}",
                path.display()
            ))
            .into());
        }

        let ini = Ini::load_from_file(path).map_err(|e| {
            RepositoryError::InvalidRepositoryState(format!(
                "unable to parse {}: {e}",
                path.display()
            ))
        })?;

        let config = Config {
            path: path.into(),
            ini,
        };
        let version = config.format_version()?;
        if version != REPOSITORY_FORMAT_VERSION {
            return Err(RepositoryError::UnsupportedFormatVersion(version).into());
        }

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// The configuration a fresh repository starts with.
    pub fn default_for_init(path: &Path) -> Self {
        let mut ini = Ini::new();
        ini.with_section(Some(CORE_SECTION))
            .set(
                "repositoryformatversion",
                REPOSITORY_FORMAT_VERSION.to_string(),
            )
            .set("filemode", "false")
            .set("bare", "false");

        Config {
            path: path.into(),
            ini,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.section(Some(section)).and_then(|s| s.get(key))
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.ini.with_section(Some(section)).set(key, value.into());
    }

    pub fn format_version(&self) -> anyhow::Result<i64> {
        let raw = self
            .get(CORE_SECTION, "repositoryformatversion")
            .ok_or_else(|| {
                RepositoryError::InvalidRepositoryState(
                    "core.repositoryformatversion is not set".into(),
                )
            })?;

        raw.trim().parse::<i64>().map_err(|_| {
            RepositoryError::InvalidRepositoryState(format!(
                "core.repositoryformatversion is not an integer: {raw:?}"
            ))
            .into()
        })
    }

    /// `(user.name, user.email)` when both are configured.
    pub fn user(&self) -> Option<(String, String)> {
        let name = self.get(USER_SECTION, "name")?;
        let email = self.get(USER_SECTION, "email")?;

        Some((name.to_string(), email.to_string()))
    }

    /// Write the file through `config.lock`.
    pub fn save(&self) -> anyhow::Result<()> {
        let mut lock = LockFile::acquire(&self.path)?;
        self.ini.write_to(&mut lock)?;
        lock.commit()
    }
}
