use crate::artifacts::branch::{HEADS_PREFIX, INVALID_REF_NAME_REGEX, TAGS_PREFIX};
use anyhow::Context;

/// A full ref name such as `refs/heads/master`, `refs/tags/v1` or `HEAD`,
/// validated against git's ref-name rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            anyhow::bail!("ref name cannot be empty");
        }

        let re = regex::Regex::new(INVALID_REF_NAME_REGEX)
            .with_context(|| format!("invalid ref name regex: {INVALID_REF_NAME_REGEX}"))?;

        if re.is_match(&name) {
            anyhow::bail!("'{name}' is not a valid ref name");
        }

        Ok(Self(name))
    }

    /// `refs/heads/<name>` for a short branch name.
    pub fn branch(name: &str) -> anyhow::Result<Self> {
        Self::try_parse(name).and_then(|_| Self::try_parse(format!("{HEADS_PREFIX}{name}")))
    }

    /// `refs/tags/<name>` for a short tag name.
    pub fn tag(name: &str) -> anyhow::Result<Self> {
        Self::try_parse(name).and_then(|_| Self::try_parse(format!("{TAGS_PREFIX}{name}")))
    }

    pub fn is_branch(&self) -> bool {
        self.0.starts_with(HEADS_PREFIX)
    }

    /// Name without its `refs/heads/` or `refs/tags/` prefix.
    pub fn short_name(&self) -> &str {
        self.0
            .strip_prefix(HEADS_PREFIX)
            .or_else(|| self.0.strip_prefix(TAGS_PREFIX))
            .unwrap_or(&self.0)
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
