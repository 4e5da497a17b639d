//! Commit object
//!
//! Commits record a tree snapshot together with its history and authorship:
//!
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>          (zero or more)
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! Unknown headers (`gpgsig`, `encoding`, ...) are preserved as read.

use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};

/// Author, committer or tagger identity with a timestamp
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current local time
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Header form: "Name <email> timestamp timezone"
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Identity from `GIT_AUTHOR_NAME` / `GIT_AUTHOR_EMAIL`, falling back to
    /// the given `(name, email)` pair (usually the repository's `[user]` config).
    ///
    /// `GIT_AUTHOR_DATE` overrides the timestamp when set; RFC 2822 and
    /// `%Y-%m-%d %H:%M:%S %z` are accepted.
    pub fn load_from_env(fallback: Option<(String, String)>) -> anyhow::Result<Self> {
        let (fallback_name, fallback_email) = fallback.unzip();
        let name = std::env::var("GIT_AUTHOR_NAME")
            .ok()
            .or(fallback_name)
            .context("GIT_AUTHOR_NAME not set and no user.name configured")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL")
            .ok()
            .or(fallback_email)
            .context("GIT_AUTHOR_EMAIL not set and no user.email configured")?;
        let timestamp = std::env::var("GIT_AUTHOR_DATE")
            .ok()
            .map(|date_str| parse_author_date(&date_str).context("Invalid GIT_AUTHOR_DATE"))
            .transpose()?;

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(name, email, ts)),
            None => Ok(Author::new(name, email)),
        }
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

/// RFC 2822 or `%Y-%m-%d %H:%M:%S %z`.
pub fn parse_author_date(date_str: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(date_str)
        .or_else(|_| DateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S %z"))
        .with_context(|| format!("unrecognized date {date_str:?}"))
}

fn parse_timezone(timezone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match timezone.split_at_checked(1)? {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return None,
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid author format"));
        }

        let offset = parse_timezone(parts[0]).ok_or_else(|| anyhow::anyhow!("Invalid timezone"))?;
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp"))?;
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let datetime = DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp: datetime,
        })
    }
}

/// Commit object
///
/// The typed fields are validated views over the header block, which is kept
/// verbatim for serialization.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    kvlm: Kvlm,
    tree_oid: ObjectId,
    parents: Vec<ObjectId>,
    author: Author,
    committer: Author,
}

impl Commit {
    /// Build a commit; the author doubles as committer.
    pub fn new(parents: Vec<ObjectId>, tree_oid: ObjectId, author: Author, message: String) -> Self {
        let mut kvlm = Kvlm::new(message);
        kvlm.push("tree", tree_oid.to_string());
        for parent in &parents {
            kvlm.push("parent", parent.to_string());
        }
        kvlm.push("author", author.display());
        kvlm.push("committer", author.display());

        Commit {
            kvlm,
            tree_oid,
            parents,
            committer: author.clone(),
            author,
        }
    }

    /// First line of the message, for one-line listings
    pub fn short_message(&self) -> String {
        self.message().lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        self.kvlm.message()
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    pub fn headers(&self) -> &Kvlm {
        &self.kvlm
    }

    /// Full textual form, as `cat-file commit` prints it
    pub fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).into_owned()
    }
}

fn corrupt(reason: String) -> anyhow::Error {
    RepositoryError::CorruptObject(format!("malformed commit: {reason}")).into()
}

fn parse_oid(raw: &str) -> anyhow::Result<ObjectId> {
    ObjectId::try_parse(raw.to_string()).map_err(|e| corrupt(e.to_string()))
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.kvlm.serialize())
    }
}

impl Unpackable for Commit {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let kvlm = Kvlm::parse(&payload)?;

        let tree_oid = parse_oid(kvlm.get("tree").ok_or_else(|| corrupt("missing tree".into()))?)?;
        let parents = kvlm
            .get_all("parent")
            .map(parse_oid)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let author = kvlm
            .get("author")
            .ok_or_else(|| corrupt("missing author".into()))
            .and_then(|raw| Author::try_from(raw).map_err(|e| corrupt(e.to_string())))?;
        let committer = kvlm
            .get("committer")
            .ok_or_else(|| corrupt("missing committer".into()))
            .and_then(|raw| Author::try_from(raw).map_err(|e| corrupt(e.to_string())))?;

        Ok(Commit {
            kvlm,
            tree_oid,
            parents,
            author,
            committer,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}
