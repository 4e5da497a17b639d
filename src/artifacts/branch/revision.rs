use crate::areas::repository::Repository;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::branch::{ANCESTOR_REGEX, PARENT_REGEX, REF_ALIASES};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;

/// Shortest abbreviated id accepted when no ref matches.
const MIN_ABBREV_LENGTH: usize = 4;

/// A revision expression naming an object.
///
/// Supported forms:
/// - `@` (alias of `HEAD`), `HEAD`, full ref paths and short ref names
/// - full 40-hex ids and abbreviated ids (at least 4 hex digits)
/// - `<rev>^` for the first parent, `<rev>~<n>` for the n-th first-parent ancestor
///
/// Hex-looking names are parsed as `Ref`; during resolution refs win over ids,
/// the same way git prefers a branch called `cafe` over the object `cafe...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Ref(String),
    Parent(Box<Revision>),
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        let parent_re = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        let ancestor_re = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;

        if let Some(caps) = parent_re.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Parent(Box::new(base_revision)));
        }

        if let Some(caps) = ancestor_re.captures(revision) {
            let generations: usize = caps[2]
                .parse()
                .with_context(|| format!("failed to parse generations in revision: {revision}"))?;
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Ancestor(Box::new(base_revision), generations));
        }

        let name = *REF_ALIASES.get(revision).unwrap_or(&revision);
        RefName::try_parse(name)
            .with_context(|| format!("invalid revision '{revision}'"))?;

        Ok(Revision::Ref(name.to_string()))
    }

    /// Resolve to an object id. The id is not peeled: `v1` may name a tag object.
    pub fn resolve(&self, repository: &Repository) -> anyhow::Result<ObjectId> {
        match self {
            Revision::Ref(name) => Self::resolve_name(name, repository),
            Revision::Parent(base) => Self::first_parent(base.resolve(repository)?, repository),
            Revision::Ancestor(base, generations) => {
                let mut oid = base.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(oid, repository)?;
                }
                Ok(oid)
            }
        }
    }

    fn resolve_name(name: &str, repository: &Repository) -> anyhow::Result<ObjectId> {
        if ObjectId::is_full_hex(name) {
            return ObjectId::try_parse(name.to_string());
        }

        if let Some(oid) = repository.refs().lookup(name)? {
            return Ok(oid);
        }

        if Self::looks_like_oid(name) {
            return Self::resolve_abbreviated(name, repository);
        }

        anyhow::bail!("ambiguous argument '{name}': unknown revision or path not in the working tree")
    }

    fn resolve_abbreviated(prefix: &str, repository: &Repository) -> anyhow::Result<ObjectId> {
        let mut matches = repository.database().find_objects_by_prefix(prefix)?;

        match matches.len() {
            0 => anyhow::bail!(
                "ambiguous argument '{prefix}': unknown revision or path not in the working tree"
            ),
            1 => Ok(matches.remove(0)),
            _ => {
                let mut message = format!("short object id {prefix} is ambiguous\nhint: The candidates are:");
                for oid in &matches {
                    let kind = repository
                        .database()
                        .get_object_type(oid)
                        .map(|t| t.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    message.push_str(&format!("\nhint:   {} {kind}", oid.to_short_oid()));
                }
                anyhow::bail!(message)
            }
        }
    }

    fn first_parent(oid: ObjectId, repository: &Repository) -> anyhow::Result<ObjectId> {
        let database = repository.database();
        let commit_oid = database.peel(&oid, ObjectType::Commit)?;
        let commit = database
            .parse_object_as_commit(&commit_oid)?
            .with_context(|| format!("object {commit_oid} is not a commit"))?;

        commit
            .parent()
            .cloned()
            .with_context(|| format!("commit {} has no parent", commit_oid.to_short_oid()))
    }

    fn looks_like_oid(s: &str) -> bool {
        (MIN_ABBREV_LENGTH..=OBJECT_ID_LENGTH).contains(&s.len())
            && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}
