use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;

/// First-parent history, newest first.
///
/// The start id may be a tag; it is peeled to the commit it points at.
/// The walk ends after a root commit, or after the first error: a parent
/// that cannot be read is reported as `CorruptObject`.
pub struct CommitLog<'d> {
    database: &'d Database,
    next_oid: Option<ObjectId>,
    is_start: bool,
}

impl<'d> CommitLog<'d> {
    pub fn new(database: &'d Database, start: ObjectId) -> Self {
        CommitLog {
            database,
            next_oid: Some(start),
            is_start: true,
        }
    }

    fn load(&self, oid: &ObjectId) -> anyhow::Result<(ObjectId, Commit)> {
        let commit_oid = self.database.peel(oid, ObjectType::Commit)?;
        let commit = self
            .database
            .parse_object_as_commit(&commit_oid)?
            .ok_or_else(|| anyhow::anyhow!("object {commit_oid} is not a commit"))?;

        Ok((commit_oid, commit))
    }
}

impl Iterator for CommitLog<'_> {
    type Item = anyhow::Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.next_oid.take()?;

        let result = self.load(&oid);
        let result = if self.is_start {
            self.is_start = false;
            result
        } else {
            result.map_err(|e| {
                anyhow::Error::from(RepositoryError::CorruptObject(format!(
                    "parent {oid} cannot be read: {e:#}"
                )))
            })
        };

        if let Ok((_, commit)) = &result {
            self.next_oid = commit.parent().cloned();
        }

        Some(result)
    }
}
