use crate::areas::workspace::Workspace;
use crate::artifacts::diff::ChangeKind;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use derive_new::new;

/// Compares index entries with the files they stand for.
#[derive(new)]
pub struct Inspector<'w> {
    workspace: &'w Workspace,
}

impl Inspector<'_> {
    fn is_content_changed(&self, entry: &IndexEntry) -> anyhow::Result<bool> {
        let data = self.workspace.read_file(&entry.name)?;
        let oid = Blob::from(data.as_slice()).object_id()?;

        Ok(oid != entry.oid)
    }

    /// Index vs working tree for one entry. Size and mode are checked first;
    /// matching timestamps are trusted, otherwise the content is hashed.
    pub fn check_index_against_workspace(
        &self,
        entry: &IndexEntry,
        stat: Option<&EntryMetadata>,
    ) -> anyhow::Result<ChangeKind> {
        let Some(stat) = stat else {
            return Ok(ChangeKind::Deleted);
        };

        match (entry.metadata.mode, stat.mode) {
            (EntryMode::Gitlink, EntryMode::Directory) => return Ok(ChangeKind::Unchanged),
            (EntryMode::Gitlink, _) | (_, EntryMode::Directory) => return Ok(ChangeKind::Deleted),
            _ => {}
        }

        if !entry.stat_match(stat) {
            return Ok(ChangeKind::Modified);
        }
        if entry.times_match(stat) {
            return Ok(ChangeKind::Unchanged);
        }

        if self.is_content_changed(entry)? {
            Ok(ChangeKind::Modified)
        } else {
            Ok(ChangeKind::Unchanged)
        }
    }
}
