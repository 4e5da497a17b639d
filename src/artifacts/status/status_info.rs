use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::ChangeKind;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::inspector::Inspector;
use derive_new::new;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub type ChangeList = Vec<(PathBuf, ChangeKind)>;

/// Where HEAD stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    Branch(String),
    /// On a branch that has no commit yet
    Unborn(String),
    Detached(ObjectId),
}

/// Result of a status run. `staged` is HEAD tree vs index, `unstaged` is
/// index vs working tree; neither list contains `Unchanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub head: HeadState,
    pub staged: ChangeList,
    pub unstaged: ChangeList,
    /// Untracked files, and untracked directories once with a trailing `/`
    pub untracked: BTreeSet<PathBuf>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

#[derive(new)]
pub struct Status<'r> {
    repository: &'r Repository,
}

impl<'r> Status<'r> {
    /// Compute the report against a loaded index. Entries whose content turns
    /// out unchanged get fresh stat data, leaving `index` marked changed.
    pub fn initialize(&self, index: &mut Index) -> anyhow::Result<StatusReport> {
        let head = self.head_state()?;

        let staged = index
            .diff_against_tree(self.repository.database(), self.repository.head_tree()?.as_ref())?
            .into_iter()
            .filter(|(_, kind)| *kind != ChangeKind::Unchanged)
            .collect();
        let unstaged = self.check_index_entries(index)?;

        let mut untracked = BTreeSet::new();
        self.scan_workspace(None, index, &mut untracked)?;

        Ok(StatusReport {
            head,
            staged,
            unstaged,
            untracked,
        })
    }

    fn head_state(&self) -> anyhow::Result<HeadState> {
        let refs = self.repository.refs();

        Ok(match (refs.current_branch()?, refs.read_head()?) {
            (Some(branch), Some(_)) => HeadState::Branch(branch),
            (Some(branch), None) => HeadState::Unborn(branch),
            (None, Some(oid)) => HeadState::Detached(oid),
            (None, None) => anyhow::bail!("HEAD does not point at a commit"),
        })
    }

    fn check_index_entries(&self, index: &mut Index) -> anyhow::Result<ChangeList> {
        let workspace = self.repository.workspace();
        let inspector = Inspector::new(workspace);
        let entries = index.entries().cloned().collect::<Vec<IndexEntry>>();

        let mut changes = Vec::new();
        for entry in entries {
            let stat = workspace.stat_file(&entry.name)?;

            match inspector.check_index_against_workspace(&entry, stat.as_ref())? {
                ChangeKind::Unchanged => {
                    if let Some(stat) = stat
                        && !entry.times_match(&stat)
                    {
                        index.update_entry_stat(&entry, stat);
                    }
                }
                kind => changes.push((entry.name.clone(), kind)),
            }
        }

        Ok(changes)
    }

    /// Untracked directories are reported whole, and only if some file lives
    /// below them; tracked directories are descended into.
    fn scan_workspace(
        &self,
        prefix_path: Option<&Path>,
        index: &Index,
        untracked: &mut BTreeSet<PathBuf>,
    ) -> anyhow::Result<()> {
        let workspace = self.repository.workspace();

        for path in workspace.list_dir(prefix_path)? {
            if index.entry_by_path(&path).is_some() {
                continue;
            }

            let is_dir = std::fs::symlink_metadata(workspace.path().join(&path))
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false);

            if !is_dir {
                untracked.insert(path);
            } else if index.is_directly_tracked(&path) {
                self.scan_workspace(Some(&path), index, untracked)?;
            } else if workspace.contains_files(&path) {
                let mut dir = path.into_os_string();
                dir.push("/");
                untracked.insert(PathBuf::from(dir));
            }
        }

        Ok(())
    }
}
