use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::tree_walker::WalkEntry;
use crate::commands::registry::CommandContext;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LsTreeArgs {
    /// Recurse into subtrees, listing only leaves
    #[arg(short, long)]
    recursive: bool,
    #[arg(value_name = "TREE-ISH")]
    tree_ish: String,
}

pub fn run(args: LsTreeArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;

    for entry in repository.ls_tree(&args.tree_ish, args.recursive)? {
        writeln!(
            context.writer,
            "{} {} {}\t{}",
            entry.mode,
            entry.mode.object_kind(),
            entry.oid,
            entry.path.display()
        )?;
    }

    Ok(())
}

impl Repository {
    /// Entries of the tree behind `tree_ish`. Without `recursive` only the top
    /// level is listed, subtrees included; with it, only leaves at any depth.
    pub fn ls_tree(&self, tree_ish: &str, recursive: bool) -> anyhow::Result<Vec<WalkEntry>> {
        let oid = Revision::try_parse(tree_ish)?.resolve(self)?;
        let tree_oid = self.database().peel(&oid, ObjectType::Tree)?;

        if recursive {
            return self
                .database()
                .walk(&tree_oid)?
                .filter(|entry| !matches!(entry, Ok(entry) if entry.is_tree()))
                .collect();
        }

        let tree = self
            .database()
            .parse_object_as_tree(&tree_oid)?
            .ok_or_else(|| anyhow::anyhow!("object {tree_oid} is not a tree"))?;
        let entries = tree
            .into_entries()
            .map(|(name, entry)| WalkEntry {
                path: PathBuf::from(name),
                mode: entry.mode,
                oid: entry.oid,
            })
            .collect();

        Ok(entries)
    }
}
