use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::commands::registry::CommandContext;
use clap::Args;

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// The commit message
    #[arg(short, long)]
    message: String,
}

pub fn run(args: CommitArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let (commit_id, commit) = repository.commit(&args.message)?;

    let branch = repository
        .refs()
        .current_branch()?
        .unwrap_or_else(|| "detached HEAD".to_string());
    let root = if commit.parents().is_empty() { " (root-commit)" } else { "" };

    writeln!(
        context.writer,
        "[{branch}{root} {}] {}",
        commit_id.to_short_oid(),
        commit.short_message()
    )?;

    Ok(())
}

impl Repository {
    /// Build the tree from the index, store a commit on top of HEAD and move
    /// the current branch (or detached HEAD) to it.
    pub fn commit(&self, message: &str) -> anyhow::Result<(ObjectId, Commit)> {
        let mut index = self.index();
        // held so the tree is built from a settled index
        let _lock = index.lock()?;
        index.rehydrate()?;

        let tree_id = index.tree_builder()?.write(self.database())?;
        let parents = self.refs().read_head()?.into_iter().collect::<Vec<_>>();

        let message = format!("{}\n", message.trim_end());
        let commit = Commit::new(parents, tree_id, self.author()?, message);
        let commit_id = self.database().store(&commit)?;
        self.refs().update_head(&commit_id)?;

        Ok((commit_id, commit))
    }
}
