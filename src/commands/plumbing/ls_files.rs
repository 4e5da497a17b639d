use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::commands::registry::CommandContext;
use clap::Args;

#[derive(Args, Debug)]
pub struct LsFilesArgs {
    /// Show mode, object id and stage
    #[arg(short, long)]
    verbose: bool,
}

pub fn run(args: LsFilesArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;

    for entry in repository.ls_files()? {
        if args.verbose {
            writeln!(
                context.writer,
                "{} {} {}\t{}",
                entry.metadata.mode,
                entry.oid,
                entry.stage(),
                entry.name.display()
            )?;
        } else {
            writeln!(context.writer, "{}", entry.name.display())?;
        }
    }

    Ok(())
}

impl Repository {
    /// Index entries in path order. Reads without taking the lock.
    pub fn ls_files(&self) -> anyhow::Result<Vec<IndexEntry>> {
        let mut index = self.index();
        index.rehydrate()?;

        Ok(index.entries().cloned().collect())
    }
}
