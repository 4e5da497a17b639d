use crate::areas::repository::Repository;
use crate::commands::registry::CommandContext;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to create the repository (defaults to the current directory)
    path: Option<PathBuf>,
}

pub fn run(args: InitArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let path = match args.path {
        Some(path) => context.cwd.join(path),
        None => context.cwd.clone(),
    };

    let repository = Repository::init(&path)?;
    writeln!(
        context.writer,
        "Initialized empty Git repository in {}/",
        repository.git_dir().display()
    )?;

    Ok(())
}
