use crate::areas::repository::Repository;
use crate::commands::registry::CommandContext;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Files or directories to stage
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

pub fn run(args: AddArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let paths = args
        .paths
        .iter()
        .map(|path| repository.relative_path(&context.cwd.join(path)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    repository.add(&paths)
}

impl Repository {
    /// Stage every file below each path. All paths are expanded before the
    /// index is touched, so a bad pathspec leaves it as it was.
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut index = self.index();
        let lock = index.lock()?;
        index.rehydrate()?;

        let files = paths
            .iter()
            .map(|path| {
                let root = (!path.as_os_str().is_empty()).then_some(path.as_path());
                self.workspace().list_files(root)
            })
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .flatten();

        for file in files {
            let data = self.workspace().read_file(&file)?;
            let stat = self
                .workspace()
                .stat_file(&file)?
                .with_context(|| format!("{} disappeared while adding", file.display()))?;

            index.stage(self.database(), &file, &data, stat)?;
        }

        index.write_updates(lock)
    }
}
