use crate::areas::repository::Repository;
use crate::commands::registry::CommandContext;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Only remove from the index; keep the working tree files
    #[arg(long)]
    cached: bool,
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

pub fn run(args: RmArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let paths = args
        .paths
        .iter()
        .map(|path| repository.relative_path(&context.cwd.join(path)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    for removed in repository.rm(&paths, args.cached)? {
        writeln!(context.writer, "rm '{}'", removed.display())?;
    }

    Ok(())
}

impl Repository {
    /// Untrack `paths` (directories recursively) and, unless `cached`, delete
    /// the files. Every path must be tracked, or nothing is removed.
    pub fn rm(&self, paths: &[PathBuf], cached: bool) -> anyhow::Result<Vec<PathBuf>> {
        let mut index = self.index();
        let lock = index.lock()?;
        index.rehydrate()?;

        let mut removed = Vec::new();
        for path in paths {
            let untracked = index.remove(path);
            if untracked.is_empty() {
                anyhow::bail!("pathspec '{}' did not match any files", path.display());
            }
            removed.extend(untracked);
        }

        index.write_updates(lock)?;

        if !cached {
            for file in &removed {
                self.remove_workspace_file(file)?;
            }
        }

        Ok(removed)
    }

    fn remove_workspace_file(&self, file: &Path) -> anyhow::Result<()> {
        let full_path = self.path().join(file);
        match std::fs::remove_file(&full_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_context(|| format!("Unable to remove {}", file.display())),
        }

        // prune directories left empty, up to the workspace root
        for dir in full_path.ancestors().skip(1) {
            if dir == self.path() || std::fs::remove_dir(dir).is_err() {
                break;
            }
        }

        Ok(())
    }
}
