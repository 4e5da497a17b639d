use crate::artifacts::branch::revision::Revision;
use crate::artifacts::checkout;
use crate::commands::registry::CommandContext;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Commit or tree to check out
    commit: String,
    /// Missing or empty directory to fill
    directory: PathBuf,
}

pub fn run(args: CheckoutArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let oid = Revision::try_parse(&args.commit)?.resolve(&repository)?;
    let destination = context.cwd.join(&args.directory);

    let written = checkout::checkout(repository.database(), &oid, &destination)?;
    tracing::debug!(%oid, written, "checkout finished");

    writeln!(
        context.writer,
        "Checked out {} files into {}",
        written,
        destination.display()
    )?;

    Ok(())
}
