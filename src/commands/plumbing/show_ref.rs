use crate::commands::registry::CommandContext;
use clap::Args;

#[derive(Args, Debug)]
pub struct ShowRefArgs {}

pub fn run(_args: ShowRefArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;

    for (name, oid) in repository.refs().list()? {
        writeln!(context.writer, "{oid} {name}")?;
    }

    Ok(())
}
