use crate::artifacts::branch::revision::Revision;
use crate::artifacts::core::PagerWriter;
use crate::artifacts::log::commit_log::CommitLog;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::commands::registry::CommandContext;
use clap::Args;
use colored::Colorize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Where history starts
    #[arg(default_value = "HEAD")]
    revision: String,
    /// One line per commit: abbreviated id and subject
    #[arg(long)]
    oneline: bool,
}

pub fn run(args: LogArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let start = Revision::try_parse(&args.revision)?.resolve(&repository)?;
    let history = CommitLog::new(repository.database(), start);

    if !context.paging {
        return write_log(history, args.oneline, context.writer);
    }

    let pager = minus::Pager::new();
    let mut writer = PagerWriter::new(pager.clone());
    write_log(history, args.oneline, &mut writer)?;
    minus::page_all(pager)?;

    Ok(())
}

fn write_log(history: CommitLog<'_>, oneline: bool, writer: &mut dyn Write) -> anyhow::Result<()> {
    for (index, entry) in history.enumerate() {
        let (oid, commit) = entry?;

        if oneline {
            show_commit_oneline(&oid, &commit, writer)?;
        } else {
            if index > 0 {
                writeln!(writer)?;
            }
            show_commit_medium(&oid, &commit, writer)?;
        }
    }

    Ok(())
}

fn show_commit_medium(oid: &ObjectId, commit: &Commit, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer, "{}", format!("commit {oid}").yellow())?;
    if commit.parents().len() > 1 {
        let parents = commit
            .parents()
            .iter()
            .map(ObjectId::to_short_oid)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "Merge: {parents}")?;
    }
    writeln!(writer, "Author: {}", commit.author().display_name())?;
    writeln!(writer, "Date:   {}", commit.author().readable_timestamp())?;
    writeln!(writer)?;
    for message_line in commit.message().lines() {
        writeln!(writer, "    {message_line}")?;
    }

    Ok(())
}

fn show_commit_oneline(oid: &ObjectId, commit: &Commit, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(
        writer,
        "{} {}",
        oid.to_short_oid().yellow(),
        commit.short_message()
    )?;

    Ok(())
}
