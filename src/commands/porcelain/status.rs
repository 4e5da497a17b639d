use crate::areas::repository::Repository;
use crate::artifacts::diff::ChangeKind;
use crate::artifacts::status::status_info::{HeadState, Status, StatusReport};
use crate::commands::registry::CommandContext;
use crate::errors::RepositoryError;
use anyhow::Context;
use clap::Args;
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Two-column `XY path` output
    #[arg(short, long)]
    short: bool,
}

pub fn run(args: StatusArgs, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let repository = context.repository()?;
    let report = repository.status()?;

    if args.short {
        print_short(&report, context.writer)
    } else {
        print_long(&report, context.writer)
    }
}

impl Repository {
    /// Compute the status report. Refreshed stat data is saved back when the
    /// index lock can be taken; a held lock only skips that step.
    pub fn status(&self) -> anyhow::Result<StatusReport> {
        let mut index = self.index();
        let lock = match index.lock() {
            Ok(lock) => Some(lock),
            Err(e) if matches!(RepositoryError::classify(&e), Some(RepositoryError::LockHeld(_))) => {
                tracing::debug!(error = %e, "index is locked, not refreshing stat data");
                None
            }
            Err(e) => return Err(e).context("Unable to lock the index"),
        };
        index.rehydrate()?;

        let report = Status::new(self).initialize(&mut index)?;

        if let Some(lock) = lock
            && index.is_changed()
        {
            index.write_updates(lock)?;
        }

        Ok(report)
    }
}

fn print_short(report: &StatusReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let mut columns = BTreeMap::<&PathBuf, (char, char)>::new();
    for (path, kind) in &report.staged {
        columns.entry(path).or_insert((' ', ' ')).0 = kind.status_char();
    }
    for (path, kind) in &report.unstaged {
        columns.entry(path).or_insert((' ', ' ')).1 = kind.status_char();
    }

    for (path, (staged, unstaged)) in columns {
        writeln!(writer, "{staged}{unstaged} {}", path.display())?;
    }
    for path in &report.untracked {
        writeln!(writer, "?? {}", path.display())?;
    }

    Ok(())
}

fn print_long(report: &StatusReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    match &report.head {
        HeadState::Branch(branch) => writeln!(writer, "On branch {branch}")?,
        HeadState::Unborn(branch) => {
            writeln!(writer, "On branch {branch}\n\nNo commits yet")?;
        }
        HeadState::Detached(oid) => writeln!(writer, "HEAD detached at {}", oid.to_short_oid())?,
    }

    print_changes(writer, "Changes to be committed:", &report.staged, |s| s.green().to_string())?;
    print_changes(writer, "Changes not staged for commit:", &report.unstaged, |s| s.red().to_string())?;

    if !report.untracked.is_empty() {
        writeln!(writer, "\nUntracked files:")?;
        for path in &report.untracked {
            writeln!(writer, "\t{}", path.display().to_string().red())?;
        }
    }

    if report.is_clean() {
        writeln!(writer, "\nnothing to commit, working tree clean")?;
    }

    Ok(())
}

fn print_changes(
    writer: &mut dyn Write,
    title: &str,
    changes: &[(PathBuf, ChangeKind)],
    paint: impl Fn(&str) -> String,
) -> anyhow::Result<()> {
    if changes.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{title}")?;
    for (path, kind) in changes {
        let line = format!("{:<12}{}", format!("{kind}:"), path.display());
        writeln!(writer, "\t{}", paint(&line))?;
    }

    Ok(())
}
