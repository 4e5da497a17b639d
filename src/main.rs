use is_terminal::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use twig::commands::registry::{CommandContext, CommandRegistry};

/// Exit status for failures reported by the repository core
const FATAL_EXIT_CODE: u8 = 128;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TWIG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let stdout_is_terminal = std::io::stdout().is_terminal();
    if !stdout_is_terminal {
        colored::control::set_override(false);
    }

    let registry = CommandRegistry::with_builtin_commands();
    // usage errors exit with clap's own status
    let matches = registry.command().get_matches();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("fatal: unable to read the current directory: {e}");
            return ExitCode::from(FATAL_EXIT_CODE);
        }
    };

    let mut stdout = std::io::stdout().lock();
    let mut context = CommandContext {
        cwd,
        writer: &mut stdout,
        paging: stdout_is_terminal && std::env::var_os("NO_PAGER").is_none(),
    };

    match registry.dispatch(&matches, &mut context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("fatal: {e:#}");
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}
