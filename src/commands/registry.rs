use crate::areas::repository::Repository;
use anyhow::Context;
use clap::{ArgMatches, Args, Command};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// What a handler gets besides its own arguments.
pub struct CommandContext<'w> {
    /// Directory the command was started from
    pub cwd: PathBuf,
    pub writer: &'w mut dyn Write,
    /// Long output may go through the pager
    pub paging: bool,
}

impl CommandContext<'_> {
    pub fn repository(&self) -> anyhow::Result<Repository> {
        Repository::find(&self.cwd)
    }
}

type Handler = Box<dyn Fn(&ArgMatches, &mut CommandContext<'_>) -> anyhow::Result<()>>;

struct RegisteredCommand {
    about: &'static str,
    augment: fn(Command) -> Command,
    handler: Handler,
}

/// Command name -> handler, built once at startup and handed to the dispatcher.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, RegisteredCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command twig ships with.
    pub fn with_builtin_commands() -> Self {
        use crate::commands::{plumbing, porcelain};

        let mut registry = Self::new();
        registry
            .register("init", "Create an empty repository", porcelain::init::run)
            .register("add", "Add file contents to the index", porcelain::add::run)
            .register("rm", "Remove files from the index and the working tree", porcelain::rm::run)
            .register("commit", "Record the index as a new commit", porcelain::commit::run)
            .register("status", "Show the working tree status", porcelain::status::run)
            .register("log", "Show first-parent commit history", porcelain::log::run)
            .register("tag", "List or create tags", porcelain::tag::run)
            .register("checkout", "Write a commit's tree into an empty directory", porcelain::checkout::run)
            .register("cat-file", "Print the payload of an object", plumbing::cat_file::run)
            .register("hash-object", "Compute an object id, optionally storing the object", plumbing::hash_object::run)
            .register("ls-files", "List the paths in the index", plumbing::ls_files::run)
            .register("ls-tree", "List the contents of a tree", plumbing::ls_tree::run)
            .register("rev-parse", "Resolve a revision to an object id", plumbing::rev_parse::run)
            .register("show-ref", "List references and their ids", plumbing::show_ref::run);

        registry
    }

    pub fn register<A: Args + 'static>(
        &mut self,
        name: &'static str,
        about: &'static str,
        run: fn(A, &mut CommandContext<'_>) -> anyhow::Result<()>,
    ) -> &mut Self {
        let handler: Handler = Box::new(move |matches, context| {
            let args = A::from_arg_matches(matches)?;
            run(args, context)
        });

        self.commands.insert(
            name,
            RegisteredCommand {
                about,
                augment: A::augment_args,
                handler,
            },
        );
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// The root `clap` command with one subcommand per registered handler.
    pub fn command(&self) -> Command {
        self.commands.iter().fold(
            Command::new("twig")
                .version(env!("CARGO_PKG_VERSION"))
                .about("A small content-addressed version control tool")
                .subcommand_required(true)
                .arg_required_else_help(true),
            |root, (name, registered)| {
                root.subcommand((registered.augment)(Command::new(*name).about(registered.about)))
            },
        )
    }

    /// Run the handler selected by already parsed root matches.
    pub fn dispatch(&self, matches: &ArgMatches, context: &mut CommandContext<'_>) -> anyhow::Result<()> {
        let (name, sub_matches) = matches.subcommand().context("no command given")?;
        let registered = self
            .commands
            .get(name)
            .with_context(|| format!("'{name}' is not a twig command"))?;

        tracing::debug!(command = name, "dispatching");
        (registered.handler)(sub_matches, context)
    }

    /// Parse `args` (program name first) and dispatch.
    pub fn run_from<I, T>(&self, args: I, context: &mut CommandContext<'_>) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;
        self.dispatch(&matches, context)
    }
}
