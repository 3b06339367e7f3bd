//! Application entry point

use crate::cli::BuildInfo;
use crate::error::{CliError, Result};
use crate::flag::Flag;
use crate::runner::command::{dispatch, Action, NotFoundHandler, PanicHandler};
use crate::runner::{context::process_exit, Command, Context, Exit};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Root of a command tree
pub struct App {
    /// Application name, defaults to the program name from argv
    pub name: String,

    pub version: String,

    /// One-line summary
    pub usage: String,

    /// Usage lines replacing the generated ones
    pub usage_text: String,

    pub description: String,
    pub authors: String,
    pub examples: String,
    pub see_also: String,

    pub build_info: Option<BuildInfo>,

    /// Global flags, visible at every level
    pub flags: Vec<Flag>,
    pub commands: Vec<Command>,

    action: Option<Action>,
    on_command_not_found: Option<NotFoundHandler>,
    on_action_panic: Option<PanicHandler>,
    env_file: Option<PathBuf>,
    exit: Exit,
}

impl Default for App {
    fn default() -> Self {
        App {
            name: String::new(),
            version: String::new(),
            usage: String::new(),
            usage_text: String::new(),
            description: String::new(),
            authors: String::new(),
            examples: String::new(),
            see_also: String::new(),
            build_info: None,
            flags: Vec::new(),
            commands: Vec::new(),
            action: None,
            on_command_not_found: None,
            on_action_panic: None,
            env_file: None,
            exit: process_exit(),
        }
    }
}

impl App {
    /// Create an application named `name`
    pub fn new(name: impl Into<String>) -> Self {
        App {
            name: name.into(),
            ..App::default()
        }
    }

    /// Set the version, which also enables `--version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the one-line summary
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Set usage lines replacing the generated ones
    pub fn with_usage_text(mut self, usage_text: impl Into<String>) -> Self {
        self.usage_text = usage_text.into();
        self
    }

    /// Set the long description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the authors, one per line
    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = authors.into();
        self
    }

    /// Set the examples, one per line
    pub fn with_examples(mut self, examples: impl Into<String>) -> Self {
        self.examples = examples.into();
        self
    }

    /// Set related links, one per line
    pub fn with_see_also(mut self, see_also: impl Into<String>) -> Self {
        self.see_also = see_also.into();
        self
    }

    /// Set the build details shown by `--version`
    pub fn with_build_info(mut self, info: BuildInfo) -> Self {
        self.build_info = Some(info);
        self
    }

    /// Add a global flag
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Add a top-level command
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Action run when no sub-command matches
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Hook run with the first unmatched token at the top level
    pub fn with_command_not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context<'_>, &str) + 'static,
    {
        self.on_command_not_found = Some(Box::new(handler));
        self
    }

    /// Hook receiving the error of any failed or panicking action
    pub fn with_action_panic<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context<'_>, &anyhow::Error) + 'static,
    {
        self.on_action_panic = Some(Box::new(handler));
        self
    }

    /// Load environment entries from a dotenv file before flags initialize
    pub fn with_env_file(mut self, path: impl AsRef<Path>) -> Self {
        self.env_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the process terminator used by every context of a run
    pub fn with_exit<F>(mut self, exit: F) -> Self
    where
        F: Fn(i32) + 'static,
    {
        self.exit = Rc::new(exit);
        self
    }

    pub(crate) fn action_panic_handler(&self) -> Option<&PanicHandler> {
        self.on_action_panic.as_ref()
    }

    /// Run with the process arguments
    pub fn run_env(&self) {
        self.run(std::env::args());
    }

    /// Run with `args`, whose first element is the program name
    pub fn run<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().unwrap_or_default();
        let args: Vec<String> = args.collect();

        let name = if self.name.is_empty() {
            program_name(&program)
        } else {
            self.name.clone()
        };

        let help = Flag::new("h, help")
            .with_usage("show help")
            .with_bool(true);
        let version = (!self.version.is_empty()).then(|| {
            Flag::new("version")
                .with_usage("print the version")
                .with_bool(true)
        });

        let mut flags: Vec<&Flag> = self.flags.iter().collect();
        flags.push(&help);
        flags.extend(version.as_ref());

        let mut ctx = Context::new(name)
            .with_app(self)
            .with_flags(flags)
            .with_args(args)
            .with_exit(Rc::clone(&self.exit))
            .with_builtin_flags(Some(&help), version.as_ref());

        if let Err(err) = self.execute(&mut ctx) {
            ctx.show_error(err);
        }
    }

    fn execute<'a>(&'a self, ctx: &mut Context<'a>) -> Result<()> {
        if let Some(path) = &self.env_file {
            load_env_file(path)?;
        }
        for flag in &self.flags {
            flag.initialize()?;
        }
        dispatch(
            ctx,
            &self.commands,
            self.action.as_ref(),
            self.on_command_not_found.as_ref(),
        )
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("flags", &self.flags.len())
            .field("commands", &self.commands)
            .finish()
    }
}

fn program_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded env file");
            Ok(())
        }
        Err(err) if err.not_found() => {
            tracing::debug!(path = %path.display(), "env file not found, skipping");
            Ok(())
        }
        Err(err) => Err(CliError::EnvFile(format!("{}: {}", path.display(), err))),
    }
}
