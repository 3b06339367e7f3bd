//! Command tree and dispatch
//!
//! Each level matches its arguments, then either descends into the
//! matched sub-command or runs its own action. Actions run behind a
//! containment boundary: a returned error or a panic is reported through
//! the application's hook and the run terminates with exit code 1.

use crate::commandline::CommandLine;
use crate::error::Result;
use crate::flag::{split_names, Flag};
use crate::runner::Context;
use anyhow::anyhow;
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// Handler run when a level is dispatched
pub type Action = Box<dyn Fn(&Context<'_>) -> anyhow::Result<()>>;

/// Handler run with the first unmatched token when no sub-command matches
pub type NotFoundHandler = Box<dyn Fn(&Context<'_>, &str)>;

/// Handler run with the captured failure of an action
pub type PanicHandler = Box<dyn Fn(&Context<'_>, &anyhow::Error)>;

/// A node in the command tree
pub struct Command {
    /// Comma-separated names, e.g. `"ls, list"`
    pub name: String,

    /// One-line summary
    pub usage: String,

    /// Usage lines replacing the generated ones
    pub usage_text: String,

    pub description: String,
    pub examples: String,
    pub see_also: String,

    /// Hide from help output
    pub hidden: bool,

    pub flags: Vec<Flag>,
    pub commands: Vec<Command>,

    action: Option<Action>,
    on_command_not_found: Option<NotFoundHandler>,
}

impl Command {
    /// Create a command; `name` may list aliases, e.g. `"ls, list"`
    pub fn new(name: impl Into<String>) -> Self {
        Command {
            name: name.into(),
            usage: String::new(),
            usage_text: String::new(),
            description: String::new(),
            examples: String::new(),
            see_also: String::new(),
            hidden: false,
            flags: Vec::new(),
            commands: Vec::new(),
            action: None,
            on_command_not_found: None,
        }
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

    /// Set whether the command is left out of help
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Add a flag, visible to this command and its sub-commands
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Add a sub-command
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Set the action run when no sub-command matches
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Hook run with the first unmatched token at this level
    pub fn with_command_not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Context<'_>, &str) + 'static,
    {
        self.on_command_not_found = Some(Box::new(handler));
        self
    }

    /// All names of this command
    pub fn names(&self) -> Vec<&str> {
        split_names(&self.name)
    }

    /// Exact, case-sensitive match against any name
    pub fn has_name(&self, name: &str) -> bool {
        self.names().iter().any(|n| *n == name)
    }

    /// First declared name, used in context names
    pub fn primary_name(&self) -> &str {
        self.names().first().copied().unwrap_or_default()
    }

    /// Dispatch this command for a context whose arguments follow its name
    ///
    /// Matching errors are reported through [`Context::show_error`].
    pub fn run<'a>(&'a self, ctx: &mut Context<'a>) {
        if let Err(err) = self.execute(ctx) {
            ctx.show_error(err);
        }
    }

    fn execute<'a>(&'a self, ctx: &mut Context<'a>) -> Result<()> {
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

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("flags", &self.flags.len())
            .field("commands", &self.commands)
            .finish()
    }
}

/// Match one level and hand control to a sub-command or the action
pub(crate) fn dispatch<'a>(
    ctx: &mut Context<'a>,
    commands: &'a [Command],
    action: Option<&'a Action>,
    not_found: Option<&'a NotFoundHandler>,
) -> Result<()> {
    tracing::debug!(context = %ctx.name(), args = ?ctx.args(), "dispatching");

    let matched = CommandLine::new(ctx.flags().to_vec(), commands).parse(ctx.args())?;
    ctx.set_args(matched.args);

    if let Some(command) = matched.command {
        let mut child = ctx.child(command, matched.rest);
        command.run(&mut child);
        return Ok(());
    }

    if ctx.help_requested() {
        ctx.show_help();
        return Ok(());
    }
    if ctx.version_requested() {
        ctx.show_version();
        return Ok(());
    }

    if !commands.is_empty() {
        if let (Some(handler), Some(token)) = (not_found, ctx.arg(0)) {
            tracing::debug!(context = %ctx.name(), token = %token, "command not found");
            handler(ctx, token);
            return Ok(());
        }
    }

    match action {
        Some(action) => invoke(ctx, action),
        None => ctx.show_help(),
    }
    Ok(())
}

/// Run `action`, routing any failure to the panic hook
fn invoke(ctx: &Context<'_>, action: &Action) {
    tracing::debug!(context = %ctx.name(), "running action");
    if let Err(err) = contain(ctx, action) {
        ctx.fail(err);
    }
}

thread_local! {
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

/// Wrap the current panic hook so panics inside actions are only traced
fn install_quiet_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINED.with(Cell::get) {
                tracing::debug!(panic = %info, "action panicked");
            } else {
                previous(info);
            }
        }));
    });
}

/// Call `action` so that neither an error nor a panic escapes
fn contain(ctx: &Context<'_>, action: &Action) -> anyhow::Result<()> {
    install_quiet_hook();
    let outer = CONTAINED.with(|c| c.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(ctx)));
    CONTAINED.with(|c| c.set(outer));

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(panic_error(payload)),
    }
}

/// Normalize a panic payload into an error
fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let payload = match payload.downcast::<anyhow::Error>() {
        Ok(err) => return *err,
        Err(payload) => payload,
    };
    if let Some(msg) = payload.downcast_ref::<String>() {
        anyhow!("{}", msg)
    } else if let Some(msg) = payload.downcast_ref::<&str>() {
        anyhow!("{}", msg)
    } else {
        anyhow!("unknown panic")
    }
}
