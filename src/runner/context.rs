//! Per-level dispatch context
//!
//! A context is built for every level of the command tree that is entered
//! during a run. It exposes the flags visible at that level, the
//! positional arguments left after matching, and a link to its parent.

use crate::cli::help::{render_help, render_version, HelpContext};
use crate::cli::App;
use crate::flag::{lookup_flag, Flag};
use crate::runner::Command;
use crate::value::number::{parse_float, parse_isize, parse_signed, parse_unsigned, parse_usize};
use crate::value::parse_bool;
use colored::Colorize;
use std::fmt;
use std::process;
use std::rc::Rc;

/// Process terminator, injectable so tests can observe exit codes
pub type Exit = Rc<dyn Fn(i32)>;

/// The default terminator, `std::process::exit`
pub fn process_exit() -> Exit {
    Rc::new(|code| process::exit(code))
}

/// Read-only view of one dispatch level
pub struct Context<'a> {
    name: String,
    app: Option<&'a App>,
    command: Option<&'a Command>,
    flags: Vec<&'a Flag>,
    args: Vec<String>,
    parent: Option<&'a Context<'a>>,
    exit: Exit,
    help_flag: Option<&'a Flag>,
    version_flag: Option<&'a Flag>,
}

impl<'a> Context<'a> {
    /// Create a root context
    pub fn new(name: impl Into<String>) -> Self {
        Context {
            name: name.into(),
            app: None,
            command: None,
            flags: Vec::new(),
            args: Vec::new(),
            parent: None,
            exit: process_exit(),
            help_flag: None,
            version_flag: None,
        }
    }

    pub fn with_app(mut self, app: &'a App) -> Self {
        self.app = Some(app);
        self
    }

    pub fn with_command(mut self, command: &'a Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Set the flags visible at this level, searched in order
    pub fn with_flags(mut self, flags: Vec<&'a Flag>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent: &'a Context<'a>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Replace the process terminator
    pub fn with_exit(mut self, exit: Exit) -> Self {
        self.exit = exit;
        self
    }

    pub(crate) fn with_builtin_flags(mut self, help: Option<&'a Flag>, version: Option<&'a Flag>) -> Self {
        self.help_flag = help;
        self.version_flag = version;
        self
    }

    /// Context for a matched sub-command, whose own flags shadow ours
    ///
    /// `--version` stays with the root level.
    pub(crate) fn child<'b>(&'b self, command: &'b Command, args: Vec<String>) -> Context<'b> {
        let version = self.version_flag;
        let mut flags: Vec<&'b Flag> = command.flags.iter().collect();
        flags.extend(
            self.flags
                .iter()
                .copied()
                .filter(|f| !version.is_some_and(|v| std::ptr::eq(v, *f))),
        );

        Context {
            name: format!("{} {}", self.name, command.primary_name()),
            app: self.app,
            command: Some(command),
            flags,
            args,
            parent: Some(self),
            exit: Rc::clone(&self.exit),
            help_flag: self.help_flag,
            version_flag: None,
        }
    }

    pub(crate) fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }

    /// Full name from the root, space separated
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    /// Walk parent links to the root context
    pub fn global(&self) -> &Context<'a> {
        let mut ctx = self;
        while let Some(parent) = ctx.parent {
            ctx = parent;
        }
        ctx
    }

    pub fn app(&self) -> Option<&'a App> {
        self.app
    }

    /// The command this level dispatches, `None` at the root
    pub fn command(&self) -> Option<&'a Command> {
        self.command
    }

    pub fn flags(&self) -> &[&'a Flag] {
        &self.flags
    }

    pub fn lookup_flag(&self, name: &str) -> Option<&'a Flag> {
        lookup_flag(self.flags.iter().copied(), name)
    }

    /// Whether the named flag appeared on the command line
    pub fn is_set(&self, name: &str) -> bool {
        self.lookup_flag(name).is_some_and(Flag::is_visited)
    }

    /// Read a flag and parse it, falling back to the zero value
    fn parsed<T, E>(&self, name: &str, parse: impl FnOnce(&str) -> Result<T, E>) -> T
    where
        T: Default,
    {
        self.lookup_flag(name)
            .and_then(|f| parse(&f.get_value()).ok())
            .unwrap_or_default()
    }

    pub fn get_string(&self, name: &str) -> String {
        self.lookup_flag(name).map(Flag::get_value).unwrap_or_default()
    }

    pub fn get_string_slice(&self, name: &str) -> Vec<String> {
        match self.lookup_flag(name).map(Flag::get_value) {
            Some(value) if !value.is_empty() => value.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.parsed(name, |s| parse_bool(s).ok_or(()))
    }

    pub fn get_int(&self, name: &str) -> isize {
        self.parsed(name, parse_isize)
    }

    pub fn get_int8(&self, name: &str) -> i8 {
        self.parsed(name, |s| parse_signed(s, 8, "int8").map(|v| v as i8))
    }

    pub fn get_int16(&self, name: &str) -> i16 {
        self.parsed(name, |s| parse_signed(s, 16, "int16").map(|v| v as i16))
    }

    pub fn get_int32(&self, name: &str) -> i32 {
        self.parsed(name, |s| parse_signed(s, 32, "int32").map(|v| v as i32))
    }

    pub fn get_int64(&self, name: &str) -> i64 {
        self.parsed(name, |s| parse_signed(s, 64, "int64"))
    }

    pub fn get_uint(&self, name: &str) -> usize {
        self.parsed(name, parse_usize)
    }

    pub fn get_uint8(&self, name: &str) -> u8 {
        self.parsed(name, |s| parse_unsigned(s, 8, "uint8").map(|v| v as u8))
    }

    pub fn get_uint16(&self, name: &str) -> u16 {
        self.parsed(name, |s| parse_unsigned(s, 16, "uint16").map(|v| v as u16))
    }

    pub fn get_uint32(&self, name: &str) -> u32 {
        self.parsed(name, |s| parse_unsigned(s, 32, "uint32").map(|v| v as u32))
    }

    pub fn get_uint64(&self, name: &str) -> u64 {
        self.parsed(name, |s| parse_unsigned(s, 64, "uint64"))
    }

    pub fn get_float32(&self, name: &str) -> f32 {
        self.parsed(name, |s| parse_float::<f32>(s, "float32"))
    }

    pub fn get_float64(&self, name: &str) -> f64 {
        self.parsed(name, |s| parse_float::<f64>(s, "float64"))
    }

    /// Number of positional arguments
    pub fn narg(&self) -> usize {
        self.args.len()
    }

    /// The n'th positional argument
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.args.get(n).map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn help_requested(&self) -> bool {
        self.help_flag.is_some_and(Flag::is_visited)
    }

    pub(crate) fn version_requested(&self) -> bool {
        self.version_flag.is_some_and(Flag::is_visited)
    }

    /// Help text for this level
    ///
    /// Lists every flag usable here, inherited and built-in ones included.
    pub fn help(&self) -> String {
        let help = match (self.command, self.app) {
            (Some(command), _) => HelpContext::for_command(&self.name, command),
            (None, Some(app)) => HelpContext::for_app(&self.name, app),
            (None, None) => return String::new(),
        };
        render_help(&help.with_flags(self.reachable_flags()))
    }

    /// Flags with at least one name not shadowed by an earlier flag
    fn reachable_flags(&self) -> Vec<&'a Flag> {
        self.flags
            .iter()
            .copied()
            .filter(|f| {
                f.names()
                    .iter()
                    .any(|n| self.lookup_flag(n).is_some_and(|found| std::ptr::eq(found, *f)))
            })
            .collect()
    }

    pub fn show_help(&self) {
        print!("{}", self.help());
    }

    pub fn show_help_and_exit(&self, code: i32) {
        self.show_help();
        self.exit(code);
    }

    pub fn show_version(&self) {
        if let Some(app) = self.app {
            print!("{}", render_version(&self.global().name, app));
        }
    }

    /// Print `err` with a help hint and exit with code 1
    pub fn show_error(&self, err: impl fmt::Display) {
        eprintln!("{}", err.to_string().red());
        eprintln!("\nRun '{} --help' for more information", self.name);
        self.exit(1);
    }

    /// Report a failed action and exit with code 1
    pub(crate) fn fail(&self, err: anyhow::Error) {
        tracing::warn!(context = %self.name, error = %err, "action failed");
        match self.app.and_then(App::action_panic_handler) {
            Some(hook) => hook(self, &err),
            None => eprintln!("{}", format!("fatal: {}", err).red()),
        }
        self.exit(1);
    }

    /// Terminate through the injected terminator
    pub fn exit(&self, code: i32) {
        (self.exit)(code);
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("parent", &self.parent.map(Context::name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Slot;

    #[test]
    fn test_context_getters() {
        let f1 = Flag::new("f1");
        let f2 = Flag::new("f2").bind(&Slot::new(false));
        let f3 = Flag::new("f3").bind(&Slot::<Vec<String>>::default());
        let f4 = Flag::new("f4");
        let ctx = Context::new("app").with_flags(vec![&f1, &f2, &f3, &f4]);

        for f in ctx.flags() {
            f.initialize().unwrap();
        }

        f1.set_value("123").unwrap();
        f2.set_value("true").unwrap();
        f3.set_value("a").unwrap();
        f3.set_value("b").unwrap();

        assert!(ctx.is_set("f1"));
        assert!(!ctx.is_set("f4"));
        assert!(!ctx.is_set("missing"));

        assert_eq!(ctx.get_string("f1"), "123");
        assert_eq!(ctx.get_int("f1"), 123);
        assert_eq!(ctx.get_int8("f1"), 123);
        assert_eq!(ctx.get_int16("f1"), 123);
        assert_eq!(ctx.get_int32("f1"), 123);
        assert_eq!(ctx.get_int64("f1"), 123);
        assert_eq!(ctx.get_uint("f1"), 123);
        assert_eq!(ctx.get_uint8("f1"), 123);
        assert_eq!(ctx.get_uint16("f1"), 123);
        assert_eq!(ctx.get_uint32("f1"), 123);
        assert_eq!(ctx.get_uint64("f1"), 123);
        assert_eq!(ctx.get_float32("f1"), 123.0);
        assert_eq!(ctx.get_float64("f1"), 123.0);

        assert!(ctx.get_bool("f2"));
        assert_eq!(ctx.get_string_slice("f3"), vec!["a", "b"]);
    }

    #[test]
    fn test_getters_collapse_to_zero() {
        let word = Flag::new("word");
        let ctx = Context::new("app").with_flags(vec![&word]);
        word.set_value("abc").unwrap();

        assert_eq!(ctx.get_int("word"), 0);
        assert_eq!(ctx.get_uint8("word"), 0);
        assert_eq!(ctx.get_float64("word"), 0.0);
        assert!(!ctx.get_bool("word"));

        assert_eq!(ctx.get_string("missing"), "");
        assert_eq!(ctx.get_int64("missing"), 0);
        assert!(ctx.get_string_slice("missing").is_empty());
    }

    #[test]
    fn test_getters_respect_width() {
        let big = Flag::new("big");
        let ctx = Context::new("app").with_flags(vec![&big]);
        big.set_value("300").unwrap();

        assert_eq!(ctx.get_int16("big"), 300);
        assert_eq!(ctx.get_int8("big"), 0);
        assert_eq!(ctx.get_uint8("big"), 0);
    }

    #[test]
    fn test_context_args() {
        let ctx = Context::new("app").with_args(["a", "b", "c"]);

        assert_eq!(ctx.narg(), 3);
        assert_eq!(ctx.arg(0), Some("a"));
        assert_eq!(ctx.arg(3), None);
        assert_eq!(ctx.args(), &["a", "b", "c"]);
    }

    #[test]
    fn test_context_parent() {
        let root = Context::new("p");
        let mid = Context::new("p m").with_parent(&root);
        let leaf = Context::new("p m c").with_parent(&mid);

        assert_eq!(leaf.parent().map(Context::name), Some("p m"));
        assert_eq!(leaf.global().name(), "p");
        assert_eq!(root.global().name(), "p");
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_help_lists_inherited_and_builtin_flags() {
        let app = App::new("app")
            .with_flag(Flag::new("v, verbose").with_usage("verbose output").with_bool(true))
            .with_command(
                Command::new("sub")
                    .with_usage("sub command")
                    .with_flag(Flag::new("l, level").with_usage("log level")),
            )
            .with_command(
                Command::new("loud").with_flag(Flag::new("v, verbose").with_usage("louder").with_bool(true)),
            );
        let help = Flag::new("h, help").with_usage("show help").with_bool(true);

        let mut flags: Vec<&Flag> = app.flags.iter().collect();
        flags.push(&help);
        let root = Context::new("app")
            .with_app(&app)
            .with_flags(flags)
            .with_builtin_flags(Some(&help), None);

        assert!(root.help().contains(
            "GLOBAL OPTIONS:\n   -v, --verbose   verbose output\n   -h, --help      show help\n\n"
        ));

        let sub = root.child(&app.commands[0], Vec::new());
        assert!(sub.help().ends_with(
            "OPTIONS:\n   -l, --level value   log level\n   -v, --verbose       verbose output\n   -h, --help          show help\n\n"
        ));

        // a fully shadowed global is listed once
        let loud = root.child(&app.commands[1], Vec::new());
        assert!(loud.help().ends_with(
            "OPTIONS:\n   -v, --verbose   louder\n   -h, --help      show help\n\n"
        ));
    }

    #[test]
    fn test_exit_is_injected() {
        let code = Rc::new(std::cell::Cell::new(None));
        let seen = Rc::clone(&code);
        let ctx = Context::new("app").with_exit(Rc::new(move |c| seen.set(Some(c))));

        ctx.show_error("boom");
        assert_eq!(code.get(), Some(1));
    }
}
