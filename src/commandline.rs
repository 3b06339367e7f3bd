//! Argument matching for one level of the command tree
//!
//! Tokens are consumed left to right:
//! - `--` sends every later token to the positional list untouched
//! - `--name`, `--name=value`, `--name value` reference a long flag
//! - `-x`, `-x=value`, `-xvalue`, `-x value` reference a short flag
//! - the first bare token may name a sub-command, which ends matching at
//!   this level; any other bare token is positional and closes the
//!   command search

use crate::error::{ParseError, ParseResult};
use crate::flag::{lookup_flag, Flag};
use crate::runner::Command;

/// Outcome of matching one level
#[derive(Debug, Default)]
pub struct Matched<'a> {
    /// Sub-command named on the line, if any
    pub command: Option<&'a Command>,

    /// Positional arguments left at this level
    pub args: Vec<String>,

    /// Tokens after the sub-command name, handed to that command
    pub rest: Vec<String>,
}

/// Matcher over a flag set and candidate sub-commands
pub struct CommandLine<'a> {
    flags: Vec<&'a Flag>,
    commands: &'a [Command],
}

impl<'a> CommandLine<'a> {
    pub fn new(flags: Vec<&'a Flag>, commands: &'a [Command]) -> Self {
        CommandLine { flags, commands }
    }

    /// Match `args`, updating the flags they reference
    pub fn parse(&self, args: &[String]) -> ParseResult<Matched<'a>> {
        let mut matched = Matched::default();
        let mut searching = true;
        let mut next = 0;

        while next < args.len() {
            let token = &args[next];
            next += 1;

            if token == "--" {
                matched.args.extend(args[next..].iter().cloned());
                break;
            }

            if let Some(body) = token.strip_prefix("--") {
                next = self.parse_long(token, body, args, next)?;
                continue;
            }

            if let Some(body) = token.strip_prefix('-').filter(|b| !b.is_empty()) {
                next = self.parse_short(token, body, args, next)?;
                continue;
            }

            if searching {
                if let Some(command) = self.commands.iter().find(|c| c.has_name(token)) {
                    tracing::debug!(command = %command.name, "matched command");
                    matched.command = Some(command);
                    matched.rest = args[next..].to_vec();
                    break;
                }
                searching = false;
            }

            tracing::trace!(arg = %token, "positional argument");
            matched.args.push(token.clone());
        }

        Ok(matched)
    }

    fn lookup(&self, name: &str) -> Option<&'a Flag> {
        lookup_flag(self.flags.iter().copied(), name)
    }

    fn parse_long(&self, token: &str, body: &str, args: &[String], next: usize) -> ParseResult<usize> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let flag = self
            .lookup(name)
            .ok_or_else(|| ParseError::UnrecognizedOption(token.to_string()))?;
        assign(flag, token, inline, args, next)
    }

    fn parse_short(&self, token: &str, body: &str, args: &[String], next: usize) -> ParseResult<usize> {
        let split = body.chars().next().map_or(0, char::len_utf8);
        let (name, glued) = body.split_at(split);
        let inline = match glued {
            "" => None,
            g => Some(g.strip_prefix('=').unwrap_or(g)),
        };
        let flag = self
            .lookup(name)
            .ok_or_else(|| ParseError::UnrecognizedOption(token.to_string()))?;
        assign(flag, token, inline, args, next)
    }
}

/// Store the value for `flag`, consuming the following token when needed
fn assign(
    flag: &Flag,
    token: &str,
    inline: Option<&str>,
    args: &[String],
    next: usize,
) -> ParseResult<usize> {
    let (value, next) = match inline {
        Some(value) => (value, next),
        None if flag.takes_no_argument() => ("true", next),
        None if !flag.no_opt_default.is_empty() => (flag.no_opt_default.as_str(), next),
        None => match args.get(next) {
            Some(value) => (value.as_str(), next + 1),
            None => return Err(ParseError::MissingArgument(token.to_string())),
        },
    };

    flag.set_value(value).map_err(|e| flag.invalid(e))?;
    Ok(next)
}
