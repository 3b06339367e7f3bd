//! Help and version text

use crate::cli::App;
use crate::flag::Flag;
use crate::runner::Command;
use std::fmt::Write;

/// Everything needed to render one help page
#[derive(Debug)]
pub struct HelpContext<'a> {
    pub name: String,
    pub version: &'a str,
    pub usage: &'a str,
    pub usage_text: &'a str,
    pub description: &'a str,
    pub authors: &'a str,
    pub examples: &'a str,
    pub see_also: &'a str,
    pub flags: Vec<&'a Flag>,
    pub commands: &'a [Command],
}

impl<'a> HelpContext<'a> {
    pub fn for_app(name: &str, app: &'a App) -> Self {
        HelpContext {
            name: name.to_string(),
            version: &app.version,
            usage: &app.usage,
            usage_text: &app.usage_text,
            description: &app.description,
            authors: &app.authors,
            examples: &app.examples,
            see_also: &app.see_also,
            flags: app.flags.iter().collect(),
            commands: &app.commands,
        }
    }

    pub fn for_command(name: &str, command: &'a Command) -> Self {
        HelpContext {
            name: name.to_string(),
            version: "",
            usage: &command.usage,
            usage_text: &command.usage_text,
            description: &command.description,
            authors: "",
            examples: &command.examples,
            see_also: &command.see_also,
            flags: command.flags.iter().collect(),
            commands: &command.commands,
        }
    }

    /// Replace the declared flags with the full set visible at a level
    pub fn with_flags(mut self, flags: Vec<&'a Flag>) -> Self {
        self.flags = flags;
        self
    }

    /// Nesting depth, 0 for the application itself
    pub fn level(&self) -> usize {
        self.name.matches(' ').count()
    }

    pub fn visible_flags(&self) -> Vec<&'a Flag> {
        self.flags.iter().copied().filter(|f| !f.hidden).collect()
    }

    pub fn visible_commands(&self) -> Vec<&'a Command> {
        self.commands.iter().filter(|c| !c.hidden).collect()
    }

    pub fn usage_text_lines(&self) -> Vec<String> {
        if !self.usage_text.is_empty() {
            return trimmed_lines(self.usage_text);
        }

        let has_flags = !self.visible_flags().is_empty();
        let mut usage = String::new();
        if !self.visible_commands().is_empty() {
            if has_flags {
                usage.push_str("[global options] ");
            }
            usage.push_str("COMMAND [command options] [arguments ...]");
        } else {
            if has_flags {
                usage.push_str(if self.level() == 0 {
                    "[options] "
                } else {
                    "[command options] "
                });
            }
            usage.push_str("[arguments ...]");
        }
        vec![usage]
    }

    pub fn author_lines(&self) -> Vec<String> {
        trimmed_lines(self.authors)
    }

    pub fn example_lines(&self) -> Vec<String> {
        trimmed_lines(self.examples)
    }

    pub fn see_also_lines(&self) -> Vec<String> {
        trimmed_lines(self.see_also)
    }

    /// Aligned `label   usage` lines for visible flags
    pub fn visible_flags_usage_lines(&self) -> Vec<String> {
        let flags = self.visible_flags();

        // long-only labels are indented when any short name exists
        let long_indent = flags
            .iter()
            .any(|f| f.names().iter().any(|n| n.chars().count() == 1));

        let labels: Vec<String> = flags.iter().map(|f| flag_label(f, long_indent)).collect();
        let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        flags
            .iter()
            .zip(&labels)
            .map(|(f, label)| {
                let mut parts = Vec::new();
                if !f.usage.is_empty() {
                    parts.push(f.usage.clone());
                }
                if !f.default.is_empty() {
                    parts.push(format!("(default: {})", f.default));
                }
                if !f.env_var.is_empty() {
                    parts.push(format!("(env: {})", f.env_var));
                }
                format!("{:<width$}   {}", label, parts.join(" "), width = width)
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    /// Aligned `names   usage` lines for visible commands
    pub fn visible_commands_usage_lines(&self) -> Vec<String> {
        let commands = self.visible_commands();
        let labels: Vec<String> = commands.iter().map(|c| c.names().join(", ")).collect();
        let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        commands
            .iter()
            .zip(&labels)
            .map(|(c, label)| {
                format!("{:<width$}   {}", label, c.usage, width = width)
                    .trim_end()
                    .to_string()
            })
            .collect()
    }
}

fn trimmed_lines(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(|l| l.trim().to_string()).collect()
}

fn flag_label(flag: &Flag, long_indent: bool) -> String {
    let names: Vec<String> = flag
        .names()
        .iter()
        .map(|n| {
            if n.chars().count() == 1 {
                format!("-{}", n)
            } else {
                format!("--{}", n)
            }
        })
        .collect();

    let mut label = names.join(", ");
    if !flag.takes_no_argument() {
        let placeholder = if flag.placeholder.is_empty() {
            "value"
        } else {
            flag.placeholder.as_str()
        };
        if flag.no_opt_default.is_empty() {
            label.push_str(&format!(" {}", placeholder));
        } else {
            label.push_str(&format!(" [{}]", placeholder));
        }
    }

    if long_indent && label.starts_with("--") {
        label.insert_str(0, "    ");
    }
    label
}

fn section(out: &mut String, title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let _ = write!(out, "\n\n{}:", title);
    for line in lines {
        let _ = write!(out, "\n   {}", line);
    }
}

/// Render a help page
pub fn render_help(c: &HelpContext<'_>) -> String {
    let mut out = String::new();

    let _ = write!(out, "NAME:\n   {}", c.name);
    if !c.usage.is_empty() {
        let _ = write!(out, " - {}", c.usage);
    }

    let usage: Vec<String> = c
        .usage_text_lines()
        .into_iter()
        .map(|line| format!("{} {}", c.name, line))
        .collect();
    section(&mut out, "USAGE", &usage);

    if !c.version.is_empty() {
        section(&mut out, "VERSION", &[c.version.to_string()]);
    }
    if !c.description.is_empty() {
        section(&mut out, "DESCRIPTION", &[c.description.trim().to_string()]);
    }
    section(&mut out, "AUTHORS", &c.author_lines());

    let has_commands = !c.visible_commands().is_empty();
    section(&mut out, "COMMANDS", &c.visible_commands_usage_lines());

    let options_title = if has_commands { "GLOBAL OPTIONS" } else { "OPTIONS" };
    section(&mut out, options_title, &c.visible_flags_usage_lines());

    section(&mut out, "EXAMPLES", &c.example_lines());
    section(&mut out, "SEE ALSO", &c.see_also_lines());

    if has_commands {
        let _ = write!(
            out,
            "\n\nRun '{} COMMAND --help' for more information on a command.",
            c.name
        );
    }
    out.push_str("\n\n");
    out
}

/// Render version and build details
pub fn render_version(name: &str, app: &App) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:       {}", name);
    let _ = writeln!(out, "Version:    {}", app.version);

    if let Some(info) = &app.build_info {
        let rows = [
            ("Patches:", &info.git_rev_count),
            ("Git branch:", &info.git_branch),
            ("Git commit:", &info.git_commit),
            ("Built:", &info.timestamp),
        ];
        for (label, value) in rows {
            if !value.is_empty() {
                let _ = writeln!(out, "{:<12}{}", label, value);
            }
        }
    }

    let _ = writeln!(
        out,
        "OS/Arch:    {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BuildInfo;

    fn demo_app() -> App {
        App::new("app")
            .with_version("1.1.1")
            .with_usage("demo app")
            .with_authors("Jane Doe <jane@example.com>")
            .with_flag(
                Flag::new("i, input")
                    .with_usage("input file")
                    .with_placeholder("file"),
            )
            .with_flag(Flag::new("o, output").with_usage("output file"))
            .with_flag(Flag::new("hidden").with_hidden(true))
            .with_command(
                Command::new("build")
                    .with_usage("build project")
                    .with_flag(Flag::new("debug").with_usage("enable debug").with_bool(true))
                    .with_see_also("https://example.com/build\nhttps://example.com/build2"),
            )
            .with_command(Command::new("release").with_usage("release project"))
            .with_command(Command::new("secret").with_hidden(true))
    }

    #[test]
    fn test_app_help() {
        let app = demo_app();
        let text = render_help(&HelpContext::for_app("app", &app));

        let expected = "\
NAME:
   app - demo app

USAGE:
   app [global options] COMMAND [command options] [arguments ...]

VERSION:
   1.1.1

AUTHORS:
   Jane Doe <jane@example.com>

COMMANDS:
   build     build project
   release   release project

GLOBAL OPTIONS:
   -i, --input file     input file
   -o, --output value   output file

Run 'app COMMAND --help' for more information on a command.

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_command_help() {
        let app = demo_app();
        let text = render_help(&HelpContext::for_command("app build", &app.commands[0]));

        let expected = "\
NAME:
   app build - build project

USAGE:
   app build [command options] [arguments ...]

OPTIONS:
   --debug   enable debug

SEE ALSO:
   https://example.com/build
   https://example.com/build2

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_flag_labels() {
        let flags = [
            Flag::new("v, verbose").with_bool(true),
            Flag::new("color")
                .with_no_opt_default("always")
                .with_placeholder("when")
                .with_default("auto")
                .with_env_var("APP_COLOR"),
        ];
        let c = HelpContext {
            name: "app".to_string(),
            version: "",
            usage: "",
            usage_text: "",
            description: "",
            authors: "",
            examples: "",
            see_also: "",
            flags: flags.iter().collect(),
            commands: &[],
        };

        assert_eq!(
            c.visible_flags_usage_lines(),
            vec![
                "-v, --verbose",
                "    --color [when]   (default: auto) (env: APP_COLOR)",
            ]
        );
        assert_eq!(c.usage_text_lines(), vec!["[options] [arguments ...]"]);
    }

    #[test]
    fn test_custom_usage_text() {
        let cmd = Command::new("get").with_usage_text("  get KEY\n  get --all  ");
        let c = HelpContext::for_command("app get", &cmd);
        assert_eq!(c.usage_text_lines(), vec!["get KEY", "get --all"]);
        assert_eq!(c.level(), 1);
    }

    #[test]
    fn test_render_version() {
        let app = App::new("app")
            .with_version("1.2.3")
            .with_build_info(BuildInfo::parse("branch:master commit:320279c patches:1234"));
        let text = render_version("app", &app);

        assert!(text.starts_with("Name:       app\nVersion:    1.2.3\n"));
        assert!(text.contains("Patches:    1234\n"));
        assert!(text.contains("Git branch: master\n"));
        assert!(text.contains("Git commit: 320279c\n"));
        assert!(!text.contains("Built:"));
        assert!(text.contains("OS/Arch:"));
    }
}
