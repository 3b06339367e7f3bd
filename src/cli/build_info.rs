//! Build information embedded at compile time

use crate::value::unquote;
use regex::Regex;
use std::sync::OnceLock;

/// Build details shown by `--version`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub timestamp: String,
    pub git_branch: String,
    pub git_commit: String,
    pub git_rev_count: String,
}

impl BuildInfo {
    /// Parse `key:value` pairs separated by whitespace
    ///
    /// Recognized keys are `time`, `branch`, `commit` and `patches`.
    /// Values may be single or double quoted to include spaces. The
    /// first occurrence of a key wins.
    pub fn parse(info: &str) -> Self {
        let mut build = BuildInfo::default();

        for caps in pattern().captures_iter(info) {
            let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            // a value must end at whitespace or end of input
            if !info[whole.end()..].chars().next().map_or(true, char::is_whitespace) {
                continue;
            }

            let field = match key.as_str() {
                "time" => &mut build.timestamp,
                "branch" => &mut build.git_branch,
                "commit" => &mut build.git_commit,
                _ => &mut build.git_rev_count,
            };
            if field.is_empty() {
                *field = unquote(value.as_str()).to_string();
            }
        }

        build
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
            && self.git_branch.is_empty()
            && self.git_commit.is_empty()
            && self.git_rev_count.is_empty()
    }
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:^|\s)(time|branch|commit|patches):("[^"]*"|'[^']*'|[[:graph:]]+)"#).unwrap()
    })
}
