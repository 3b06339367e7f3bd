//! Flag declarations
//!
//! A flag binds one or more names to a [`Value`] together with its
//! default, environment fallbacks and help metadata.

use crate::error::{ValueError, ValueResult};
use crate::value::{unquote, Destination, Slot, Value};
use std::cell::Cell;
use std::env;

/// A named command-line option
#[derive(Debug)]
pub struct Flag {
    /// Comma-separated names, e.g. `"i, input"`
    pub name: String,

    /// Help text
    pub usage: String,

    /// Value name shown in help, e.g. `<file>`
    pub placeholder: String,

    /// Literal applied before parsing when no environment value is found
    pub default: String,

    /// Comma-separated environment variables, checked in order
    pub env_var: String,

    /// Value used when the flag appears without an argument
    pub no_opt_default: String,

    /// Treat the flag as a switch even if its value is not boolean
    pub is_bool: bool,

    /// Hide from help output
    pub hidden: bool,

    value: Value,
    visited: Cell<bool>,

    /// Holds a default or environment value the command line replaces
    fallback: Cell<bool>,
}

impl Flag {
    /// Create a flag backed by its own string storage
    pub fn new(name: impl Into<String>) -> Self {
        Flag {
            name: name.into(),
            usage: String::new(),
            placeholder: String::new(),
            default: String::new(),
            env_var: String::new(),
            no_opt_default: String::new(),
            is_bool: false,
            hidden: false,
            value: Value::String(Slot::default()),
            visited: Cell::new(false),
            fallback: Cell::new(false),
        }
    }

    /// Bind the flag to an application storage cell
    pub fn bind<T: Destination>(mut self, slot: &Slot<T>) -> Self {
        self.value = T::bind(slot);
        self
    }

    /// Bind the flag to an already constructed value
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// Set the help text
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Set the value name shown in help
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the literal applied when no environment value is found
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Set the comma-separated environment variables to check
    pub fn with_env_var(mut self, env_var: impl Into<String>) -> Self {
        self.env_var = env_var.into();
        self
    }

    /// Set the value used when the flag has no argument
    pub fn with_no_opt_default(mut self, value: impl Into<String>) -> Self {
        self.no_opt_default = value.into();
        self
    }

    /// Set whether the flag is a switch taking no argument
    pub fn with_bool(mut self, is_bool: bool) -> Self {
        self.is_bool = is_bool;
        self
    }

    /// Set whether the flag is left out of help
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// All names of this flag, aliases trimmed
    pub fn names(&self) -> Vec<&str> {
        split_names(&self.name)
    }

    /// Whether `name` is one of this flag's names
    pub fn has_name(&self, name: &str) -> bool {
        self.names().iter().any(|n| *n == name)
    }

    /// Whether the flag may appear without an argument
    pub fn takes_no_argument(&self) -> bool {
        self.is_bool || self.value.is_bool()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the flag was given on the command line
    pub fn is_visited(&self) -> bool {
        self.visited.get()
    }

    /// Reset the value, then apply environment or default value
    ///
    /// The first non-empty environment variable wins over the default.
    /// A slice filled here is replaced, not extended, by the first
    /// command-line value.
    pub fn initialize(&self) -> ValueResult<()> {
        self.visited.set(false);
        self.fallback.set(false);
        self.value.reset();

        let from_env = split_names(&self.env_var)
            .into_iter()
            .filter_map(|key| env::var(key).ok())
            .find(|v| !v.is_empty());

        let fallback = match from_env {
            Some(value) => {
                tracing::trace!(flag = %self.name, value = %value, "flag from environment");
                value
            }
            None if !self.default.is_empty() => {
                tracing::trace!(flag = %self.name, value = %self.default, "flag from default");
                self.default.clone()
            }
            None => return Ok(()),
        };

        self.value.set(&fallback)?;
        self.fallback.set(self.value.is_slice());
        Ok(())
    }

    /// Store a command-line argument and mark the flag visited
    pub fn set_value(&self, text: &str) -> ValueResult<()> {
        let text = unquote(text);
        if self.fallback.replace(false) {
            self.value.reset();
        }
        self.value.set(text)?;
        self.visited.set(true);
        tracing::trace!(flag = %self.name, value = %text, "flag set");
        Ok(())
    }

    /// Current value in canonical form
    pub fn get_value(&self) -> String {
        self.value.to_string()
    }

    pub(crate) fn invalid(&self, err: ValueError) -> crate::error::ParseError {
        crate::error::ParseError::InvalidValue {
            flag: self.names().first().copied().unwrap_or_default().to_string(),
            source: err,
        }
    }
}

pub(crate) fn split_names(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect()
}

/// Find a flag by any of its names
pub fn lookup_flag<'a, I>(flags: I, name: &str) -> Option<&'a Flag>
where
    I: IntoIterator<Item = &'a Flag>,
{
    flags.into_iter().find(|f| f.has_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset};
    use chrono_tz::Tz;
    use serial_test::serial;
    use std::net::IpAddr;
    use url::Url;

    #[test]
    fn test_names() {
        let f = Flag::new("i, input");
        assert_eq!(f.names(), vec!["i", "input"]);
        assert!(f.has_name("input"));
        assert!(!f.has_name("in"));
    }

    #[test]
    fn test_initialize_all_kinds() {
        let flags = vec![
            Flag::new("a").bind(&Slot::new(false)),
            Flag::new("b").bind(&Slot::new(String::new())),
            Flag::new("c").bind(&Slot::<Vec<String>>::default()),
            Flag::new("d").bind(&Slot::new(0isize)),
            Flag::new("e").bind(&Slot::<Vec<isize>>::default()),
            Flag::new("f").bind(&Slot::new(0i8)),
            Flag::new("g").bind(&Slot::new(0u64)),
            Flag::new("h").bind(&Slot::<Vec<usize>>::default()),
            Flag::new("i").bind(&Slot::new(0f32)),
            Flag::new("j").bind(&Slot::<Vec<f64>>::default()),
            Flag::new("k").bind(&Slot::<Option<DateTime<FixedOffset>>>::default()),
            Flag::new("l").bind(&Slot::new(Duration::zero())),
            Flag::new("m").bind(&Slot::new(Tz::UTC)),
            Flag::new("n").bind(&Slot::<Option<IpAddr>>::default()),
            Flag::new("o").bind(&Slot::<Vec<IpAddr>>::default()),
            Flag::new("p").bind(&Slot::<Option<Url>>::default()),
            Flag::new("q"),
        ];
        for f in &flags {
            f.initialize().unwrap();
            assert!(!f.is_visited());
        }
    }

    #[test]
    #[serial]
    fn test_initialize_env_var() {
        env::remove_var("CLITREE_TEST_E1");
        env::set_var("CLITREE_TEST_E2", "ee");

        let slot = Slot::new(String::new());
        let f = Flag::new("e")
            .bind(&slot)
            .with_default("dd")
            .with_env_var("CLITREE_TEST_E1, CLITREE_TEST_E2");
        f.initialize().unwrap();

        assert_eq!(f.get_value(), "ee");
        assert_eq!(slot.get(), "ee");
        assert!(!f.is_visited());

        env::remove_var("CLITREE_TEST_E2");
    }

    #[test]
    #[serial]
    fn test_initialize_skips_empty_env() {
        env::set_var("CLITREE_TEST_EMPTY", "");

        let f = Flag::new("e")
            .with_default("dd")
            .with_env_var("CLITREE_TEST_EMPTY");
        f.initialize().unwrap();
        assert_eq!(f.get_value(), "dd");

        env::remove_var("CLITREE_TEST_EMPTY");
    }

    #[test]
    fn test_initialize_default() {
        let f = Flag::new("d").with_default("ee");
        f.initialize().unwrap();
        assert_eq!(f.get_value(), "ee");
    }

    #[test]
    fn test_slice_default_is_replaced_by_argv() {
        let list = Slot::<Vec<String>>::default();
        let f = Flag::new("l, list").with_default("a").bind(&list);

        f.initialize().unwrap();
        assert_eq!(list.get(), vec!["a"]);

        f.set_value("b").unwrap();
        f.set_value("c").unwrap();
        assert_eq!(list.get(), vec!["b", "c"]);

        f.initialize().unwrap();
        assert_eq!(list.get(), vec!["a"]);
        assert!(!f.is_visited());
    }

    #[test]
    #[serial]
    fn test_slice_env_is_replaced_by_argv() {
        env::set_var("CLITREE_TEST_LIST", "x");

        let list = Slot::<Vec<String>>::default();
        let f = Flag::new("list")
            .with_default("a")
            .with_env_var("CLITREE_TEST_LIST")
            .bind(&list);

        f.initialize().unwrap();
        assert_eq!(list.get(), vec!["x"]);
        f.set_value("y").unwrap();
        assert_eq!(list.get(), vec!["y"]);

        env::remove_var("CLITREE_TEST_LIST");
    }

    #[test]
    fn test_initialize_clears_previous_value() {
        let f = Flag::new("name");
        f.set_value("x").unwrap();
        f.initialize().unwrap();
        assert_eq!(f.get_value(), "");

        let n = Slot::new(7u16);
        let f = Flag::new("n").bind(&n);
        f.initialize().unwrap();
        assert_eq!(n.get(), 0);
    }

    #[test]
    fn test_initialize_rejects_bad_default() {
        let f = Flag::new("n").bind(&Slot::new(0u8)).with_default("nope");
        assert!(f.initialize().is_err());
    }

    #[test]
    fn test_set_value_marks_visited_and_unquotes() {
        let f = Flag::new("s");
        f.set_value("'a b'").unwrap();
        assert!(f.is_visited());
        assert_eq!(f.get_value(), "a b");
    }

    #[test]
    fn test_bool_detection() {
        assert!(Flag::new("b").bind(&Slot::new(false)).takes_no_argument());
        assert!(Flag::new("debug").with_bool(true).takes_no_argument());
        assert!(!Flag::new("s").takes_no_argument());
    }

    #[test]
    fn test_lookup_flag() {
        let flags = vec![Flag::new("a, all"), Flag::new("b")];
        assert_eq!(lookup_flag(&flags, "all").map(|f| f.name.as_str()), Some("a, all"));
        assert!(lookup_flag(&flags, "c").is_none());
    }
}
