//! Typed flag values
//!
//! A [`Value`] is bound to exactly one storage [`Slot`] when a flag is
//! declared. `set` parses text with the grammar of the slot's type and
//! stores it; slice kinds append instead of replacing. `Display` renders
//! the current contents in canonical form.

pub mod net;
pub mod number;
pub mod time;

use crate::error::ValueResult;
use chrono::{DateTime, Duration, FixedOffset};
use chrono_tz::Tz;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::net::IpAddr;
use std::rc::Rc;
use url::Url;

pub use net::{IpMask, IpNet};

/// Shared storage cell a flag writes into
///
/// The application keeps one handle and reads it after parsing; the
/// flag's [`Value`] keeps the other.
pub struct Slot<T>(Rc<RefCell<T>>);

impl<T> Slot<T> {
    pub fn new(value: T) -> Self {
        Slot(Rc::new(RefCell::new(value)))
    }

    /// Borrow the current contents
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Replace the current contents
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }
}

impl<T: Clone> Slot<T> {
    /// Clone out the current contents
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Slot::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.0.borrow()).finish()
    }
}

/// Application-defined flag value
pub trait FlagValue {
    /// Parse `text` and store it
    fn set(&mut self, text: &str) -> ValueResult<()>;

    /// Render the current value
    fn render(&self) -> String;

    /// Boolean values never consume the following token
    fn is_bool(&self) -> bool {
        false
    }

    /// Restore the empty state before a run
    fn reset(&mut self) {}
}

/// The closed set of destination kinds a flag can bind to
#[derive(Clone)]
pub enum Value {
    Bool(Slot<bool>),
    String(Slot<String>),
    Int(Slot<isize>),
    Int8(Slot<i8>),
    Int16(Slot<i16>),
    Int32(Slot<i32>),
    Int64(Slot<i64>),
    Uint(Slot<usize>),
    Uint8(Slot<u8>),
    Uint16(Slot<u16>),
    Uint32(Slot<u32>),
    Uint64(Slot<u64>),
    Float32(Slot<f32>),
    Float64(Slot<f64>),
    Duration(Slot<Duration>),
    Time(Slot<Option<DateTime<FixedOffset>>>),
    Location(Slot<Tz>),
    Ip(Slot<Option<IpAddr>>),
    IpMask(Slot<Option<IpMask>>),
    IpNet(Slot<Option<IpNet>>),
    Url(Slot<Option<Url>>),
    StringSlice(Slot<Vec<String>>),
    IntSlice(Slot<Vec<isize>>),
    UintSlice(Slot<Vec<usize>>),
    Float64Slice(Slot<Vec<f64>>),
    IpSlice(Slot<Vec<IpAddr>>),
    IpNetSlice(Slot<Vec<IpNet>>),
    UrlSlice(Slot<Vec<Url>>),
    Custom(Rc<RefCell<dyn FlagValue>>),
}

/// Types a [`Slot`] may hold when bound to a flag
///
/// Binding an unsupported type fails to compile.
pub trait Destination: Sized {
    fn bind(slot: &Slot<Self>) -> Value;
}

macro_rules! destinations {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Destination for $ty {
                fn bind(slot: &Slot<Self>) -> Value {
                    Value::$variant(slot.clone())
                }
            }
        )*
    };
}

destinations! {
    bool => Bool,
    String => String,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    Duration => Duration,
    Option<DateTime<FixedOffset>> => Time,
    Tz => Location,
    Option<IpAddr> => Ip,
    Option<IpMask> => IpMask,
    Option<IpNet> => IpNet,
    Option<Url> => Url,
    Vec<String> => StringSlice,
    Vec<isize> => IntSlice,
    Vec<usize> => UintSlice,
    Vec<f64> => Float64Slice,
    Vec<IpAddr> => IpSlice,
    Vec<IpNet> => IpNetSlice,
    Vec<Url> => UrlSlice,
}

/// Permissive boolean grammar: unrecognized text is false
pub fn parse_bool_lenient(text: &str) -> bool {
    matches!(text, "1" | "t" | "T" | "TRUE" | "true" | "True" | "on")
}

/// Strict boolean grammar
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Strip one pair of matching surrounding quotes
pub fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn render_opt<T: fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

impl Value {
    /// Wrap an application-defined value
    pub fn custom<T: FlagValue + 'static>(cell: Rc<RefCell<T>>) -> Self {
        Value::Custom(cell)
    }

    /// Parse `text` and store it; slice kinds append
    pub fn set(&self, text: &str) -> ValueResult<()> {
        use number::{parse_float, parse_isize, parse_signed, parse_unsigned, parse_usize};

        match self {
            Value::Bool(s) => s.set(parse_bool_lenient(text)),
            Value::String(s) => s.set(text.to_string()),
            Value::Int(s) => s.set(parse_isize(text)?),
            Value::Int8(s) => s.set(parse_signed(text, 8, "int8")? as i8),
            Value::Int16(s) => s.set(parse_signed(text, 16, "int16")? as i16),
            Value::Int32(s) => s.set(parse_signed(text, 32, "int32")? as i32),
            Value::Int64(s) => s.set(parse_signed(text, 64, "int64")?),
            Value::Uint(s) => s.set(parse_usize(text)?),
            Value::Uint8(s) => s.set(parse_unsigned(text, 8, "uint8")? as u8),
            Value::Uint16(s) => s.set(parse_unsigned(text, 16, "uint16")? as u16),
            Value::Uint32(s) => s.set(parse_unsigned(text, 32, "uint32")? as u32),
            Value::Uint64(s) => s.set(parse_unsigned(text, 64, "uint64")?),
            Value::Float32(s) => s.set(parse_float::<f32>(text, "float32")?),
            Value::Float64(s) => s.set(parse_float::<f64>(text, "float64")?),
            Value::Duration(s) => s.set(time::parse_duration(text)?),
            Value::Time(s) => s.set(Some(time::parse_time(text)?)),
            Value::Location(s) => s.set(time::parse_location(text)?),
            Value::Ip(s) => s.set(Some(net::parse_ip(text)?)),
            Value::IpMask(s) => s.set(Some(text.parse::<IpMask>()?)),
            Value::IpNet(s) => s.set(Some(text.parse::<IpNet>()?)),
            Value::Url(s) => s.set(Some(net::parse_url(text)?)),
            Value::StringSlice(s) => s.borrow_mut().push(text.to_string()),
            Value::IntSlice(s) => {
                let v = parse_isize(text)?;
                s.borrow_mut().push(v)
            }
            Value::UintSlice(s) => {
                let v = parse_usize(text)?;
                s.borrow_mut().push(v)
            }
            Value::Float64Slice(s) => {
                let v = parse_float::<f64>(text, "float64")?;
                s.borrow_mut().push(v)
            }
            Value::IpSlice(s) => {
                let v = net::parse_ip(text)?;
                s.borrow_mut().push(v)
            }
            Value::IpNetSlice(s) => {
                let v = text.parse::<IpNet>()?;
                s.borrow_mut().push(v)
            }
            Value::UrlSlice(s) => {
                let v = net::parse_url(text)?;
                s.borrow_mut().push(v)
            }
            Value::Custom(c) => c.borrow_mut().set(text)?,
        }
        Ok(())
    }

    /// Restore the zero value; slice kinds are emptied
    pub fn reset(&self) {
        match self {
            Value::Bool(s) => s.set(false),
            Value::String(s) => s.set(String::new()),
            Value::Int(s) => s.set(0),
            Value::Int8(s) => s.set(0),
            Value::Int16(s) => s.set(0),
            Value::Int32(s) => s.set(0),
            Value::Int64(s) => s.set(0),
            Value::Uint(s) => s.set(0),
            Value::Uint8(s) => s.set(0),
            Value::Uint16(s) => s.set(0),
            Value::Uint32(s) => s.set(0),
            Value::Uint64(s) => s.set(0),
            Value::Float32(s) => s.set(0.0),
            Value::Float64(s) => s.set(0.0),
            Value::Duration(s) => s.set(Duration::zero()),
            Value::Time(s) => s.set(None),
            Value::Location(s) => s.set(Tz::UTC),
            Value::Ip(s) => s.set(None),
            Value::IpMask(s) => s.set(None),
            Value::IpNet(s) => s.set(None),
            Value::Url(s) => s.set(None),
            Value::StringSlice(s) => s.borrow_mut().clear(),
            Value::IntSlice(s) => s.borrow_mut().clear(),
            Value::UintSlice(s) => s.borrow_mut().clear(),
            Value::Float64Slice(s) => s.borrow_mut().clear(),
            Value::IpSlice(s) => s.borrow_mut().clear(),
            Value::IpNetSlice(s) => s.borrow_mut().clear(),
            Value::UrlSlice(s) => s.borrow_mut().clear(),
            Value::Custom(c) => c.borrow_mut().reset(),
        }
    }

    /// Whether the flag may appear without an argument
    pub fn is_bool(&self) -> bool {
        match self {
            Value::Bool(_) => true,
            Value::Custom(c) => c.borrow().is_bool(),
            _ => false,
        }
    }

    /// Whether repeated `set` calls accumulate
    pub fn is_slice(&self) -> bool {
        matches!(
            self,
            Value::StringSlice(_)
                | Value::IntSlice(_)
                | Value::UintSlice(_)
                | Value::Float64Slice(_)
                | Value::IpSlice(_)
                | Value::IpNetSlice(_)
                | Value::UrlSlice(_)
        )
    }

    /// Destination type name used in messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint(_) => "uint",
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Duration(_) => "duration",
            Value::Time(_) => "time",
            Value::Location(_) => "location",
            Value::Ip(_) => "ip",
            Value::IpMask(_) => "ip mask",
            Value::IpNet(_) => "ip network",
            Value::Url(_) => "url",
            Value::StringSlice(_) => "string list",
            Value::IntSlice(_) => "int list",
            Value::UintSlice(_) => "uint list",
            Value::Float64Slice(_) => "float64 list",
            Value::IpSlice(_) => "ip list",
            Value::IpNetSlice(_) => "ip network list",
            Value::UrlSlice(_) => "url list",
            Value::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Value::Bool(s) => s.borrow().to_string(),
            Value::String(s) => s.borrow().clone(),
            Value::Int(s) => s.borrow().to_string(),
            Value::Int8(s) => s.borrow().to_string(),
            Value::Int16(s) => s.borrow().to_string(),
            Value::Int32(s) => s.borrow().to_string(),
            Value::Int64(s) => s.borrow().to_string(),
            Value::Uint(s) => s.borrow().to_string(),
            Value::Uint8(s) => s.borrow().to_string(),
            Value::Uint16(s) => s.borrow().to_string(),
            Value::Uint32(s) => s.borrow().to_string(),
            Value::Uint64(s) => s.borrow().to_string(),
            Value::Float32(s) => s.borrow().to_string(),
            Value::Float64(s) => s.borrow().to_string(),
            Value::Duration(s) => time::format_duration(&s.borrow()),
            Value::Time(s) => s.borrow().as_ref().map(time::format_time).unwrap_or_default(),
            Value::Location(s) => s.borrow().name().to_string(),
            Value::Ip(s) => render_opt(&s.borrow()),
            Value::IpMask(s) => render_opt(&s.borrow()),
            Value::IpNet(s) => render_opt(&s.borrow()),
            Value::Url(s) => render_opt(&s.borrow()),
            Value::StringSlice(s) => s.borrow().join(","),
            Value::IntSlice(s) => join(&s.borrow()),
            Value::UintSlice(s) => join(&s.borrow()),
            Value::Float64Slice(s) => join(&s.borrow()),
            Value::IpSlice(s) => join(&s.borrow()),
            Value::IpNetSlice(s) => join(&s.borrow()),
            Value::UrlSlice(s) => join(&s.borrow()),
            Value::Custom(c) => c.borrow().render(),
        };
        f.write_str(&text)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value::<{}>({:?})", self.kind(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    fn bound<T: Destination + Default>() -> Value {
        T::bind(&Slot::<T>::default())
    }

    #[test]
    fn test_scalar_round_trip() {
        let cases: Vec<(&str, Value, &str)> = vec![
            ("-1", bound::<isize>(), "-1"),
            ("-1", bound::<i8>(), "-1"),
            ("-1", bound::<i16>(), "-1"),
            ("-1", bound::<i32>(), "-1"),
            ("-1", bound::<i64>(), "-1"),
            ("1", bound::<usize>(), "1"),
            ("1", bound::<u8>(), "1"),
            ("1", bound::<u16>(), "1"),
            ("1", bound::<u32>(), "1"),
            ("1", bound::<u64>(), "1"),
            ("1.1", bound::<f32>(), "1.1"),
            ("1.1", bound::<f64>(), "1.1"),
            ("true", bound::<bool>(), "true"),
            ("no", bound::<bool>(), "false"),
            ("abc", bound::<String>(), "abc"),
            ("0x10", bound::<i32>(), "16"),
            (
                "2018-05-24 14:56:56 +0000 UTC",
                bound::<Option<DateTime<FixedOffset>>>(),
                "2018-05-24 14:56:56 +0000 UTC",
            ),
            ("1h2m30s", Duration::bind(&Slot::new(Duration::zero())), "1h2m30s"),
            ("Asia/Shanghai", Tz::bind(&Slot::new(Tz::UTC)), "Asia/Shanghai"),
            ("127.0.0.1", bound::<Option<IpAddr>>(), "127.0.0.1"),
            ("255.255.0.0", bound::<Option<IpMask>>(), "ffff0000"),
            ("192.0.2.0/24", bound::<Option<IpNet>>(), "192.0.2.0/24"),
            ("http://google.com/", bound::<Option<Url>>(), "http://google.com/"),
        ];

        for (input, value, want) in cases {
            value
                .set(input)
                .unwrap_or_else(|e| panic!("{} set failed: {}", value.kind(), e));
            assert_eq!(value.to_string(), want, "{} rendered wrong", value.kind());
        }
    }

    #[test]
    fn test_bool_spellings() {
        let slot = Slot::new(false);
        let value = bool::bind(&slot);
        for text in ["1", "t", "T", "TRUE", "true", "True", "on"] {
            slot.set(false);
            value.set(text).unwrap();
            assert!(slot.get(), "{} should be true", text);
        }
        for text in ["0", "f", "F", "FALSE", "false", "False", "off", "yes", ""] {
            slot.set(true);
            value.set(text).unwrap();
            assert!(!slot.get(), "{} should be false", text);
        }
    }

    #[test]
    fn test_slices_append_in_order() {
        let cases: Vec<(&str, &str, Value)> = vec![
            ("1", "2", bound::<Vec<isize>>()),
            ("1", "2", bound::<Vec<usize>>()),
            ("1.1", "2.2", bound::<Vec<f64>>()),
            ("a", "b", bound::<Vec<String>>()),
            ("127.0.0.1", "127.0.0.2", bound::<Vec<IpAddr>>()),
            ("192.0.2.0/24", "192.168.0.0/16", bound::<Vec<IpNet>>()),
            ("http://google.com/", "http://baidu.com/", bound::<Vec<Url>>()),
        ];

        for (first, second, value) in cases {
            value.set(first).unwrap();
            value.set(second).unwrap();
            assert!(value.is_slice());
            assert_eq!(value.to_string(), format!("{},{}", first, second));
        }
    }

    #[test]
    fn test_slice_writes_through_slot() {
        let slot: Slot<Vec<String>> = Slot::default();
        let value = Vec::<String>::bind(&slot);
        for item in ["x", "y", "z"] {
            value.set(item).unwrap();
        }
        assert_eq!(slot.get(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_set_errors_name_kind() {
        let value = bound::<u8>();
        let err = value.set("300").unwrap_err();
        assert_eq!(err.to_string(), "invalid uint8 value '300': out of range");

        let value = bound::<Option<IpAddr>>();
        assert!(value.set("not-an-ip").is_err());
        assert_eq!(value.to_string(), "");
    }

    #[derive(Default)]
    struct Level(u8);

    impl FlagValue for Level {
        fn set(&mut self, text: &str) -> ValueResult<()> {
            self.0 = match text {
                "low" => 1,
                "high" => 2,
                _ => return Err(ValueError::invalid(text, "level", "expected low or high")),
            };
            Ok(())
        }

        fn render(&self) -> String {
            match self.0 {
                1 => "low".to_string(),
                2 => "high".to_string(),
                _ => String::new(),
            }
        }

        fn reset(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn test_reset_restores_zero() {
        let values = vec![
            bound::<bool>(),
            bound::<String>(),
            bound::<i64>(),
            bound::<f64>(),
            bound::<Option<IpAddr>>(),
            bound::<Vec<String>>(),
            bound::<Vec<IpNet>>(),
        ];
        let inputs = ["true", "abc", "-5", "1.5", "10.0.0.1", "a", "10.0.0.0/8"];

        for (value, input) in values.iter().zip(inputs) {
            value.set(input).unwrap();
            value.reset();
        }
        let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
        assert_eq!(rendered, vec!["false", "", "0", "0", "", "", ""]);

        let tz = Slot::new(Tz::UTC);
        let value = Tz::bind(&tz);
        value.set("Asia/Shanghai").unwrap();
        value.reset();
        assert_eq!(tz.get(), Tz::UTC);

        let level = Rc::new(RefCell::new(Level::default()));
        let value = Value::custom(level.clone());
        value.set("low").unwrap();
        value.reset();
        assert_eq!(value.to_string(), "");
    }

    #[test]
    fn test_custom_value() {
        let level = Rc::new(RefCell::new(Level::default()));
        let value = Value::custom(level.clone());
        value.set("high").unwrap();
        assert_eq!(level.borrow().0, 2);
        assert_eq!(value.to_string(), "high");
        assert!(value.set("medium").is_err());
        assert!(!value.is_bool());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'a b'"), "a b");
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'a b\""), "'a b\"");
        assert_eq!(unquote("'"), "'");
        assert_eq!(unquote("plain"), "plain");
    }
}
