//! Integer and float grammar
//!
//! Integers take an optional sign and auto-detect their base from the
//! prefix: `0x` hex, `0o` or a bare leading `0` octal, `0b` binary,
//! decimal otherwise. Underscores may separate digits.

use crate::error::{ValueError, ValueResult};
use std::num::IntErrorKind;
use std::str::FromStr;

/// Split off sign and base prefix: (negative, radix, digits)
fn split_radix(s: &str) -> (bool, u32, &str) {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = rest.get(..2).map(|p| p.to_ascii_lowercase());
    match lower.as_deref() {
        Some("0x") => (negative, 16, &rest[2..]),
        Some("0o") => (negative, 8, &rest[2..]),
        Some("0b") => (negative, 2, &rest[2..]),
        _ if rest.len() > 1 && rest.starts_with('0') => (negative, 8, &rest[1..]),
        _ => (negative, 10, rest),
    }
}

/// Parse the unsigned magnitude of an integer literal
fn magnitude(input: &str, digits: &str, radix: u32, kind: &'static str) -> ValueResult<u128> {
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(ValueError::invalid(input, kind, "invalid syntax"));
    }
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(ValueError::invalid(input, kind, "invalid syntax"));
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    u128::from_str_radix(&cleaned, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ValueError::out_of_range(input, kind),
        _ => ValueError::invalid(input, kind, "invalid syntax"),
    })
}

/// Parse a signed integer that must fit in `bits` bits
pub fn parse_signed(input: &str, bits: u32, kind: &'static str) -> ValueResult<i64> {
    let (negative, radix, digits) = split_radix(input);
    let mag = magnitude(input, digits, radix, kind)?;

    let limit = 1u128 << (bits - 1);
    if negative {
        if mag > limit {
            return Err(ValueError::out_of_range(input, kind));
        }
        Ok((-(mag as i128)) as i64)
    } else {
        if mag >= limit {
            return Err(ValueError::out_of_range(input, kind));
        }
        Ok(mag as i64)
    }
}

/// Parse an unsigned integer that must fit in `bits` bits
pub fn parse_unsigned(input: &str, bits: u32, kind: &'static str) -> ValueResult<u64> {
    if input.starts_with(['+', '-']) {
        return Err(ValueError::invalid(input, kind, "invalid syntax"));
    }
    let (_, radix, digits) = split_radix(input);
    let mag = magnitude(input, digits, radix, kind)?;

    if bits < 128 && mag >> bits != 0 {
        return Err(ValueError::out_of_range(input, kind));
    }
    Ok(mag as u64)
}

/// Parse a floating point literal
///
/// Finite input that overflows to infinity is rejected as out of range.
pub fn parse_float<F>(input: &str, kind: &'static str) -> ValueResult<F>
where
    F: FromStr<Err = std::num::ParseFloatError> + Into<f64> + Copy,
{
    let value: F = input
        .trim()
        .parse()
        .map_err(|e| ValueError::invalid(input, kind, e))?;

    let wide: f64 = value.into();
    if wide.is_infinite() && !input.to_ascii_lowercase().contains("inf") {
        return Err(ValueError::out_of_range(input, kind));
    }
    Ok(value)
}

/// Native-width signed integer
pub fn parse_isize(input: &str) -> ValueResult<isize> {
    parse_signed(input, isize::BITS, "int").map(|v| v as isize)
}

/// Native-width unsigned integer
pub fn parse_usize(input: &str) -> ValueResult<usize> {
    parse_unsigned(input, usize::BITS, "uint").map(|v| v as usize)
}
