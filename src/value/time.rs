//! Duration, timestamp and location grammar

use crate::error::{ValueError, ValueResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1_000 * NANOSECOND;
const MILLISECOND: u128 = 1_000 * MICROSECOND;
const SECOND: u128 = 1_000 * MILLISECOND;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parse a duration such as `1h2m30s`, `1.5s`, `-300ms` or `0`
pub fn parse_duration(input: &str) -> ValueResult<Duration> {
    const KIND: &str = "duration";

    let (negative, mut s) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if s == "0" {
        return Ok(Duration::zero());
    }
    if s.is_empty() {
        return Err(ValueError::invalid(input, KIND, "invalid syntax"));
    }

    let limit: u128 = if negative {
        i64::MAX as u128 + 1
    } else {
        i64::MAX as u128
    };
    let mut total: u128 = 0;

    while !s.is_empty() {
        let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_digits, rest) = s.split_at(int_len);
        s = rest;

        let mut frac_digits = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            frac_digits = &rest[..frac_len];
            s = &rest[frac_len..];
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(ValueError::invalid(input, KIND, "invalid syntax"));
        }

        let unit_len = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        let (unit, rest) = s.split_at(unit_len);
        s = rest;
        if unit.is_empty() {
            return Err(ValueError::invalid(input, KIND, "missing unit"));
        }
        let scale = unit_nanos(unit)
            .ok_or_else(|| ValueError::invalid(input, KIND, format!("unknown unit '{}'", unit)))?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits
                .parse()
                .map_err(|_| ValueError::out_of_range(input, KIND))?
        };
        let mut part = whole
            .checked_mul(scale)
            .ok_or_else(|| ValueError::out_of_range(input, KIND))?;

        if !frac_digits.is_empty() {
            let kept = &frac_digits[..frac_digits.len().min(18)];
            let frac: u128 = kept
                .parse()
                .map_err(|_| ValueError::invalid(input, KIND, "invalid syntax"))?;
            part += frac * scale / 10u128.pow(kept.len() as u32);
        }

        total = total
            .checked_add(part)
            .filter(|t| *t <= limit)
            .ok_or_else(|| ValueError::out_of_range(input, KIND))?;
    }

    let nanos = if negative {
        (-(total as i128)) as i64
    } else {
        total as i64
    };
    Ok(Duration::nanoseconds(nanos))
}

/// Integer part and trimmed fraction of `v / 10^prec`
fn split_fraction(v: u128, prec: u32) -> (u128, String) {
    let base = 10u128.pow(prec);
    let frac = v % base;
    if frac == 0 {
        return (v / base, String::new());
    }
    let digits = format!("{:0width$}", frac, width = prec as usize);
    (v / base, format!(".{}", digits.trim_end_matches('0')))
}

/// Render a duration as `72h3m0.5s`, `1.5ms`, `0s`
pub fn format_duration(d: &Duration) -> String {
    let Some(nanos) = d.num_nanoseconds() else {
        return format!("{}s", d.num_seconds());
    };

    let sign = if nanos < 0 { "-" } else { "" };
    let u = nanos.unsigned_abs() as u128;

    if u == 0 {
        return "0s".to_string();
    }
    if u < SECOND {
        let (int, frac, unit) = if u < MICROSECOND {
            (u, String::new(), "ns")
        } else if u < MILLISECOND {
            let (i, f) = split_fraction(u, 3);
            (i, f, "µs")
        } else {
            let (i, f) = split_fraction(u, 6);
            (i, f, "ms")
        };
        return format!("{}{}{}{}", sign, int, frac, unit);
    }

    let (secs, frac) = split_fraction(u, 9);
    let hours = secs / 3600;
    let minutes = secs / 60 % 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}{}h{}m{}{}s", sign, hours, minutes, seconds, frac)
    } else if minutes > 0 {
        format!("{}{}m{}{}s", sign, minutes, seconds, frac)
    } else {
        format!("{}{}{}s", sign, seconds, frac)
    }
}

/// Parse a timestamp
///
/// Accepts RFC 3339, `2006-01-02 15:04:05[.nnn] -0700 [ZONE]`,
/// `2006-01-02 15:04:05` (UTC) and `2006-01-02` (UTC midnight).
pub fn parse_time(input: &str) -> ValueResult<DateTime<FixedOffset>> {
    let text = input.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t);
    }

    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() == 3 || fields.len() == 4 {
        let head = fields[..3].join(" ");
        if let Ok(t) = DateTime::parse_from_str(&head, "%Y-%m-%d %H:%M:%S%.f %z") {
            return Ok(t);
        }
    }

    if let Ok(t) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(t.and_utc().fixed_offset());
    }

    if let Some(t) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(t.and_utc().fixed_offset());
    }

    Err(ValueError::invalid(input, "time", "unrecognized time layout"))
}

/// Render a timestamp as `2018-05-24 14:56:56 +0000 UTC`
pub fn format_time(t: &DateTime<FixedOffset>) -> String {
    let (_, frac) = split_fraction(t.timestamp_subsec_nanos() as u128, 9);
    let offset = t.format("%z").to_string();
    let zone = if t.offset().local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        offset.clone()
    };
    format!("{}{} {} {}", t.format("%Y-%m-%d %H:%M:%S"), frac, offset, zone)
}

/// Parse an IANA time zone name such as `Asia/Shanghai`
pub fn parse_location(input: &str) -> ValueResult<Tz> {
    input
        .parse::<Tz>()
        .map_err(|e| ValueError::invalid(input, "location", e))
}
