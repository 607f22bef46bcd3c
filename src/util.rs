// Utility helpers for numeric coercion and formatting.
//
// This module centralizes all the "dirty" number/date handling so the rest of
// the code can assume clean, typed values. `to_number` is the only place where
// an upstream value turns into an `f64`.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce any JSON value into a finite `f64`.
///
/// - `null` becomes 0.
/// - Numbers pass through unchanged.
/// - Booleans become 1 or 0.
/// - Strings go through [`parse_number_str`].
/// - Arrays and objects become 0.
///
/// The result is never NaN or infinite.
pub fn to_number(v: &Value) -> f64 {
    let n = match v {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_number_str(s),
        Value::Array(_) | Value::Object(_) => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Parse a numeric string the way a JavaScript `Number(..)` call would, with
/// every failure mapped to 0.
///
/// - Trims whitespace; an empty string is 0.
/// - Accepts `0x`, `0o` and `0b` prefixed integers.
/// - Accepts plain decimal and exponent notation (`12.5`, `.5`, `1e3`).
/// - A decimal comma is NOT understood: `"12,5"` is 0.
pub fn parse_number_str(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return i64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(0.0);
        }
    }
    // `str::parse::<f64>` also accepts "inf" and "NaN"; those are not numbers here.
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return 0.0;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

pub fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "oui"),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
        Value::Number(_) => to_number(v) != 0.0,
    }
}

/// Render a scalar JSON value as text; containers and `null` become empty.
pub fn to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // Dates are expected in `YYYY-MM-DD` format.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// Serde adapters. Record fields are decoded through these so a stray string
// or null in an upstream payload never fails the whole document.

pub fn de_number<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(to_number(&v))
}

pub fn de_int<'de, D>(d: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    // `as` saturates, so out-of-range values clamp instead of wrapping.
    Ok(to_number(&v).trunc() as i32)
}

/// Like [`de_number`], but `null` and empty strings mean "absent".
pub fn de_opt_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(other) => Some(to_number(&other)),
    })
}

pub fn de_text<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(to_text(&v))
}

pub fn de_opt_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.map(|v| to_text(&v)).filter(|s| !s.is_empty()))
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - French separators (e.g. `1 234 567,89`).
    let locale = Locale::fr;
    let abs_n = if n.is_finite() { n.abs() } else { 0.0 };
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let neg = n < 0.0 && s.chars().any(|c| matches!(c, '1'..='9'));
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // `num-format` inserts the thousands separators into the integer portion.
    // Past i64 range the digits are kept as they are, unseparated.
    let mut res = match int_part.parse::<i64>() {
        Ok(int_val) => int_val.to_formatted_string(&locale),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push_str(locale.decimal());
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::fr)
}
