//! Column value to SQL literal encoding.
//!
//! Every literal produced here parses back to the exact value it came from:
//! floats use the shortest round-trip digits, bytes are fully hex-escaped,
//! and timestamps keep nanosecond precision.
//!
//! Literal syntax follows Spanner's lexical rules:
//!
//! | Type        | Literal                                  |
//! |-------------|------------------------------------------|
//! | `BOOL`      | `true`, `false`                          |
//! | `BYTES`     | `b"\x61\x62"`                            |
//! | `FLOAT64`   | `1.23`, `1e+06`, `CAST('nan' AS FLOAT64)`|
//! | `INT64`     | `-42`                                    |
//! | `STRING`    | `"foo\"bar"`                             |
//! | `TIMESTAMP` | `TIMESTAMP "2018-01-23T03:00:00Z"`       |
//! | `DATE`      | `DATE "2018-01-23"`                      |
//! | `ARRAY<T>`  | `[1, NULL, 3]`                           |

use std::fmt::Write as FmtWrite;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tracing::warn;

use crate::core::value::{ArrayValue, ColumnValue, RawColumn};
use crate::error::{DumpError, Result};

/// Literal for SQL NULL.
pub const NULL: &str = "NULL";

/// Encode a single column value as a literal.
///
/// # Errors
///
/// Returns `DumpError::Encode` for STRUCT values, which are never valid
/// column types.
pub fn encode_value(value: &ColumnValue) -> Result<String> {
    let literal = match value {
        ColumnValue::Bool(v) => nullable(v.as_ref(), bool_literal),
        ColumnValue::Bytes(v) => nullable(v.as_deref(), bytes_literal),
        ColumnValue::Float64(v) => nullable(v.as_ref(), float64_literal),
        ColumnValue::Int64(v) => nullable(v.as_ref(), int64_literal),
        ColumnValue::String(v) => nullable(v.as_deref(), string_literal),
        ColumnValue::Timestamp(v) => nullable(v.as_ref(), timestamp_literal),
        ColumnValue::Date(v) => nullable(v.as_ref(), date_literal),
        ColumnValue::Array(array) => array_literal(array),
        ColumnValue::Struct => {
            return Err(DumpError::encode(
                "unexpected error: column has STRUCT data type",
            ))
        }
        ColumnValue::Unsupported { spanner_type, raw } => {
            // No escaping guarantee on this path.
            warn!(
                "No literal rule for {} values, writing raw value {:?}",
                spanner_type, raw
            );
            raw.clone()
        }
    };
    Ok(literal)
}

/// Encode a row of values, failing on the first value that cannot be encoded.
pub fn encode_row(values: &[ColumnValue]) -> Result<Vec<String>> {
    values.iter().map(encode_value).collect()
}

/// Decode and encode a raw column.
///
/// # Errors
///
/// Returns `DumpError::Encode` when the raw value does not match its
/// declared type, or for STRUCT columns.
pub fn encode_raw(column: &RawColumn) -> Result<String> {
    encode_value(&column.decode()?)
}

/// Decode and encode a raw row, failing on the first bad column.
pub fn encode_raw_row(columns: &[RawColumn]) -> Result<Vec<String>> {
    columns.iter().map(encode_raw).collect()
}

fn nullable<T: ?Sized>(value: Option<&T>, literal: impl FnOnce(&T) -> String) -> String {
    match value {
        Some(v) => literal(v),
        None => NULL.to_string(),
    }
}

fn array_literal(array: &ArrayValue) -> String {
    match array {
        ArrayValue::Bool(v) => elements(v.as_deref(), bool_literal),
        ArrayValue::Bytes(v) => elements(v.as_deref(), |b: &Vec<u8>| bytes_literal(b)),
        ArrayValue::Float64(v) => elements(v.as_deref(), float64_literal),
        ArrayValue::Int64(v) => elements(v.as_deref(), int64_literal),
        ArrayValue::String(v) => elements(v.as_deref(), |s: &String| string_literal(s)),
        ArrayValue::Timestamp(v) => elements(v.as_deref(), timestamp_literal),
        ArrayValue::Date(v) => elements(v.as_deref(), date_literal),
    }
}

fn elements<T>(values: Option<&[Option<T>]>, literal: impl Fn(&T) -> String) -> String {
    let Some(values) = values else {
        return NULL.to_string();
    };
    let literals: Vec<String> = values
        .iter()
        .map(|v| nullable(v.as_ref(), &literal))
        .collect();
    format!("[{}]", literals.join(", "))
}

fn bool_literal(v: &bool) -> String {
    v.to_string()
}

fn bytes_literal(v: &[u8]) -> String {
    let mut out = String::with_capacity(v.len() * 4 + 3);
    out.push_str("b\"");
    for b in v {
        let _ = write!(out, "\\x{:02x}", b);
    }
    out.push('"');
    out
}

fn float64_literal(v: &f64) -> String {
    let v = *v;
    if v.is_nan() {
        "CAST('nan' AS FLOAT64)".to_string()
    } else if v == f64::INFINITY {
        "CAST('inf' AS FLOAT64)".to_string()
    } else if v == f64::NEG_INFINITY {
        "CAST('-inf' AS FLOAT64)".to_string()
    } else {
        format_float(v)
    }
}

/// Shortest round-trip representation in `%g` style.
///
/// Scientific notation is used when the decimal exponent is below -4 or at
/// least 6; the exponent always carries a sign and at least two digits.
fn format_float(v: f64) -> String {
    // `{:e}` gives the shortest digits that round-trip, e.g. "1.5e-7".
    let sci = format!("{:e}", v);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return v.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return v.to_string();
    };

    if (-4..6).contains(&exp) {
        v.to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    }
}

fn int64_literal(v: &i64) -> String {
    v.to_string()
}

fn string_literal(v: &str) -> String {
    let mut out = String::with_capacity(v.len() + 2);
    out.push('"');
    for c in v.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if c < ' ' || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if !is_printable(c) => {
                if (c as u32) < 0x10000 {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                } else {
                    let _ = write!(out, "\\U{:08x}", c as u32);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `c` is written as-is inside a string literal.
///
/// Control, format, separator (other than ASCII space), private-use and
/// noncharacter code points are escaped. Unassigned code points are not
/// detected and pass through.
fn is_printable(c: char) -> bool {
    if c.is_control() || (c.is_whitespace() && c != ' ') {
        return false;
    }
    let cp = c as u32;
    let format = matches!(
        cp,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x0890..=0x0891
            | 0x08E2
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0x110BD
            | 0x110CD
            | 0x13430..=0x1343F
            | 0x1BCA0..=0x1BCA3
            | 0x1D173..=0x1D17A
            | 0xE0001
            | 0xE0020..=0xE007F
    );
    let private_use = matches!(cp, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD);
    let nonchar = (0xFDD0..=0xFDEF).contains(&cp) || cp & 0xFFFE == 0xFFFE;
    !(format || private_use || nonchar)
}

/// RFC 3339 with nanoseconds, trailing fractional zeros removed.
fn timestamp_literal(v: &DateTime<Utc>) -> String {
    let text = v.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let text = text.strip_suffix('Z').unwrap_or(&text);
    let text = match text.split_once('.') {
        Some((secs, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                secs.to_string()
            } else {
                format!("{}.{}", secs, frac)
            }
        }
        None => text.to_string(),
    };
    format!("TIMESTAMP \"{}Z\"", text)
}

fn date_literal(v: &NaiveDate) -> String {
    format!("DATE \"{}\"", v.format("%Y-%m-%d"))
}
