//! Column value types.
//!
//! A [`RawColumn`] is a column exactly as a source hands it over: a declared
//! [`SpannerType`] plus the value in Spanner's JSON wire format. Decoding it
//! yields a typed [`ColumnValue`], which is what the encoder renders.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{SpannerType, TypeCode};
use crate::error::{DumpError, Result};

/// A typed, nullable column value.
///
/// `None` in any variant is SQL NULL, which is distinct from a zero value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Bool(Option<bool>),
    Bytes(Option<Vec<u8>>),
    Float64(Option<f64>),
    Int64(Option<i64>),
    String(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
    Date(Option<NaiveDate>),

    /// Homogeneous array; see [`ArrayValue`].
    Array(ArrayValue),

    /// STRUCT (or ARRAY<STRUCT>) column. Not allowed as a column type, so
    /// the encoder always rejects it.
    Struct,

    /// A type the encoder has no literal rule for (NUMERIC, JSON, nested
    /// arrays). Carries the raw text to be written as-is.
    Unsupported {
        spanner_type: SpannerType,
        raw: String,
    },
}

/// Array column value.
///
/// The outer `Option` is the array's own NULL; each element carries its own.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Bool(Option<Vec<Option<bool>>>),
    Bytes(Option<Vec<Option<Vec<u8>>>>),
    Float64(Option<Vec<Option<f64>>>),
    Int64(Option<Vec<Option<i64>>>),
    String(Option<Vec<Option<String>>>),
    Timestamp(Option<Vec<Option<DateTime<Utc>>>>),
    Date(Option<Vec<Option<NaiveDate>>>),
}

impl ColumnValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            ColumnValue::Bool(v) => v.is_none(),
            ColumnValue::Bytes(v) => v.is_none(),
            ColumnValue::Float64(v) => v.is_none(),
            ColumnValue::Int64(v) => v.is_none(),
            ColumnValue::String(v) => v.is_none(),
            ColumnValue::Timestamp(v) => v.is_none(),
            ColumnValue::Date(v) => v.is_none(),
            ColumnValue::Array(a) => a.is_null(),
            ColumnValue::Struct | ColumnValue::Unsupported { .. } => false,
        }
    }
}

impl ArrayValue {
    /// Check if the array itself is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            ArrayValue::Bool(v) => v.is_none(),
            ArrayValue::Bytes(v) => v.is_none(),
            ArrayValue::Float64(v) => v.is_none(),
            ArrayValue::Int64(v) => v.is_none(),
            ArrayValue::String(v) => v.is_none(),
            ArrayValue::Timestamp(v) => v.is_none(),
            ArrayValue::Date(v) => v.is_none(),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for ColumnValue {
                fn from(v: $t) -> Self {
                    ColumnValue::$variant(Some(v))
                }
            }

            impl From<Option<$t>> for ColumnValue {
                fn from(v: Option<$t>) -> Self {
                    ColumnValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool => Bool,
    Vec<u8> => Bytes,
    f64 => Float64,
    i64 => Int64,
    String => String,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
);

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::String(Some(v.to_string()))
    }
}

impl From<&[u8]> for ColumnValue {
    fn from(v: &[u8]) -> Self {
        ColumnValue::Bytes(Some(v.to_vec()))
    }
}

impl From<ArrayValue> for ColumnValue {
    fn from(v: ArrayValue) -> Self {
        ColumnValue::Array(v)
    }
}

/// An undecoded column value as produced by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    /// Declared column type.
    pub r#type: SpannerType,

    /// Value in the Spanner JSON wire format. Absent means NULL.
    #[serde(default)]
    pub value: Value,
}

impl RawColumn {
    pub fn new(r#type: SpannerType, value: Value) -> Self {
        Self { r#type, value }
    }

    /// Decode into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `DumpError::Encode` when the value cannot be interpreted
    /// under its declared type, or when an array has no element type.
    pub fn decode(&self) -> Result<ColumnValue> {
        let value = &self.value;
        match self.r#type.code {
            TypeCode::Bool => decode_bool(value).map(ColumnValue::Bool),
            TypeCode::Bytes => decode_bytes(value).map(ColumnValue::Bytes),
            TypeCode::Float64 => decode_float64(value).map(ColumnValue::Float64),
            TypeCode::Int64 => decode_int64(value).map(ColumnValue::Int64),
            TypeCode::String => decode_string(value).map(ColumnValue::String),
            TypeCode::Timestamp => decode_timestamp(value).map(ColumnValue::Timestamp),
            TypeCode::Date => decode_date(value).map(ColumnValue::Date),
            TypeCode::Struct => Ok(ColumnValue::Struct),
            TypeCode::Array => self.decode_array(),
            TypeCode::Numeric | TypeCode::Json | TypeCode::Unknown => Ok(self.unsupported()),
        }
    }

    fn decode_array(&self) -> Result<ColumnValue> {
        let value = &self.value;
        let element = self.r#type.element_code().ok_or_else(|| {
            DumpError::encode("ARRAY column is missing its element type".to_string())
        })?;

        let array = match element {
            TypeCode::Bool => ArrayValue::Bool(decode_array(value, decode_bool)?),
            TypeCode::Bytes => ArrayValue::Bytes(decode_array(value, decode_bytes)?),
            TypeCode::Float64 => ArrayValue::Float64(decode_array(value, decode_float64)?),
            TypeCode::Int64 => ArrayValue::Int64(decode_array(value, decode_int64)?),
            TypeCode::String => ArrayValue::String(decode_array(value, decode_string)?),
            TypeCode::Timestamp => ArrayValue::Timestamp(decode_array(value, decode_timestamp)?),
            TypeCode::Date => ArrayValue::Date(decode_array(value, decode_date)?),
            TypeCode::Struct => return Ok(ColumnValue::Struct),
            TypeCode::Array | TypeCode::Numeric | TypeCode::Json | TypeCode::Unknown => {
                return Ok(self.unsupported())
            }
        };
        Ok(ColumnValue::Array(array))
    }

    fn unsupported(&self) -> ColumnValue {
        let raw = match &self.value {
            Value::Null => "NULL".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        ColumnValue::Unsupported {
            spanner_type: self.r#type.clone(),
            raw,
        }
    }
}

/// Decode a full row of raw columns, failing on the first bad column.
pub fn decode_row(columns: &[RawColumn]) -> Result<Vec<ColumnValue>> {
    columns.iter().map(RawColumn::decode).collect()
}

fn malformed(code: TypeCode, value: &Value) -> DumpError {
    DumpError::encode(format!("cannot interpret {} as {}", value, code))
}

fn decode_array<T>(
    value: &Value,
    decode: fn(&Value) -> Result<Option<T>>,
) -> Result<Option<Vec<Option<T>>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items.iter().map(decode).collect::<Result<Vec<_>>>().map(Some),
        other => Err(malformed(TypeCode::Array, other)),
    }
}

fn decode_bool(value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        other => Err(malformed(TypeCode::Bool, other)),
    }
}

fn decode_bytes(value: &Value) -> Result<Option<Vec<u8>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => STANDARD
            .decode(s)
            .map(Some)
            .map_err(|_| malformed(TypeCode::Bytes, value)),
        other => Err(malformed(TypeCode::Bytes, other)),
    }
}

fn decode_float64(value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed(TypeCode::Float64, value)),
        // Non-finite values travel as strings.
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(Some(f64::NAN)),
            "Infinity" => Ok(Some(f64::INFINITY)),
            "-Infinity" => Ok(Some(f64::NEG_INFINITY)),
            other => other
                .parse::<f64>()
                .map(Some)
                .map_err(|_| malformed(TypeCode::Float64, value)),
        },
        other => Err(malformed(TypeCode::Float64, other)),
    }
}

fn decode_int64(value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        // INT64 is string-encoded on the wire to survive JSON number precision.
        Value::String(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| malformed(TypeCode::Int64, value)),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| malformed(TypeCode::Int64, value)),
        other => Err(malformed(TypeCode::Int64, other)),
    }
}

fn decode_string(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(malformed(TypeCode::String, other)),
    }
}

fn decode_timestamp(value: &Value) -> Result<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| malformed(TypeCode::Timestamp, value)),
        other => Err(malformed(TypeCode::Timestamp, other)),
    }
}

fn decode_date(value: &Value) -> Result<Option<NaiveDate>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| malformed(TypeCode::Date, value)),
        other => Err(malformed(TypeCode::Date, other)),
    }
}
