//! Spanner column type descriptors.
//!
//! Mirrors the shape of Spanner's `Type` message as it appears in the JSON
//! wire format: a type code plus, for arrays, the element type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Spanner type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeCode {
    Bool,
    Int64,
    Float64,
    String,
    Bytes,
    Timestamp,
    Date,
    Array,
    Struct,
    Numeric,
    Json,

    /// Any code this crate does not know (e.g. newer Spanner types).
    /// Values of such columns take the raw-text fallback.
    #[serde(other)]
    Unknown,
}

impl TypeCode {
    /// Name as it appears in DDL and in the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCode::Bool => "BOOL",
            TypeCode::Int64 => "INT64",
            TypeCode::Float64 => "FLOAT64",
            TypeCode::String => "STRING",
            TypeCode::Bytes => "BYTES",
            TypeCode::Timestamp => "TIMESTAMP",
            TypeCode::Date => "DATE",
            TypeCode::Array => "ARRAY",
            TypeCode::Struct => "STRUCT",
            TypeCode::Numeric => "NUMERIC",
            TypeCode::Json => "JSON",
            TypeCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column type: a code plus the element type for `ARRAY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpannerType {
    pub code: TypeCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_element_type: Option<Box<SpannerType>>,
}

impl SpannerType {
    /// A non-array type.
    pub fn scalar(code: TypeCode) -> Self {
        Self {
            code,
            array_element_type: None,
        }
    }

    /// An `ARRAY<element>` type.
    pub fn array(element: TypeCode) -> Self {
        Self {
            code: TypeCode::Array,
            array_element_type: Some(Box::new(SpannerType::scalar(element))),
        }
    }

    /// Element type code for arrays, `None` otherwise.
    pub fn element_code(&self) -> Option<TypeCode> {
        self.array_element_type.as_ref().map(|t| t.code)
    }
}

impl fmt::Display for SpannerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.array_element_type {
            Some(element) if self.code == TypeCode::Array => write!(f, "ARRAY<{}>", element),
            _ => write!(f, "{}", self.code),
        }
    }
}
