//! Decoded, application-facing values.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

/// Insertion-ordered mapping from element name to decoded value.
pub type FieldMap = IndexMap<String, Value>;

/// A decoded field value: a native scalar or a nested mapping.
///
/// Dates, datetimes and times are already rendered to their fixed string
/// formats by the scalar decoder, so they appear here as `String`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Bytes(Vec<u8>),
    Char(char),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    String(String),
    Map(FieldMap),
}

impl Value {
    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<FieldMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view for the float and integer variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(v) => Some(*v),
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Key form of a value, used when a decoded value indexes a mapping
    /// (dates in historical data, bar times in intraday data).
    pub fn to_key(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Bool(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
            Self::Char(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::Float32(v) => v.to_string(),
            Self::Float64(v) => v.to_string(),
            Self::Decimal(v) => v.to_string(),
            Self::Map(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

impl From<FieldMap> for Value {
    fn from(map: FieldMap) -> Self {
        Self::Map(map)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}
