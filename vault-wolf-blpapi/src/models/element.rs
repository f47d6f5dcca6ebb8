//! Wire element tree.
//!
//! A provider message is a tree of self-describing elements. Every element
//! carries a name and a declared data type, and holds exactly one of a scalar
//! value, an ordered array of child elements, or a complex record of named
//! child elements.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{BlpApiError, Result};

// ============================================================================
// CorrelationId
// ============================================================================

/// Opaque token binding response events to the request that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cid:{}", self.0)
    }
}

// ============================================================================
// DataType
// ============================================================================

/// Data type declared by the provider schema for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "BOOL")]
    Bool,
    #[serde(rename = "BYTE")]
    Byte,
    #[serde(rename = "BYTEARRAY")]
    ByteArray,
    #[serde(rename = "CHAR")]
    Char,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DATETIME")]
    Datetime,
    #[serde(rename = "DECIMAL")]
    Decimal,
    #[serde(rename = "ENUMERATION")]
    Enumeration,
    #[serde(rename = "FLOAT32")]
    Float32,
    #[serde(rename = "FLOAT64")]
    Float64,
    #[serde(rename = "INT32")]
    Int32,
    #[serde(rename = "INT64")]
    Int64,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "TIME")]
    Time,
    #[serde(rename = "CORRELATION_ID")]
    CorrelationId,
    #[serde(rename = "SEQUENCE")]
    Sequence,
    #[serde(rename = "ARRAY")]
    Array,
    #[serde(rename = "CHOICE")]
    Choice,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "BOOL",
            Self::Byte => "BYTE",
            Self::ByteArray => "BYTEARRAY",
            Self::Char => "CHAR",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::Decimal => "DECIMAL",
            Self::Enumeration => "ENUMERATION",
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::String => "STRING",
            Self::Time => "TIME",
            Self::CorrelationId => "CORRELATION_ID",
            Self::Sequence => "SEQUENCE",
            Self::Array => "ARRAY",
            Self::Choice => "CHOICE",
        };
        f.write_str(s)
    }
}

// ============================================================================
// ElementValue
// ============================================================================

/// A primitive value carried by a scalar element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Bool(bool),
    Byte(u8),
    ByteArray(Vec<u8>),
    Char(char),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    Decimal(Decimal),
    Enumeration(String),
    Float32(f32),
    Float64(f64),
    Int32(i32),
    Int64(i64),
    String(String),
    Time(NaiveTime),
    CorrelationId(CorrelationId),
}

impl ElementValue {
    /// The data type this value naturally belongs to.
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Byte(_) => DataType::Byte,
            Self::ByteArray(_) => DataType::ByteArray,
            Self::Char(_) => DataType::Char,
            Self::Date(_) => DataType::Date,
            Self::Datetime(_) => DataType::Datetime,
            Self::Decimal(_) => DataType::Decimal,
            Self::Enumeration(_) => DataType::Enumeration,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::String(_) => DataType::String,
            Self::Time(_) => DataType::Time,
            Self::CorrelationId(_) => DataType::CorrelationId,
        }
    }

    /// Parse a JSON scalar as a value of the declared `datatype`.
    pub fn from_json(datatype: DataType, json: &serde_json::Value) -> Result<Self> {
        let mismatch = || {
            BlpApiError::Decoding(format!("value {json} is not a valid {datatype}"))
        };
        let text = || json.as_str().ok_or_else(mismatch);

        let value = match datatype {
            DataType::Bool => Self::Bool(json.as_bool().ok_or_else(mismatch)?),
            DataType::Byte => Self::Byte(
                json.as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(mismatch)?,
            ),
            DataType::ByteArray => Self::ByteArray(match json {
                serde_json::Value::String(s) => s.as_bytes().to_vec(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|b| b.as_u64().and_then(|v| u8::try_from(v).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(mismatch)?,
                _ => return Err(mismatch()),
            }),
            DataType::Char => {
                let s = text()?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => return Err(mismatch()),
                }
            }
            DataType::Date => Self::Date(
                NaiveDate::parse_from_str(text()?, "%Y-%m-%d").map_err(|_| mismatch())?,
            ),
            DataType::Datetime => {
                let s = text()?;
                let parsed = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                    .map_err(|_| mismatch())?;
                Self::Datetime(parsed)
            }
            DataType::Decimal => {
                let raw = match json {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return Err(mismatch()),
                };
                Self::Decimal(Decimal::from_str(&raw).map_err(|_| mismatch())?)
            }
            DataType::Enumeration => Self::Enumeration(text()?.to_string()),
            DataType::Float32 => Self::Float32(json.as_f64().ok_or_else(mismatch)? as f32),
            DataType::Float64 => Self::Float64(json.as_f64().ok_or_else(mismatch)?),
            DataType::Int32 => Self::Int32(
                json.as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(mismatch)?,
            ),
            DataType::Int64 => Self::Int64(json.as_i64().ok_or_else(mismatch)?),
            DataType::String => Self::String(text()?.to_string()),
            DataType::Time => Self::Time(
                NaiveTime::parse_from_str(text()?, "%H:%M:%S%.f").map_err(|_| mismatch())?,
            ),
            DataType::CorrelationId => {
                Self::CorrelationId(CorrelationId(json.as_u64().ok_or_else(mismatch)?))
            }
            DataType::Sequence | DataType::Array | DataType::Choice => {
                return Err(BlpApiError::Decoding(format!(
                    "{datatype} element cannot carry a scalar value"
                )))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for ElementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::ByteArray(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            Self::Char(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Datetime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Enumeration(v) | Self::String(v) => f.write_str(v),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{}", v.format("%H:%M:%S")),
            Self::CorrelationId(v) => write!(f, "{v}"),
        }
    }
}

// ============================================================================
// Element
// ============================================================================

/// What an element holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementContent {
    /// A single primitive value.
    Scalar(ElementValue),
    /// Ordered values (array semantics).
    Array(Vec<Element>),
    /// Named children (complex record semantics).
    Complex(Vec<Element>),
}

/// Structural discriminant of an element, independent of its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Array,
    Complex,
}

/// One node of a provider message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawElement")]
pub struct Element {
    name: String,
    datatype: DataType,
    content: ElementContent,
}

impl Element {
    /// Scalar element whose declared type follows from the value.
    pub fn scalar(name: impl Into<String>, value: ElementValue) -> Self {
        Self {
            name: name.into(),
            datatype: value.datatype(),
            content: ElementContent::Scalar(value),
        }
    }

    /// Element with an explicit declared type; used to model schema drift.
    pub fn with_datatype(name: impl Into<String>, datatype: DataType, content: ElementContent) -> Self {
        Self {
            name: name.into(),
            datatype,
            content,
        }
    }

    /// Complex record (`SEQUENCE`) of named children.
    pub fn sequence(name: impl Into<String>, children: Vec<Element>) -> Self {
        Self::with_datatype(name, DataType::Sequence, ElementContent::Complex(children))
    }

    /// Variant record (`CHOICE`); exactly one child is active.
    pub fn choice(name: impl Into<String>, active: Element) -> Self {
        Self::with_datatype(name, DataType::Choice, ElementContent::Complex(vec![active]))
    }

    /// Array of values. Arrays of records are declared `SEQUENCE`, as the
    /// provider reports the type of the array's entries.
    pub fn array(name: impl Into<String>, datatype: DataType, values: Vec<Element>) -> Self {
        Self::with_datatype(name, datatype, ElementContent::Array(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn content(&self) -> &ElementContent {
        &self.content
    }

    pub fn kind(&self) -> NodeKind {
        match self.content {
            ElementContent::Scalar(_) => NodeKind::Scalar,
            ElementContent::Array(_) => NodeKind::Array,
            ElementContent::Complex(_) => NodeKind::Complex,
        }
    }

    pub fn is_array(&self) -> bool {
        self.kind() == NodeKind::Array
    }

    pub fn is_complex(&self) -> bool {
        self.kind() == NodeKind::Complex
    }

    pub fn value(&self) -> Option<&ElementValue> {
        match &self.content {
            ElementContent::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Array values or record children; empty for scalars.
    pub fn children(&self) -> &[Element] {
        match &self.content {
            ElementContent::Scalar(_) => &[],
            ElementContent::Array(values) => values,
            ElementContent::Complex(elements) => elements,
        }
    }

    pub fn num_children(&self) -> usize {
        self.children().len()
    }

    /// Whether a complex element has a child named `name`.
    pub fn has_element(&self, name: &str) -> bool {
        match &self.content {
            ElementContent::Complex(elements) => elements.iter().any(|e| e.name == name),
            _ => false,
        }
    }

    /// Named child of a complex element.
    pub fn get_element(&self, name: &str) -> Result<&Element> {
        match &self.content {
            ElementContent::Complex(elements) => elements
                .iter()
                .find(|e| e.name == name)
                .ok_or_else(|| BlpApiError::NotFound(format!("element '{name}' in '{}'", self.name))),
            _ => Err(BlpApiError::NotFound(format!(
                "element '{name}': '{}' is not a complex element",
                self.name
            ))),
        }
    }

    /// Named child's scalar value rendered as a string.
    pub fn get_element_as_string(&self, name: &str) -> Result<String> {
        let child = self.get_element(name)?;
        child
            .value()
            .map(ToString::to_string)
            .ok_or_else(|| BlpApiError::Decoding(format!("element '{name}' is not a scalar")))
    }
}

// ============================================================================
// JSON representation
// ============================================================================

/// JSON form of an element: `name`, `datatype`, and exactly one of
/// `value`, `array` or `elements`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawElement {
    name: String,
    datatype: DataType,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    array: Option<Vec<Element>>,
    #[serde(default)]
    elements: Option<Vec<Element>>,
}

impl TryFrom<RawElement> for Element {
    type Error = BlpApiError;

    fn try_from(raw: RawElement) -> Result<Self> {
        let content = match (raw.value, raw.array, raw.elements) {
            (Some(json), None, None) => {
                ElementContent::Scalar(ElementValue::from_json(raw.datatype, &json)?)
            }
            (None, Some(values), None) => ElementContent::Array(values),
            (None, None, Some(elements)) => ElementContent::Complex(elements),
            _ => {
                return Err(BlpApiError::Decoding(format!(
                    "element '{}' must have exactly one of value, array, elements",
                    raw.name
                )))
            }
        };
        Ok(Self {
            name: raw.name,
            datatype: raw.datatype,
            content,
        })
    }
}
