//! Bloomberg API response decoding.
//!
//! Turns provider messages into `DecodedMessage`s. Three layers:
//!
//! - [`decode_scalar`] maps one scalar element to a `(name, Value)` pair,
//!   dispatching on the declared data type.
//! - [`decode_tree`] walks a field-data subtree into nested `FieldMap`s,
//!   minting suffixed names for repeated composite siblings, and
//!   [`flatten`] strips the single-key wrapper layers it leaves behind.
//! - The message decoders ([`decode_historical_message`],
//!   [`decode_reference_message`], [`decode_intraday_message`]) own the
//!   shape-specific traversal and the three error levels (response,
//!   security, field).

use indexmap::IndexMap;

use crate::errors::{BlpApiError, Result};
use crate::models::element::{DataType, Element, ElementValue, NodeKind};
use crate::models::response::{DecodedMessage, Fragment, SecurityResult};
use crate::models::value::{FieldMap, Value};
use crate::protocol::{names, RequestType, MAX_DECODE_DEPTH};
use crate::wrapper::Message;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TIME_FORMAT: &str = "%H:%M:%S";

// ============================================================================
// Scalar decoding
// ============================================================================

/// Extract the `ElementValue` variant the declared type requires, or fail
/// with a decoding error naming both types.
macro_rules! expect_value {
    ($element:expr, $value:expr, $variant:ident) => {
        match $value {
            ElementValue::$variant(v) => v,
            other => {
                return Err(BlpApiError::Decoding(format!(
                    "'{}' is declared {} but carries a {} value",
                    $element.name(),
                    $element.datatype(),
                    other.datatype()
                )))
            }
        }
    };
}

/// Decode one scalar element into its `(name, value)` pair.
///
/// Dates, datetimes and times are rendered as `YYYY-MM-DD`,
/// `YYYY-MM-DD HH:MM:SS` and `HH:MM:SS`; other kinds pass through.
/// `ENUMERATION` and `CORRELATION_ID` are refused with `NotImplemented`.
pub fn decode_scalar(element: &Element) -> Result<(String, Value)> {
    let value = element.value().ok_or_else(|| {
        BlpApiError::Decoding(format!("'{}' is not a scalar element", element.name()))
    })?;

    let decoded = match element.datatype() {
        DataType::Bool => Value::Bool(*expect_value!(element, value, Bool)),
        DataType::Byte => Value::Byte(*expect_value!(element, value, Byte)),
        DataType::ByteArray => Value::Bytes(expect_value!(element, value, ByteArray).clone()),
        DataType::Char => Value::Char(*expect_value!(element, value, Char)),
        DataType::Date => {
            Value::String(expect_value!(element, value, Date).format(DATE_FORMAT).to_string())
        }
        DataType::Datetime => Value::String(
            expect_value!(element, value, Datetime)
                .format(DATETIME_FORMAT)
                .to_string(),
        ),
        DataType::Time => {
            Value::String(expect_value!(element, value, Time).format(TIME_FORMAT).to_string())
        }
        DataType::Decimal => Value::Decimal(*expect_value!(element, value, Decimal)),
        DataType::Float32 => Value::Float32(*expect_value!(element, value, Float32)),
        DataType::Float64 => Value::Float64(*expect_value!(element, value, Float64)),
        DataType::Int32 => Value::Int32(*expect_value!(element, value, Int32)),
        DataType::Int64 => Value::Int64(*expect_value!(element, value, Int64)),
        DataType::String => Value::String(expect_value!(element, value, String).clone()),
        DataType::Enumeration | DataType::CorrelationId => {
            return Err(BlpApiError::NotImplemented(element.datatype()))
        }
        DataType::Sequence | DataType::Array | DataType::Choice => {
            return Err(BlpApiError::Decoding(format!(
                "'{}' has composite type {} but carries a scalar value",
                element.name(),
                element.datatype()
            )))
        }
    };

    Ok((element.name().to_string(), decoded))
}

// ============================================================================
// Structural flattening
// ============================================================================

/// Collapse single-key wrapper layers.
///
/// Non-mappings and mappings with more than one key are returned unchanged.
/// For a single-key mapping: if the value is itself a single-key mapping it
/// is returned, otherwise flattening continues into the value.
pub fn flatten(node: Value) -> Value {
    let mut node = node;
    loop {
        node = match node {
            Value::Map(mut map) if map.len() == 1 => match map.pop() {
                Some((_, Value::Map(inner))) if inner.len() == 1 => return Value::Map(inner),
                Some((_, inner)) => inner,
                None => return Value::Map(map),
            },
            other => return other,
        };
    }
}

// ============================================================================
// Recursive element decoding
// ============================================================================

/// Names minted for repeated composite siblings, and repeated scalar array
/// entries, during one decode.
///
/// The registry spans the whole tree, so suffixes keep increasing across
/// nesting levels: the first duplicate anywhere becomes `name_0`, the next
/// `name_1`, and so on.
#[derive(Debug, Default, Clone)]
pub struct DuplicateNames {
    minted: Vec<String>,
}

impl DuplicateNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minted(&self) -> &[String] {
        &self.minted
    }

    /// Register and return a name for `name` that is not yet a key of `taken`.
    fn mint(&mut self, name: &str, taken: &FieldMap) -> String {
        let mut n = self.minted.len();
        loop {
            let candidate = format!("{name}_{n}");
            if !taken.contains_key(&candidate) {
                self.minted.push(candidate.clone());
                return candidate;
            }
            n += 1;
        }
    }
}

/// Decode an element subtree into a mapping keyed by element name.
///
/// Composite elements (arrays and complex records, including `CHOICE`)
/// become nested mappings; scalars are decoded with [`decode_scalar`].
/// The returned mapping always has the element itself as its outer key.
pub fn decode_tree(element: &Element, duplicates: &mut DuplicateNames) -> Result<FieldMap> {
    let mut results = FieldMap::new();
    decode_into(element, duplicates, &mut results, false, 0)?;
    Ok(results)
}

fn decode_into(
    element: &Element,
    duplicates: &mut DuplicateNames,
    results: &mut FieldMap,
    in_array: bool,
    depth: usize,
) -> Result<()> {
    if depth > MAX_DECODE_DEPTH {
        return Err(BlpApiError::DepthExceeded(MAX_DECODE_DEPTH));
    }

    match element.kind() {
        NodeKind::Scalar => {
            let (name, value) = decode_scalar(element)?;
            // Array entries share the array's name; record fields overwrite.
            let name = if in_array && results.contains_key(&name) {
                duplicates.mint(&name, results)
            } else {
                name
            };
            results.insert(name, value);
        }
        NodeKind::Array | NodeKind::Complex => {
            let name = if results.contains_key(element.name()) {
                duplicates.mint(element.name(), results)
            } else {
                element.name().to_string()
            };

            let is_array = element.kind() == NodeKind::Array;
            let mut entry = FieldMap::new();
            for child in element.children() {
                decode_into(child, duplicates, &mut entry, is_array, depth + 1)?;
            }
            results.insert(name, Value::Map(entry));
        }
    }
    Ok(())
}

/// Decode a single element of any kind to its `(name, value)` pair.
fn decode_element(element: &Element) -> Result<(String, Value)> {
    if element.kind() == NodeKind::Scalar {
        return decode_scalar(element);
    }
    let mut tree = decode_tree(element, &mut DuplicateNames::new())?;
    tree.pop().ok_or_else(|| {
        BlpApiError::Decoding(format!("'{}' produced no value", element.name()))
    })
}

/// `fieldData` subtree of a reference response, unwrapped.
fn decode_field_data(field_data: &Element) -> Result<FieldMap> {
    let tree = decode_tree(field_data, &mut DuplicateNames::new())?;
    Ok(match flatten(Value::Map(tree)) {
        Value::Map(map) => map,
        scalar => FieldMap::from([(field_data.name().to_string(), scalar)]),
    })
}

// ============================================================================
// Error records
// ============================================================================

/// `responseError` / `securityError`: each child name mapped to its value.
fn error_record(element: &Element) -> Result<FieldMap> {
    element.children().iter().map(decode_element).collect()
}

/// `fieldExceptions`: `errorInfo` category mapped to the failing field id.
///
/// A repeated category gets a suffixed key like repeated composite names.
fn field_exception_record(element: &Element) -> Result<FieldMap> {
    let mut exceptions = FieldMap::new();
    let mut duplicates = DuplicateNames::new();
    for exception in element.children() {
        let field_id = exception.get_element_as_string(names::FIELD_ID)?;
        let category = exception
            .get_element(names::ERROR_INFO)?
            .get_element_as_string(names::CATEGORY)?;
        let key = if exceptions.contains_key(&category) {
            duplicates.mint(&category, &exceptions)
        } else {
            category
        };
        exceptions.insert(key, Value::String(field_id));
    }
    Ok(exceptions)
}

/// Short-circuit for messages reporting a request-level failure.
fn response_error(msg: &Message) -> Result<Option<DecodedMessage>> {
    if !msg.has_element(names::RESPONSE_ERROR) {
        return Ok(None);
    }
    let error = error_record(msg.get_element(names::RESPONSE_ERROR)?)?;
    tracing::warn!(
        "{} reported a response error: {:?}",
        msg.message_type(),
        error.get("message")
    );
    Ok(Some(DecodedMessage::Flat(Fragment::ResponseError(error))))
}

fn require_container<'a>(msg: &'a Message, name: &str, what: &str) -> Result<&'a Element> {
    if !msg.has_element(name) {
        return Err(BlpApiError::NotFound(format!("No {what} in message.")));
    }
    msg.get_element(name)
}

// ============================================================================
// Message decoders
// ============================================================================

/// Decode a `ReferenceDataResponse` message.
///
/// One entry in `securityData` yields a keyed single-security fragment; more
/// than one yields a flat fragment keyed by identifier.
pub fn decode_reference_message(msg: &Message) -> Result<DecodedMessage> {
    if let Some(error) = response_error(msg)? {
        return Ok(error);
    }
    let security_data = require_container(msg, names::SECURITY_DATA, "Security Data")?;

    let mut results: IndexMap<String, SecurityResult> = IndexMap::new();
    let mut last_security = None;

    for item in security_data.children() {
        let security = item.get_element_as_string(names::SECURITY)?;

        let security_errors = if item.has_element(names::SECURITY_ERROR) {
            error_record(item.get_element(names::SECURITY_ERROR)?)?
        } else {
            FieldMap::new()
        };

        let data = if item.has_element(names::FIELD_DATA) || security_errors.is_empty() {
            let field_data = item.get_element(names::FIELD_DATA)?;
            if field_data.num_children() > 0 {
                decode_field_data(field_data)?
            } else {
                FieldMap::new()
            }
        } else {
            FieldMap::new()
        };

        let field_exceptions = match item.get_element(names::FIELD_EXCEPTIONS) {
            Ok(exceptions) if exceptions.num_children() > 0 => field_exception_record(exceptions)?,
            _ => FieldMap::new(),
        };

        results.insert(
            security.clone(),
            SecurityResult {
                security_data: data,
                security_errors,
                field_exceptions,
            },
        );
        last_security = Some(security);
    }

    if security_data.num_children() > 1 {
        return Ok(DecodedMessage::Flat(Fragment::Securities(results)));
    }
    match (last_security, results.pop()) {
        (Some(security), Some((_, result))) => Ok(DecodedMessage::keyed(security, result)),
        _ => Ok(DecodedMessage::Flat(Fragment::Securities(results))),
    }
}

/// Decode a `HistoricalDataResponse` message (one security per message).
///
/// `security_data` maps each row's `date` to the row's other fields.
pub fn decode_historical_message(msg: &Message) -> Result<DecodedMessage> {
    if let Some(error) = response_error(msg)? {
        return Ok(error);
    }
    let security_data = require_container(msg, names::SECURITY_DATA, "Security Data")?;
    let security = security_data.get_element_as_string(names::SECURITY)?;

    if security_data.has_element(names::SECURITY_ERROR) {
        let errors = error_record(security_data.get_element(names::SECURITY_ERROR)?)?;
        return Ok(DecodedMessage::keyed(security, SecurityResult::errors_only(errors)));
    }

    let field_exceptions = if security_data.has_element(names::FIELD_EXCEPTIONS) {
        field_exception_record(security_data.get_element(names::FIELD_EXCEPTIONS)?)?
    } else {
        FieldMap::new()
    };

    let mut by_date = FieldMap::new();
    for row in security_data.get_element(names::FIELD_DATA)?.children() {
        let mut date = None;
        let mut fields = FieldMap::new();
        for element in row.children() {
            let (name, value) = decode_element(element)?;
            if name == names::DATE {
                date = Some(value.to_key());
            } else {
                fields.insert(name, value);
            }
        }
        let date = date.ok_or_else(|| {
            BlpApiError::NotFound(format!("'{}' in {security} fieldData row", names::DATE))
        })?;
        by_date.insert(date, Value::Map(fields));
    }

    Ok(DecodedMessage::keyed(
        security,
        SecurityResult {
            security_data: by_date,
            security_errors: FieldMap::new(),
            field_exceptions,
        },
    ))
}

/// Decode an `IntradayBarResponse` message.
///
/// Bars are keyed by their `time` value in arrival order; no security
/// identifier is emitted.
pub fn decode_intraday_message(msg: &Message) -> Result<DecodedMessage> {
    if let Some(error) = response_error(msg)? {
        return Ok(error);
    }
    let bar_data = require_container(msg, names::BAR_DATA, "Bar Data")?;

    let mut bars = IndexMap::new();
    for tick in bar_data.get_element(names::BAR_TICK_DATA)?.children() {
        let mut bar = FieldMap::new();
        for element in tick.children() {
            let (name, value) = decode_element(element)?;
            bar.entry(name).or_insert(value);
        }
        let time = bar
            .get(names::TIME)
            .map(Value::to_key)
            .ok_or_else(|| BlpApiError::NotFound(format!("'{}' in bar tick", names::TIME)))?;
        bars.insert(time, bar);
    }

    Ok(DecodedMessage::Flat(Fragment::Bars(bars)))
}

/// Route a message to the decoder for the request kind that produced it.
pub fn decode_message(kind: RequestType, msg: &Message) -> Result<DecodedMessage> {
    match kind {
        RequestType::HistoricalDataRequest => decode_historical_message(msg),
        RequestType::ReferenceDataRequest => decode_reference_message(msg),
        RequestType::IntradayBarRequest => decode_intraday_message(msg),
    }
}

// ============================================================================
// Tests
// ============================================================================
