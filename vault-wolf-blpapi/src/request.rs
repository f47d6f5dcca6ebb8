//! Outbound request objects.
//!
//! A `Request` is an ordered bag of named elements, the shape the provider's
//! request schemas expect: scalars are set, lists are appended to, and
//! overrides are appended as `{fieldId, value}` records.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::protocol::{request_names, RequestType, ServiceType};

/// Value of one request element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestValue {
    String(String),
    Int(i64),
    Datetime(NaiveDateTime),
    List(Vec<RequestValue>),
    Sequence(IndexMap<String, RequestValue>),
}

impl RequestValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RequestValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for RequestValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RequestValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for RequestValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for RequestValue {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<NaiveDateTime> for RequestValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Datetime(dt)
    }
}

/// Dates travel as `YYYYMMDD` strings.
impl From<NaiveDate> for RequestValue {
    fn from(d: NaiveDate) -> Self {
        Self::String(d.format("%Y%m%d").to_string())
    }
}

/// A request ready to be sent on a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    service: ServiceType,
    kind: RequestType,
    elements: IndexMap<String, RequestValue>,
}

impl Request {
    pub fn new(service: ServiceType, kind: RequestType) -> Self {
        Self {
            service,
            kind,
            elements: IndexMap::new(),
        }
    }

    pub fn service(&self) -> ServiceType {
        self.service
    }

    pub fn kind(&self) -> RequestType {
        self.kind
    }

    /// Set a scalar element, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<RequestValue>) {
        self.elements.insert(name.to_string(), value.into());
    }

    /// Append to a list element, creating it on first use.
    pub fn append(&mut self, name: &str, value: impl Into<RequestValue>) {
        let value = value.into();
        match self.elements.get_mut(name) {
            Some(RequestValue::List(items)) => items.push(value),
            Some(existing) => {
                let previous = std::mem::replace(existing, RequestValue::List(Vec::new()));
                *existing = RequestValue::List(vec![previous, value]);
            }
            None => {
                self.elements
                    .insert(name.to_string(), RequestValue::List(vec![value]));
            }
        }
    }

    /// Append an override record to the `overrides` list.
    pub fn append_override(&mut self, field_id: &str, value: impl Into<String>) {
        let record = IndexMap::from([
            (request_names::FIELD_ID.to_string(), RequestValue::from(field_id)),
            (request_names::VALUE.to_string(), RequestValue::String(value.into())),
        ]);
        self.append(request_names::OVERRIDES, RequestValue::Sequence(record));
    }

    pub fn get(&self, name: &str) -> Option<&RequestValue> {
        self.elements.get(name)
    }

    pub fn elements(&self) -> &IndexMap<String, RequestValue> {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_and_append_builds_lists() {
        let mut req = Request::new(ServiceType::RefData, RequestType::ReferenceDataRequest);
        req.set("maxDataPoints", 10u32);
        req.set("maxDataPoints", 20u32);
        req.append("fields", "PX_LAST");
        req.append("fields", "NAME");

        assert_eq!(req.get("maxDataPoints"), Some(&RequestValue::Int(20)));
        let fields: Vec<_> = req
            .get("fields")
            .and_then(RequestValue::as_list)
            .unwrap()
            .iter()
            .filter_map(RequestValue::as_str)
            .collect();
        assert_eq!(fields, ["PX_LAST", "NAME"]);
    }

    #[test]
    fn overrides_serialize_as_field_value_records() {
        let mut req = Request::new(ServiceType::RefData, RequestType::ReferenceDataRequest);
        req.append_override("CURVE_DATE", "20230101");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["elements"]["overrides"][0]["fieldId"], "CURVE_DATE");
        assert_eq!(json["elements"]["overrides"][0]["value"], "20230101");
        assert_eq!(json["service"], "//blp/refdata");
        assert_eq!(json["kind"], "ReferenceDataRequest");
    }

    #[test]
    fn dates_become_compact_strings() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(RequestValue::from(d), RequestValue::String("20240105".into()));
    }
}
