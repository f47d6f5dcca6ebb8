//! Decoded response structures.

use indexmap::IndexMap;
use serde::Serialize;

use super::value::FieldMap;

// ============================================================================
// SecurityResult
// ============================================================================

/// Data, security errors and field exceptions for one security.
///
/// All three sections are always present. In a well-formed response either
/// `security_data` or `security_errors` is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityResult {
    pub security_data: FieldMap,
    pub security_errors: FieldMap,
    pub field_exceptions: FieldMap,
}

impl SecurityResult {
    /// Result for a security the provider could not resolve.
    pub fn errors_only(security_errors: FieldMap) -> Self {
        Self {
            security_errors,
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.security_errors.is_empty()
    }

    /// Shallow merge of a later fragment into this one, section by section.
    /// Keys present in `newer` replace the same keys here; new keys are
    /// appended in arrival order.
    pub fn merge(&mut self, newer: SecurityResult) {
        self.security_data.extend(newer.security_data);
        self.security_errors.extend(newer.security_errors);
        self.field_exceptions.extend(newer.field_exceptions);
    }
}

// ============================================================================
// Fragment
// ============================================================================

/// Partial result that is not bound to a single security.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// The whole request failed; carries the decoded `responseError`.
    ResponseError(FieldMap),
    /// Several securities from one reference message, keyed by identifier.
    Securities(IndexMap<String, SecurityResult>),
    /// Intraday bars keyed by bar time, in arrival order.
    Bars(IndexMap<String, FieldMap>),
}

/// A message decoder's output.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    /// Result for the one security the message is about.
    Security {
        security: String,
        result: SecurityResult,
    },
    /// Result with no single owning security.
    Flat(Fragment),
}

impl DecodedMessage {
    pub fn keyed(security: impl Into<String>, result: SecurityResult) -> Self {
        Self::Security {
            security: security.into(),
            result,
        }
    }

    /// Security the message is bound to; `None` for flat results.
    pub fn security(&self) -> Option<&str> {
        match self {
            Self::Security { security, .. } => Some(security),
            Self::Flat(_) => None,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Cumulative output of one request.
///
/// Historical and reference requests fill `securities`; intraday bar requests
/// fill `bars`. A request the provider rejected outright carries its
/// `response_error` instead of data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_error: Option<FieldMap>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub securities: IndexMap<String, SecurityResult>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub bars: IndexMap<String, FieldMap>,
}

impl Response {
    pub fn security(&self, security: &str) -> Option<&SecurityResult> {
        self.securities.get(security)
    }

    pub fn is_empty(&self) -> bool {
        self.response_error.is_none() && self.securities.is_empty() && self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::value::Value;

    fn map(pairs: &[(&str, f64)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (k.to_string(), Value::Float64(*v))).collect()
    }

    #[test]
    fn merge_is_section_wise_and_newest_wins() {
        let mut acc = SecurityResult {
            security_data: map(&[("2024-01-02", 1.0), ("2024-01-03", 2.0)]),
            ..Default::default()
        };
        acc.merge(SecurityResult {
            security_data: map(&[("2024-01-03", 20.0), ("2024-01-04", 3.0)]),
            field_exceptions: map(&[("BAD_FLD", 0.0)]),
            ..Default::default()
        });

        let keys: Vec<_> = acc.security_data.keys().cloned().collect();
        assert_eq!(keys, ["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(acc.security_data["2024-01-03"], Value::Float64(20.0));
        assert_eq!(acc.field_exceptions.len(), 1);
        assert!(!acc.has_errors());
    }

    #[test]
    fn serializes_with_all_three_sections() {
        let result = SecurityResult::errors_only(map(&[("code", 15.0)]));
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["security_data"].as_object().unwrap().is_empty());
        assert!(json["field_exceptions"].as_object().unwrap().is_empty());
        assert_eq!(json["security_errors"]["code"], 15.0);
    }
}
