//! Bloomberg API protocol constants.
//!
//! Element names used by the refdata service schemas, request kinds, service
//! names and the limits the decoder enforces.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Session Defaults
// ============================================================================

/// Default Bloomberg API host (Desktop API / B-PIPE local endpoint).
pub const DEFAULT_HOST: &str = "localhost";

/// Default Bloomberg API port.
pub const DEFAULT_PORT: u16 = 8194;

/// Wait applied to each `next_event` call by the response reader.
pub const DEFAULT_EVENT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default `maxDataPoints` for historical and intraday requests.
pub const DEFAULT_MAX_DATA_POINTS: u32 = 2500;

/// Maximum element nesting the decoder will follow.
pub const MAX_DECODE_DEPTH: usize = 64;

/// Field id whose override value is transmitted as a `YYYYMMDD` date.
pub const CURVE_DATE: &str = "CURVE_DATE";

// ============================================================================
// Element Names
// ============================================================================

/// Element names of the `//blp/refdata` response schemas.
pub mod names {
    pub const SECURITY_DATA: &str = "securityData";
    pub const SECURITY: &str = "security";
    pub const BAR_DATA: &str = "barData";
    pub const BAR_TICK_DATA: &str = "barTickData";
    pub const FIELD_DATA: &str = "fieldData";
    pub const FIELD_EXCEPTIONS: &str = "fieldExceptions";
    pub const SECURITY_ERROR: &str = "securityError";
    pub const RESPONSE_ERROR: &str = "responseError";
    pub const FIELD_ID: &str = "fieldId";
    pub const ERROR_INFO: &str = "errorInfo";
    pub const CATEGORY: &str = "category";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
}

/// Element names of the outbound request schemas.
pub mod request_names {
    pub const SECURITIES: &str = "securities";
    pub const SECURITY: &str = "security";
    pub const FIELDS: &str = "fields";
    pub const OVERRIDES: &str = "overrides";
    pub const FIELD_ID: &str = "fieldId";
    pub const VALUE: &str = "value";
    pub const PERIODICITY_ADJUSTMENT: &str = "periodicityAdjustment";
    pub const PERIODICITY_SELECTION: &str = "periodicitySelection";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
    pub const MAX_DATA_POINTS: &str = "maxDataPoints";
    pub const NON_TRADING_DAY_FILL_OPTION: &str = "nonTradingDayFillOption";
    pub const NON_TRADING_DAY_FILL_METHOD: &str = "nonTradingDayFillMethod";
    pub const EVENT_TYPE: &str = "eventType";
    pub const INTERVAL: &str = "interval";
    pub const START_DATE_TIME: &str = "startDateTime";
    pub const END_DATE_TIME: &str = "endDateTime";
}

// ============================================================================
// Request Kinds
// ============================================================================

/// Request kinds understood by `//blp/refdata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    HistoricalDataRequest,
    ReferenceDataRequest,
    IntradayBarRequest,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HistoricalDataRequest => "HistoricalDataRequest",
            Self::ReferenceDataRequest => "ReferenceDataRequest",
            Self::IntradayBarRequest => "IntradayBarRequest",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = crate::errors::BlpApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HistoricalDataRequest" => Ok(Self::HistoricalDataRequest),
            "ReferenceDataRequest" => Ok(Self::ReferenceDataRequest),
            "IntradayBarRequest" => Ok(Self::IntradayBarRequest),
            other => Err(crate::errors::BlpApiError::NotFound(format!(
                "request type '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Services
// ============================================================================

/// Bloomberg service names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    #[serde(rename = "//blp/refdata")]
    RefData,
    #[serde(rename = "//blp/apiflds")]
    ApiFields,
    #[serde(rename = "//blp/tasvc")]
    TechnicalAnalysis,
    #[serde(rename = "//blp/apiauth")]
    ApiAuthorization,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        Self::RefData,
        Self::ApiFields,
        Self::TechnicalAnalysis,
        Self::ApiAuthorization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RefData => "//blp/refdata",
            Self::ApiFields => "//blp/apiflds",
            Self::TechnicalAnalysis => "//blp/tasvc",
            Self::ApiAuthorization => "//blp/apiauth",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = crate::errors::BlpApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|svc| svc.as_str() == s)
            .ok_or_else(|| crate::errors::BlpApiError::NotFound(format!("service '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_type_roundtrips_through_str() {
        for kind in [
            RequestType::HistoricalDataRequest,
            RequestType::ReferenceDataRequest,
            RequestType::IntradayBarRequest,
        ] {
            assert_eq!(kind.as_str().parse::<RequestType>().unwrap(), kind);
        }
        assert!("BeqsRequest".parse::<RequestType>().is_err());
    }

    #[test]
    fn service_type_parses_provider_names() {
        assert_eq!(
            "//blp/refdata".parse::<ServiceType>().unwrap(),
            ServiceType::RefData
        );
        assert_eq!(ServiceType::TechnicalAnalysis.to_string(), "//blp/tasvc");
        assert!("//blp/mktdata".parse::<ServiceType>().is_err());
    }
}
