//! BlpClient: the main entry point for Bloomberg API requests.
//!
//! Each call starts a session, opens the configured service, builds and
//! sends one request and reads events until the final response. The session
//! is stopped when the call returns, whether it succeeded or not.
//!
//! ```rust,ignore
//! let client = BlpClient::new(provider);
//! let req = ReferenceRequest::new(["AAPL US Equity"], ["PX_LAST", "NAME"]);
//! let response = client.reference(&req)?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{BlpApiError, Result};
use crate::models::enums::{
    IntradayEventType, NonTradingDayFillMethod, NonTradingDayFillOption, Periodicity,
};
use crate::models::response::Response;
use crate::protocol::{
    request_names, RequestType, ServiceType, CURVE_DATE, DEFAULT_EVENT_TIMEOUT,
    DEFAULT_MAX_DATA_POINTS,
};
use crate::reader::ResponseReader;
use crate::request::Request;
use crate::session::{Session, SessionGuard, SessionOptions, SessionProvider};

// ============================================================================
// ClientConfig
// ============================================================================

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub session: SessionOptions,
    pub service: ServiceType,
    /// Wait applied to each `next_event` call.
    pub event_timeout: Duration,
    /// Overall deadline per request; `None` waits for the final response.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            service: ServiceType::RefData,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
            request_timeout: None,
        }
    }
}

// ============================================================================
// Request parameters
// ============================================================================

fn validate_names(what: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(BlpApiError::InvalidArgument(format!("at least one {what} is required")));
    }
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(BlpApiError::InvalidArgument(format!("{what} must not be blank")));
    }
    Ok(())
}

fn validate_max_data_points(max_data_points: u32) -> Result<()> {
    if max_data_points == 0 {
        return Err(BlpApiError::InvalidArgument(
            "max data points must be a positive integer".into(),
        ));
    }
    Ok(())
}

fn collect<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// Parameters of a `HistoricalDataRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRequest {
    pub tickers: Vec<String>,
    pub fields: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub periodicity: Periodicity,
    pub max_data_points: u32,
    pub fill_option: NonTradingDayFillOption,
    pub fill_method: NonTradingDayFillMethod,
}

impl HistoricalRequest {
    pub fn new<T, F>(tickers: T, fields: F, start_date: NaiveDate, end_date: NaiveDate) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            tickers: collect(tickers),
            fields: collect(fields),
            start_date,
            end_date,
            periodicity: Periodicity::default(),
            max_data_points: DEFAULT_MAX_DATA_POINTS,
            fill_option: NonTradingDayFillOption::default(),
            fill_method: NonTradingDayFillMethod::default(),
        }
    }

    pub fn periodicity(mut self, periodicity: Periodicity) -> Self {
        self.periodicity = periodicity;
        self
    }

    pub fn max_data_points(mut self, max_data_points: u32) -> Self {
        self.max_data_points = max_data_points;
        self
    }

    pub fn fill(mut self, option: NonTradingDayFillOption, method: NonTradingDayFillMethod) -> Self {
        self.fill_option = option;
        self.fill_method = method;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_names("ticker", &self.tickers)?;
        validate_names("field", &self.fields)?;
        validate_max_data_points(self.max_data_points)?;
        if self.start_date > self.end_date {
            return Err(BlpApiError::InvalidArgument(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    fn populate(&self, request: &mut Request) {
        for ticker in &self.tickers {
            request.append(request_names::SECURITIES, ticker.as_str());
        }
        for field in &self.fields {
            request.append(request_names::FIELDS, field.as_str());
        }
        request.set(request_names::PERIODICITY_ADJUSTMENT, "ACTUAL");
        request.set(request_names::PERIODICITY_SELECTION, self.periodicity.to_string());
        request.set(request_names::START_DATE, self.start_date);
        request.set(request_names::END_DATE, self.end_date);
        request.set(request_names::MAX_DATA_POINTS, self.max_data_points);
        request.set(request_names::NON_TRADING_DAY_FILL_OPTION, self.fill_option.to_string());
        request.set(request_names::NON_TRADING_DAY_FILL_METHOD, self.fill_method.to_string());
    }
}

/// Override value as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Best-effort typing of a textual override: ISO date, ISO datetime,
/// integer, float, otherwise the string itself.
impl FromStr for OverrideValue {
    type Err = BlpApiError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Date(d));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self::Datetime(dt));
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Self::Int(n));
        }
        if let Ok(x) = s.parse::<f64>() {
            return Ok(Self::Float(x));
        }
        Ok(Self::String(s.to_string()))
    }
}

impl From<&str> for OverrideValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<NaiveDate> for OverrideValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<f64> for OverrideValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

/// Wire string for one override.
///
/// `CURVE_DATE` dates are sent as `YYYYMMDD`; everything else is sent as its
/// plain string rendering.
pub fn format_override(field_id: &str, value: &OverrideValue) -> String {
    match value {
        OverrideValue::Date(d) if field_id == CURVE_DATE => d.format("%Y%m%d").to_string(),
        OverrideValue::Datetime(dt) if field_id == CURVE_DATE => dt.format("%Y%m%d").to_string(),
        other => other.to_string(),
    }
}

/// Parameters of a `ReferenceDataRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRequest {
    pub tickers: Vec<String>,
    pub fields: Vec<String>,
    #[serde(default)]
    pub overrides: IndexMap<String, OverrideValue>,
}

impl ReferenceRequest {
    pub fn new<T, F>(tickers: T, fields: F) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            tickers: collect(tickers),
            fields: collect(fields),
            overrides: IndexMap::new(),
        }
    }

    pub fn with_override(mut self, field_id: impl Into<String>, value: impl Into<OverrideValue>) -> Self {
        self.overrides.insert(field_id.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_names("ticker", &self.tickers)?;
        validate_names("field", &self.fields)?;
        if self.overrides.keys().any(|k| k.trim().is_empty()) {
            return Err(BlpApiError::InvalidArgument("override field id must not be blank".into()));
        }
        Ok(())
    }

    fn populate(&self, request: &mut Request) {
        for ticker in &self.tickers {
            request.append(request_names::SECURITIES, ticker.as_str());
        }
        for field in &self.fields {
            request.append(request_names::FIELDS, field.as_str());
        }
        for (field_id, value) in &self.overrides {
            request.append_override(field_id, format_override(field_id, value));
        }
    }
}

/// Parameters of an `IntradayBarRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayBarRequest {
    pub ticker: String,
    pub event_type: IntradayEventType,
    /// Bar length in minutes.
    pub interval: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub max_data_points: u32,
}

impl IntradayBarRequest {
    pub fn new(ticker: impl Into<String>, interval: u32, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            ticker: ticker.into(),
            event_type: IntradayEventType::default(),
            interval,
            start,
            end,
            max_data_points: DEFAULT_MAX_DATA_POINTS,
        }
    }

    pub fn event_type(mut self, event_type: IntradayEventType) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn max_data_points(mut self, max_data_points: u32) -> Self {
        self.max_data_points = max_data_points;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(BlpApiError::InvalidArgument("ticker must not be blank".into()));
        }
        if self.interval == 0 {
            return Err(BlpApiError::InvalidArgument(
                "interval must be a positive number of minutes".into(),
            ));
        }
        validate_max_data_points(self.max_data_points)?;
        if self.start > self.end {
            return Err(BlpApiError::InvalidArgument(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    fn populate(&self, request: &mut Request) {
        request.set(request_names::SECURITY, self.ticker.as_str());
        request.set(request_names::EVENT_TYPE, self.event_type.to_string());
        request.set(request_names::INTERVAL, self.interval);
        request.set(request_names::START_DATE_TIME, self.start);
        request.set(request_names::END_DATE_TIME, self.end);
        request.set(request_names::MAX_DATA_POINTS, self.max_data_points);
    }
}

// ============================================================================
// BlpClient
// ============================================================================

/// Request client over a session provider.
///
/// Holds no session between calls, so a single client can serve concurrent
/// callers when the provider is `Sync`.
pub struct BlpClient<P: SessionProvider> {
    provider: P,
    config: ClientConfig,
}

impl<P: SessionProvider> BlpClient<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ClientConfig::default())
    }

    pub fn with_config(provider: P, config: ClientConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Daily (or coarser) history per security, keyed by date.
    pub fn historical(&self, params: &HistoricalRequest) -> Result<Response> {
        params.validate()?;
        self.execute(RequestType::HistoricalDataRequest, |r| params.populate(r))
    }

    /// Current field values per security, with overrides applied.
    pub fn reference(&self, params: &ReferenceRequest) -> Result<Response> {
        params.validate()?;
        self.execute(RequestType::ReferenceDataRequest, |r| params.populate(r))
    }

    /// Intraday bars for one security, keyed by bar time.
    pub fn intraday(&self, params: &IntradayBarRequest) -> Result<Response> {
        params.validate()?;
        self.execute(RequestType::IntradayBarRequest, |r| params.populate(r))
    }

    fn execute(&self, kind: RequestType, populate: impl FnOnce(&mut Request)) -> Result<Response> {
        let service = self.config.service;
        tracing::debug!("starting session to {}", self.config.session.endpoint());
        let mut session = SessionGuard::new(self.provider.start(&self.config.session)?);

        session.open_service(service)?;
        let mut request = session.create_request(service, kind)?;
        populate(&mut request);

        let cid = session.send_request(request)?;
        tracing::info!("sent {kind} on {service} as {cid}");

        ResponseReader::new(cid, kind)
            .with_event_timeout(self.config.event_timeout)
            .with_request_timeout(self.config.request_timeout)
            .run(&mut *session)
    }
}
