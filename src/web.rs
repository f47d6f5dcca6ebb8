//! VaultWolf Bloomberg Web Server — REST API built with axum.
//!
//! Query parameters are plain strings: lists are comma separated, dates are
//! `YYYY-MM-DD`, datetimes `YYYY-MM-DDTHH:MM:SS`, overrides `FIELD:VALUE`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use vault_wolf_blpapi::{
    BlpApiError, HistoricalRequest, IntradayBarRequest, OverrideValue, ReferenceRequest,
};

use crate::manager::BbgManager;
use crate::models::*;

// ============================================================================
// App State
// ============================================================================

pub type SharedManager = Arc<BbgManager>;

// ============================================================================
// Router
// ============================================================================

pub fn create_router(manager: SharedManager) -> Router {
    Router::new()
        // Health
        .route("/health", get(handle_health))
        // Bloomberg data
        .route("/api/bbg/historical", get(handle_historical))
        .route("/api/bbg/reference", get(handle_reference))
        .route("/api/bbg/intraday", get(handle_intraday))
        .layer(CorsLayer::permissive())
        .with_state(manager)
}

// ============================================================================
// Query parameter types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct HistoricalQuery {
    pub tickers: Option<String>,
    pub fields: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub periodicity: Option<String>,
    pub max_data_points: Option<u32>,
    pub fill_option: Option<String>,
    pub fill_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReferenceQuery {
    pub tickers: Option<String>,
    pub fields: Option<String>,
    pub overrides: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IntradayQuery {
    pub ticker: Option<String>,
    pub event_type: Option<String>,
    pub interval: Option<u32>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub max_data_points: Option<u32>,
}

// ============================================================================
// Query parsing
// ============================================================================

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, BlpApiError> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(BlpApiError::InvalidArgument(format!("Missing required parameter: {name}"))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_date(raw: &str, name: &str) -> Result<NaiveDate, BlpApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        BlpApiError::InvalidArgument(format!("{name} must be YYYY-MM-DD (got '{raw}')"))
    })
}

fn parse_datetime(raw: &str, name: &str) -> Result<NaiveDateTime, BlpApiError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map_err(|_| {
        BlpApiError::InvalidArgument(format!("{name} must be YYYY-MM-DDTHH:MM:SS (got '{raw}')"))
    })
}

fn parse_overrides(raw: &str) -> Result<Vec<(String, OverrideValue)>, BlpApiError> {
    split_list(raw)
        .into_iter()
        .map(|pair| -> Result<(String, OverrideValue), BlpApiError> {
            let (field, value) = pair.split_once(':').ok_or_else(|| {
                BlpApiError::InvalidArgument(format!("override must be FIELD:VALUE (got '{pair}')"))
            })?;
            Ok((field.trim().to_string(), value.parse()?))
        })
        .collect()
}

pub fn historical_params(q: &HistoricalQuery) -> Result<HistoricalRequest, BlpApiError> {
    let mut params = HistoricalRequest::new(
        split_list(required(&q.tickers, "tickers")?),
        split_list(required(&q.fields, "fields")?),
        parse_date(required(&q.start, "start")?, "start")?,
        parse_date(required(&q.end, "end")?, "end")?,
    );
    if let Some(p) = &q.periodicity {
        params.periodicity = p.parse()?;
    }
    if let Some(n) = q.max_data_points {
        params.max_data_points = n;
    }
    if let Some(o) = &q.fill_option {
        params.fill_option = o.parse()?;
    }
    if let Some(m) = &q.fill_method {
        params.fill_method = m.parse()?;
    }
    Ok(params)
}

pub fn reference_params(q: &ReferenceQuery) -> Result<ReferenceRequest, BlpApiError> {
    let mut params = ReferenceRequest::new(
        split_list(required(&q.tickers, "tickers")?),
        split_list(required(&q.fields, "fields")?),
    );
    if let Some(raw) = &q.overrides {
        params.overrides.extend(parse_overrides(raw)?);
    }
    Ok(params)
}

pub fn intraday_params(q: &IntradayQuery) -> Result<IntradayBarRequest, BlpApiError> {
    let interval = q
        .interval
        .ok_or_else(|| BlpApiError::InvalidArgument("Missing required parameter: interval".into()))?;
    let mut params = IntradayBarRequest::new(
        required(&q.ticker, "ticker")?,
        interval,
        parse_datetime(required(&q.start, "start")?, "start")?,
        parse_datetime(required(&q.end, "end")?, "end")?,
    );
    if let Some(e) = &q.event_type {
        params.event_type = e.parse()?;
    }
    if let Some(n) = q.max_data_points {
        params.max_data_points = n;
    }
    Ok(params)
}

// ============================================================================
// Helpers
// ============================================================================

fn ok_json<T: serde::Serialize>(msg: &str, data: T) -> axum::response::Response {
    Json(ApiResponse::success(msg, data)).into_response()
}

fn err_json(err: &BlpApiError) -> axum::response::Response {
    let code = error_code(err);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::error(err.to_string(), code))).into_response()
}

fn respond(
    result: Result<vault_wolf_blpapi::Response, BlpApiError>,
    msg: &str,
) -> axum::response::Response {
    match result {
        Ok(data) => ok_json(msg, data),
        Err(e) => err_json(&e),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn handle_health(State(mgr): State<SharedManager>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "bloombergEndpoint": mgr.endpoint(),
        "sessionsStarted": mgr.sessions_started(),
        "server": "VaultWolf Bloomberg API Server",
        "version": "1.0.0"
    }))
}

async fn handle_historical(
    State(mgr): State<SharedManager>,
    Query(q): Query<HistoricalQuery>,
) -> axum::response::Response {
    let params = match historical_params(&q) {
        Ok(p) => p,
        Err(e) => return err_json(&e),
    };
    respond(mgr.historical(params).await, "Historical data retrieved")
}

async fn handle_reference(
    State(mgr): State<SharedManager>,
    Query(q): Query<ReferenceQuery>,
) -> axum::response::Response {
    let params = match reference_params(&q) {
        Ok(p) => p,
        Err(e) => return err_json(&e),
    };
    respond(mgr.reference(params).await, "Reference data retrieved")
}

async fn handle_intraday(
    State(mgr): State<SharedManager>,
    Query(q): Query<IntradayQuery>,
) -> axum::response::Response {
    let params = match intraday_params(&q) {
        Ok(p) => p,
        Err(e) => return err_json(&e),
    };
    respond(mgr.intraday(params).await, "Intraday bars retrieved")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_wolf_blpapi::{IntradayEventType, Periodicity};

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn historical_query_parses_lists_dates_and_enums() {
        let q = HistoricalQuery {
            tickers: some("SPX Index, NDX Index"),
            fields: some("PX_LAST"),
            start: some("2024-01-02"),
            end: some("2024-01-31"),
            periodicity: some("WEEKLY"),
            ..Default::default()
        };
        let p = historical_params(&q).unwrap();
        assert_eq!(p.tickers, ["SPX Index", "NDX Index"]);
        assert_eq!(p.periodicity, Periodicity::Weekly);
        assert_eq!(p.max_data_points, 2500);
    }

    #[test]
    fn missing_or_malformed_parameters_are_invalid_arguments() {
        let q = HistoricalQuery {
            tickers: some("SPX Index"),
            fields: some("PX_LAST"),
            start: some("20240102"),
            end: some("2024-01-31"),
            ..Default::default()
        };
        assert!(matches!(historical_params(&q), Err(BlpApiError::InvalidArgument(_))));

        let q = ReferenceQuery { tickers: some("  "), fields: some("PX_LAST"), overrides: None };
        assert!(matches!(reference_params(&q), Err(BlpApiError::InvalidArgument(_))));

        let q = ReferenceQuery {
            tickers: some("AAPL US Equity"),
            fields: some("PX_LAST"),
            overrides: some("CURVE_DATE"),
        };
        assert!(matches!(reference_params(&q), Err(BlpApiError::InvalidArgument(_))));
    }

    #[test]
    fn overrides_keep_their_order_and_types() {
        let q = ReferenceQuery {
            tickers: some("AAPL US Equity"),
            fields: some("PX_LAST"),
            overrides: some("CURVE_DATE:2023-01-01,EQY_FUND_CRNCY:EUR"),
        };
        let p = reference_params(&q).unwrap();
        let fields: Vec<_> = p.overrides.keys().cloned().collect();
        assert_eq!(fields, ["CURVE_DATE", "EQY_FUND_CRNCY"]);
        assert_eq!(
            p.overrides["CURVE_DATE"],
            OverrideValue::Date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
        );
    }

    #[test]
    fn intraday_query_parses_datetimes() {
        let q = IntradayQuery {
            ticker: some("IBM US Equity"),
            event_type: some("ASK"),
            interval: Some(5),
            start: some("2024-05-01T09:30:00"),
            end: some("2024-05-01T16:00:00"),
            max_data_points: None,
        };
        let p = intraday_params(&q).unwrap();
        assert_eq!(p.event_type, IntradayEventType::Ask);
        assert_eq!(p.start.to_string(), "2024-05-01 09:30:00");

        let missing = IntradayQuery { interval: None, ..q };
        assert!(matches!(intraday_params(&missing), Err(BlpApiError::InvalidArgument(_))));
    }
}
