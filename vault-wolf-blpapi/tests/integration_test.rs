//! Integration tests for vault-wolf-blpapi.
//!
//! These drive `BlpClient` end to end over the replay session provider, so
//! they run without a Bloomberg terminal:
//!
//! ```bash
//! cargo test -p vault-wolf-blpapi --test integration_test
//! ```

use chrono::NaiveDate;
use vault_wolf_blpapi::{
    BlpApiError, BlpClient, ClientConfig, DataType, Element, ElementValue, Event, EventType,
    HistoricalRequest, IntradayBarRequest, Message, OverrideValue, ReferenceRequest,
    ReplayScript, ReplaySessionProvider, RequestType, RequestValue, Value,
};

const FIXTURE: &str = include_str!("fixtures/replay.json");

fn fixture_client() -> (BlpClient<ReplaySessionProvider>, ReplaySessionProvider) {
    let provider = ReplaySessionProvider::new(ReplayScript::from_json(FIXTURE).unwrap());
    (BlpClient::new(provider.clone()), provider)
}

fn client_for(kind: RequestType, events: Vec<Event>) -> (BlpClient<ReplaySessionProvider>, ReplaySessionProvider) {
    let provider = ReplaySessionProvider::new(ReplayScript::new().with_events(kind, events));
    (BlpClient::new(provider.clone()), provider)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn keys<V>(map: &indexmap::IndexMap<String, V>) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

// ============================================================================
// Reference Data
// ============================================================================

#[test]
fn test_reference_good_and_bad_ticker() {
    let (client, provider) = fixture_client();
    let req = ReferenceRequest::new(["AAPL US Equity", "BADTICKER"], ["PX_LAST", "NAME", "NOT_A_FIELD"]);
    let response = client.reference(&req).unwrap();

    assert_eq!(keys(&response.securities), ["AAPL US Equity", "BADTICKER"]);

    let aapl = response.security("AAPL US Equity").unwrap();
    assert_eq!(aapl.security_data["PX_LAST"], Value::Float64(189.5));
    assert_eq!(aapl.security_data["NAME"], Value::String("APPLE INC".into()));
    assert!(aapl.security_errors.is_empty());
    assert_eq!(aapl.field_exceptions["BAD_FLD"], Value::String("NOT_A_FIELD".into()));

    let bad = response.security("BADTICKER").unwrap();
    assert!(bad.security_data.is_empty());
    assert!(bad.field_exceptions.is_empty());
    assert_eq!(bad.security_errors["category"], Value::String("BAD_SEC".into()));
    assert_eq!(bad.security_errors["code"], Value::Int32(15));

    // IBM arrived under a foreign correlation id.
    assert!(response.security("IBM US Equity").is_none());
    assert_eq!(provider.sessions_started(), 1);
    assert_eq!(provider.stop_calls(), 1);
}

#[test]
fn test_reference_request_carries_securities_fields_and_curve_date() {
    let (client, provider) = fixture_client();
    let req = ReferenceRequest::new(["AAPL US Equity"], ["PX_LAST"])
        .with_override("CURVE_DATE", date(2023, 1, 1))
        .with_override("EQY_FUND_CRNCY", "EUR")
        .with_override("PX_OVERRIDE", OverrideValue::Float(1.5));
    client.reference(&req).unwrap();

    let sent = provider.sent_requests();
    assert_eq!(sent.len(), 1);
    let request = &sent[0];
    assert_eq!(request.kind(), RequestType::ReferenceDataRequest);

    let securities = request.get("securities").and_then(RequestValue::as_list).unwrap();
    assert_eq!(securities, [RequestValue::String("AAPL US Equity".into())]);

    let json = serde_json::to_value(request).unwrap();
    let overrides = &json["elements"]["overrides"];
    assert_eq!(overrides[0]["fieldId"], "CURVE_DATE");
    assert_eq!(overrides[0]["value"], "20230101");
    assert_eq!(overrides[1]["value"], "EUR");
    assert_eq!(overrides[2]["value"], "1.5");
}

#[test]
fn test_response_error_is_data_not_failure() {
    let message = Message::new(
        "ReferenceDataResponse",
        vec![],
        vec![Element::sequence(
            "responseError",
            vec![
                Element::scalar("category", ElementValue::String("BAD_ARGS".into())),
                Element::scalar("message", ElementValue::String("No securities".into())),
            ],
        )],
    );
    let (client, provider) = client_for(
        RequestType::ReferenceDataRequest,
        vec![Event::new(EventType::Response, vec![message])],
    );

    let response = client.reference(&ReferenceRequest::new(["X"], ["PX_LAST"])).unwrap();
    let error = response.response_error.unwrap();
    assert_eq!(error["category"], Value::String("BAD_ARGS".into()));
    assert!(response.securities.is_empty());
    assert_eq!(provider.stop_calls(), 1);
}

// ============================================================================
// Historical Data
// ============================================================================

#[test]
fn test_historical_rows_accumulate_across_events() {
    let (client, provider) = fixture_client();
    let req = HistoricalRequest::new(["SPX Index"], ["PX_LAST"], date(2024, 1, 2), date(2024, 1, 4));
    let response = client.historical(&req).unwrap();

    let spx = response.security("SPX Index").unwrap();
    assert_eq!(keys(&spx.security_data), ["2024-01-02", "2024-01-03", "2024-01-04"]);
    let last = spx.security_data["2024-01-04"].as_map().unwrap();
    assert_eq!(last["PX_LAST"], Value::Float64(4688.68));

    let sent = &provider.sent_requests()[0];
    assert_eq!(sent.get("startDate").and_then(RequestValue::as_str), Some("20240102"));
    assert_eq!(sent.get("periodicitySelection").and_then(RequestValue::as_str), Some("DAILY"));
    assert_eq!(sent.get("maxDataPoints"), Some(&RequestValue::Int(2500)));
    assert_eq!(provider.stop_calls(), 1);
}

// ============================================================================
// Intraday Bars
// ============================================================================

#[test]
fn test_intraday_bars_keep_time_order() {
    let (client, _provider) = fixture_client();
    let start = date(2024, 5, 1).and_hms_opt(9, 30, 0).unwrap();
    let end = date(2024, 5, 1).and_hms_opt(9, 32, 0).unwrap();
    let response = client.intraday(&IntradayBarRequest::new("IBM US Equity", 1, start, end)).unwrap();

    assert_eq!(keys(&response.bars), ["2024-05-01 09:30:00", "2024-05-01 09:31:00"]);
    let first = &response.bars["2024-05-01 09:30:00"];
    assert_eq!(first["open"], Value::Float64(166.2));
    assert_eq!(first["volume"], Value::Int64(120400));
    assert!(response.securities.is_empty());
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn test_connection_failure_surfaces_without_session() {
    let provider = ReplaySessionProvider::unreachable();
    let client = BlpClient::new(provider.clone());
    let err = client.reference(&ReferenceRequest::new(["AAPL US Equity"], ["PX_LAST"])).unwrap_err();
    assert!(matches!(err, BlpApiError::Connection(_)));
    assert_eq!(provider.stop_calls(), 0);
}

#[test]
fn test_decode_error_still_stops_session_once() {
    let broken = Message::new(
        "HistoricalDataResponse",
        vec![],
        vec![Element::array("unexpected", DataType::Sequence, vec![])],
    );
    let (client, provider) = client_for(
        RequestType::HistoricalDataRequest,
        vec![Event::new(EventType::Response, vec![broken])],
    );
    let req = HistoricalRequest::new(["SPX Index"], ["PX_LAST"], date(2024, 1, 2), date(2024, 1, 4));
    let err = client.historical(&req).unwrap_err();
    assert!(matches!(err, BlpApiError::NotFound(_)));
    assert_eq!(provider.stop_calls(), 1);
}

#[test]
fn test_stream_ending_early_is_disconnected() {
    let (client, provider) = client_for(
        RequestType::IntradayBarRequest,
        vec![Event::new(EventType::PartialResponse, vec![])],
    );
    let start = date(2024, 5, 1).and_hms_opt(9, 30, 0).unwrap();
    let err = client.intraday(&IntradayBarRequest::new("IBM US Equity", 5, start, start)).unwrap_err();
    assert!(matches!(err, BlpApiError::Disconnected(_)));
    assert_eq!(provider.stop_calls(), 1);
}

#[test]
fn test_invalid_parameters_never_start_a_session() {
    let (client, provider) = fixture_client();
    let err = client.reference(&ReferenceRequest::new(Vec::<String>::new(), ["PX_LAST"])).unwrap_err();
    assert!(matches!(err, BlpApiError::InvalidArgument(_)));
    assert_eq!(provider.sessions_started(), 0);
}

#[test]
fn test_request_timeout_is_enforced() {
    let provider = ReplaySessionProvider::new(ReplayScript::from_json(FIXTURE).unwrap());
    let config = ClientConfig {
        request_timeout: Some(std::time::Duration::ZERO),
        ..ClientConfig::default()
    };
    let client = BlpClient::with_config(provider.clone(), config);
    let err = client.reference(&ReferenceRequest::new(["AAPL US Equity"], ["PX_LAST"])).unwrap_err();
    assert!(matches!(err, BlpApiError::Timeout(_)));
    assert_eq!(provider.stop_calls(), 1);
}

#[test]
fn test_request_failure_status_is_decoded_not_dropped() {
    let failure = Message::new(
        "RequestFailure",
        vec![],
        vec![Element::sequence(
            "reason",
            vec![Element::scalar("message", ElementValue::String("Invalid security".into()))],
        )],
    );
    let (client, provider) = client_for(
        RequestType::ReferenceDataRequest,
        vec![Event::new(EventType::RequestStatus, vec![failure])],
    );
    let err = client.reference(&ReferenceRequest::new(["BAD Equity"], ["PX_LAST"])).unwrap_err();
    assert!(matches!(err, BlpApiError::NotFound(ref m) if m == "No Security Data in message."));
    assert_eq!(provider.stop_calls(), 1);
}
