//! VaultWolf Bloomberg server data models.
//!
//! The decoded payloads come straight from `vault_wolf_blpapi::Response`;
//! this module holds the JSON envelope they travel in and the error-code
//! mapping shared by all handlers.

use serde::{Deserialize, Serialize};
use vault_wolf_blpapi::BlpApiError;

// ============================================================================
// API Response Wrappers
// ============================================================================

/// Generic JSON API response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error_code: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: Some(code),
        }
    }
}

/// HTTP status code reported for a library error.
pub fn error_code(err: &BlpApiError) -> u16 {
    match err {
        BlpApiError::InvalidArgument(_) => 400,
        BlpApiError::NotFound(_) => 404,
        _ => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::error("Missing required parameter: tickers", 400)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], 400);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn error_codes_follow_error_kind() {
        assert_eq!(error_code(&BlpApiError::InvalidArgument("x".into())), 400);
        assert_eq!(error_code(&BlpApiError::NotFound("x".into())), 404);
        assert_eq!(error_code(&BlpApiError::Disconnected("x".into())), 500);
        assert_eq!(error_code(&BlpApiError::Timeout("x".into())), 500);
    }
}
