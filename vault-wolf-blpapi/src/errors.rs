//! Error types for the vault-wolf-blpapi library.
//!
//! Only transport failures and contract violations are errors. Response,
//! security and field level problems reported by the provider are decoded
//! into data and returned through the normal path.

use thiserror::Error;

use crate::models::element::DataType;

/// Top-level error type for the Bloomberg API client library.
#[derive(Debug, Error)]
pub enum BlpApiError {
    /// The provider session could not be started.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A service, request kind, element or container was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unknown provider-side failure while creating a request.
    #[error("Unknown error: {0}")]
    UnknownError(String),

    /// Scalar kind the decoder refuses to interpret.
    #[error("Not implemented: decoding of {0} elements")]
    NotImplemented(DataType),

    /// Element content does not agree with its declared data type.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Element nesting exceeded the decoder's depth limit.
    #[error("Decoding error: element nesting exceeds {0} levels")]
    DepthExceeded(usize),

    /// Request parameters failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The overall request deadline elapsed before the final response.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The event source ended before the final response arrived.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// Malformed replay script.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while loading a replay script.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for this library.
pub type Result<T> = std::result::Result<T, BlpApiError>;
