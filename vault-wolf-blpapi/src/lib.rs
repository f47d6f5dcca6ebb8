//! vault-wolf-blpapi -- Rust native Bloomberg API response decoding and
//! request client.
//!
//! The provider delivers responses as trees of typed elements spread over a
//! stream of events. This crate decodes those trees into plain nested maps
//! and accumulates the fragments of one request into a single `Response`.
//! The provider itself sits behind the `SessionProvider` / `Session` traits;
//! `replay` ships a file-driven implementation.
//!
//! ## Modules
//!
//! - [`models`] -- Element trees, decoded values, request enums, responses
//! - [`protocol`] -- Element names, request kinds, services, defaults
//! - [`errors`] -- Error types for the library
//! - [`wrapper`] -- Events and messages delivered by a session
//! - [`decoder`] -- Scalar, tree and per-message decoding
//! - [`reader`] -- Response accumulation and the per-request event loop
//! - [`session`] -- Provider session traits and `SessionGuard`
//! - [`request`] -- Outbound request object
//! - [`client`] -- BlpClient (main API entry point)
//! - [`replay`] -- Session provider replaying scripted events

pub mod client;
pub mod decoder;
pub mod errors;
pub mod models;
pub mod protocol;
pub mod reader;
pub mod replay;
pub mod request;
pub mod session;
pub mod wrapper;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use errors::{BlpApiError, Result};

// Element trees and decoded values
pub use models::element::{CorrelationId, DataType, Element, ElementContent, ElementValue, NodeKind};
pub use models::value::{FieldMap, Value};

// Responses
pub use models::response::{DecodedMessage, Fragment, Response, SecurityResult};

// Enums
pub use models::enums::*;

// Protocol
pub use protocol::{RequestType, ServiceType};

// Decoding
pub use decoder::{
    decode_historical_message, decode_intraday_message, decode_message, decode_reference_message,
    decode_scalar, decode_tree, flatten, DuplicateNames,
};

// Sessions / Client / Reader
pub use client::{
    format_override, BlpClient, ClientConfig, HistoricalRequest, IntradayBarRequest, OverrideValue,
    ReferenceRequest,
};
pub use reader::{FragmentHistory, ResponseAccumulator, ResponseReader};
pub use replay::{ReplayScript, ReplaySession, ReplaySessionProvider};
pub use request::{Request, RequestValue};
pub use session::{Session, SessionGuard, SessionOptions, SessionProvider};
pub use wrapper::{Event, EventType, Message};
