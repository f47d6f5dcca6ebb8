//! Bloomberg API event types.
//!
//! A session delivers `Event`s. Each event carries zero or more `Message`s,
//! and each message is tagged with the correlation ids of the requests it
//! answers plus a message type (e.g. `HistoricalDataResponse`).

use serde::{Deserialize, Serialize};

use crate::errors::{BlpApiError, Result};
use crate::models::element::{CorrelationId, Element};

// ============================================================================
// EventType
// ============================================================================

/// Event categories delivered by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Admin,
    SessionStatus,
    ServiceStatus,
    RequestStatus,
    /// More messages for the request will follow.
    PartialResponse,
    /// Final event for the request.
    Response,
    /// `next_event` waited the full timeout without anything to deliver.
    Timeout,
}

impl EventType {
    /// Events that answer a specific request and carry its correlation ids.
    pub fn is_request_scoped(self) -> bool {
        matches!(
            self,
            EventType::RequestStatus | EventType::PartialResponse | EventType::Response
        )
    }
}

// ============================================================================
// Message
// ============================================================================

/// One provider message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    message_type: String,
    #[serde(default)]
    correlation_ids: Vec<CorrelationId>,
    #[serde(default)]
    elements: Vec<Element>,
}

impl Message {
    pub fn new(
        message_type: impl Into<String>,
        correlation_ids: Vec<CorrelationId>,
        elements: Vec<Element>,
    ) -> Self {
        Self {
            message_type: message_type.into(),
            correlation_ids,
            elements,
        }
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn correlation_ids(&self) -> &[CorrelationId] {
        &self.correlation_ids
    }

    pub fn has_correlation_id(&self, cid: CorrelationId) -> bool {
        self.correlation_ids.contains(&cid)
    }

    pub(crate) fn set_correlation_ids(&mut self, ids: Vec<CorrelationId>) {
        self.correlation_ids = ids;
    }

    /// Top-level elements of the message body.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn has_element(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name() == name)
    }

    pub fn get_element(&self, name: &str) -> Result<&Element> {
        self.elements
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| {
                BlpApiError::NotFound(format!("element '{name}' in {} message", self.message_type))
            })
    }
}

// ============================================================================
// Event
// ============================================================================

/// A batch of messages delivered by one `next_event` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    event_type: EventType,
    #[serde(default)]
    messages: Vec<Message>,
}

impl Event {
    pub fn new(event_type: EventType, messages: Vec<Message>) -> Self {
        Self {
            event_type,
            messages,
        }
    }

    /// Empty event signalling the wait elapsed.
    pub fn timeout() -> Self {
        Self::new(EventType::Timeout, Vec::new())
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Whether this is the terminal event of a request.
    pub fn is_final(&self) -> bool {
        self.event_type == EventType::Response
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }
}
