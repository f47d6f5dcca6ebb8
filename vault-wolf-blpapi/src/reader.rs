//! Response reader for Bloomberg API requests.
//!
//! Pulls events from a session until the terminal `RESPONSE` event, decodes
//! every message that answers the request and folds the decoded fragments
//! into one cumulative `Response`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::decoder::decode_message;
use crate::errors::{BlpApiError, Result};
use crate::models::element::CorrelationId;
use crate::models::response::{DecodedMessage, Fragment, Response, SecurityResult};
use crate::protocol::{RequestType, DEFAULT_EVENT_TIMEOUT};
use crate::session::Session;

// ============================================================================
// FragmentHistory
// ============================================================================

/// Message types seen so far, per owning security.
///
/// Flat fragments (no owning security) are recorded under `None`.
#[derive(Debug, Default, Clone)]
pub struct FragmentHistory {
    seen: HashMap<Option<String>, Vec<String>>,
}

impl FragmentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message type for `security` and return how many times that
    /// type has now been seen for it.
    pub fn record(&mut self, security: Option<&str>, message_type: &str) -> usize {
        let types = self.seen.entry(security.map(str::to_string)).or_default();
        types.push(message_type.to_string());
        types.iter().filter(|t| *t == message_type).count()
    }

    /// Message types recorded for `security`, in arrival order.
    pub fn types_for(&self, security: Option<&str>) -> &[String] {
        self.seen
            .get(&security.map(str::to_string))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ============================================================================
// ResponseAccumulator
// ============================================================================

/// Folds decoded fragments into a cumulative `Response`.
///
/// The first fragment of a message type for a security replaces whatever the
/// output holds for that security; later fragments are merged section by
/// section with the newest value winning. Entries are never removed.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    history: FragmentHistory,
    output: Response,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, message_type: &str, decoded: DecodedMessage) {
        let seen = self.history.record(decoded.security(), message_type);
        let first = seen <= 1;

        match decoded {
            DecodedMessage::Security { security, result } => {
                Self::place(&mut self.output, security, result, first)
            }
            DecodedMessage::Flat(Fragment::Securities(results)) => {
                for (security, result) in results {
                    Self::place(&mut self.output, security, result, first);
                }
            }
            DecodedMessage::Flat(Fragment::Bars(bars)) => self.output.bars.extend(bars),
            DecodedMessage::Flat(Fragment::ResponseError(error)) => {
                tracing::debug!("recording response error fragment");
                self.output
                    .response_error
                    .get_or_insert_with(Default::default)
                    .extend(error);
            }
        }
    }

    fn place(output: &mut Response, security: String, result: SecurityResult, first: bool) {
        match output.securities.get_mut(&security) {
            Some(existing) if !first => existing.merge(result),
            Some(existing) => *existing = result,
            None => {
                output.securities.insert(security, result);
            }
        }
    }

    pub fn history(&self) -> &FragmentHistory {
        &self.history
    }

    pub fn output(&self) -> &Response {
        &self.output
    }

    pub fn finish(self) -> Response {
        self.output
    }
}

// ============================================================================
// ResponseReader
// ============================================================================

/// Drives a session's event loop for one request.
///
/// ## Usage
///
/// ```rust,ignore
/// let cid = session.send_request(request)?;
/// let response = ResponseReader::new(cid, RequestType::ReferenceDataRequest)
///     .with_request_timeout(Some(Duration::from_secs(30)))
///     .run(&mut session)?;
/// ```
#[derive(Debug, Clone)]
pub struct ResponseReader {
    cid: CorrelationId,
    kind: RequestType,
    event_timeout: Duration,
    request_timeout: Option<Duration>,
}

impl ResponseReader {
    pub fn new(cid: CorrelationId, kind: RequestType) -> Self {
        Self {
            cid,
            kind,
            event_timeout: DEFAULT_EVENT_TIMEOUT,
            request_timeout: None,
        }
    }

    /// Wait passed to each `next_event` call.
    pub fn with_event_timeout(mut self, timeout: Duration) -> Self {
        self.event_timeout = timeout;
        self
    }

    /// Overall deadline for the request; `None` waits indefinitely.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read events until the terminal response and return the cumulative
    /// output.
    ///
    /// Every message carrying this request's correlation id is decoded,
    /// whatever the event type; other messages are skipped. Only the final
    /// response event ends the read.
    pub fn run<S: Session + ?Sized>(&self, session: &mut S) -> Result<Response> {
        let deadline = self.request_timeout.map(|t| Instant::now() + t);
        let mut accumulator = ResponseAccumulator::new();

        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::warn!("{} {} timed out waiting for the final response", self.kind, self.cid);
                    return Err(BlpApiError::Timeout(format!(
                        "{} {} did not complete within {:?}",
                        self.kind,
                        self.cid,
                        self.request_timeout.unwrap_or_default()
                    )));
                }
            }

            let event = session.next_event(self.event_timeout)?;

            for msg in event.messages() {
                if !msg.has_correlation_id(self.cid) {
                    tracing::debug!(
                        "skipping {} message for {:?}",
                        msg.message_type(),
                        msg.correlation_ids()
                    );
                    continue;
                }
                let decoded = decode_message(self.kind, msg)?;
                accumulator.accept(msg.message_type(), decoded);
            }

            if event.is_final() {
                let output = accumulator.finish();
                tracing::info!(
                    "{} {} complete: {} securities, {} bars",
                    self.kind,
                    self.cid,
                    output.securities.len(),
                    output.bars.len()
                );
                return Ok(output);
            }
        }
    }
}
