//! File-driven session provider.
//!
//! A `ReplayScript` holds, per request kind, the events a provider would
//! deliver after that request is sent. `ReplaySessionProvider` starts
//! sessions that play those events back, which lets the client run without
//! the native provider SDK (offline serving, tests, demos).
//!
//! Script format:
//!
//! ```json
//! {
//!   "ReferenceDataRequest": [
//!     {"eventType": "RESPONSE", "messages": [
//!       {"messageType": "ReferenceDataResponse", "elements": [ ... ]}
//!     ]}
//!   ]
//! }
//! ```
//!
//! Messages of request-scoped events (request status, partial and final
//! responses) without explicit `correlationIds` are stamped with the id
//! assigned to the request when it is sent.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{BlpApiError, Result};
use crate::models::element::CorrelationId;
use crate::protocol::{RequestType, ServiceType};
use crate::request::Request;
use crate::session::{Session, SessionOptions, SessionProvider};
use crate::wrapper::Event;

// ============================================================================
// ReplayScript
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ReplayScript {
    responses: HashMap<RequestType, Vec<Event>>,
}

impl ReplayScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let script = Self::from_json(&text)?;
        tracing::info!(
            "loaded replay script {} ({} request kinds)",
            path.as_ref().display(),
            script.responses.len()
        );
        Ok(script)
    }

    /// Replace the events played back for `kind`.
    pub fn with_events(mut self, kind: RequestType, events: Vec<Event>) -> Self {
        self.responses.insert(kind, events);
        self
    }

    pub fn events(&self, kind: RequestType) -> &[Event] {
        self.responses.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// ReplaySessionProvider
// ============================================================================

#[derive(Debug, Default)]
struct ReplayLog {
    sent: Vec<Request>,
    started: usize,
    stop_calls: usize,
}

/// Starts `ReplaySession`s over a shared script and records what they do.
///
/// Clones share the script and the log.
#[derive(Debug, Clone)]
pub struct ReplaySessionProvider {
    script: Arc<ReplayScript>,
    log: Arc<Mutex<ReplayLog>>,
    reachable: bool,
}

impl ReplaySessionProvider {
    pub fn new(script: ReplayScript) -> Self {
        Self {
            script: Arc::new(script),
            log: Arc::default(),
            reachable: true,
        }
    }

    /// Provider whose sessions never start, as if the endpoint were down.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(ReplayScript::new())
        }
    }

    fn log(&self) -> MutexGuard<'_, ReplayLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every request sent by any session of this provider, in order.
    pub fn sent_requests(&self) -> Vec<Request> {
        self.log().sent.clone()
    }

    pub fn sessions_started(&self) -> usize {
        self.log().started
    }

    /// Number of `stop()` calls across all sessions.
    pub fn stop_calls(&self) -> usize {
        self.log().stop_calls
    }
}

impl SessionProvider for ReplaySessionProvider {
    type Session = ReplaySession;

    fn start(&self, options: &SessionOptions) -> Result<ReplaySession> {
        if !self.reachable {
            tracing::error!("replay provider refused session to {}", options.endpoint());
            return Err(BlpApiError::Connection(format!(
                "failed to start session to {}",
                options.endpoint()
            )));
        }
        self.log().started += 1;
        tracing::debug!("replay session started (nominal endpoint {})", options.endpoint());
        Ok(ReplaySession {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
            opened: HashSet::new(),
            queue: VecDeque::new(),
            next_cid: 1,
            stopped: false,
        })
    }
}

// ============================================================================
// ReplaySession
// ============================================================================

pub struct ReplaySession {
    script: Arc<ReplayScript>,
    log: Arc<Mutex<ReplayLog>>,
    opened: HashSet<ServiceType>,
    queue: VecDeque<Event>,
    next_cid: u64,
    stopped: bool,
}

impl ReplaySession {
    fn ensure_running(&self) -> Result<()> {
        if self.stopped {
            return Err(BlpApiError::Disconnected("session has been stopped".into()));
        }
        Ok(())
    }
}

impl Session for ReplaySession {
    fn open_service(&mut self, service: ServiceType) -> Result<()> {
        self.ensure_running()?;
        self.opened.insert(service);
        tracing::debug!("opened {service}");
        Ok(())
    }

    fn create_request(&mut self, service: ServiceType, kind: RequestType) -> Result<Request> {
        self.ensure_running()?;
        if !self.opened.contains(&service) {
            return Err(BlpApiError::NotFound(format!("service {service} has not been opened")));
        }
        if service != ServiceType::RefData {
            return Err(BlpApiError::NotFound(format!("{kind} on {service}")));
        }
        Ok(Request::new(service, kind))
    }

    fn send_request(&mut self, request: Request) -> Result<CorrelationId> {
        self.ensure_running()?;
        let cid = CorrelationId(self.next_cid);
        self.next_cid += 1;

        for event in self.script.events(request.kind()) {
            let mut event = event.clone();
            if !event.event_type().is_request_scoped() {
                self.queue.push_back(event);
                continue;
            }
            for msg in event.messages_mut() {
                if msg.correlation_ids().is_empty() {
                    msg.set_correlation_ids(vec![cid]);
                }
            }
            self.queue.push_back(event);
        }
        tracing::debug!("queued {} events for {cid}", self.queue.len());

        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .push(request);
        Ok(cid)
    }

    fn next_event(&mut self, _timeout: Duration) -> Result<Event> {
        self.ensure_running()?;
        self.queue
            .pop_front()
            .ok_or_else(|| BlpApiError::Disconnected("replay script exhausted".into()))
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop_calls += 1;
    }
}
