//! Provider session abstraction.
//!
//! A `SessionProvider` starts sessions; a `Session` opens services, creates
//! and sends requests and hands out events. `SessionGuard` ties a session's
//! lifetime to a scope so it is stopped exactly once on every exit path.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::element::CorrelationId;
use crate::protocol::{RequestType, ServiceType, DEFAULT_HOST, DEFAULT_PORT};
use crate::request::Request;
use crate::wrapper::Event;

// ============================================================================
// SessionOptions
// ============================================================================

/// Endpoint a session connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl SessionOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Factory for provider sessions.
pub trait SessionProvider {
    type Session: Session;

    /// Start a session against `options`. Fails with `Connection` when the
    /// provider cannot be reached.
    fn start(&self, options: &SessionOptions) -> Result<Self::Session>;
}

/// One live provider session.
pub trait Session {
    /// Open a service. Fails with `NotFound` for unknown services.
    fn open_service(&mut self, service: ServiceType) -> Result<()>;

    /// Create an empty request of `kind` on an opened service.
    fn create_request(&mut self, service: ServiceType, kind: RequestType) -> Result<Request>;

    /// Send a request and return the correlation id its messages will carry.
    fn send_request(&mut self, request: Request) -> Result<CorrelationId>;

    /// Block up to `timeout` for the next event. An elapsed wait yields an
    /// event of type `Timeout`, not an error.
    fn next_event(&mut self, timeout: Duration) -> Result<Event>;

    fn stop(&mut self);
}

// ============================================================================
// SessionGuard
// ============================================================================

/// Owns a session and stops it when dropped.
pub struct SessionGuard<S: Session> {
    session: S,
    stopped: bool,
}

impl<S: Session> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            stopped: false,
        }
    }

    /// Stop the session now instead of at end of scope.
    pub fn stop(mut self) {
        self.stop_once();
    }

    fn stop_once(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.session.stop();
            tracing::debug!("session stopped");
        }
    }
}

impl<S: Session> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: Session> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.stop_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting(Rc<Cell<usize>>);

    impl Session for Counting {
        fn open_service(&mut self, _service: ServiceType) -> Result<()> {
            Ok(())
        }
        fn create_request(&mut self, service: ServiceType, kind: RequestType) -> Result<Request> {
            Ok(Request::new(service, kind))
        }
        fn send_request(&mut self, _request: Request) -> Result<CorrelationId> {
            Ok(CorrelationId(1))
        }
        fn next_event(&mut self, _timeout: Duration) -> Result<Event> {
            Ok(Event::timeout())
        }
        fn stop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn guard_stops_once_on_drop() {
        let stops = Rc::new(Cell::new(0));
        {
            let mut guard = SessionGuard::new(Counting(stops.clone()));
            guard.open_service(ServiceType::RefData).unwrap();
        }
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn explicit_stop_does_not_double_stop() {
        let stops = Rc::new(Cell::new(0));
        SessionGuard::new(Counting(stops.clone())).stop();
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn default_options_point_at_local_endpoint() {
        assert_eq!(SessionOptions::default().endpoint(), "localhost:8194");
        assert_eq!(SessionOptions::new("bpipe", 8196).port, 8196);
    }
}
