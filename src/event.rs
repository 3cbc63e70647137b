//! Envelopes that move sessions between threads.

use std::fmt;
use std::io;

use crate::session::Session;

/// Carries a session to a reactor's registration entry point.
pub struct Event {
    session: Session,
}

impl Event {
    pub fn new(session: Session) -> Self {
        Event { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:?})", self.session)
    }
}

/// Carries a session together with the error that took it down.
///
/// Published exactly once per failed attach or readiness-handling step;
/// consumption is the failure sink's concern.
pub struct FailureEvent {
    session: Session,
    error: io::Error,
}

impl FailureEvent {
    pub fn new(session: Session, error: io::Error) -> Self {
        FailureEvent { session, error }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn error(&self) -> &io::Error {
        &self.error
    }

    pub fn into_parts(self) -> (Session, io::Error) {
        (self.session, self.error)
    }
}

impl fmt::Debug for FailureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FailureEvent({:?}, {})", self.session, self.error)
    }
}
