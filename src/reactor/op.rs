//! The capability contract between the reactor core and its operation
//! strategies.

use std::fmt;
use std::io;

use crate::io::{Poller, Token};
use crate::session::Session;

/// The operation kind a reactor services. Determines the readiness condition
/// and the strategy that handles it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OpKind {
    Accept,
    Read,
    Write,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Accept => f.write_str("accept"),
            OpKind::Read => f.write_str("read"),
            OpKind::Write => f.write_str("write"),
        }
    }
}

/// What the reactor should do with a session after a readiness step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Disposition {
    /// Leave the session attached for future readiness.
    Keep,
    /// Detach the session and hand it to [`Op::detached`].
    Retire,
}

/// One operation kind's behavior, injected into the generic reactor core.
///
/// Strategies run exclusively on the reactor thread; they never need to be
/// re-entrant and never report their own failures. Any `Err` they return is
/// caught by the core, wrapped with the offending session and published to
/// the failure sink.
pub trait Op: Send + 'static {
    fn kind(&self) -> OpKind;

    /// Registers the session's handle with the selection mechanism for this
    /// operation kind's readiness condition.
    fn attach(&mut self, poller: &Poller, token: Token, session: &mut Session) -> io::Result<()>;

    /// Invoked when the session's attachment reports readiness. Performs the
    /// operation-specific action and decides whether the session stays
    /// attached.
    fn on_ready(&mut self, session: &mut Session) -> io::Result<Disposition>;

    /// Invoked after a session retired via [`Disposition::Retire`] has been
    /// detached. The default drops the session, closing its socket.
    fn detached(&mut self, session: Session) {
        drop(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_kind_display() {
        assert_eq!(OpKind::Accept.to_string(), "accept");
        assert_eq!(OpKind::Read.to_string(), "read");
        assert_eq!(OpKind::Write.to_string(), "write");
    }
}
