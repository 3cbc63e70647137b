//! This module contains the readiness-selection layer.
//!
//! [`Poller`] wraps the system selector (epoll on Linux) together with an
//! eventfd-backed [`Waker`] that lets other threads interrupt a blocked wait.
//! The selection handle itself is only ever mutated by the thread that owns
//! the [`Poller`]; everything cross-thread goes through the [`Waker`].

pub mod sys;

pub use sys::unix::epoll::{Poller, Waker};

/// Correlates a readiness notification back to the session it belongs to.
///
/// Tokens are handed out by the reactor when a session is attached and carry
/// no meaning outside of that reactor's selection handle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token(pub(crate) usize);

impl Token {
    /// Reserved for the wakeup eventfd. Never assigned to a session.
    pub(crate) const WAKER: Token = Token(usize::MAX);

    pub(crate) fn as_u64(self) -> u64 {
        self.0 as u64
    }

    pub(crate) fn from_u64(data: u64) -> Self {
        Token(data as usize)
    }
}

/// The readiness condition a session is attached for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Interest {
    Readable,
    Writable,
}
