//! epoll-backed [`Poller`] and its eventfd [`Waker`].

use std::io;
use std::os::fd::{AsFd, AsRawFd};
use std::sync::Arc;

use nix::sys::epoll::{Epoll, EpollCreateFlags, EpollEvent, EpollFlags, EpollTimeout};
use nix::sys::eventfd::{EfdFlags, EventFd};

use crate::io::{Interest, Token};

pub(crate) const MAX_EVENTS_RETURNED: usize = 256;

impl Interest {
    fn into_flags(self) -> EpollFlags {
        match self {
            Interest::Readable => EpollFlags::EPOLLIN,
            Interest::Writable => EpollFlags::EPOLLOUT,
        }
    }
}

/// Owns the selection handle for one reactor.
///
/// A non-blocking eventfd is registered under [`Token::WAKER`] at creation,
/// so any thread holding a [`Waker`] can break the owning thread out of
/// [`Poller::wait`]. All other registrations must happen on the thread that
/// drives the wait loop.
pub struct Poller {
    epoll: Epoll,
    wake_fd: Arc<EventFd>,
    events: [EpollEvent; MAX_EVENTS_RETURNED],
}

impl Poller {
    pub fn new() -> io::Result<Self> {
        let epoll = Epoll::new(EpollCreateFlags::empty())?;
        let wake_fd = EventFd::from_value_and_flags(0, EfdFlags::EFD_NONBLOCK)?;
        epoll.add(
            &wake_fd,
            EpollEvent::new(EpollFlags::EPOLLIN, Token::WAKER.as_u64()),
        )?;

        Ok(Poller {
            epoll,
            wake_fd: Arc::new(wake_fd),
            events: [EpollEvent::empty(); MAX_EVENTS_RETURNED],
        })
    }

    /// Returns a cheap cloneable handle for interrupting [`Poller::wait`]
    /// from other threads.
    pub fn waker(&self) -> Waker {
        Waker {
            wake_fd: self.wake_fd.clone(),
        }
    }

    /// Attaches `fd` for `interest`, correlated by `token`.
    pub fn add(&self, token: Token, fd: &impl AsFd, interest: Interest) -> io::Result<()> {
        self.epoll
            .add(fd, EpollEvent::new(interest.into_flags(), token.as_u64()))?;
        Ok(())
    }

    /// Detaches `fd` from the selection handle.
    pub fn delete(&self, fd: &impl AsFd) -> io::Result<()> {
        self.epoll.delete(fd)?;
        Ok(())
    }

    /// Blocks until at least one attachment is ready and collects the ready
    /// tokens into `ready`.
    ///
    /// A wakeup request is consumed here and does not show up as a token.
    /// `EINTR` surfaces as [`io::ErrorKind::Interrupted`]; callers treat it
    /// as a benign interruption of the wait.
    pub fn wait(&mut self, ready: &mut Vec<Token>) -> io::Result<()> {
        let num_incoming_events = self.epoll.wait(&mut self.events, EpollTimeout::NONE)?;

        for event in &self.events[..num_incoming_events] {
            let token = Token::from_u64(event.data());
            if token == Token::WAKER {
                self.consume_wakeup();
            } else {
                ready.push(token);
            }
        }

        Ok(())
    }

    /// Raw selection-handle fd, for tests that sabotage the handle.
    #[cfg(test)]
    pub(crate) fn raw_fd(&self) -> std::os::fd::RawFd {
        self.epoll.0.as_raw_fd()
    }

    fn consume_wakeup(&self) {
        let mut buf = [0u8; 8];
        // The eventfd is non-blocking; EAGAIN here only means the wakeup
        // was already consumed.
        let _ = nix::unistd::read(self.wake_fd.as_raw_fd(), &mut buf);
    }
}

/// Interrupts a blocked [`Poller::wait`] from any thread.
#[derive(Clone)]
pub struct Waker {
    wake_fd: Arc<EventFd>,
}

impl Waker {
    pub fn wake(&self) -> io::Result<()> {
        self.wake_fd.write(1)?;
        Ok(())
    }
}
