//! This module contains [`Session`].

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

use socket2::{Domain, Protocol, Socket, Type};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One socket endpoint under management.
///
/// A session is attached to at most one selection handle per operation kind
/// at a time. Ownership transfers when it is handed to a reactor for
/// registration: the registering thread must not touch it again until it is
/// handed back through an event or a failure.
///
/// The socket is closed when the session is dropped; whether and when that
/// happens is the operation strategy's decision, not the reactor's.
pub struct Session {
    id: u64,
    socket: Socket,
    peer: Option<SocketAddr>,
    outbound: VecDeque<u8>,
}

impl Session {
    /// Creates a session around a bound, listening, non-blocking TCP socket.
    pub fn listener(addr: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        Ok(Self::with_socket(socket, None))
    }

    /// Creates a session around an already-connected socket.
    ///
    /// The socket must already be non-blocking; a blocking socket would stall
    /// the reactor thread inside the operation strategies.
    pub fn connected(socket: Socket, peer: Option<SocketAddr>) -> Self {
        Self::with_socket(socket, peer)
    }

    fn with_socket(socket: Socket, peer: Option<SocketAddr>) -> Self {
        Session {
            id: NEXT_SESSION_ID.fetch_add(1, Relaxed),
            socket,
            peer,
            outbound: VecDeque::new(),
        }
    }

    /// Logical identity, used for correlation in logs and failure reports.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// The locally bound address. Mostly useful for listeners bound to an
    /// ephemeral port.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()?.as_socket().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "socket is not an inet socket")
        })
    }

    /// Appends bytes to the outbound queue consumed by the write strategy.
    pub fn queue_write(&mut self, bytes: &[u8]) {
        self.outbound.extend(bytes.iter().copied());
    }

    /// Number of outbound bytes not yet written to the socket.
    pub fn pending_out(&self) -> usize {
        self.outbound.len()
    }

    pub(crate) fn outbound(&self) -> &VecDeque<u8> {
        &self.outbound
    }

    pub(crate) fn outbound_mut(&mut self) -> &mut VecDeque<u8> {
        &mut self.outbound
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peer {
            Some(peer) => write!(f, "session #{} ({})", self.id, peer),
            None => write!(f, "session #{}", self.id),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("pending_out", &self.outbound.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Session::listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let b = Session::listener("127.0.0.1:0".parse().unwrap()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_listener_is_nonblocking() {
        let listener = Session::listener("127.0.0.1:0".parse().unwrap()).unwrap();
        match listener.socket().accept() {
            Err(e) => assert_eq!(e.kind(), io::ErrorKind::WouldBlock),
            Ok(_) => panic!("accept on an idle non-blocking listener must not succeed"),
        }
    }

    #[test]
    fn test_outbound_queue_preserves_order() {
        let mut session = Session::listener("127.0.0.1:0".parse().unwrap()).unwrap();
        session.queue_write(b"ab");
        session.queue_write(b"cd");
        assert_eq!(session.pending_out(), 4);
        let bytes: Vec<u8> = session.outbound().iter().copied().collect();
        assert_eq!(bytes, b"abcd");
    }
}
