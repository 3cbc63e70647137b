//! Read-kind strategy.

use std::io;
use std::io::Read;

use crossbeam::channel::Sender;
use tracing::{debug, trace, warn};

use crate::io::{Interest, Poller, Token};
use crate::reactor::op::{Disposition, Op, OpKind};
use crate::session::Session;
use crate::utils::hex;

pub(crate) const READ_BUF_LEN: usize = 64 * 1024;

/// Reads whatever is available from ready sessions and forwards it as
/// `(session id, bytes)` pairs. A zero-byte read retires the session, which
/// closes the socket.
pub struct Reader {
    received: Sender<(u64, Vec<u8>)>,
    buf: Vec<u8>,
}

impl Reader {
    pub fn new(received: Sender<(u64, Vec<u8>)>) -> Self {
        Reader {
            received,
            buf: vec![0; READ_BUF_LEN],
        }
    }

    fn deliver(&self, session: &Session, bytes: Vec<u8>) {
        if self.received.send((session.id(), bytes)).is_err() {
            warn!("received-data channel is disconnected, dropping payload of {}", session);
        }
    }
}

impl Op for Reader {
    fn kind(&self) -> OpKind {
        OpKind::Read
    }

    fn attach(&mut self, poller: &Poller, token: Token, session: &mut Session) -> io::Result<()> {
        poller.add(token, session.socket(), Interest::Readable)
    }

    fn on_ready(&mut self, session: &mut Session) -> io::Result<Disposition> {
        let mut collected: Vec<u8> = Vec::new();

        loop {
            let mut socket = session.socket();
            match socket.read(&mut self.buf) {
                Ok(0) => {
                    debug!("{} reached end of stream", session);
                    if !collected.is_empty() {
                        self.deliver(session, collected);
                    }
                    return Ok(Disposition::Retire);
                }
                Ok(n) => {
                    trace!("{} read {} bytes: {}", session, n, hex::dump(&self.buf[..n]));
                    collected.extend_from_slice(&self.buf[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if !collected.is_empty() {
            self.deliver(session, collected);
        }

        Ok(Disposition::Keep)
    }
}
