//! Write-kind strategy.

use std::io;
use std::io::Write;

use crossbeam::channel::Sender;
use tracing::{debug, trace, warn};

use crate::event::Event;
use crate::io::{Interest, Poller, Token};
use crate::reactor::op::{Disposition, Op, OpKind};
use crate::session::Session;

/// Writes a session's queued outbound bytes whenever the socket is writable.
///
/// A session with a drained queue is retired; with a drained-session channel
/// configured, retirement hands the session back instead of closing it, so an
/// upstream component can re-queue bytes or move it to a read reactor.
pub struct Writer {
    drained: Option<Sender<Event>>,
}

impl Writer {
    pub fn new() -> Self {
        Writer { drained: None }
    }

    pub fn with_drained(drained: Sender<Event>) -> Self {
        Writer {
            drained: Some(drained),
        }
    }
}

impl Default for Writer {
    fn default() -> Self {
        Writer::new()
    }
}

impl Op for Writer {
    fn kind(&self) -> OpKind {
        OpKind::Write
    }

    fn attach(&mut self, poller: &Poller, token: Token, session: &mut Session) -> io::Result<()> {
        poller.add(token, session.socket(), Interest::Writable)
    }

    fn on_ready(&mut self, session: &mut Session) -> io::Result<Disposition> {
        while session.pending_out() > 0 {
            let res = {
                let mut socket = session.socket();
                let (front, _) = session.outbound().as_slices();
                socket.write(front)
            };

            match res {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    trace!("{} wrote {} bytes, {} pending", session, n, session.pending_out() - n);
                    session.outbound_mut().drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Disposition::Keep),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        debug!("{} outbound queue drained", session);
        Ok(Disposition::Retire)
    }

    fn detached(&mut self, session: Session) {
        if let Some(drained) = &self.drained {
            if drained.send(Event::new(session)).is_err() {
                warn!("drained-session channel is disconnected, closing session");
            }
        }
    }
}
