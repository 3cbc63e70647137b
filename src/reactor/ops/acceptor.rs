//! Accept-kind strategy.

use std::io;

use crossbeam::channel::Sender;
use socket2::Socket;
use tracing::{debug, warn};

use crate::event::Event;
use crate::io::{Interest, Poller, Token};
use crate::reactor::op::{Disposition, Op, OpKind};
use crate::session::Session;

/// Accepts pending connections from listening sessions and publishes each new
/// session as an [`Event`], typically wired to a read reactor's
/// [`on_event`](crate::Reactor::on_event).
pub struct Acceptor {
    accepted: Sender<Event>,
}

impl Acceptor {
    pub fn new(accepted: Sender<Event>) -> Self {
        Acceptor { accepted }
    }
}

fn setup_connection(socket: &Socket) -> io::Result<()> {
    socket.set_nonblocking(true)?;
    socket.set_nodelay(true)?;
    Ok(())
}

impl Op for Acceptor {
    fn kind(&self) -> OpKind {
        OpKind::Accept
    }

    fn attach(&mut self, poller: &Poller, token: Token, session: &mut Session) -> io::Result<()> {
        poller.add(token, session.socket(), Interest::Readable)
    }

    fn on_ready(&mut self, session: &mut Session) -> io::Result<Disposition> {
        loop {
            match session.socket().accept() {
                Ok((socket, addr)) => {
                    // A connection that cannot be set up is dropped without
                    // taking the listener down with it.
                    if let Err(e) = setup_connection(&socket) {
                        warn!("failed to set up connection accepted by {}: {}", session, e);
                        continue;
                    }

                    let accepted = Session::connected(socket, addr.as_socket());
                    debug!("{} accepted by {}", accepted, session);

                    if self.accepted.send(Event::new(accepted)).is_err() {
                        warn!("accepted-session channel is disconnected, dropping connection");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // The peer gave up between readiness and accept.
                Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Disposition::Keep)
    }
}
