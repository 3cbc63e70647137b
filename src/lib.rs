//! spindle is the reactor core of a non-blocking socket I/O framework.
//!
//! One [`Reactor`] per operation kind (accept, read, write) owns a selection
//! handle and a dedicated thread. Other threads hand it sessions through
//! [`Reactor::register`] or [`Reactor::on_event`]; the loop attaches them,
//! blocks until readiness and dispatches to the injected [`Op`] strategy.
//! Per-session failures are isolated and published as [`FailureEvent`]s to a
//! channel of the caller's choosing.
//!
//! ```no_run
//! use std::sync::Arc;
//! use crossbeam::channel::unbounded;
//! use spindle::{Acceptor, Config, Reactor, Reader, Session};
//!
//! # fn main() -> std::io::Result<()> {
//! let cfg = Arc::new(Config::new("echo"));
//! let (failed_tx, failed_rx) = unbounded();
//! let (accepted_tx, accepted_rx) = unbounded();
//! let (received_tx, received_rx) = unbounded();
//!
//! let mut acceptor = Reactor::new(Acceptor::new(accepted_tx), cfg.clone(), failed_tx.clone())?;
//! let mut reader = Reactor::new(Reader::new(received_tx), cfg, failed_tx)?;
//! acceptor.start()?;
//! reader.start()?;
//!
//! acceptor.register(Session::listener("127.0.0.1:8081".parse().unwrap())?);
//! for event in accepted_rx {
//!     reader.on_event(event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cfg;
pub mod event;
pub mod io;
pub mod reactor;
pub mod session;
pub mod utils;

pub use cfg::Config;
pub use event::{Event, FailureEvent};
pub use reactor::op::{Disposition, Op, OpKind};
pub use reactor::ops::{Acceptor, Reader, Writer};
pub use reactor::Reactor;
pub use session::Session;
