//! The reactor core: one selection handle, one thread, one operation kind.
//!
//! Producer threads hand sessions over through [`Reactor::register`]; the
//! reactor thread alone touches the selection handle. The hand-off is a
//! locked queue plus an atomic coalescing flag, so a burst of registrations
//! arriving while the thread is parked in its wait costs at most one wakeup.
//!
//! Per-session failures never take the loop down; they are wrapped with the
//! offending session and published to the failure sink. Only a failure of the
//! wait call itself (or of thread spawning) is fatal to a reactor.

pub mod op;
pub mod ops;
pub(crate) mod queue;

use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Release};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use slab::Slab;
use tracing::{debug, error, warn};

use crate::cfg::Config;
use crate::event::{Event, FailureEvent};
use crate::io::{Poller, Token, Waker};
use crate::session::Session;
use op::{Disposition, Op, OpKind};
use queue::RegistrationQueue;

struct Shared {
    to_add: RegistrationQueue<Session>,
    shutdown: AtomicBool,
    waker: Waker,
}

/// Drives a single operation kind's readiness loop on a dedicated thread.
///
/// Registration is available before and after [`start`](Self::start); queued
/// sessions are attached once the loop runs. Failures surface asynchronously
/// through the failure sink handed to [`new`](Self::new), never as a
/// synchronous return from [`register`](Self::register).
pub struct Reactor<O: Op> {
    kind: OpKind,
    cfg: Arc<Config>,
    shared: Arc<Shared>,
    failed: Sender<FailureEvent>,
    // Moved onto the reactor thread by start().
    inner: Option<(Poller, O)>,
    thread: Option<(JoinHandle<()>, Receiver<()>)>,
}

impl<O: Op> Reactor<O> {
    /// Creates the reactor and opens its selection handle.
    pub fn new(op: O, cfg: Arc<Config>, failed: Sender<FailureEvent>) -> io::Result<Self> {
        let poller = Poller::new()?;
        let shared = Arc::new(Shared {
            to_add: RegistrationQueue::new(),
            shutdown: AtomicBool::new(false),
            waker: poller.waker(),
        });

        Ok(Reactor {
            kind: op.kind(),
            cfg,
            shared,
            failed,
            inner: Some((poller, op)),
            thread: None,
        })
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Accepts a session for eventual attachment to this reactor's selection
    /// handle.
    ///
    /// Never blocks the caller on I/O. The session is appended to the
    /// registration queue and, iff this call won the wakeup transition, the
    /// blocked wait is interrupted once for the whole burst. Attachment
    /// happens later on the reactor thread; attach failures surface through
    /// the failure sink.
    pub fn register(&self, session: Session) {
        debug!("adding {} to {} selector queue", session, self.kind);

        if self.shared.to_add.push(session) {
            if let Err(e) = self.shared.waker.wake() {
                error!("failed to wake {} selector: {}", self.kind, e);
            }
        }
    }

    /// The single-message inbound handler: unwraps the event and registers
    /// its session. Invokable by any publisher on any thread.
    pub fn on_event(&self, event: Event) {
        self.register(event.into_session());
    }

    /// Spawns the reactor thread.
    ///
    /// Returns once spawning is requested; it does not wait for the loop to
    /// begin blocking. A spawn failure is fatal and surfaces here.
    pub fn start(&mut self) -> io::Result<()> {
        let (poller, op) = self
            .inner
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "reactor already started"))?;

        let shared = self.shared.clone();
        let failed = self.failed.clone();
        let kind = self.kind;
        let (done_tx, done_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name(self.cfg.thread_name(kind))
            .spawn(move || {
                run(kind, poller, op, shared, failed);
                drop(done_tx);
            })?;

        self.thread = Some((handle, done_rx));
        Ok(())
    }

    /// Requests termination and waits up to the configured disposal bound.
    ///
    /// Cancellation is cooperative: the flag is observed at loop-iteration
    /// boundaries, with the wakeup breaking the thread out of a blocking
    /// wait. If the bound elapses first the join is abandoned with a warning;
    /// the thread may still be winding down afterwards.
    pub fn stop(&mut self) {
        self.shared.shutdown.store(true, Release);
        if let Err(e) = self.shared.waker.wake() {
            error!("failed to wake {} selector for shutdown: {}", self.kind, e);
        }

        if let Some((handle, done)) = self.thread.take() {
            match done.recv_timeout(self.cfg.disposal_wait()) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = handle.join();
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "{} selector thread did not exit within {:?}",
                        self.kind,
                        self.cfg.disposal_wait()
                    );
                }
            }
        }
    }
}

/// Two-tier classification of wait failures, applied in the select loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum WaitFailure {
    /// A handle was invalidated concurrently with the wait; the loop
    /// continues.
    Benign,
    /// The selection handle itself is broken; the reactor terminates.
    Fatal,
}

fn classify_wait_failure(e: &io::Error) -> WaitFailure {
    if e.kind() == io::ErrorKind::Interrupted {
        WaitFailure::Benign
    } else {
        WaitFailure::Fatal
    }
}

fn run<O: Op>(
    kind: OpKind,
    mut poller: Poller,
    mut op: O,
    shared: Arc<Shared>,
    failed: Sender<FailureEvent>,
) {
    let mut sessions: Slab<Session> = Slab::new();
    let mut ready: Vec<Token> = Vec::new();

    loop {
        ready.clear();
        match poller.wait(&mut ready) {
            Ok(()) => {}
            Err(e) => match classify_wait_failure(&e) {
                WaitFailure::Benign => {
                    debug!("{} selector wait interrupted mid-select, ignoring: {}", kind, e);
                }
                WaitFailure::Fatal => {
                    error!("error while selecting for {}s: {}", kind, e);
                    break;
                }
            },
        }

        if shared.shutdown.load(Acquire) {
            debug!("{} selector interrupted...", kind);
            break;
        }

        for session in shared.to_add.drain() {
            let key = sessions.insert(session);
            if let Err(e) = op.attach(&poller, Token(key), &mut sessions[key]) {
                let session = sessions.remove(key);
                debug!("failed to attach {} to {} selector: {}", session, kind, e);
                publish_failure(&failed, kind, session, e);
            }
        }

        for &token in &ready {
            let Some(session) = sessions.get_mut(token.0) else {
                continue;
            };

            match op.on_ready(session) {
                Ok(Disposition::Keep) => {}
                Ok(Disposition::Retire) => {
                    let session = sessions.remove(token.0);
                    if let Err(e) = poller.delete(session.socket()) {
                        debug!("failed to detach {} from {} selector: {}", session, kind, e);
                    }
                    op.detached(session);
                }
                Err(e) => {
                    let session = sessions.remove(token.0);
                    let _ = poller.delete(session.socket());
                    publish_failure(&failed, kind, session, e);
                }
            }
        }
    }

    debug!("{} selector thread exiting...", kind);
}

fn publish_failure(failed: &Sender<FailureEvent>, kind: OpKind, session: Session, error: io::Error) {
    if failed.send(FailureEvent::new(session, error)).is_err() {
        warn!("failure channel of {} selector is disconnected", kind);
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::os::fd::AsRawFd;
    use std::time::Duration;

    use crossbeam::channel::unbounded;

    use super::ops::Writer;
    use super::*;
    use crate::io::Interest;

    fn cfg() -> Arc<Config> {
        Arc::new(Config::new("test").with_disposal_wait(Duration::from_secs(1)))
    }

    struct TrackingOp {
        attached: Sender<u64>,
    }

    impl Op for TrackingOp {
        fn kind(&self) -> OpKind {
            OpKind::Read
        }

        fn attach(
            &mut self,
            poller: &Poller,
            token: Token,
            session: &mut Session,
        ) -> io::Result<()> {
            poller.add(token, session.socket(), Interest::Readable)?;
            let _ = self.attached.send(session.id());
            Ok(())
        }

        fn on_ready(&mut self, _session: &mut Session) -> io::Result<Disposition> {
            Ok(Disposition::Keep)
        }
    }

    #[test]
    fn test_start_twice_is_an_error() {
        let (failed_tx, _failed_rx) = unbounded();
        let mut reactor = Reactor::new(Writer::new(), cfg(), failed_tx).unwrap();
        assert!(reactor.start().is_ok());
        assert!(reactor.start().is_err());
        reactor.stop();
    }

    #[test]
    fn test_stop_without_start_returns() {
        let (failed_tx, _failed_rx) = unbounded();
        let mut reactor = Reactor::new(Writer::new(), cfg(), failed_tx).unwrap();
        reactor.stop();
    }

    #[test]
    fn test_wait_failure_classification() {
        assert_eq!(
            classify_wait_failure(&io::Error::from(io::ErrorKind::Interrupted)),
            WaitFailure::Benign
        );
        assert_eq!(
            classify_wait_failure(&io::Error::from(io::ErrorKind::InvalidInput)),
            WaitFailure::Fatal
        );
        assert_eq!(
            classify_wait_failure(&io::Error::from(io::ErrorKind::BrokenPipe)),
            WaitFailure::Fatal
        );
    }

    #[test]
    fn test_fatal_wait_error_terminates_the_loop() {
        let (failed_tx, _failed_rx) = unbounded();
        let (attached_tx, attached_rx) = unbounded();
        let op = TrackingOp {
            attached: attached_tx,
        };
        let mut reactor = Reactor::new(op, cfg(), failed_tx).unwrap();
        let epoll_fd = reactor.inner.as_ref().unwrap().0.raw_fd();

        reactor.start().unwrap();

        // Prove the loop is up before sabotaging it.
        let s1 = Session::listener("127.0.0.1:0".parse().unwrap()).unwrap();
        reactor.register(s1);
        attached_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // Replace the selection handle with a plain file; the next wait
        // fails with a non-benign error and the loop must exit on its own,
        // without a shutdown request.
        let devnull = File::open("/dev/null").unwrap();
        nix::unistd::dup2(devnull.as_raw_fd(), epoll_fd).unwrap();
        reactor.shared.waker.wake().unwrap();

        let (handle, done) = reactor.thread.take().unwrap();
        match done.recv_timeout(Duration::from_secs(2)) {
            Err(RecvTimeoutError::Disconnected) => {}
            other => panic!("reactor thread should have exited, got {:?}", other),
        }
        handle.join().unwrap();

        // A session registered after the fatal failure is never attached.
        let s2 = Session::listener("127.0.0.1:0".parse().unwrap()).unwrap();
        reactor.register(s2);
        assert!(attached_rx.recv_timeout(Duration::from_millis(300)).is_err());
    }
}
