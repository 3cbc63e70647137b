//! Reactor configuration: diagnostic naming and the shutdown wait bound.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Relaxed;
use std::time::Duration;

use crate::reactor::op::OpKind;

const DEFAULT_DISPOSAL_WAIT: Duration = Duration::from_secs(5);

/// Shared configuration for the reactors of one framework instance.
///
/// The counter only feeds diagnostic thread names; it increments every time
/// a reactor thread is spawned under this configuration.
pub struct Config {
    name: String,
    disposal_wait: Duration,
    counter: AtomicUsize,
}

impl Config {
    pub fn new(name: impl Into<String>) -> Self {
        Config {
            name: name.into(),
            disposal_wait: DEFAULT_DISPOSAL_WAIT,
            counter: AtomicUsize::new(0),
        }
    }

    /// Bounds how long [`Reactor::stop`](crate::Reactor::stop) waits for the
    /// reactor thread to confirm termination.
    pub fn with_disposal_wait(mut self, wait: Duration) -> Self {
        self.disposal_wait = wait;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disposal_wait(&self) -> Duration {
        self.disposal_wait
    }

    pub(crate) fn thread_name(&self, kind: OpKind) -> String {
        let n = self.counter.fetch_add(1, Relaxed);
        format!("{} {}-{}", kind, self.name, n)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new("spindle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_name_format_and_counter() {
        let cfg = Config::new("srv");
        assert_eq!(cfg.thread_name(OpKind::Read), "read srv-0");
        assert_eq!(cfg.thread_name(OpKind::Write), "write srv-1");
        assert_eq!(cfg.thread_name(OpKind::Accept), "accept srv-2");
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.name(), "spindle");
        assert_eq!(cfg.disposal_wait(), Duration::from_secs(5));
    }
}
