//! The cross-thread registration queue with wakeup coalescing.

use std::mem;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::sync::Mutex;

/// An append-only buffer shared between arbitrary producers and one consumer,
/// paired with a coalescing flag that limits a burst of pushes to a single
/// wakeup of the consumer.
///
/// While the flag is `true`, a wakeup has already been requested and not yet
/// consumed, so further pushes stay silent. [`drain`](Self::drain) resets the
/// flag inside the same critical section that swaps the buffer, so a push
/// arriving right after the swap re-arms a wakeup.
pub(crate) struct RegistrationQueue<T> {
    to_add: Mutex<Vec<T>>,
    waking: AtomicBool,
}

impl<T> RegistrationQueue<T> {
    pub(crate) fn new() -> Self {
        RegistrationQueue {
            to_add: Mutex::new(Vec::new()),
            waking: AtomicBool::new(false),
        }
    }

    /// Appends `item` and returns whether the caller won the wakeup transition
    /// and is therefore responsible for issuing the single wakeup request for
    /// this burst.
    pub(crate) fn push(&self, item: T) -> bool {
        self.to_add.lock().unwrap().push(item);

        self.waking
            .compare_exchange(false, true, AcqRel, Acquire)
            .is_ok()
    }

    /// Takes everything queued so far, in push order, and disarms the wakeup
    /// flag.
    pub(crate) fn drain(&self) -> Vec<T> {
        let mut to_add = self.to_add.lock().unwrap();
        let drained = mem::take(&mut *to_add);
        self.waking.store(false, Release);

        drained
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    #[test]
    fn test_first_push_wins_the_wakeup() {
        let queue = RegistrationQueue::new();
        assert!(queue.push(1));
        assert!(!queue.push(2));
        assert!(!queue.push(3));
        assert_eq!(queue.drain(), vec![1, 2, 3]);
    }

    #[test]
    fn test_drain_rearms_the_wakeup() {
        let queue = RegistrationQueue::new();
        assert!(queue.push(1));
        assert_eq!(queue.drain(), vec![1]);
        assert!(queue.push(2));
        assert_eq!(queue.drain(), vec![2]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_concurrent_burst_requests_one_wakeup() {
        const THREADS: usize = 16;

        let queue = Arc::new(RegistrationQueue::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let queue = queue.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    queue.push(i) as usize
                })
            })
            .collect();

        let wakeups: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(wakeups, 1);
        assert_eq!(queue.drain().len(), THREADS);
    }

    #[test]
    fn test_per_producer_order_is_preserved() {
        let queue = Arc::new(RegistrationQueue::new());

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    queue.push(i);
                }
            })
        };
        producer.join().unwrap();

        let drained = queue.drain();
        assert_eq!(drained, (0..100).collect::<Vec<_>>());
    }
}
