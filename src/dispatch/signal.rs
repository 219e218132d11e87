//! Wakeup signal a blocked call waits on.

use std::sync::{Condvar, Mutex};

/// A one-waiter wakeup signal.
///
/// Each call context owns one. The thread running the call is the only
/// waiter; whichever thread admits the context next triggers it. The signal
/// is reusable: every `wait` consumes exactly one `trigger`, so a context
/// can block once for admission and again for every pause/resume cycle.
#[derive(Debug, Default)]
pub struct ResumeSignal {
    pending: Mutex<u32>,
    cv: Condvar,
}

impl ResumeSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    /// Blocks the calling thread until the signal is triggered, consuming
    /// the trigger.
    pub fn wait(&self) {
        let mut pending = self.pending.lock().expect("resume signal poisoned");
        while *pending == 0 {
            pending = self.cv.wait(pending).expect("resume signal poisoned");
        }
        *pending -= 1;
    }

    /// Wakes the waiter. A trigger before the wait is stored, not lost.
    pub fn trigger(&self) {
        let mut pending = self.pending.lock().expect("resume signal poisoned");
        *pending += 1;
        drop(pending);
        self.cv.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn trigger_before_wait_is_stored() {
        let signal = ResumeSignal::new();
        signal.trigger();
        signal.wait();
    }

    #[test]
    fn wakes_a_blocked_waiter() {
        let signal = Arc::new(ResumeSignal::new());
        let waiter = Arc::clone(&signal);
        let handle = thread::spawn(move || waiter.wait());
        signal.trigger();
        handle.join().expect("waiter thread panicked");
    }

    #[test]
    fn reusable_across_cycles() {
        let signal = ResumeSignal::new();
        for _ in 0..3 {
            signal.trigger();
            signal.wait();
        }
    }
}
