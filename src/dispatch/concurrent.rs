//! The concurrent dispatch discipline.
//!
//! Calls run fully unsynchronized; admission control is a no-op and
//! pause/resume only keep the timing books. What the discipline does own is
//! a voluntary reader/writer lock over the policy's private state, requested
//! explicitly by policy code through the call handle.
//!
//! # Arbitration
//!
//! Waiters carry arrival tickets. On unlock with no holders left, the
//! waiter with the oldest ticket wins; if it is a shared waiter, every
//! other shared waiter whose ticket is older than the oldest waiting
//! exclusive ticket is promoted with it. New shared requests join an
//! already-shared lock only while no exclusive waiter is queued. Strict
//! ticket order keeps either mode from starving the other indefinitely.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::dispatch::context::CallContext;
use crate::dispatch::Discipline;
use crate::runtime::ResumeReason;
use crate::tracing_compat::trace;

/// Current mode of the policy lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LockMode {
    #[default]
    Unlocked,
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct Waiter {
    ctx: Arc<CallContext>,
    ticket: u64,
}

#[derive(Debug, Default)]
struct ConInner {
    mode: LockMode,
    holders: Vec<Arc<CallContext>>,
    shared_waiters: VecDeque<Waiter>,
    exclusive_waiters: VecDeque<Waiter>,
    next_ticket: u64,
}

impl ConInner {
    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    /// Promotes the next waiter group once the holder set drains.
    fn promote(&mut self) {
        let oldest_shared = self.shared_waiters.front().map(|w| w.ticket);
        let oldest_exclusive = self.exclusive_waiters.front().map(|w| w.ticket);
        match (oldest_shared, oldest_exclusive) {
            (None, None) => self.mode = LockMode::Unlocked,
            (Some(shared), exclusive) if exclusive.is_none() || shared < exclusive.unwrap() => {
                // Shared batch: everything queued before the oldest
                // exclusive request goes together.
                self.mode = LockMode::Shared;
                let cutoff = exclusive.unwrap_or(u64::MAX);
                while self
                    .shared_waiters
                    .front()
                    .is_some_and(|w| w.ticket < cutoff)
                {
                    let waiter = self.shared_waiters.pop_front().expect("front checked");
                    waiter.ctx.set_holds_lock(true);
                    waiter.ctx.resume().trigger();
                    self.holders.push(waiter.ctx);
                }
            }
            _ => {
                self.mode = LockMode::Exclusive;
                let waiter = self.exclusive_waiters.pop_front().expect("front checked");
                waiter.ctx.set_holds_lock(true);
                waiter.ctx.resume().trigger();
                self.holders.push(waiter.ctx);
            }
        }
    }
}

/// Concurrent discipline state. One per dispatcher.
#[derive(Debug, Default)]
pub struct ConcurrentDiscipline {
    inner: Mutex<ConInner>,
}

impl ConcurrentDiscipline {
    /// Creates the discipline with the lock open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, ConInner> {
        self.inner.lock().expect("concurrent state poisoned")
    }

    #[cfg(test)]
    fn debug_state(&self) -> (usize, usize, usize) {
        let inner = self.lock_inner();
        (
            inner.holders.len(),
            inner.shared_waiters.len(),
            inner.exclusive_waiters.len(),
        )
    }
}

impl Discipline for ConcurrentDiscipline {
    fn begin(&self, ctx: &Arc<CallContext>, _prioritize: bool) {
        // No admission control: every call runs immediately.
        ctx.mark_started();
    }

    fn pause(&self, ctx: &Arc<CallContext>) {
        ctx.mark_paused();
    }

    fn resume(&self, ctx: &Arc<CallContext>, reason: ResumeReason) {
        trace!(
            call = %ctx.kind(),
            seq = ctx.sequence(),
            reason = reason.name(),
            "concurrent call resumed"
        );
        ctx.mark_resumed();
    }

    fn finish(&self, ctx: &Arc<CallContext>) {
        debug_assert!(
            !ctx.holds_lock(),
            "call finished while holding the policy lock"
        );
    }

    fn lock(&self, ctx: &Arc<CallContext>, read_only: bool) {
        debug_assert!(!ctx.holds_lock(), "re-lock while already holding");
        let mut inner = self.lock_inner();
        let grant_now = match inner.mode {
            LockMode::Unlocked => true,
            LockMode::Shared => read_only && inner.exclusive_waiters.is_empty(),
            LockMode::Exclusive => false,
        };
        if grant_now {
            inner.mode = if read_only {
                LockMode::Shared
            } else {
                LockMode::Exclusive
            };
            inner.holders.push(Arc::clone(ctx));
            drop(inner);
            ctx.set_holds_lock(true);
            return;
        }
        let ticket = inner.take_ticket();
        let waiter = Waiter {
            ctx: Arc::clone(ctx),
            ticket,
        };
        if read_only {
            inner.shared_waiters.push_back(waiter);
        } else {
            inner.exclusive_waiters.push_back(waiter);
        }
        drop(inner);
        ctx.resume().wait();
    }

    fn unlock(&self, ctx: &Arc<CallContext>) {
        let mut inner = self.lock_inner();
        let position = inner.holders.iter().position(|c| Arc::ptr_eq(c, ctx));
        debug_assert!(position.is_some(), "unlock without holding the policy lock");
        if let Some(position) = position {
            inner.holders.swap_remove(position);
            ctx.set_holds_lock(false);
        }
        if inner.holders.is_empty() {
            inner.promote();
        }
    }

    fn set_reentrant(&self, _ctx: &Arc<CallContext>, _permit: bool) {
        debug_assert!(
            false,
            "reentrance control is meaningless without the serializing discipline"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::types::CallKind;
    use std::sync::Arc as StdArc;
    use std::thread;
    use std::time::Duration;

    fn ctx() -> Arc<CallContext> {
        Arc::new(CallContext::new(CallKind::MapTask, None))
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..2000 {
            if cond() {
                return;
            }
            thread::yield_now();
            thread::sleep(Duration::from_millis(1));
        }
        unreachable!("condition not reached within timeout");
    }

    #[test]
    fn two_readers_share_without_blocking() {
        init_test_logging();
        crate::test_phase!("two_readers_share_without_blocking");
        let disc = ConcurrentDiscipline::new();
        let a = ctx();
        let b = ctx();
        disc.lock(&a, true);
        disc.lock(&b, true);
        let holders = disc.debug_state().0;
        crate::assert_with_log!(holders == 2, "both readers hold", 2usize, holders);
        disc.unlock(&a);
        disc.unlock(&b);
        assert_eq!(disc.debug_state(), (0, 0, 0));
        crate::test_complete!("two_readers_share_without_blocking");
    }

    #[test]
    fn writer_waits_for_both_readers() {
        init_test_logging();
        let disc = StdArc::new(ConcurrentDiscipline::new());
        let a = ctx();
        let b = ctx();
        disc.lock(&a, true);
        disc.lock(&b, true);

        let got_lock = StdArc::new(Mutex::new(false));
        let writer = {
            let disc = StdArc::clone(&disc);
            let got_lock = StdArc::clone(&got_lock);
            thread::spawn(move || {
                let w = ctx();
                disc.lock(&w, false);
                *got_lock.lock().unwrap() = true;
                disc.unlock(&w);
            })
        };
        wait_until(|| disc.debug_state().2 == 1);
        assert!(!*got_lock.lock().unwrap());

        disc.unlock(&a);
        // One reader still holds: the writer keeps waiting.
        assert!(!*got_lock.lock().unwrap());
        disc.unlock(&b);
        writer.join().unwrap();
        assert!(*got_lock.lock().unwrap());
    }

    #[test]
    fn queued_writer_blocks_new_readers() {
        init_test_logging();
        let disc = StdArc::new(ConcurrentDiscipline::new());
        let reader = ctx();
        disc.lock(&reader, true);

        let writer = {
            let disc = StdArc::clone(&disc);
            thread::spawn(move || {
                let w = ctx();
                disc.lock(&w, false);
                disc.unlock(&w);
            })
        };
        wait_until(|| disc.debug_state().2 == 1);

        // A new shared request must queue behind the waiting writer.
        let late_reader = {
            let disc = StdArc::clone(&disc);
            thread::spawn(move || {
                let r = ctx();
                disc.lock(&r, true);
                disc.unlock(&r);
            })
        };
        wait_until(|| disc.debug_state().1 == 1);

        disc.unlock(&reader);
        writer.join().unwrap();
        late_reader.join().unwrap();
        assert_eq!(disc.debug_state(), (0, 0, 0));
    }

    #[test]
    fn shared_batch_ends_at_oldest_exclusive_ticket() {
        init_test_logging();
        let disc = StdArc::new(ConcurrentDiscipline::new());
        let holder = ctx();
        disc.lock(&holder, false);

        // Arrival order: reader r1, writer w, reader r2.
        let r1 = {
            let disc = StdArc::clone(&disc);
            thread::spawn(move || {
                let r = ctx();
                disc.lock(&r, true);
                disc.unlock(&r);
            })
        };
        wait_until(|| disc.debug_state().1 == 1);
        let w = {
            let disc = StdArc::clone(&disc);
            thread::spawn(move || {
                let w = ctx();
                disc.lock(&w, false);
                disc.unlock(&w);
            })
        };
        wait_until(|| disc.debug_state().2 == 1);
        let r2 = {
            let disc = StdArc::clone(&disc);
            thread::spawn(move || {
                let r = ctx();
                disc.lock(&r, true);
                disc.unlock(&r);
            })
        };
        wait_until(|| disc.debug_state().1 == 2);

        // Releasing the holder promotes r1 alone (its ticket predates w's);
        // r2 arrived after w and must wait its turn.
        disc.unlock(&holder);
        r1.join().unwrap();
        w.join().unwrap();
        r2.join().unwrap();
        assert_eq!(disc.debug_state(), (0, 0, 0));
    }

    #[test]
    fn pause_and_resume_are_bookkeeping_only() {
        init_test_logging();
        let disc = ConcurrentDiscipline::new();
        let a = ctx();
        disc.begin(&a, false);
        disc.pause(&a);
        disc.resume(&a, ResumeReason::EventTriggered);
        assert_eq!(a.pause_count(), 1);
        disc.finish(&a);
    }
}
