//! The serializing dispatch discipline.
//!
//! At most one call executes at any instant. Admission moves through three
//! states: Idle (no executing context), Executing (exactly one), and Paused
//! (the executing context suspended at a blocking checkpoint).
//!
//! # Queueing
//!
//! | Queue   | Holds                                   | Priority |
//! |---------|-----------------------------------------|----------|
//! | ready   | contexts that already paused once       | first    |
//! | pending | contexts that have not started          | second   |
//!
//! Ready contexts are serviced ahead of pending ones: they already paid a
//! preemption/restart cost, and bounding their latency bounds the worst
//! case for partially-progressed work. Priority admissions jump to the
//! front of the pending queue, so completion order is deliberately not
//! FIFO.
//!
//! # Reentrance
//!
//! Without reentrance, a paused call reserves the dispatcher: nothing else
//! may start until it resumes. With reentrance enabled (and currently
//! permitted), pausing admits the next queued context so a different call
//! can make progress meanwhile; each admitted call may itself pause and
//! admit another. An executing call can withdraw the permission around a
//! critical section with `set_reentrant`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::dispatch::context::CallContext;
use crate::dispatch::Discipline;
use crate::runtime::ResumeReason;
use crate::tracing_compat::trace;

#[derive(Debug, Default)]
struct SerInner {
    executing: Option<Arc<CallContext>>,
    pending: VecDeque<Arc<CallContext>>,
    ready: VecDeque<Arc<CallContext>>,
    paused: usize,
    reentrant_enabled: bool,
    permit_reentrant: bool,
}

impl SerInner {
    fn admit_next(&mut self) {
        if let Some(next) = self.ready.pop_front().or_else(|| self.pending.pop_front()) {
            next.resume().trigger();
            self.executing = Some(next);
        }
    }
}

/// Serializing discipline state. One per dispatcher.
#[derive(Debug)]
pub struct SerializingDiscipline {
    inner: Mutex<SerInner>,
}

impl SerializingDiscipline {
    /// Creates the discipline; `reentrant` fixes whether paused calls may
    /// yield the dispatcher to other calls.
    #[must_use]
    pub fn new(reentrant: bool) -> Self {
        Self {
            inner: Mutex::new(SerInner {
                reentrant_enabled: reentrant,
                permit_reentrant: reentrant,
                ..SerInner::default()
            }),
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, SerInner> {
        self.inner.lock().expect("serializing state poisoned")
    }

    #[cfg(test)]
    fn debug_state(&self) -> (Option<u64>, usize, usize, usize) {
        let inner = self.lock_inner();
        (
            inner.executing.as_ref().map(|c| c.sequence()),
            inner.ready.len(),
            inner.pending.len(),
            inner.paused,
        )
    }
}

impl Discipline for SerializingDiscipline {
    fn begin(&self, ctx: &Arc<CallContext>, prioritize: bool) {
        let mut inner = self.lock_inner();
        let idle = inner.executing.is_none()
            && (inner.paused == 0 || (inner.reentrant_enabled && inner.permit_reentrant));
        if idle && inner.ready.is_empty() && inner.pending.is_empty() {
            inner.executing = Some(Arc::clone(ctx));
            drop(inner);
            ctx.mark_started();
            return;
        }
        if prioritize {
            inner.pending.push_front(Arc::clone(ctx));
        } else {
            inner.pending.push_back(Arc::clone(ctx));
        }
        trace!(
            call = %ctx.kind(),
            seq = ctx.sequence(),
            prioritize,
            "call queued behind executing context"
        );
        drop(inner);
        ctx.resume().wait();
        ctx.mark_started();
    }

    fn pause(&self, ctx: &Arc<CallContext>) {
        let mut inner = self.lock_inner();
        debug_assert!(
            inner
                .executing
                .as_ref()
                .is_some_and(|c| Arc::ptr_eq(c, ctx)),
            "pause from a context that is not executing"
        );
        inner.executing = None;
        inner.paused += 1;
        ctx.mark_paused();
        if inner.reentrant_enabled && inner.permit_reentrant {
            inner.admit_next();
        }
        // Otherwise the dispatcher stays reserved for ctx until it resumes.
    }

    fn resume(&self, ctx: &Arc<CallContext>, reason: ResumeReason) {
        let mut inner = self.lock_inner();
        inner.paused -= 1;
        trace!(
            call = %ctx.kind(),
            seq = ctx.sequence(),
            reason = reason.name(),
            "call resuming"
        );
        if inner.executing.is_none() {
            inner.executing = Some(Arc::clone(ctx));
            drop(inner);
            ctx.mark_resumed();
            return;
        }
        // Ready contexts outrank pending ones at the next admission.
        inner.ready.push_back(Arc::clone(ctx));
        drop(inner);
        ctx.resume().wait();
        ctx.mark_resumed();
    }

    fn finish(&self, ctx: &Arc<CallContext>) {
        let mut inner = self.lock_inner();
        debug_assert!(
            inner
                .executing
                .as_ref()
                .is_some_and(|c| Arc::ptr_eq(c, ctx)),
            "finish from a context that is not executing"
        );
        inner.executing = None;
        inner.admit_next();
    }

    fn lock(&self, _ctx: &Arc<CallContext>, _read_only: bool) {
        debug_assert!(
            false,
            "policy locking requires the concurrent discipline; \
             serialized policies are already exclusive"
        );
    }

    fn unlock(&self, _ctx: &Arc<CallContext>) {
        debug_assert!(false, "unlock without the concurrent discipline");
    }

    fn set_reentrant(&self, ctx: &Arc<CallContext>, permit: bool) {
        let mut inner = self.lock_inner();
        debug_assert!(
            inner.reentrant_enabled,
            "reentrance control on a non-reentrant dispatcher"
        );
        debug_assert!(
            inner
                .executing
                .as_ref()
                .is_some_and(|c| Arc::ptr_eq(c, ctx)),
            "reentrance control from a context that is not executing"
        );
        inner.permit_reentrant = permit;
        ctx.set_reentrant_disabled(!permit);
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

    fn ctx(kind: CallKind) -> Arc<CallContext> {
        Arc::new(CallContext::new(kind, None))
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
    fn idle_begin_starts_immediately() {
        init_test_logging();
        crate::test_phase!("idle_begin_starts_immediately");
        let disc = SerializingDiscipline::new(false);
        let c = ctx(CallKind::MapTask);
        disc.begin(&c, false);
        let (executing, ready, pending, paused) = disc.debug_state();
        crate::assert_with_log!(
            executing == Some(c.sequence()),
            "context executing",
            Some(c.sequence()),
            executing
        );
        assert_eq!((ready, pending, paused), (0, 0, 0));
        disc.finish(&c);
        assert_eq!(disc.debug_state().0, None);
        crate::test_complete!("idle_begin_starts_immediately");
    }

    #[test]
    fn prioritized_call_jumps_the_pending_queue() {
        init_test_logging();
        let disc = StdArc::new(SerializingDiscipline::new(false));
        let order = StdArc::new(Mutex::new(Vec::new()));

        let c = ctx(CallKind::MapTask);
        disc.begin(&c, false);

        let spawn_call = |kind: CallKind, label: &'static str, prioritize: bool| {
            let disc = StdArc::clone(&disc);
            let order = StdArc::clone(&order);
            thread::spawn(move || {
                let call = ctx(kind);
                disc.begin(&call, prioritize);
                order.lock().unwrap().push(label);
                disc.finish(&call);
            })
        };

        let a = spawn_call(CallKind::SelectTunableValue, "a", false);
        wait_until(|| disc.debug_state().2 == 1);
        let b = spawn_call(CallKind::HandleMessage, "b", true);
        wait_until(|| disc.debug_state().2 == 2);

        disc.finish(&c);
        a.join().unwrap();
        b.join().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn nonreentrant_pause_reserves_the_dispatcher() {
        init_test_logging();
        let disc = StdArc::new(SerializingDiscipline::new(false));
        let order = StdArc::new(Mutex::new(Vec::new()));

        let c = ctx(CallKind::MapTask);
        disc.begin(&c, false);
        disc.pause(&c);

        let handle = {
            let disc = StdArc::clone(&disc);
            let order = StdArc::clone(&order);
            thread::spawn(move || {
                let a = ctx(CallKind::SliceTask);
                disc.begin(&a, false);
                order.lock().unwrap().push("a");
                disc.finish(&a);
            })
        };
        wait_until(|| disc.debug_state().2 == 1);
        // Reserved: the queued call must not have started.
        assert_eq!(disc.debug_state().0, None);
        assert!(order.lock().unwrap().is_empty());

        disc.resume(&c, ResumeReason::Scheduled);
        order.lock().unwrap().push("c");
        disc.finish(&c);
        handle.join().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["c", "a"]);
    }

    #[test]
    fn reentrant_pause_admits_ready_before_pending() {
        init_test_logging();
        let disc = StdArc::new(SerializingDiscipline::new(true));
        let order = StdArc::new(Mutex::new(Vec::new()));

        // C executes, then pauses with nothing queued.
        let c = ctx(CallKind::MapTask);
        disc.begin(&c, false);
        disc.pause(&c);

        // D starts immediately under reentrance.
        let d = ctx(CallKind::MapCopy);
        disc.begin(&d, false);
        assert_eq!(disc.debug_state().0, Some(d.sequence()));

        // C resumes while D executes: it joins the ready queue.
        let c_thread = {
            let disc = StdArc::clone(&disc);
            let order = StdArc::clone(&order);
            let c = Arc::clone(&c);
            thread::spawn(move || {
                disc.resume(&c, ResumeReason::EventTriggered);
                order.lock().unwrap().push("c_resumed");
                disc.finish(&c);
            })
        };
        wait_until(|| disc.debug_state().1 == 1);

        // E arrives fresh: pending queue.
        let e_thread = {
            let disc = StdArc::clone(&disc);
            let order = StdArc::clone(&order);
            thread::spawn(move || {
                let e = ctx(CallKind::SliceTask);
                disc.begin(&e, false);
                order.lock().unwrap().push("e_started");
                disc.finish(&e);
            })
        };
        wait_until(|| disc.debug_state().2 == 1);

        // Finishing D must service ready (C) ahead of pending (E).
        disc.finish(&d);
        c_thread.join().unwrap();
        e_thread.join().unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["c_resumed", "e_started"]);
    }

    #[test]
    fn withdrawn_reentrance_reserves_like_nonreentrant() {
        init_test_logging();
        let disc = StdArc::new(SerializingDiscipline::new(true));

        let c = ctx(CallKind::MapTask);
        disc.begin(&c, false);
        disc.set_reentrant(&c, false);
        assert!(c.reentrant_disabled());
        disc.pause(&c);

        let handle = {
            let disc = StdArc::clone(&disc);
            thread::spawn(move || {
                let a = ctx(CallKind::MapInline);
                disc.begin(&a, false);
                disc.finish(&a);
            })
        };
        wait_until(|| disc.debug_state().2 == 1);
        assert_eq!(disc.debug_state().0, None);

        disc.resume(&c, ResumeReason::Scheduled);
        disc.set_reentrant(&c, true);
        disc.finish(&c);
        handle.join().unwrap();
    }
}
