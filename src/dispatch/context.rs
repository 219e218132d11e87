//! Per-invocation call contexts.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::dispatch::signal::ResumeSignal;
use crate::types::{CallKind, InstanceId, OperationId};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Bookkeeping record for one policy-method invocation.
///
/// Created by the dispatcher when an `invoke_*` entry point is called and
/// destroyed after the finalize step commits outputs and drains the ledger.
/// The context is shared between the thread running the call (which blocks
/// on [`resume`](Self::resume)) and whichever thread admits it next, so the
/// mutable pieces sit behind a lock.
#[derive(Debug)]
pub struct CallContext {
    kind: CallKind,
    operation: Option<OperationId>,
    sequence: u64,
    resume: ResumeSignal,
    inner: Mutex<ContextInner>,
}

#[derive(Debug, Default)]
struct ContextInner {
    /// Reference count per acquired instance.
    ledger: HashMap<InstanceId, u32>,
    /// Set while this context has reentrance disabled.
    reentrant_disabled: bool,
    /// Set while this context holds the concurrent policy lock.
    holds_lock: bool,
    timing: CallTiming,
}

#[derive(Debug, Default)]
struct CallTiming {
    started: Option<Instant>,
    paused_at: Option<Instant>,
    total_paused: Duration,
    pause_count: u32,
}

impl CallContext {
    /// Creates a context tagged with the call kind and owning operation.
    #[must_use]
    pub fn new(kind: CallKind, operation: Option<OperationId>) -> Self {
        Self {
            kind,
            operation,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            resume: ResumeSignal::new(),
            inner: Mutex::new(ContextInner::default()),
        }
    }

    /// The call kind this context was created for.
    #[must_use]
    pub const fn kind(&self) -> CallKind {
        self.kind
    }

    /// The operation the call is deciding for, if any.
    #[must_use]
    pub const fn operation(&self) -> Option<OperationId> {
        self.operation
    }

    /// Monotonic arrival sequence, used for FIFO arbitration and logging.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The signal the owning thread blocks on while not executing.
    #[must_use]
    pub const fn resume(&self) -> &ResumeSignal {
        &self.resume
    }

    // --- timing ---

    pub(crate) fn mark_started(&self) {
        self.inner.lock().timing.started = Some(Instant::now());
    }

    pub(crate) fn mark_paused(&self) {
        let mut inner = self.inner.lock();
        inner.timing.paused_at = Some(Instant::now());
        inner.timing.pause_count += 1;
    }

    pub(crate) fn mark_resumed(&self) {
        let mut inner = self.inner.lock();
        if let Some(paused_at) = inner.timing.paused_at.take() {
            inner.timing.total_paused += paused_at.elapsed();
        }
    }

    /// Total time this call has spent paused at blocking checkpoints.
    #[must_use]
    pub fn paused_duration(&self) -> Duration {
        self.inner.lock().timing.total_paused
    }

    /// How many times this call has paused.
    #[must_use]
    pub fn pause_count(&self) -> u32 {
        self.inner.lock().timing.pause_count
    }

    /// Wall time since the call began executing, if it has.
    #[must_use]
    pub fn running_duration(&self) -> Option<Duration> {
        self.inner.lock().timing.started.map(|s| s.elapsed())
    }

    // --- reentrance / lock flags ---

    pub(crate) fn set_reentrant_disabled(&self, disabled: bool) {
        self.inner.lock().reentrant_disabled = disabled;
    }

    /// Whether this context has disabled reentrance for its pauses.
    #[must_use]
    pub fn reentrant_disabled(&self) -> bool {
        self.inner.lock().reentrant_disabled
    }

    pub(crate) fn set_holds_lock(&self, holds: bool) {
        self.inner.lock().holds_lock = holds;
    }

    pub(crate) fn holds_lock(&self) -> bool {
        self.inner.lock().holds_lock
    }

    // --- acquired-instance ledger ---

    /// Records one acquired reference to `instance`.
    pub(crate) fn ledger_acquire(&self, instance: InstanceId) {
        *self.inner.lock().ledger.entry(instance).or_insert(0) += 1;
    }

    /// Drops one recorded reference. Returns false when the instance was
    /// not in the ledger, which is a policy defect the caller asserts on.
    pub(crate) fn ledger_release(&self, instance: InstanceId) -> bool {
        let mut inner = self.inner.lock();
        match inner.ledger.get_mut(&instance) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                inner.ledger.remove(&instance);
                true
            }
            None => false,
        }
    }

    /// Removes an instance from the ledger without releasing it, because
    /// the call's output keeps it referenced.
    pub(crate) fn ledger_commit(&self, instance: InstanceId) -> u32 {
        self.inner.lock().ledger.remove(&instance).unwrap_or(0)
    }

    /// Drains every remaining ledger entry for implicit release at finish.
    pub(crate) fn ledger_drain(&self) -> Vec<(InstanceId, u32)> {
        self.inner.lock().ledger.drain().collect()
    }

    /// Current reference count this call holds on `instance`.
    #[must_use]
    pub fn ledger_count(&self, instance: InstanceId) -> u32 {
        self.inner
            .lock()
            .ledger
            .get(&instance)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CallContext {
        CallContext::new(CallKind::MapTask, Some(OperationId::from_raw(1)))
    }

    #[test]
    fn sequences_are_unique() {
        let a = ctx();
        let b = ctx();
        assert_ne!(a.sequence(), b.sequence());
    }

    #[test]
    fn ledger_counts_references() {
        let c = ctx();
        let inst = InstanceId::from_raw(7);
        c.ledger_acquire(inst);
        c.ledger_acquire(inst);
        assert_eq!(c.ledger_count(inst), 2);
        assert!(c.ledger_release(inst));
        assert_eq!(c.ledger_count(inst), 1);
        assert!(c.ledger_release(inst));
        assert!(!c.ledger_release(inst));
    }

    #[test]
    fn commit_removes_without_release() {
        let c = ctx();
        let kept = InstanceId::from_raw(1);
        let dropped = InstanceId::from_raw(2);
        c.ledger_acquire(kept);
        c.ledger_acquire(dropped);
        c.ledger_acquire(dropped);

        assert_eq!(c.ledger_commit(kept), 1);
        let drained = c.ledger_drain();
        assert_eq!(drained, vec![(dropped, 2)]);
    }

    #[test]
    fn pause_accounting() {
        let c = ctx();
        c.mark_started();
        c.mark_paused();
        c.mark_resumed();
        c.mark_paused();
        c.mark_resumed();
        assert_eq!(c.pause_count(), 2);
        assert!(c.running_duration().is_some());
    }
}
