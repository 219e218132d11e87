//! Call dispatch: admission, preemption, and finalization of policy calls.
//!
//! One [`Dispatcher`] exists per {policy instance, processor} pair. Every
//! policy invocation flows through an `invoke_*` entry point, which builds a
//! [`CallContext`], admits it under the policy's discipline, runs the policy
//! method, and finalizes bookkeeping. Suspension happens only at the
//! explicit pause/resume checkpoints bracketing blocking runtime services;
//! there is no involuntary preemption and no cancellation.

pub mod concurrent;
pub mod context;
pub mod dispatcher;
pub mod serializing;
pub mod signal;

pub use concurrent::ConcurrentDiscipline;
pub use context::CallContext;
pub use dispatcher::{CallHandle, Dispatcher, DispatcherStats};
pub use serializing::SerializingDiscipline;
pub use signal::ResumeSignal;

use crate::runtime::ResumeReason;
use std::sync::Arc;

/// Admission control contract a dispatch discipline implements.
///
/// `begin` and the blocking half of `lock` may suspend the calling thread on
/// the context's resume signal; everything else returns promptly. Misuse
/// (pausing a context that is not executing, unlocking without holding,
/// reentrance control on the wrong discipline) is a programmer defect:
/// asserted in debug builds, unspecified in release builds.
pub(crate) trait Discipline: Send + Sync + std::fmt::Debug {
    /// Admits a context, blocking until it may execute.
    fn begin(&self, ctx: &Arc<CallContext>, prioritize: bool);

    /// Suspends the executing context at a blocking checkpoint.
    fn pause(&self, ctx: &Arc<CallContext>);

    /// Reschedules a paused context, blocking until it executes again.
    fn resume(&self, ctx: &Arc<CallContext>, reason: ResumeReason);

    /// Retires a finished context and admits the next waiter.
    fn finish(&self, ctx: &Arc<CallContext>);

    /// Acquires the policy lock (concurrent discipline only).
    fn lock(&self, ctx: &Arc<CallContext>, read_only: bool);

    /// Releases the policy lock (concurrent discipline only).
    fn unlock(&self, ctx: &Arc<CallContext>);

    /// Grants or withdraws reentrance permission (serializing only).
    fn set_reentrant(&self, ctx: &Arc<CallContext>, permit: bool);
}
