//! The downward boundary: services the surrounding runtime provides to
//! policy code.
//!
//! Everything a policy may call back into during a mapper call flows
//! through [`RuntimeInterface`]. The methods documented as *blocking* are
//! the cooperative-preemption boundary: the call handle brackets them with
//! pause/resume so the dispatcher's discipline can run other calls while
//! this one waits. Implementations live in the surrounding runtime; this
//! crate only defines the contract.

use crate::constraint::LayoutConstraintSet;
use crate::types::{EventId, InstanceId, MemoryId, OperationId, ProcessorId};

/// Why a paused call was resumed. Recorded for profiling and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeReason {
    /// The dispatcher scheduled the context again after a pause.
    Scheduled,
    /// A policy lock request was granted.
    LockGranted,
    /// An event the call waited on triggered.
    EventTriggered,
    /// An instance search or creation completed.
    InstanceReady,
    /// A semantic-information fetch completed.
    SemanticReady,
    /// An index-space computation completed.
    SpaceReady,
}

impl ResumeReason {
    /// Stable lowercase name for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::LockGranted => "lock_granted",
            Self::EventTriggered => "event_triggered",
            Self::InstanceReady => "instance_ready",
            Self::SemanticReady => "semantic_ready",
            Self::SpaceReady => "space_ready",
        }
    }
}

/// Services the surrounding runtime exposes to policy calls.
///
/// One implementation is shared by every dispatcher on a node. Methods take
/// `&self` because calls arrive concurrently from many dispatcher threads.
pub trait RuntimeInterface: Send + Sync {
    /// Looks for an existing instance in `memory` satisfying `constraints`.
    ///
    /// Non-blocking; returns `None` when nothing matches.
    fn find_instance(
        &self,
        memory: MemoryId,
        constraints: &LayoutConstraintSet,
    ) -> Option<InstanceId>;

    /// Finds or allocates an instance in `memory` satisfying `constraints`.
    ///
    /// **Blocking**: allocation may wait on the memory manager. Returns
    /// `None` when the memory cannot hold such an instance.
    fn find_or_create_instance(
        &self,
        memory: MemoryId,
        constraints: &LayoutConstraintSet,
    ) -> Option<InstanceId>;

    /// Adds one reference to `instance`, protecting it from reclamation.
    ///
    /// Returns false if the instance no longer exists.
    fn acquire_instance(&self, instance: InstanceId) -> bool;

    /// Drops `count` references from `instance`.
    fn release_instance(&self, instance: InstanceId, count: u32);

    /// Mints a fresh policy event.
    fn create_event(&self) -> EventId;

    /// Triggers a policy event, waking every waiter.
    fn trigger_event(&self, event: EventId);

    /// Returns true if the event has triggered.
    fn has_triggered(&self, event: EventId) -> bool;

    /// Waits until the event triggers.
    ///
    /// **Blocking**. An event nothing ever triggers deadlocks the waiting
    /// call; that is a documented hazard of the policy, not a defended
    /// condition.
    fn wait_event(&self, event: EventId);

    /// Number of points in the operation's index space.
    ///
    /// Non-blocking; the volume is known locally.
    fn index_space_volume(&self, operation: OperationId) -> u64;

    /// Splits the operation's index space into at most `pieces` dense
    /// runs, returned as `(offset, extent)` pairs.
    ///
    /// **Blocking**: sparse spaces may require materializing remote data.
    fn partition_index_space(&self, operation: OperationId, pieces: u32) -> Vec<(u64, u64)>;

    /// Retrieves semantic information attached to an operation.
    ///
    /// **Blocking**: the information may live on another node.
    fn semantic_info(&self, operation: OperationId, tag: u32) -> Option<Vec<u8>>;

    /// Sends a message to the policy instance owning `to`.
    fn send_message(&self, from: ProcessorId, to: ProcessorId, payload: &[u8]);

    /// Broadcasts a message to every peer policy instance.
    fn broadcast(&self, from: ProcessorId, payload: &[u8]);
}
