//! The policy interface: one capability trait, one method per call kind.
//!
//! A [`PlacementPolicy`] is application-supplied code deciding placement
//! outcomes: which processor runs a task, which instances back its regions,
//! how index launches slice, whether steals are permitted. The runtime never
//! calls these methods directly; every invocation flows through a
//! [`Dispatcher`](crate::dispatch::Dispatcher), which enforces the policy's
//! chosen concurrency discipline and passes a [`CallHandle`] granting access
//! to runtime services for the duration of the call.
//!
//! Every method except [`reduce_future_map`](PlacementPolicy::reduce_future_map)
//! must be implemented; that one alone carries a default no-op, matching the
//! one decision the runtime can always fold itself.

pub mod args;

pub use args::*;

use crate::dispatch::CallHandle;
use crate::types::{OperationId, SyncModel};

/// Application-supplied placement policy ("mapper").
///
/// Methods take `&self`: under the serializing discipline the dispatcher
/// guarantees exclusivity, while under the concurrent discipline the policy
/// guards its own state, either internally or through the dispatcher's
/// voluntary lock ([`CallHandle::lock_policy`]).
///
/// A method that fails to fill a mandated output field is defective; the
/// dispatcher asserts mandated fields in debug builds and leaves the
/// behavior unspecified in release builds.
#[allow(unused_variables)]
pub trait PlacementPolicy: Send + Sync {
    /// Human-readable policy name for logs and diagnostics.
    fn name(&self) -> &str;

    /// The concurrency discipline this policy requires. Queried once at
    /// dispatcher construction.
    fn sync_model(&self) -> SyncModel;

    // --- task pipeline ---

    /// Choose initial scheduling options for a task.
    fn select_task_options(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        output: &mut TaskOptions,
    );

    /// Pre-map regions the runtime must see before slicing.
    fn premap_task(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &PremapTaskInput,
        output: &mut PremapTaskOutput,
    );

    /// Slice an index-space launch across processors.
    fn slice_task(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &SliceTaskInput,
        output: &mut SliceTaskOutput,
    );

    /// Map a single task: variant, target processors, instances.
    fn map_task(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &MapTaskInput,
        output: &mut MapTaskOutput,
    );

    /// Pick a variant for a task already bound to a processor.
    fn select_task_variant(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &SelectVariantInput,
        output: &mut SelectVariantOutput,
    );

    /// Post-mapping hook for tasks that requested it.
    fn postmap_task(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &PostmapTaskInput,
        output: &mut PostmapTaskOutput,
    );

    /// Rank source instances for a task's copies.
    fn select_task_sources(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &SelectSourcesInput,
        output: &mut SelectSourcesOutput,
    );

    /// Receive a profiling response for a task.
    fn report_task_profiling(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &ProfilingReport,
    );

    /// Pick the sharding functor for a task in a replicated context.
    fn select_task_sharding_functor(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &ShardingFunctorInput,
        output: &mut ShardingFunctorOutput,
    );

    // --- inline mappings ---

    /// Map an inline mapping operation.
    fn map_inline(
        &self,
        ctx: &CallHandle<'_>,
        inline_op: &InlineDescription,
        input: &MapInlineInput,
        output: &mut MapInlineOutput,
    );

    /// Rank source instances for an inline mapping.
    fn select_inline_sources(
        &self,
        ctx: &CallHandle<'_>,
        inline_op: &InlineDescription,
        input: &SelectSourcesInput,
        output: &mut SelectSourcesOutput,
    );

    /// Receive a profiling response for an inline mapping.
    fn report_inline_profiling(
        &self,
        ctx: &CallHandle<'_>,
        inline_op: &InlineDescription,
        input: &ProfilingReport,
    );

    // --- copies ---

    /// Map an explicit copy operation.
    fn map_copy(
        &self,
        ctx: &CallHandle<'_>,
        copy: &CopyDescription,
        input: &MapCopyInput,
        output: &mut MapCopyOutput,
    );

    /// Rank source instances for a copy.
    fn select_copy_sources(
        &self,
        ctx: &CallHandle<'_>,
        copy: &CopyDescription,
        input: &SelectSourcesInput,
        output: &mut SelectSourcesOutput,
    );

    /// Receive a profiling response for a copy.
    fn report_copy_profiling(
        &self,
        ctx: &CallHandle<'_>,
        copy: &CopyDescription,
        input: &ProfilingReport,
    );

    /// Pick the sharding functor for a copy.
    fn select_copy_sharding_functor(
        &self,
        ctx: &CallHandle<'_>,
        copy: &CopyDescription,
        input: &ShardingFunctorInput,
        output: &mut ShardingFunctorOutput,
    );

    // --- closes ---

    /// Rank source instances for a close.
    fn select_close_sources(
        &self,
        ctx: &CallHandle<'_>,
        close: &CloseDescription,
        input: &SelectSourcesInput,
        output: &mut SelectSourcesOutput,
    );

    /// Receive a profiling response for a close.
    fn report_close_profiling(
        &self,
        ctx: &CallHandle<'_>,
        close: &CloseDescription,
        input: &ProfilingReport,
    );

    /// Pick the sharding functor for a close.
    fn select_close_sharding_functor(
        &self,
        ctx: &CallHandle<'_>,
        close: &CloseDescription,
        input: &ShardingFunctorInput,
        output: &mut ShardingFunctorOutput,
    );

    // --- acquires ---

    /// Map an acquire operation.
    fn map_acquire(
        &self,
        ctx: &CallHandle<'_>,
        acquire: &AcquireDescription,
        output: &mut MapAcquireOutput,
    );

    /// Receive a profiling response for an acquire.
    fn report_acquire_profiling(
        &self,
        ctx: &CallHandle<'_>,
        acquire: &AcquireDescription,
        input: &ProfilingReport,
    );

    /// Pick the sharding functor for an acquire.
    fn select_acquire_sharding_functor(
        &self,
        ctx: &CallHandle<'_>,
        acquire: &AcquireDescription,
        input: &ShardingFunctorInput,
        output: &mut ShardingFunctorOutput,
    );

    // --- releases ---

    /// Map a release operation.
    fn map_release(
        &self,
        ctx: &CallHandle<'_>,
        release: &ReleaseDescription,
        output: &mut MapReleaseOutput,
    );

    /// Rank source instances for a release.
    fn select_release_sources(
        &self,
        ctx: &CallHandle<'_>,
        release: &ReleaseDescription,
        input: &SelectSourcesInput,
        output: &mut SelectSourcesOutput,
    );

    /// Receive a profiling response for a release.
    fn report_release_profiling(
        &self,
        ctx: &CallHandle<'_>,
        release: &ReleaseDescription,
        input: &ProfilingReport,
    );

    /// Pick the sharding functor for a release.
    fn select_release_sharding_functor(
        &self,
        ctx: &CallHandle<'_>,
        release: &ReleaseDescription,
        input: &ShardingFunctorInput,
        output: &mut ShardingFunctorOutput,
    );

    // --- partitions ---

    /// Choose the projection for a dependent partition operation.
    fn select_partition_projection(
        &self,
        ctx: &CallHandle<'_>,
        partition: &PartitionDescription,
        input: &PartitionProjectionInput,
        output: &mut PartitionProjectionOutput,
    );

    /// Map a dependent partition operation.
    fn map_partition(
        &self,
        ctx: &CallHandle<'_>,
        partition: &PartitionDescription,
        input: &MapPartitionInput,
        output: &mut MapPartitionOutput,
    );

    /// Rank source instances for a partition operation.
    fn select_partition_sources(
        &self,
        ctx: &CallHandle<'_>,
        partition: &PartitionDescription,
        input: &SelectSourcesInput,
        output: &mut SelectSourcesOutput,
    );

    /// Receive a profiling response for a partition operation.
    fn report_partition_profiling(
        &self,
        ctx: &CallHandle<'_>,
        partition: &PartitionDescription,
        input: &ProfilingReport,
    );

    /// Pick the sharding functor for a partition operation.
    fn select_partition_sharding_functor(
        &self,
        ctx: &CallHandle<'_>,
        partition: &PartitionDescription,
        input: &ShardingFunctorInput,
        output: &mut ShardingFunctorOutput,
    );

    // --- context, tunables, epochs, scheduling ---

    /// Configure the execution context of a newly started task.
    fn configure_context(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        output: &mut ContextConfigOutput,
    );

    /// Produce a tunable value requested by the application.
    fn select_tunable_value(
        &self,
        ctx: &CallHandle<'_>,
        task: &TaskDescription,
        input: &TunableInput,
        output: &mut TunableOutput,
    );

    /// Map all tasks of a must-epoch launch together.
    fn map_must_epoch(
        &self,
        ctx: &CallHandle<'_>,
        input: &MapMustEpochInput,
        output: &mut MapMustEpochOutput,
    );

    /// Map a whole dataflow graph at once.
    fn map_dataflow_graph(
        &self,
        ctx: &CallHandle<'_>,
        input: &MapDataflowGraphInput,
        output: &mut MapDataflowGraphOutput,
    );

    /// Decide whether to memoize an operation's mapping.
    fn memoize_operation(
        &self,
        ctx: &CallHandle<'_>,
        op: OperationId,
        input: &MemoizeInput,
        output: &mut MemoizeOutput,
    );

    /// Choose which ready tasks to map now, relocate, or defer.
    fn select_tasks_to_map(
        &self,
        ctx: &CallHandle<'_>,
        input: &SelectTasksToMapInput,
        output: &mut SelectTasksToMapOutput,
    );

    // --- stealing ---

    /// Choose processors to attempt to steal from.
    fn select_steal_targets(
        &self,
        ctx: &CallHandle<'_>,
        input: &SelectStealTargetsInput,
        output: &mut SelectStealTargetsOutput,
    );

    /// Approve or deny an incoming steal request.
    fn permit_steal_request(
        &self,
        ctx: &CallHandle<'_>,
        input: &PermitStealInput,
        output: &mut PermitStealOutput,
    );

    // --- messaging, results, futures ---

    /// Handle a message from a peer policy instance.
    fn handle_message(&self, ctx: &CallHandle<'_>, message: &PolicyMessage);

    /// Handle a task result broadcast for speculation.
    fn handle_task_result(&self, ctx: &CallHandle<'_>, input: &TaskResultInput);

    /// Fold a future map into one future value.
    ///
    /// The only method with a default: leaving `output.reduced` unset keeps
    /// the runtime's own fold.
    fn reduce_future_map(
        &self,
        ctx: &CallHandle<'_>,
        input: &ReduceFutureMapInput,
        output: &mut ReduceFutureMapOutput,
    ) {
    }
}
