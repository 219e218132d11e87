//! The dispatcher: `invoke_*` entry points and the call handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::DispatcherConfig;
use crate::constraint::LayoutConstraintSet;
use crate::dispatch::concurrent::ConcurrentDiscipline;
use crate::dispatch::context::CallContext;
use crate::dispatch::serializing::SerializingDiscipline;
use crate::dispatch::Discipline;
use crate::policy::{
    AcquireDescription, CloseDescription, ContextConfigOutput, CopyDescription,
    InlineDescription, MapAcquireOutput, MapCopyInput, MapCopyOutput, MapDataflowGraphInput,
    MapDataflowGraphOutput, MapInlineInput, MapInlineOutput, MapMustEpochInput,
    MapMustEpochOutput, MapPartitionInput, MapPartitionOutput, MapReleaseOutput, MapTaskInput,
    MapTaskOutput, MemoizeInput, MemoizeOutput, PartitionDescription, PartitionProjectionInput,
    PartitionProjectionOutput, PermitStealInput, PermitStealOutput, PlacementPolicy,
    PolicyMessage, PostmapTaskInput, PostmapTaskOutput, PremapTaskInput, PremapTaskOutput,
    ProfilingReport, ReduceFutureMapInput, ReduceFutureMapOutput, ReleaseDescription,
    SelectSourcesInput, SelectSourcesOutput, SelectStealTargetsInput, SelectStealTargetsOutput,
    SelectTasksToMapInput, SelectTasksToMapOutput, SelectVariantInput, SelectVariantOutput,
    ShardingFunctorInput, ShardingFunctorOutput, SliceTaskInput, SliceTaskOutput,
    TaskDescription, TaskOptions, TaskResultInput, TunableInput, TunableOutput,
};
use crate::runtime::{ResumeReason, RuntimeInterface};
use crate::tracing_compat::{debug, trace};
use crate::types::{
    CallKind, EventId, InstanceId, MemoryId, OperationId, ProcessorId, SyncModel,
};

#[derive(Debug, Default)]
struct StatCounters {
    begun: AtomicU64,
    finished: AtomicU64,
    pauses: AtomicU64,
    messages_sent: AtomicU64,
}

/// Snapshot of a dispatcher's call counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatcherStats {
    /// Calls admitted so far.
    pub calls_begun: u64,
    /// Calls fully finalized.
    pub calls_finished: u64,
    /// Blocking checkpoints crossed.
    pub pauses: u64,
    /// Messages sent to peer policies.
    pub messages_sent: u64,
}

impl DispatcherStats {
    /// Calls admitted but not yet finalized.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.calls_begun - self.calls_finished
    }
}

/// Dispatches policy calls for one {policy instance, processor} pair.
///
/// The discipline is fixed at construction from the policy's declared
/// [`SyncModel`]; the dispatcher owns the policy object and the contexts it
/// creates, and shares the node-wide [`RuntimeInterface`].
pub struct Dispatcher {
    policy: Box<dyn PlacementPolicy>,
    runtime: Arc<dyn RuntimeInterface>,
    discipline: Box<dyn Discipline>,
    processor: ProcessorId,
    model: SyncModel,
    profile_calls: bool,
    stats: StatCounters,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy.name())
            .field("processor", &self.processor)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Builds the dispatcher for `policy` on `processor`.
    ///
    /// The policy's [`SyncModel`] picks the discipline; the configuration
    /// can veto reentrance and enables call profiling.
    #[must_use]
    pub fn new(
        policy: Box<dyn PlacementPolicy>,
        runtime: Arc<dyn RuntimeInterface>,
        processor: ProcessorId,
        config: &DispatcherConfig,
    ) -> Self {
        let model = policy.sync_model();
        let discipline: Box<dyn Discipline> = match model {
            SyncModel::Serialized { reentrant } => Box::new(SerializingDiscipline::new(
                config.reentrant_override.unwrap_or(reentrant),
            )),
            SyncModel::Concurrent => Box::new(ConcurrentDiscipline::new()),
        };
        Self {
            policy,
            runtime,
            discipline,
            processor,
            model,
            profile_calls: config.profile_calls,
            stats: StatCounters::default(),
        }
    }

    /// The processor this dispatcher serves.
    #[must_use]
    pub const fn processor(&self) -> ProcessorId {
        self.processor
    }

    /// The policy's declared concurrency discipline.
    #[must_use]
    pub const fn sync_model(&self) -> SyncModel {
        self.model
    }

    /// The policy's name.
    #[must_use]
    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            calls_begun: self.stats.begun.load(Ordering::Relaxed),
            calls_finished: self.stats.finished.load(Ordering::Relaxed),
            pauses: self.stats.pauses.load(Ordering::Relaxed),
            messages_sent: self.stats.messages_sent.load(Ordering::Relaxed),
        }
    }

    /// Builds a context, admits it, runs `body`, and finalizes: remaining
    /// ledger references are released, then the next waiter is admitted.
    fn with_call<T>(
        &self,
        kind: CallKind,
        operation: Option<OperationId>,
        prioritize: bool,
        body: impl FnOnce(&CallHandle<'_>) -> T,
    ) -> T {
        let ctx = Arc::new(CallContext::new(kind, operation));
        self.stats.begun.fetch_add(1, Ordering::Relaxed);
        self.discipline.begin(&ctx, prioritize);
        trace!(
            policy = self.policy.name(),
            call = %kind,
            seq = ctx.sequence(),
            "mapper call began"
        );

        let handle = CallHandle {
            dispatcher: self,
            ctx: &ctx,
        };
        let result = body(&handle);

        for (instance, count) in ctx.ledger_drain() {
            self.runtime.release_instance(instance, count);
        }
        self.discipline.finish(&ctx);
        self.stats.finished.fetch_add(1, Ordering::Relaxed);
        if self.profile_calls {
            debug!(
                policy = self.policy.name(),
                call = %kind,
                seq = ctx.sequence(),
                running_us = ctx.running_duration().map_or(0, |d| d.as_micros() as u64),
                paused_us = ctx.paused_duration().as_micros() as u64,
                pauses = ctx.pause_count(),
                "mapper call finished"
            );
        }
        result
    }

    // --- task pipeline ---

    /// Invokes `select_task_options`.
    pub fn invoke_select_task_options(&self, task: &TaskDescription) -> TaskOptions {
        self.with_call(CallKind::SelectTaskOptions, Some(task.op), false, |h| {
            let mut output = TaskOptions::default();
            self.policy.select_task_options(h, task, &mut output);
            debug_assert!(
                output.initial_processor.is_some(),
                "select_task_options left no initial processor"
            );
            output
        })
    }

    /// Invokes `premap_task`.
    pub fn invoke_premap_task(
        &self,
        task: &TaskDescription,
        input: &PremapTaskInput,
    ) -> PremapTaskOutput {
        self.with_call(CallKind::PremapTask, Some(task.op), false, |h| {
            let mut output = PremapTaskOutput::default();
            self.policy.premap_task(h, task, input, &mut output);
            h.commit_instances(&output.chosen_instances);
            output
        })
    }

    /// Invokes `slice_task`.
    pub fn invoke_slice_task(
        &self,
        task: &TaskDescription,
        input: &SliceTaskInput,
    ) -> SliceTaskOutput {
        self.with_call(CallKind::SliceTask, Some(task.op), false, |h| {
            let mut output = SliceTaskOutput::default();
            self.policy.slice_task(h, task, input, &mut output);
            debug_assert!(!output.slices.is_empty(), "slice_task produced no slices");
            output
        })
    }

    /// Invokes `map_task`.
    pub fn invoke_map_task(&self, task: &TaskDescription, input: &MapTaskInput) -> MapTaskOutput {
        self.with_call(CallKind::MapTask, Some(task.op), false, |h| {
            let mut output = MapTaskOutput::default();
            self.policy.map_task(h, task, input, &mut output);
            debug_assert!(
                !output.target_processors.is_empty(),
                "map_task named no target processor"
            );
            debug_assert!(
                output.chosen_variant.is_some(),
                "map_task chose no variant"
            );
            h.commit_instances(&output.chosen_instances);
            output
        })
    }

    /// Invokes `select_task_variant`.
    pub fn invoke_select_task_variant(
        &self,
        task: &TaskDescription,
        input: &SelectVariantInput,
    ) -> SelectVariantOutput {
        self.with_call(CallKind::SelectTaskVariant, Some(task.op), false, |h| {
            let mut output = SelectVariantOutput::default();
            self.policy.select_task_variant(h, task, input, &mut output);
            debug_assert!(
                output.chosen_variant.is_some(),
                "select_task_variant chose no variant"
            );
            output
        })
    }

    /// Invokes `postmap_task`.
    pub fn invoke_postmap_task(
        &self,
        task: &TaskDescription,
        input: &PostmapTaskInput,
    ) -> PostmapTaskOutput {
        self.with_call(CallKind::PostmapTask, Some(task.op), false, |h| {
            let mut output = PostmapTaskOutput::default();
            self.policy.postmap_task(h, task, input, &mut output);
            h.commit_instances(&output.extra_instances);
            output
        })
    }

    /// Invokes `select_task_sources`.
    pub fn invoke_select_task_sources(
        &self,
        task: &TaskDescription,
        input: &SelectSourcesInput,
    ) -> SelectSourcesOutput {
        self.with_call(CallKind::SelectTaskSources, Some(task.op), false, |h| {
            let mut output = SelectSourcesOutput::default();
            self.policy.select_task_sources(h, task, input, &mut output);
            output
        })
    }

    /// Invokes `report_task_profiling`.
    pub fn invoke_report_task_profiling(&self, task: &TaskDescription, input: &ProfilingReport) {
        self.with_call(CallKind::ReportTaskProfiling, Some(task.op), false, |h| {
            self.policy.report_task_profiling(h, task, input);
        });
    }

    /// Invokes `select_task_sharding_functor`.
    pub fn invoke_select_task_sharding_functor(
        &self,
        task: &TaskDescription,
        input: &ShardingFunctorInput,
    ) -> ShardingFunctorOutput {
        self.with_call(
            CallKind::SelectTaskShardingFunctor,
            Some(task.op),
            false,
            |h| {
                let mut output = ShardingFunctorOutput::default();
                self.policy
                    .select_task_sharding_functor(h, task, input, &mut output);
                debug_assert!(
                    output.chosen_functor.is_some(),
                    "select_task_sharding_functor chose no functor"
                );
                output
            },
        )
    }

    // --- inline mappings ---

    /// Invokes `map_inline`.
    pub fn invoke_map_inline(
        &self,
        inline_op: &InlineDescription,
        input: &MapInlineInput,
    ) -> MapInlineOutput {
        self.with_call(CallKind::MapInline, Some(inline_op.op), false, |h| {
            let mut output = MapInlineOutput::default();
            self.policy.map_inline(h, inline_op, input, &mut output);
            debug_assert!(
                !output.chosen_instances.is_empty(),
                "map_inline chose no instances"
            );
            h.commit_instances(&output.chosen_instances);
            output
        })
    }

    /// Invokes `select_inline_sources`.
    pub fn invoke_select_inline_sources(
        &self,
        inline_op: &InlineDescription,
        input: &SelectSourcesInput,
    ) -> SelectSourcesOutput {
        self.with_call(CallKind::SelectInlineSources, Some(inline_op.op), false, |h| {
            let mut output = SelectSourcesOutput::default();
            self.policy
                .select_inline_sources(h, inline_op, input, &mut output);
            output
        })
    }

    /// Invokes `report_inline_profiling`.
    pub fn invoke_report_inline_profiling(
        &self,
        inline_op: &InlineDescription,
        input: &ProfilingReport,
    ) {
        self.with_call(
            CallKind::ReportInlineProfiling,
            Some(inline_op.op),
            false,
            |h| {
                self.policy.report_inline_profiling(h, inline_op, input);
            },
        );
    }

    // --- copies ---

    /// Invokes `map_copy`.
    pub fn invoke_map_copy(&self, copy: &CopyDescription, input: &MapCopyInput) -> MapCopyOutput {
        self.with_call(CallKind::MapCopy, Some(copy.op), false, |h| {
            let mut output = MapCopyOutput::default();
            self.policy.map_copy(h, copy, input, &mut output);
            debug_assert!(
                !output.dst_instances.is_empty(),
                "map_copy chose no destination instances"
            );
            h.commit_instances(&output.src_instances);
            h.commit_instances(&output.dst_instances);
            output
        })
    }

    /// Invokes `select_copy_sources`.
    pub fn invoke_select_copy_sources(
        &self,
        copy: &CopyDescription,
        input: &SelectSourcesInput,
    ) -> SelectSourcesOutput {
        self.with_call(CallKind::SelectCopySources, Some(copy.op), false, |h| {
            let mut output = SelectSourcesOutput::default();
            self.policy.select_copy_sources(h, copy, input, &mut output);
            output
        })
    }

    /// Invokes `report_copy_profiling`.
    pub fn invoke_report_copy_profiling(&self, copy: &CopyDescription, input: &ProfilingReport) {
        self.with_call(CallKind::ReportCopyProfiling, Some(copy.op), false, |h| {
            self.policy.report_copy_profiling(h, copy, input);
        });
    }

    /// Invokes `select_copy_sharding_functor`.
    pub fn invoke_select_copy_sharding_functor(
        &self,
        copy: &CopyDescription,
        input: &ShardingFunctorInput,
    ) -> ShardingFunctorOutput {
        self.with_call(
            CallKind::SelectCopyShardingFunctor,
            Some(copy.op),
            false,
            |h| {
                let mut output = ShardingFunctorOutput::default();
                self.policy
                    .select_copy_sharding_functor(h, copy, input, &mut output);
                debug_assert!(
                    output.chosen_functor.is_some(),
                    "select_copy_sharding_functor chose no functor"
                );
                output
            },
        )
    }

    // --- closes ---

    /// Invokes `select_close_sources`.
    pub fn invoke_select_close_sources(
        &self,
        close: &CloseDescription,
        input: &SelectSourcesInput,
    ) -> SelectSourcesOutput {
        self.with_call(CallKind::SelectCloseSources, Some(close.op), false, |h| {
            let mut output = SelectSourcesOutput::default();
            self.policy
                .select_close_sources(h, close, input, &mut output);
            output
        })
    }

    /// Invokes `report_close_profiling`.
    pub fn invoke_report_close_profiling(&self, close: &CloseDescription, input: &ProfilingReport) {
        self.with_call(CallKind::ReportCloseProfiling, Some(close.op), false, |h| {
            self.policy.report_close_profiling(h, close, input);
        });
    }

    /// Invokes `select_close_sharding_functor`.
    pub fn invoke_select_close_sharding_functor(
        &self,
        close: &CloseDescription,
        input: &ShardingFunctorInput,
    ) -> ShardingFunctorOutput {
        self.with_call(
            CallKind::SelectCloseShardingFunctor,
            Some(close.op),
            false,
            |h| {
                let mut output = ShardingFunctorOutput::default();
                self.policy
                    .select_close_sharding_functor(h, close, input, &mut output);
                debug_assert!(
                    output.chosen_functor.is_some(),
                    "select_close_sharding_functor chose no functor"
                );
                output
            },
        )
    }

    // --- acquires ---

    /// Invokes `map_acquire`.
    pub fn invoke_map_acquire(&self, acquire: &AcquireDescription) -> MapAcquireOutput {
        self.with_call(CallKind::MapAcquire, Some(acquire.op), false, |h| {
            let mut output = MapAcquireOutput::default();
            self.policy.map_acquire(h, acquire, &mut output);
            output
        })
    }

    /// Invokes `report_acquire_profiling`.
    pub fn invoke_report_acquire_profiling(
        &self,
        acquire: &AcquireDescription,
        input: &ProfilingReport,
    ) {
        self.with_call(
            CallKind::ReportAcquireProfiling,
            Some(acquire.op),
            false,
            |h| {
                self.policy.report_acquire_profiling(h, acquire, input);
            },
        );
    }

    /// Invokes `select_acquire_sharding_functor`.
    pub fn invoke_select_acquire_sharding_functor(
        &self,
        acquire: &AcquireDescription,
        input: &ShardingFunctorInput,
    ) -> ShardingFunctorOutput {
        self.with_call(
            CallKind::SelectAcquireShardingFunctor,
            Some(acquire.op),
            false,
            |h| {
                let mut output = ShardingFunctorOutput::default();
                self.policy
                    .select_acquire_sharding_functor(h, acquire, input, &mut output);
                debug_assert!(
                    output.chosen_functor.is_some(),
                    "select_acquire_sharding_functor chose no functor"
                );
                output
            },
        )
    }

    // --- releases ---

    /// Invokes `map_release`.
    pub fn invoke_map_release(&self, release: &ReleaseDescription) -> MapReleaseOutput {
        self.with_call(CallKind::MapRelease, Some(release.op), false, |h| {
            let mut output = MapReleaseOutput::default();
            self.policy.map_release(h, release, &mut output);
            output
        })
    }

    /// Invokes `select_release_sources`.
    pub fn invoke_select_release_sources(
        &self,
        release: &ReleaseDescription,
        input: &SelectSourcesInput,
    ) -> SelectSourcesOutput {
        self.with_call(CallKind::SelectReleaseSources, Some(release.op), false, |h| {
            let mut output = SelectSourcesOutput::default();
            self.policy
                .select_release_sources(h, release, input, &mut output);
            output
        })
    }

    /// Invokes `report_release_profiling`.
    pub fn invoke_report_release_profiling(
        &self,
        release: &ReleaseDescription,
        input: &ProfilingReport,
    ) {
        self.with_call(
            CallKind::ReportReleaseProfiling,
            Some(release.op),
            false,
            |h| {
                self.policy.report_release_profiling(h, release, input);
            },
        );
    }

    /// Invokes `select_release_sharding_functor`.
    pub fn invoke_select_release_sharding_functor(
        &self,
        release: &ReleaseDescription,
        input: &ShardingFunctorInput,
    ) -> ShardingFunctorOutput {
        self.with_call(
            CallKind::SelectReleaseShardingFunctor,
            Some(release.op),
            false,
            |h| {
                let mut output = ShardingFunctorOutput::default();
                self.policy
                    .select_release_sharding_functor(h, release, input, &mut output);
                debug_assert!(
                    output.chosen_functor.is_some(),
                    "select_release_sharding_functor chose no functor"
                );
                output
            },
        )
    }

    // --- partitions ---

    /// Invokes `select_partition_projection`.
    pub fn invoke_select_partition_projection(
        &self,
        partition: &PartitionDescription,
        input: &PartitionProjectionInput,
    ) -> PartitionProjectionOutput {
        self.with_call(
            CallKind::SelectPartitionProjection,
            Some(partition.op),
            false,
            |h| {
                let mut output = PartitionProjectionOutput::default();
                self.policy
                    .select_partition_projection(h, partition, input, &mut output);
                output
            },
        )
    }

    /// Invokes `map_partition`.
    pub fn invoke_map_partition(
        &self,
        partition: &PartitionDescription,
        input: &MapPartitionInput,
    ) -> MapPartitionOutput {
        self.with_call(CallKind::MapPartition, Some(partition.op), false, |h| {
            let mut output = MapPartitionOutput::default();
            self.policy.map_partition(h, partition, input, &mut output);
            debug_assert!(
                !output.chosen_instances.is_empty(),
                "map_partition chose no instances"
            );
            h.commit_instances(&output.chosen_instances);
            output
        })
    }

    /// Invokes `select_partition_sources`.
    pub fn invoke_select_partition_sources(
        &self,
        partition: &PartitionDescription,
        input: &SelectSourcesInput,
    ) -> SelectSourcesOutput {
        self.with_call(
            CallKind::SelectPartitionSources,
            Some(partition.op),
            false,
            |h| {
                let mut output = SelectSourcesOutput::default();
                self.policy
                    .select_partition_sources(h, partition, input, &mut output);
                output
            },
        )
    }

    /// Invokes `report_partition_profiling`.
    pub fn invoke_report_partition_profiling(
        &self,
        partition: &PartitionDescription,
        input: &ProfilingReport,
    ) {
        self.with_call(
            CallKind::ReportPartitionProfiling,
            Some(partition.op),
            false,
            |h| {
                self.policy.report_partition_profiling(h, partition, input);
            },
        );
    }

    /// Invokes `select_partition_sharding_functor`.
    pub fn invoke_select_partition_sharding_functor(
        &self,
        partition: &PartitionDescription,
        input: &ShardingFunctorInput,
    ) -> ShardingFunctorOutput {
        self.with_call(
            CallKind::SelectPartitionShardingFunctor,
            Some(partition.op),
            false,
            |h| {
                let mut output = ShardingFunctorOutput::default();
                self.policy
                    .select_partition_sharding_functor(h, partition, input, &mut output);
                debug_assert!(
                    output.chosen_functor.is_some(),
                    "select_partition_sharding_functor chose no functor"
                );
                output
            },
        )
    }

    // --- context, tunables, epochs, scheduling ---

    /// Invokes `configure_context`.
    pub fn invoke_configure_context(&self, task: &TaskDescription) -> ContextConfigOutput {
        self.with_call(CallKind::ConfigureContext, Some(task.op), false, |h| {
            let mut output = ContextConfigOutput::default();
            self.policy.configure_context(h, task, &mut output);
            output
        })
    }

    /// Invokes `select_tunable_value`.
    pub fn invoke_select_tunable_value(
        &self,
        task: &TaskDescription,
        input: &TunableInput,
    ) -> TunableOutput {
        self.with_call(CallKind::SelectTunableValue, Some(task.op), false, |h| {
            let mut output = TunableOutput::default();
            self.policy.select_tunable_value(h, task, input, &mut output);
            debug_assert!(
                output.value.is_some(),
                "select_tunable_value produced no value"
            );
            output
        })
    }

    /// Invokes `map_must_epoch`.
    pub fn invoke_map_must_epoch(&self, input: &MapMustEpochInput) -> MapMustEpochOutput {
        self.with_call(CallKind::MapMustEpoch, None, false, |h| {
            let mut output = MapMustEpochOutput::default();
            self.policy.map_must_epoch(h, input, &mut output);
            debug_assert!(
                output.task_processors.len() == input.tasks.len(),
                "map_must_epoch must place every task"
            );
            output
        })
    }

    /// Invokes `map_dataflow_graph`.
    pub fn invoke_map_dataflow_graph(
        &self,
        input: &MapDataflowGraphInput,
    ) -> MapDataflowGraphOutput {
        self.with_call(CallKind::MapDataflowGraph, None, false, |h| {
            let mut output = MapDataflowGraphOutput::default();
            self.policy.map_dataflow_graph(h, input, &mut output);
            output
        })
    }

    /// Invokes `memoize_operation`.
    pub fn invoke_memoize_operation(
        &self,
        op: OperationId,
        input: &MemoizeInput,
    ) -> MemoizeOutput {
        self.with_call(CallKind::MemoizeOperation, Some(op), false, |h| {
            let mut output = MemoizeOutput::default();
            self.policy.memoize_operation(h, op, input, &mut output);
            output
        })
    }

    /// Invokes `select_tasks_to_map`.
    pub fn invoke_select_tasks_to_map(
        &self,
        input: &SelectTasksToMapInput,
    ) -> SelectTasksToMapOutput {
        self.with_call(CallKind::SelectTasksToMap, None, false, |h| {
            let mut output = SelectTasksToMapOutput::default();
            self.policy.select_tasks_to_map(h, input, &mut output);
            debug_assert!(
                !output.map_tasks.is_empty()
                    || !output.relocate_tasks.is_empty()
                    || output.deferral.is_some(),
                "select_tasks_to_map acted on nothing and deferred to nothing"
            );
            output
        })
    }

    // --- stealing ---

    /// Invokes `select_steal_targets`.
    pub fn invoke_select_steal_targets(
        &self,
        input: &SelectStealTargetsInput,
    ) -> SelectStealTargetsOutput {
        self.with_call(CallKind::SelectStealTargets, None, false, |h| {
            let mut output = SelectStealTargetsOutput::default();
            self.policy.select_steal_targets(h, input, &mut output);
            output
        })
    }

    /// Invokes `permit_steal_request`.
    pub fn invoke_permit_steal_request(&self, input: &PermitStealInput) -> PermitStealOutput {
        self.with_call(CallKind::PermitStealRequest, None, false, |h| {
            let mut output = PermitStealOutput::default();
            self.policy.permit_steal_request(h, input, &mut output);
            output
        })
    }

    // --- messaging, results, futures ---

    /// Invokes `handle_message`.
    ///
    /// Message handling is admitted with priority: peers block on responses,
    /// and a message stuck behind a long pending queue can deadlock a
    /// distributed protocol between policies.
    pub fn invoke_handle_message(&self, message: &PolicyMessage) {
        self.with_call(CallKind::HandleMessage, None, true, |h| {
            self.policy.handle_message(h, message);
        });
    }

    /// Invokes `handle_task_result`.
    pub fn invoke_handle_task_result(&self, input: &TaskResultInput) {
        self.with_call(CallKind::HandleTaskResult, input.op, false, |h| {
            self.policy.handle_task_result(h, input);
        });
    }

    /// Invokes `reduce_future_map`.
    pub fn invoke_reduce_future_map(
        &self,
        input: &ReduceFutureMapInput,
    ) -> ReduceFutureMapOutput {
        self.with_call(CallKind::ReduceFutureMap, None, false, |h| {
            let mut output = ReduceFutureMapOutput::default();
            self.policy.reduce_future_map(h, input, &mut output);
            output
        })
    }
}

/// Grants a policy method access to runtime services for the duration of
/// one call.
///
/// The handle borrows the call context, so services cannot outlive the call
/// that was granted them; using runtime services outside an active call is
/// therefore unrepresentable rather than asserted. Methods documented as
/// *blocking* bracket the wait with the discipline's pause/resume
/// checkpoints.
pub struct CallHandle<'a> {
    dispatcher: &'a Dispatcher,
    ctx: &'a Arc<CallContext>,
}

impl CallHandle<'_> {
    /// The kind of the running call.
    #[must_use]
    pub fn kind(&self) -> CallKind {
        self.ctx.kind()
    }

    /// The operation the call is deciding for, if any.
    #[must_use]
    pub fn operation(&self) -> Option<OperationId> {
        self.ctx.operation()
    }

    /// The processor this dispatcher serves.
    #[must_use]
    pub fn processor(&self) -> ProcessorId {
        self.dispatcher.processor
    }

    fn blocking<T>(&self, reason: ResumeReason, wait: impl FnOnce() -> T) -> T {
        self.dispatcher.stats.pauses.fetch_add(1, Ordering::Relaxed);
        self.dispatcher.discipline.pause(self.ctx);
        let value = wait();
        self.dispatcher.discipline.resume(self.ctx, reason);
        value
    }

    // --- instances ---

    /// Looks for an existing instance satisfying `constraints` in `memory`
    /// without blocking. A hit is recorded in the call's ledger.
    pub fn find_instance(
        &self,
        memory: MemoryId,
        constraints: &LayoutConstraintSet,
    ) -> Option<InstanceId> {
        let found = self.dispatcher.runtime.find_instance(memory, constraints)?;
        if self.dispatcher.runtime.acquire_instance(found) {
            self.ctx.ledger_acquire(found);
            Some(found)
        } else {
            None
        }
    }

    /// Finds or creates an instance satisfying `constraints` in `memory`.
    ///
    /// **Blocking**: brackets the allocation with pause/resume. A result is
    /// recorded in the call's ledger.
    pub fn find_or_create_instance(
        &self,
        memory: MemoryId,
        constraints: &LayoutConstraintSet,
    ) -> Option<InstanceId> {
        let created = self.blocking(ResumeReason::InstanceReady, || {
            self.dispatcher
                .runtime
                .find_or_create_instance(memory, constraints)
        })?;
        if self.dispatcher.runtime.acquire_instance(created) {
            self.ctx.ledger_acquire(created);
            Some(created)
        } else {
            None
        }
    }

    /// Adds a reference to an instance the call already knows about.
    pub fn acquire_instance(&self, instance: InstanceId) -> bool {
        if self.dispatcher.runtime.acquire_instance(instance) {
            self.ctx.ledger_acquire(instance);
            true
        } else {
            false
        }
    }

    /// Explicitly drops one of the call's references to `instance`.
    ///
    /// Releasing an instance the call never acquired is a policy defect.
    pub fn release_instance(&self, instance: InstanceId) {
        let held = self.ctx.ledger_release(instance);
        debug_assert!(held, "release of an instance this call never acquired");
        if held {
            self.dispatcher.runtime.release_instance(instance, 1);
        }
    }

    /// Marks output-referenced instances as kept: their references survive
    /// the call instead of being released at finish.
    pub(crate) fn commit_instances(&self, instances: &[InstanceId]) {
        for &instance in instances {
            self.ctx.ledger_commit(instance);
        }
    }

    // --- events ---

    /// Mints a fresh policy event.
    #[must_use]
    pub fn create_event(&self) -> EventId {
        self.dispatcher.runtime.create_event()
    }

    /// Triggers a policy event.
    pub fn trigger_event(&self, event: EventId) {
        self.dispatcher.runtime.trigger_event(event);
    }

    /// Returns true if the event has triggered.
    #[must_use]
    pub fn has_triggered(&self, event: EventId) -> bool {
        self.dispatcher.runtime.has_triggered(event)
    }

    /// Waits for a policy event. **Blocking.**
    pub fn wait_event(&self, event: EventId) {
        self.blocking(ResumeReason::EventTriggered, || {
            self.dispatcher.runtime.wait_event(event);
        });
    }

    // --- index-space algebra ---

    /// Number of points in an operation's index space.
    #[must_use]
    pub fn index_space_volume(&self, operation: OperationId) -> u64 {
        self.dispatcher.runtime.index_space_volume(operation)
    }

    /// Splits an operation's index space into at most `pieces` dense runs.
    /// **Blocking.**
    pub fn partition_index_space(&self, operation: OperationId, pieces: u32) -> Vec<(u64, u64)> {
        self.blocking(ResumeReason::SpaceReady, || {
            self.dispatcher.runtime.partition_index_space(operation, pieces)
        })
    }

    // --- semantic information ---

    /// Fetches semantic information for an operation. **Blocking.**
    pub fn semantic_info(&self, operation: OperationId, tag: u32) -> Option<Vec<u8>> {
        self.blocking(ResumeReason::SemanticReady, || {
            self.dispatcher.runtime.semantic_info(operation, tag)
        })
    }

    // --- messaging ---

    /// Sends a message to the policy instance owning `to`.
    pub fn send_message(&self, to: ProcessorId, payload: &[u8]) {
        self.dispatcher
            .stats
            .messages_sent
            .fetch_add(1, Ordering::Relaxed);
        self.dispatcher
            .runtime
            .send_message(self.dispatcher.processor, to, payload);
    }

    /// Broadcasts a message to every peer policy instance.
    pub fn broadcast(&self, payload: &[u8]) {
        self.dispatcher
            .stats
            .messages_sent
            .fetch_add(1, Ordering::Relaxed);
        self.dispatcher
            .runtime
            .broadcast(self.dispatcher.processor, payload);
    }

    // --- lock and reentrance control ---

    /// Acquires the policy lock. **Blocking.** Requires the concurrent
    /// discipline; shared mode when `read_only`.
    pub fn lock_policy(&self, read_only: bool) {
        self.blocking(ResumeReason::LockGranted, || {
            self.dispatcher.discipline.lock(self.ctx, read_only);
        });
    }

    /// Releases the policy lock.
    pub fn unlock_policy(&self) {
        self.dispatcher.discipline.unlock(self.ctx);
    }

    /// Forbids other calls from being admitted while this call pauses.
    /// Requires the reentrant serializing discipline.
    pub fn disable_reentrant(&self) {
        self.dispatcher.discipline.set_reentrant(self.ctx, false);
    }

    /// Re-permits admission of other calls while this call pauses.
    pub fn enable_reentrant(&self) {
        self.dispatcher.discipline.set_reentrant(self.ctx, true);
    }
}
