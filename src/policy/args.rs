//! Operation descriptions and per-call input/output records.
//!
//! These are plain structured data, no behavior: the dispatcher passes
//! inputs by shared reference and outputs by mutable reference across the
//! policy boundary. Fields the policy *must* fill are `Option`s (or must be
//! non-empty); the dispatcher asserts them after the call in debug builds.

use crate::types::{
    EventId, InstanceId, OperationId, ProcessorId, ShardingId, TunableId, VariantId,
};

// ---------------------------------------------------------------------------
// operation descriptions
// ---------------------------------------------------------------------------

/// A task awaiting placement decisions.
#[derive(Debug, Clone)]
pub struct TaskDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Registered task type.
    pub task_kind: u32,
    /// Enclosing parent task, if any.
    pub parent: Option<OperationId>,
    /// Whether this is an index-space launch.
    pub is_index_space: bool,
    /// Number of points for index-space launches; one otherwise.
    pub point_count: u64,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

/// An inline mapping operation.
#[derive(Debug, Clone)]
pub struct InlineDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Enclosing parent task.
    pub parent: Option<OperationId>,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

/// An explicit copy operation.
#[derive(Debug, Clone)]
pub struct CopyDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Enclosing parent task.
    pub parent: Option<OperationId>,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

/// A close operation.
#[derive(Debug, Clone)]
pub struct CloseDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

/// An acquire operation.
#[derive(Debug, Clone)]
pub struct AcquireDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

/// A release operation.
#[derive(Debug, Clone)]
pub struct ReleaseDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

/// A dependent partition operation.
#[derive(Debug, Clone)]
pub struct PartitionDescription {
    /// The operation's identity.
    pub op: OperationId,
    /// Number of points being partitioned.
    pub point_count: u64,
    /// Application-supplied mapping tag.
    pub tag: u64,
}

// ---------------------------------------------------------------------------
// task pipeline
// ---------------------------------------------------------------------------

/// Output of `select_task_options`.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Processor to send the task toward. Mandated.
    pub initial_processor: Option<ProcessorId>,
    /// Run inline in the parent's context.
    pub inline_task: bool,
    /// Allow other processors to steal this task.
    pub stealable: bool,
    /// Map on this node rather than the target.
    pub map_locally: bool,
    /// Memoize this task's mapping.
    pub memoize: bool,
    /// Replicate the task across shards.
    pub replicate: bool,
}

/// Input to `premap_task`.
#[derive(Debug, Clone, Default)]
pub struct PremapTaskInput {
    /// Instances already valid for the premapped regions.
    pub valid_instances: Vec<InstanceId>,
}

/// Output of `premap_task`.
#[derive(Debug, Clone, Default)]
pub struct PremapTaskOutput {
    /// Instances to use for the premapped regions.
    pub chosen_instances: Vec<InstanceId>,
}

/// One slice of an index-space launch.
#[derive(Debug, Clone)]
pub struct TaskSlice {
    /// First point of the slice.
    pub offset: u64,
    /// Number of points in the slice.
    pub extent: u64,
    /// Processor the slice is sent to.
    pub target: ProcessorId,
    /// Recursively re-slice on arrival.
    pub recurse: bool,
    /// Points in this slice may be stolen.
    pub stealable: bool,
}

/// Input to `slice_task`.
#[derive(Debug, Clone, Default)]
pub struct SliceTaskInput {
    /// Total number of points to slice.
    pub point_count: u64,
}

/// Output of `slice_task`. The slices must cover every point. Mandated
/// non-empty.
#[derive(Debug, Clone, Default)]
pub struct SliceTaskOutput {
    /// The chosen slices.
    pub slices: Vec<TaskSlice>,
}

/// Input to `map_task`.
#[derive(Debug, Clone, Default)]
pub struct MapTaskInput {
    /// Instances currently valid for the task's regions.
    pub valid_instances: Vec<InstanceId>,
}

/// Output of `map_task`.
#[derive(Debug, Clone, Default)]
pub struct MapTaskOutput {
    /// Processors the task may run on. Mandated non-empty.
    pub target_processors: Vec<ProcessorId>,
    /// The variant to execute. Mandated.
    pub chosen_variant: Option<VariantId>,
    /// Instances backing the task's regions.
    pub chosen_instances: Vec<InstanceId>,
    /// Priority for any profiling responses.
    pub profiling_priority: i32,
}

/// Input to `select_task_variant`.
#[derive(Debug, Clone, Default)]
pub struct SelectVariantInput {
    /// The processor the task is bound to.
    pub processor: Option<ProcessorId>,
    /// Variants registered for the task on that processor kind.
    pub variants: Vec<VariantId>,
}

/// Output of `select_task_variant`. Mandated.
#[derive(Debug, Clone, Default)]
pub struct SelectVariantOutput {
    /// The chosen variant.
    pub chosen_variant: Option<VariantId>,
}

/// Input to `postmap_task`.
#[derive(Debug, Clone, Default)]
pub struct PostmapTaskInput {
    /// Instances mapped for the task.
    pub mapped_instances: Vec<InstanceId>,
}

/// Output of `postmap_task`.
#[derive(Debug, Clone, Default)]
pub struct PostmapTaskOutput {
    /// Additional instances to keep valid after the task runs.
    pub extra_instances: Vec<InstanceId>,
}

// ---------------------------------------------------------------------------
// shared families
// ---------------------------------------------------------------------------

/// Input to the `select_*_sources` family: rank copy sources for a target.
#[derive(Debug, Clone, Default)]
pub struct SelectSourcesInput {
    /// The destination instance.
    pub target: Option<InstanceId>,
    /// Candidate source instances.
    pub sources: Vec<InstanceId>,
}

/// Output of the `select_*_sources` family. An empty ranking lets the
/// runtime pick.
#[derive(Debug, Clone, Default)]
pub struct SelectSourcesOutput {
    /// Sources in preference order, best first.
    pub ranking: Vec<InstanceId>,
}

/// Input to the `report_*_profiling` family. No output.
#[derive(Debug, Clone, Default)]
pub struct ProfilingReport {
    /// Serialized profiling response payload.
    pub payload: Vec<u8>,
    /// Total responses expected for the operation.
    pub total_reports: u32,
}

/// Input to the `select_*_sharding_functor` family.
#[derive(Debug, Clone, Default)]
pub struct ShardingFunctorInput {
    /// Number of shards in the replicated context.
    pub shard_count: u32,
}

/// Output of the `select_*_sharding_functor` family. Mandated.
#[derive(Debug, Clone, Default)]
pub struct ShardingFunctorOutput {
    /// The chosen sharding functor.
    pub chosen_functor: Option<ShardingId>,
}

// ---------------------------------------------------------------------------
// inline / copy / acquire / release / partition mapping
// ---------------------------------------------------------------------------

/// Input to `map_inline`.
#[derive(Debug, Clone, Default)]
pub struct MapInlineInput {
    /// Instances currently valid for the mapped region.
    pub valid_instances: Vec<InstanceId>,
}

/// Output of `map_inline`. Mandated non-empty.
#[derive(Debug, Clone, Default)]
pub struct MapInlineOutput {
    /// Instances backing the inline mapping.
    pub chosen_instances: Vec<InstanceId>,
}

/// Input to `map_copy`.
#[derive(Debug, Clone, Default)]
pub struct MapCopyInput {
    /// Valid instances for each source requirement.
    pub src_instances: Vec<InstanceId>,
    /// Valid instances for each destination requirement.
    pub dst_instances: Vec<InstanceId>,
}

/// Output of `map_copy`. Destination instances are mandated non-empty.
#[derive(Debug, Clone, Default)]
pub struct MapCopyOutput {
    /// Chosen source instances.
    pub src_instances: Vec<InstanceId>,
    /// Chosen destination instances.
    pub dst_instances: Vec<InstanceId>,
}

/// Output of `map_acquire`.
#[derive(Debug, Clone, Default)]
pub struct MapAcquireOutput {
    /// Priority for any profiling responses.
    pub profiling_priority: i32,
}

/// Output of `map_release`.
#[derive(Debug, Clone, Default)]
pub struct MapReleaseOutput {
    /// Priority for any profiling responses.
    pub profiling_priority: i32,
}

/// Input to `select_partition_projection`.
#[derive(Debug, Clone, Default)]
pub struct PartitionProjectionInput {
    /// Whether a complete partition of the region exists.
    pub open_complete: bool,
}

/// Output of `select_partition_projection`.
#[derive(Debug, Clone, Default)]
pub struct PartitionProjectionOutput {
    /// Projection functor to apply, if any.
    pub chosen_projection: Option<u32>,
}

/// Input to `map_partition`.
#[derive(Debug, Clone, Default)]
pub struct MapPartitionInput {
    /// Instances currently valid for the partitioned region.
    pub valid_instances: Vec<InstanceId>,
}

/// Output of `map_partition`. Mandated non-empty.
#[derive(Debug, Clone, Default)]
pub struct MapPartitionOutput {
    /// Instances backing the partition operation.
    pub chosen_instances: Vec<InstanceId>,
}

// ---------------------------------------------------------------------------
// context, tunables, epochs, scheduling
// ---------------------------------------------------------------------------

/// Output of `configure_context`. Zeroes mean runtime defaults.
#[derive(Debug, Clone, Default)]
pub struct ContextConfigOutput {
    /// Maximum outstanding operations in the context's window.
    pub max_window_size: u32,
    /// Refill threshold for the window, in percent.
    pub hysteresis_percentage: u32,
    /// Maximum outstanding execution frames.
    pub max_outstanding_frames: u32,
    /// Minimum ready tasks before the scheduler runs.
    pub min_tasks_to_schedule: u32,
    /// Allow the application to change task priorities later.
    pub mutable_priority: bool,
}

/// Input to `select_tunable_value`.
#[derive(Debug, Clone, Default)]
pub struct TunableInput {
    /// Which tunable is requested.
    pub tunable: TunableId,
    /// Application-supplied arguments.
    pub args: Vec<u8>,
}

/// Output of `select_tunable_value`. Mandated.
#[derive(Debug, Clone, Default)]
pub struct TunableOutput {
    /// Serialized tunable value.
    pub value: Option<Vec<u8>>,
}

/// Input to `map_must_epoch`.
#[derive(Debug, Clone, Default)]
pub struct MapMustEpochInput {
    /// Tasks that must run concurrently.
    pub tasks: Vec<OperationId>,
}

/// Output of `map_must_epoch`. One processor per task, mandated.
#[derive(Debug, Clone, Default)]
pub struct MapMustEpochOutput {
    /// Chosen processor for each task, by position.
    pub task_processors: Vec<ProcessorId>,
}

/// Input to `map_dataflow_graph`.
#[derive(Debug, Clone, Default)]
pub struct MapDataflowGraphInput {
    /// Operations in the graph.
    pub nodes: Vec<OperationId>,
}

/// Output of `map_dataflow_graph`.
#[derive(Debug, Clone, Default)]
pub struct MapDataflowGraphOutput {}

/// Input to `memoize_operation`.
#[derive(Debug, Clone, Default)]
pub struct MemoizeInput {
    /// Trace identifier the operation belongs to.
    pub trace_id: u64,
}

/// Output of `memoize_operation`.
#[derive(Debug, Clone, Default)]
pub struct MemoizeOutput {
    /// Whether to memoize the operation's mapping.
    pub memoize: bool,
}

/// Input to `select_tasks_to_map`.
#[derive(Debug, Clone, Default)]
pub struct SelectTasksToMapInput {
    /// Tasks ready to map, in ready order.
    pub ready_tasks: Vec<OperationId>,
}

/// Output of `select_tasks_to_map`.
///
/// The policy must either act on at least one task or provide a deferral
/// event; returning neither would stall the scheduler forever and is
/// asserted in debug builds.
#[derive(Debug, Clone, Default)]
pub struct SelectTasksToMapOutput {
    /// Tasks to map on this processor now.
    pub map_tasks: Vec<OperationId>,
    /// Tasks to send elsewhere instead.
    pub relocate_tasks: Vec<(OperationId, ProcessorId)>,
    /// Retry after this event triggers, when no task was acted on.
    pub deferral: Option<EventId>,
}

/// Input to `select_steal_targets`.
#[derive(Debug, Clone, Default)]
pub struct SelectStealTargetsInput {
    /// Processors that recently denied this policy a steal.
    pub blacklist: Vec<ProcessorId>,
}

/// Output of `select_steal_targets`.
#[derive(Debug, Clone, Default)]
pub struct SelectStealTargetsOutput {
    /// Processors to attempt to steal from.
    pub targets: Vec<ProcessorId>,
}

/// Input to `permit_steal_request`.
#[derive(Debug, Clone, Default)]
pub struct PermitStealInput {
    /// The processor attempting the steal.
    pub thief: Option<ProcessorId>,
    /// Tasks eligible to be stolen.
    pub stealable_tasks: Vec<OperationId>,
}

/// Output of `permit_steal_request`.
#[derive(Debug, Clone, Default)]
pub struct PermitStealOutput {
    /// Tasks granted to the thief.
    pub stolen_tasks: Vec<OperationId>,
}

// ---------------------------------------------------------------------------
// messaging, results, futures
// ---------------------------------------------------------------------------

/// A message from a peer policy instance.
#[derive(Debug, Clone)]
pub struct PolicyMessage {
    /// Processor of the sending policy instance.
    pub sender: ProcessorId,
    /// Whether this was a broadcast.
    pub broadcast: bool,
    /// Opaque message payload.
    pub payload: Vec<u8>,
}

/// Input to `handle_task_result`.
#[derive(Debug, Clone, Default)]
pub struct TaskResultInput {
    /// The completed operation.
    pub op: Option<OperationId>,
    /// Serialized result value.
    pub result: Vec<u8>,
}

/// Input to `reduce_future_map`.
#[derive(Debug, Clone, Default)]
pub struct ReduceFutureMapInput {
    /// Serialized future values, one per point.
    pub futures: Vec<Vec<u8>>,
}

/// Output of `reduce_future_map`.
#[derive(Debug, Clone, Default)]
pub struct ReduceFutureMapOutput {
    /// The folded value; `None` keeps the runtime's default fold.
    pub reduced: Option<Vec<u8>>,
}
