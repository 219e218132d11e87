//! Kind enumerations: call kinds, processor and memory kinds, dimensions.

use core::fmt;

/// Identifies which policy method a dispatcher is invoking.
///
/// Every entry point on [`PlacementPolicy`](crate::policy::PlacementPolicy)
/// has exactly one tag here. The tag travels with the call context and shows
/// up in logging, profiling ranges, and defect diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CallKind {
    /// Choose initial scheduling options for a task.
    SelectTaskOptions,
    /// Pre-map regions the runtime must see before slicing.
    PremapTask,
    /// Slice an index task launch across processors.
    SliceTask,
    /// Map a single task: variant, target processors, instances.
    MapTask,
    /// Pick a variant for a task already bound to a processor kind.
    SelectTaskVariant,
    /// Post-mapping hook for tasks that requested it.
    PostmapTask,
    /// Rank source instances for a task's copies.
    SelectTaskSources,
    /// Deliver a profiling response for a task.
    ReportTaskProfiling,
    /// Pick the sharding functor for a task in a replicated context.
    SelectTaskShardingFunctor,
    /// Map an inline mapping operation.
    MapInline,
    /// Rank source instances for an inline mapping.
    SelectInlineSources,
    /// Deliver a profiling response for an inline mapping.
    ReportInlineProfiling,
    /// Map an explicit copy operation.
    MapCopy,
    /// Rank source instances for a copy.
    SelectCopySources,
    /// Deliver a profiling response for a copy.
    ReportCopyProfiling,
    /// Pick the sharding functor for a copy.
    SelectCopyShardingFunctor,
    /// Rank source instances for a close operation.
    SelectCloseSources,
    /// Deliver a profiling response for a close.
    ReportCloseProfiling,
    /// Pick the sharding functor for a close.
    SelectCloseShardingFunctor,
    /// Map an acquire operation.
    MapAcquire,
    /// Deliver a profiling response for an acquire.
    ReportAcquireProfiling,
    /// Pick the sharding functor for an acquire.
    SelectAcquireShardingFunctor,
    /// Map a release operation.
    MapRelease,
    /// Rank source instances for a release.
    SelectReleaseSources,
    /// Deliver a profiling response for a release.
    ReportReleaseProfiling,
    /// Pick the sharding functor for a release.
    SelectReleaseShardingFunctor,
    /// Choose the projection for a dependent partition operation.
    SelectPartitionProjection,
    /// Map a dependent partition operation.
    MapPartition,
    /// Rank source instances for a partition operation.
    SelectPartitionSources,
    /// Deliver a profiling response for a partition operation.
    ReportPartitionProfiling,
    /// Pick the sharding functor for a partition operation.
    SelectPartitionShardingFunctor,
    /// Configure the execution context of a newly started task.
    ConfigureContext,
    /// Produce a tunable value requested by the application.
    SelectTunableValue,
    /// Map all tasks of a must-epoch launch together.
    MapMustEpoch,
    /// Map a whole dataflow graph at once.
    MapDataflowGraph,
    /// Decide whether to memoize an operation's mapping.
    MemoizeOperation,
    /// Choose which ready tasks to map now, defer, or relocate.
    SelectTasksToMap,
    /// Choose processors to attempt to steal from.
    SelectStealTargets,
    /// Approve or deny an incoming steal request.
    PermitStealRequest,
    /// Handle a message from a peer policy instance.
    HandleMessage,
    /// Handle a task result broadcast for speculation.
    HandleTaskResult,
    /// Fold a future map into a single future value.
    ReduceFutureMap,
}

impl CallKind {
    /// Returns the stable lowercase name used in logging and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SelectTaskOptions => "select_task_options",
            Self::PremapTask => "premap_task",
            Self::SliceTask => "slice_task",
            Self::MapTask => "map_task",
            Self::SelectTaskVariant => "select_task_variant",
            Self::PostmapTask => "postmap_task",
            Self::SelectTaskSources => "select_task_sources",
            Self::ReportTaskProfiling => "report_task_profiling",
            Self::SelectTaskShardingFunctor => "select_task_sharding_functor",
            Self::MapInline => "map_inline",
            Self::SelectInlineSources => "select_inline_sources",
            Self::ReportInlineProfiling => "report_inline_profiling",
            Self::MapCopy => "map_copy",
            Self::SelectCopySources => "select_copy_sources",
            Self::ReportCopyProfiling => "report_copy_profiling",
            Self::SelectCopyShardingFunctor => "select_copy_sharding_functor",
            Self::SelectCloseSources => "select_close_sources",
            Self::ReportCloseProfiling => "report_close_profiling",
            Self::SelectCloseShardingFunctor => "select_close_sharding_functor",
            Self::MapAcquire => "map_acquire",
            Self::ReportAcquireProfiling => "report_acquire_profiling",
            Self::SelectAcquireShardingFunctor => "select_acquire_sharding_functor",
            Self::MapRelease => "map_release",
            Self::SelectReleaseSources => "select_release_sources",
            Self::ReportReleaseProfiling => "report_release_profiling",
            Self::SelectReleaseShardingFunctor => "select_release_sharding_functor",
            Self::SelectPartitionProjection => "select_partition_projection",
            Self::MapPartition => "map_partition",
            Self::SelectPartitionSources => "select_partition_sources",
            Self::ReportPartitionProfiling => "report_partition_profiling",
            Self::SelectPartitionShardingFunctor => "select_partition_sharding_functor",
            Self::ConfigureContext => "configure_context",
            Self::SelectTunableValue => "select_tunable_value",
            Self::MapMustEpoch => "map_must_epoch",
            Self::MapDataflowGraph => "map_dataflow_graph",
            Self::MemoizeOperation => "memoize_operation",
            Self::SelectTasksToMap => "select_tasks_to_map",
            Self::SelectStealTargets => "select_steal_targets",
            Self::PermitStealRequest => "permit_steal_request",
            Self::HandleMessage => "handle_message",
            Self::HandleTaskResult => "handle_task_result",
            Self::ReduceFutureMap => "reduce_future_map",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The concurrency discipline a policy asks its dispatcher to enforce.
///
/// Queried once when the dispatcher is built; it cannot change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncModel {
    /// At most one call executes at a time. With `reentrant`, a different
    /// call may be admitted while the executing call is paused at a
    /// blocking checkpoint.
    Serialized {
        /// Whether paused calls yield the dispatcher to other calls.
        reentrant: bool,
    },
    /// Calls run fully concurrently; the policy synchronizes its own state
    /// through the dispatcher's voluntary reader/writer lock.
    Concurrent,
}

/// Processor flavors a task variant can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProcessorKind {
    /// Latency-optimized CPU core.
    Cpu = 0,
    /// Throughput-optimized accelerator.
    Gpu = 1,
    /// Runtime utility processor.
    Utility = 2,
    /// I/O processor.
    Io = 3,
    /// OpenMP group processor.
    OpenMp = 4,
    /// Python interpreter processor.
    Python = 5,
    /// A gang of processors scheduled together.
    Group = 6,
}

impl ProcessorKind {
    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Cpu),
            1 => Some(Self::Gpu),
            2 => Some(Self::Utility),
            3 => Some(Self::Io),
            4 => Some(Self::OpenMp),
            5 => Some(Self::Python),
            6 => Some(Self::Group),
            _ => None,
        }
    }
}

/// Memory flavors an instance can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MemoryKind {
    /// Globally visible memory (e.g. GASNet segment).
    Global = 0,
    /// Ordinary host DRAM.
    System = 1,
    /// Pinned host memory registered for RDMA.
    Registered = 2,
    /// NUMA-socket-local host memory.
    Socket = 3,
    /// Host memory mapped into device address space.
    ZeroCopy = 4,
    /// Accelerator framebuffer memory.
    Framebuffer = 5,
    /// Disk-backed memory.
    Disk = 6,
    /// File-backed memory.
    File = 7,
    /// Last-level cache carved out as scratch.
    Cache = 8,
}

impl MemoryKind {
    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Global),
            1 => Some(Self::System),
            2 => Some(Self::Registered),
            3 => Some(Self::Socket),
            4 => Some(Self::ZeroCopy),
            5 => Some(Self::Framebuffer),
            6 => Some(Self::Disk),
            7 => Some(Self::File),
            8 => Some(Self::Cache),
            _ => None,
        }
    }
}

/// A dimension of an index space, as named by ordering and tiling
/// constraints.
///
/// `F` is the field pseudo-dimension: its position in an ordering
/// distinguishes array-of-structs from struct-of-arrays layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DimensionKind {
    /// First spatial dimension.
    X = 0,
    /// Second spatial dimension.
    Y = 1,
    /// Third spatial dimension.
    Z = 2,
    /// Fourth spatial dimension.
    W = 3,
    /// Fifth spatial dimension.
    U = 4,
    /// Sixth spatial dimension.
    V = 5,
    /// The field pseudo-dimension.
    F = 6,
}

impl DimensionKind {
    /// Returns the spatial index of this dimension, or `None` for `F`.
    #[must_use]
    pub const fn spatial_index(self) -> Option<u32> {
        match self {
            Self::X => Some(0),
            Self::Y => Some(1),
            Self::Z => Some(2),
            Self::W => Some(3),
            Self::U => Some(4),
            Self::V => Some(5),
            Self::F => None,
        }
    }

    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            3 => Some(Self::W),
            4 => Some(Self::U),
            5 => Some(Self::V),
            6 => Some(Self::F),
            _ => None,
        }
    }
}

/// Processor-local resources an execution constraint can bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ResourceKind {
    /// Shared scratch memory per gang.
    SharedMemory = 0,
    /// Register file pressure per lane.
    Registers = 1,
    /// Dedicated scratchpad bytes.
    ScratchPad = 2,
    /// Constant-memory bytes.
    ConstantMemory = 3,
}

impl ResourceKind {
    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::SharedMemory),
            1 => Some(Self::Registers),
            2 => Some(Self::ScratchPad),
            3 => Some(Self::ConstantMemory),
            _ => None,
        }
    }
}

/// Launch-geometry axes an execution constraint can pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LaunchKind {
    /// Gang-grid extent along X.
    GridX = 0,
    /// Gang-grid extent along Y.
    GridY = 1,
    /// Gang-grid extent along Z.
    GridZ = 2,
    /// Gang size along X.
    BlockX = 3,
    /// Gang size along Y.
    BlockY = 4,
    /// Gang size along Z.
    BlockZ = 5,
}

impl LaunchKind {
    /// Decodes a wire tag.
    #[must_use]
    pub const fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::GridX),
            1 => Some(Self::GridY),
            2 => Some(Self::GridZ),
            3 => Some(Self::BlockX),
            4 => Some(Self::BlockY),
            5 => Some(Self::BlockZ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_kind_names_are_stable() {
        assert_eq!(CallKind::MapTask.name(), "map_task");
        assert_eq!(CallKind::HandleMessage.to_string(), "handle_message");
    }

    #[test]
    fn wire_tags_round_trip() {
        for tag in 0..=8u8 {
            let kind = MemoryKind::from_wire(tag).unwrap();
            assert_eq!(kind as u8, tag);
        }
        assert!(MemoryKind::from_wire(9).is_none());
        assert!(DimensionKind::from_wire(7).is_none());
        assert!(ProcessorKind::from_wire(7).is_none());
    }
}
