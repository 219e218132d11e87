//! Core identifier and kind types for the placement subsystem.

pub mod id;
pub mod kinds;

pub use id::{
    EventId, FieldId, InstanceId, MemoryId, OperationId, ProcessorId, ShardingId, TunableId,
    VariantId,
};
pub use kinds::{
    CallKind, DimensionKind, LaunchKind, MemoryKind, ProcessorKind, ResourceKind, SyncModel,
};
