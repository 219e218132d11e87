//! Identifier types for placement entities.
//!
//! These types provide type-safe identifiers for the entities the placement
//! subsystem talks about: processors, memories, physical instances,
//! operations, fields, and policy events. They are opaque handles minted by
//! the surrounding runtime; this crate never interprets their bit patterns
//! beyond equality, ordering, and hashing.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static EPHEMERAL_EVENT_COUNTER: AtomicU64 = AtomicU64::new(1);

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $short:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) u64);

        impl $name {
            /// Creates an identifier from its raw runtime handle.
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw runtime handle.
            #[must_use]
            pub const fn into_raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($short, "{:x}"), self.0)
            }
        }
    };
}

opaque_id!(
    /// A processor somewhere on the machine.
    ///
    /// Each {policy instance, processor} pair owns exactly one dispatcher;
    /// the processor id also names peer policy instances for messaging.
    ProcessorId,
    "p"
);

opaque_id!(
    /// A physical memory visible to some set of processors.
    MemoryId,
    "m"
);

opaque_id!(
    /// A physical instance backing a region in some memory.
    ///
    /// Instances referenced during a policy call are pinned through the
    /// call context's acquired-instance ledger until released.
    InstanceId,
    "i"
);

opaque_id!(
    /// An operation (task, copy, partition, ...) awaiting placement decisions.
    OperationId,
    "op"
);

/// A field within a region's field space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldId(pub u32);

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({})", self.0)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// An event a policy can create, trigger, and wait on.
///
/// Events are the policy-visible face of the runtime's wait machinery: a
/// policy may defer a decision by creating an event and returning it as a
/// "try again after this" token, then triggering it from another call.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(pub(crate) u64);

impl EventId {
    /// Creates an event id from its raw runtime handle.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw runtime handle.
    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    /// Mints a fresh event id outside the runtime's own allocator.
    ///
    /// Intended for test doubles and request-scoped contexts that need
    /// unique ids without a full runtime.
    #[must_use]
    pub fn new_ephemeral() -> Self {
        Self(EPHEMERAL_EVENT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Names a tunable value a policy can be asked for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TunableId(pub u32);

/// Names a task variant registered with the runtime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariantId(pub u32);

/// Names a sharding functor for index-space operations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShardingId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        let p = ProcessorId::from_raw(0xdead);
        assert_eq!(p.into_raw(), 0xdead);
        assert_eq!(format!("{p}"), "pdead");
        assert_eq!(format!("{p:?}"), "ProcessorId(0xdead)");
    }

    #[test]
    fn ephemeral_events_are_unique() {
        let a = EventId::new_ephemeral();
        let b = EventId::new_ephemeral();
        assert_ne!(a, b);
    }
}
