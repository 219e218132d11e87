//! Execution constraints: processor kinds, resources, launch geometry,
//! colocation.

use crate::constraint::bound::{bound_conflicts, bound_entails, decode_bound, encode_bound, BoundOp};
use crate::types::{FieldId, LaunchKind, ProcessorKind, ResourceKind};
use crate::wire::{WireEncode, WireError, WireSink, WireSource};

/// Restricts which processor kinds may run a task variant.
///
/// An empty kind list is the unconstrained default. A non-empty list means
/// "any of these".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProcessorConstraint {
    /// Acceptable processor kinds.
    pub kinds: Vec<ProcessorKind>,
}

impl ProcessorConstraint {
    /// Creates a constraint accepting exactly one processor kind.
    #[must_use]
    pub fn new(kind: ProcessorKind) -> Self {
        Self { kinds: vec![kind] }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.kinds.is_empty()
    }

    /// True iff every processor acceptable to `self` is acceptable to
    /// `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        if other.kinds.is_empty() {
            return true;
        }
        if self.kinds.is_empty() {
            return false;
        }
        self.kinds.iter().all(|k| other.kinds.contains(k))
    }

    /// True iff both restrict kinds and no kind satisfies both.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        !self.kinds.is_empty()
            && !other.kinds.is_empty()
            && self.kinds.iter().all(|k| !other.kinds.contains(k))
    }
}

impl WireEncode for ProcessorConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_len(self.kinds.len());
        for kind in &self.kinds {
            sink.put_u8(*kind as u8);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let len = source.get_len()?;
        let mut kinds = Vec::with_capacity(len);
        for _ in 0..len {
            let tag = source.get_u8()?;
            let kind = ProcessorKind::from_wire(tag).ok_or(WireError::BadDiscriminant {
                what: "processor kind",
                value: tag,
            })?;
            kinds.push(kind);
        }
        Ok(Self { kinds })
    }
}

/// Bounds a processor-local resource a variant consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceConstraint {
    /// The resource being bounded.
    pub resource: ResourceKind,
    /// Comparison operator.
    pub op: BoundOp,
    /// Bound value.
    pub value: u64,
}

impl ResourceConstraint {
    /// Creates a resource bound.
    #[must_use]
    pub const fn new(resource: ResourceKind, op: BoundOp, value: u64) -> Self {
        Self {
            resource,
            op,
            value,
        }
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self.resource == other.resource
            && bound_entails(self.op, self.value, other.op, other.value)
    }

    /// True iff both bound the same resource incompatibly.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        self.resource == other.resource
            && bound_conflicts(self.op, self.value, other.op, other.value)
    }
}

impl WireEncode for ResourceConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u8(self.resource as u8);
        encode_bound(sink, self.op, self.value);
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let tag = source.get_u8()?;
        let resource = ResourceKind::from_wire(tag).ok_or(WireError::BadDiscriminant {
            what: "resource kind",
            value: tag,
        })?;
        let (op, value) = decode_bound(source)?;
        Ok(Self {
            resource,
            op,
            value,
        })
    }
}

/// Pins one axis of a variant's launch geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaunchConstraint {
    /// The axis being pinned.
    pub kind: LaunchKind,
    /// Required extent along that axis.
    pub value: u64,
}

impl LaunchConstraint {
    /// Creates a launch-geometry constraint.
    #[must_use]
    pub const fn new(kind: LaunchKind, value: u64) -> Self {
        Self { kind, value }
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self == other
    }

    /// True iff both pin the same axis to different extents.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value != other.value
    }
}

impl WireEncode for LaunchConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u8(self.kind as u8);
        sink.put_u64(self.value);
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let tag = source.get_u8()?;
        let kind = LaunchKind::from_wire(tag).ok_or(WireError::BadDiscriminant {
            what: "launch kind",
            value: tag,
        })?;
        Ok(Self {
            kind,
            value: source.get_u64()?,
        })
    }
}

/// Requires a group of region requirements to share one physical instance
/// for the named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ColocationConstraint {
    /// Indexes of the region requirements that must colocate.
    pub requirements: Vec<u32>,
    /// The fields that must share an instance.
    pub fields: Vec<FieldId>,
}

impl ColocationConstraint {
    /// Creates a colocation constraint.
    #[must_use]
    pub fn new(requirements: Vec<u32>, fields: Vec<FieldId>) -> Self {
        Self {
            requirements,
            fields,
        }
    }

    /// True iff satisfying `self` guarantees `other`: colocating a superset
    /// of requirements over a superset of fields implies any weaker
    /// grouping.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        other
            .requirements
            .iter()
            .all(|r| self.requirements.contains(r))
            && other.fields.iter().all(|f| self.fields.contains(f))
    }

    /// Colocation groups never make each other unsatisfiable.
    #[must_use]
    pub fn conflicts(&self, _other: &Self) -> bool {
        false
    }
}

impl WireEncode for ColocationConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_len(self.requirements.len());
        for requirement in &self.requirements {
            sink.put_u32(*requirement);
        }
        sink.put_len(self.fields.len());
        for field in &self.fields {
            sink.put_u32(field.0);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let len = source.get_len()?;
        let mut requirements = Vec::with_capacity(len);
        for _ in 0..len {
            requirements.push(source.get_u32()?);
        }
        let len = source.get_len()?;
        let mut fields = Vec::with_capacity(len);
        for _ in 0..len {
            fields.push(FieldId(source.get_u32()?));
        }
        Ok(Self {
            requirements,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_subset_entails() {
        let cpu = ProcessorConstraint::new(ProcessorKind::Cpu);
        let either = ProcessorConstraint {
            kinds: vec![ProcessorKind::Cpu, ProcessorKind::Gpu],
        };
        assert!(cpu.entails(&either));
        assert!(!either.entails(&cpu));
        assert!(!cpu.conflicts(&either));

        let gpu = ProcessorConstraint::new(ProcessorKind::Gpu);
        assert!(cpu.conflicts(&gpu));
    }

    #[test]
    fn resource_bounds() {
        let cap = ResourceConstraint::new(ResourceKind::SharedMemory, BoundOp::Le, 48 << 10);
        let loose = ResourceConstraint::new(ResourceKind::SharedMemory, BoundOp::Le, 64 << 10);
        assert!(cap.entails(&loose));
        assert!(!cap.entails(&ResourceConstraint::new(
            ResourceKind::Registers,
            BoundOp::Le,
            64 << 10
        )));
    }

    #[test]
    fn colocation_superset_entails_and_never_conflicts() {
        let big = ColocationConstraint::new(vec![0, 1, 2], vec![FieldId(1), FieldId(2)]);
        let small = ColocationConstraint::new(vec![0, 2], vec![FieldId(1)]);
        assert!(big.entails(&small));
        assert!(!small.entails(&big));
        assert!(!big.conflicts(&small));
    }

    #[test]
    fn wire_round_trips() {
        let p = ProcessorConstraint {
            kinds: vec![ProcessorKind::Gpu, ProcessorKind::OpenMp],
        };
        let r = ResourceConstraint::new(ResourceKind::ScratchPad, BoundOp::Lt, 1024);
        let l = LaunchConstraint::new(LaunchKind::BlockX, 256);
        let c = ColocationConstraint::new(vec![3], vec![FieldId(9)]);

        let mut buf = Vec::new();
        p.encode(&mut buf);
        r.encode(&mut buf);
        l.encode(&mut buf);
        c.encode(&mut buf);

        let mut src: &[u8] = &buf;
        assert_eq!(ProcessorConstraint::decode(&mut src).unwrap(), p);
        assert_eq!(ResourceConstraint::decode(&mut src).unwrap(), r);
        assert_eq!(LaunchConstraint::decode(&mut src).unwrap(), l);
        assert_eq!(ColocationConstraint::decode(&mut src).unwrap(), c);
        assert_eq!(src.remaining(), 0);
    }
}
