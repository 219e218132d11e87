//! Constraint sets: whole-layout and whole-execution aggregates.
//!
//! A set holds one slot per singleton constraint kind (defaulting to
//! unconstrained) plus ordered vectors of repeatable constraints. The
//! set-level relations compose the per-kind relations:
//!
//! - `entails` checks singleton slots first and fails fast on the first
//!   mismatch, then requires for every repeatable entry of the other set at
//!   least one own entry that entails it (existential matching);
//! - `conflicts` checks singleton slots first, then tests every own-vector
//!   entry against every other-vector entry.
//!
//! The singleton-first order is load-bearing: diagnostics name the *first*
//! failing sub-constraint, and callers rely on singleton mismatches being
//! reported without the vectors ever being scanned.

use smallvec::SmallVec;

use crate::constraint::execution::{
    ColocationConstraint, LaunchConstraint, ProcessorConstraint, ResourceConstraint,
};
use crate::constraint::field::FieldConstraint;
use crate::constraint::ordering::OrderingConstraint;
use crate::constraint::singleton::{MemoryConstraint, PaddingConstraint, PointerConstraint};
use crate::constraint::specialize::SpecializedConstraint;
use crate::constraint::vectored::{
    AlignmentConstraint, DimensionConstraint, OffsetConstraint, TilingConstraint,
};
use crate::types::MemoryKind;
use crate::wire::{WireEncode, WireError, WireSink, WireSource};
use core::fmt;

/// Names a constraint kind inside a set, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Specialization slot.
    Specialized,
    /// Memory-kind slot.
    Memory,
    /// Dimension-ordering slot.
    Ordering,
    /// Field-set slot.
    Field,
    /// Pointer slot.
    Pointer,
    /// Padding slot.
    Padding,
    /// Tiling vector.
    Tiling,
    /// Dimension-bound vector.
    Dimension,
    /// Alignment vector.
    Alignment,
    /// Offset vector.
    Offset,
    /// Processor slot.
    Processor,
    /// Resource vector.
    Resource,
    /// Launch vector.
    Launch,
    /// Colocation vector.
    Colocation,
}

/// Points at one sub-constraint of a set.
///
/// `index` is `None` for singleton slots and the position within the other
/// set's vector for repeatable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRef {
    /// Which constraint kind.
    pub kind: ConstraintKind,
    /// Position within the vector, for repeatable kinds.
    pub index: Option<usize>,
}

impl ConstraintRef {
    const fn slot(kind: ConstraintKind) -> Self {
        Self { kind, index: None }
    }

    const fn entry(kind: ConstraintKind, index: usize) -> Self {
        Self {
            kind,
            index: Some(index),
        }
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{:?}[{index}]", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// For every entry in `theirs`, some entry in `ours` must entail it.
fn entails_existential<T>(
    ours: &[T],
    theirs: &[T],
    kind: ConstraintKind,
    entails: impl Fn(&T, &T) -> bool,
) -> Result<(), ConstraintRef> {
    for (index, needed) in theirs.iter().enumerate() {
        if !ours.iter().any(|own| entails(own, needed)) {
            return Err(ConstraintRef::entry(kind, index));
        }
    }
    Ok(())
}

/// Any pairwise conflict fails the whole set.
fn conflicts_pairwise<T>(
    ours: &[T],
    theirs: &[T],
    kind: ConstraintKind,
    conflicts: impl Fn(&T, &T) -> bool,
) -> Option<ConstraintRef> {
    for (index, other) in theirs.iter().enumerate() {
        if ours.iter().any(|own| conflicts(own, other)) {
            return Some(ConstraintRef::entry(kind, index));
        }
    }
    None
}

/// The full set of constraints describing an acceptable physical instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutConstraintSet {
    /// Specialization slot.
    pub specialized: SpecializedConstraint,
    /// Memory-kind slot.
    pub memory: MemoryConstraint,
    /// Dimension-ordering slot.
    pub ordering: OrderingConstraint,
    /// Field-set slot.
    pub field: FieldConstraint,
    /// Pointer slot.
    pub pointer: PointerConstraint,
    /// Padding slot.
    pub padding: PaddingConstraint,
    /// Tiling entries.
    pub tilings: SmallVec<[TilingConstraint; 2]>,
    /// Dimension-bound entries.
    pub dimensions: SmallVec<[DimensionConstraint; 2]>,
    /// Alignment entries.
    pub alignments: SmallVec<[AlignmentConstraint; 2]>,
    /// Offset entries.
    pub offsets: SmallVec<[OffsetConstraint; 2]>,
}

impl LayoutConstraintSet {
    /// Creates an empty (fully unconstrained) set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the specialization slot.
    #[must_use]
    pub fn specialize(mut self, constraint: SpecializedConstraint) -> Self {
        self.specialized = constraint;
        self
    }

    /// Sets the memory-kind slot.
    #[must_use]
    pub fn memory(mut self, kind: MemoryKind) -> Self {
        self.memory = MemoryConstraint::new(kind);
        self
    }

    /// Sets the ordering slot.
    #[must_use]
    pub fn order(mut self, constraint: OrderingConstraint) -> Self {
        self.ordering = constraint;
        self
    }

    /// Sets the field slot.
    #[must_use]
    pub fn fields(mut self, constraint: FieldConstraint) -> Self {
        self.field = constraint;
        self
    }

    /// Sets the pointer slot.
    #[must_use]
    pub fn pointer(mut self, constraint: PointerConstraint) -> Self {
        self.pointer = constraint;
        self
    }

    /// Sets the padding slot.
    #[must_use]
    pub fn padding(mut self, constraint: PaddingConstraint) -> Self {
        self.padding = constraint;
        self
    }

    /// Appends a tiling entry.
    #[must_use]
    pub fn tile(mut self, constraint: TilingConstraint) -> Self {
        self.tilings.push(constraint);
        self
    }

    /// Appends a dimension-bound entry.
    #[must_use]
    pub fn dimension(mut self, constraint: DimensionConstraint) -> Self {
        self.dimensions.push(constraint);
        self
    }

    /// Appends an alignment entry.
    #[must_use]
    pub fn align(mut self, constraint: AlignmentConstraint) -> Self {
        self.alignments.push(constraint);
        self
    }

    /// Appends an offset entry.
    #[must_use]
    pub fn offset(mut self, constraint: OffsetConstraint) -> Self {
        self.offsets.push(constraint);
        self
    }

    /// True iff any instance satisfying `self` also satisfies `other`.
    ///
    /// `total_dims` filters ordering elements naming dimensions an instance
    /// of that dimensionality does not have; zero disables filtering.
    #[must_use]
    pub fn entails(&self, other: &Self, total_dims: u32) -> bool {
        self.entails_explain(other, total_dims).is_ok()
    }

    /// [`entails`](Self::entails), reporting the first requirement of
    /// `other` this set fails to guarantee.
    pub fn entails_explain(&self, other: &Self, total_dims: u32) -> Result<(), ConstraintRef> {
        if !self.specialized.entails(&other.specialized) {
            return Err(ConstraintRef::slot(ConstraintKind::Specialized));
        }
        if !self.memory.entails(&other.memory) {
            return Err(ConstraintRef::slot(ConstraintKind::Memory));
        }
        if !self.ordering.entails(&other.ordering, total_dims) {
            return Err(ConstraintRef::slot(ConstraintKind::Ordering));
        }
        if !self.field.entails(&other.field) {
            return Err(ConstraintRef::slot(ConstraintKind::Field));
        }
        if !self.pointer.entails(&other.pointer) {
            return Err(ConstraintRef::slot(ConstraintKind::Pointer));
        }
        if !self.padding.entails(&other.padding) {
            return Err(ConstraintRef::slot(ConstraintKind::Padding));
        }
        entails_existential(
            &self.tilings,
            &other.tilings,
            ConstraintKind::Tiling,
            TilingConstraint::entails,
        )?;
        entails_existential(
            &self.dimensions,
            &other.dimensions,
            ConstraintKind::Dimension,
            DimensionConstraint::entails,
        )?;
        entails_existential(
            &self.alignments,
            &other.alignments,
            ConstraintKind::Alignment,
            AlignmentConstraint::entails,
        )?;
        entails_existential(
            &self.offsets,
            &other.offsets,
            ConstraintKind::Offset,
            OffsetConstraint::entails,
        )
    }

    /// True iff no instance can satisfy both sets; reports the first
    /// offending sub-constraint of `other`.
    ///
    /// Singleton slots are compared before any repeatable vector is
    /// scanned.
    #[must_use]
    pub fn conflicts(&self, other: &Self, total_dims: u32) -> Option<ConstraintRef> {
        if self.specialized.conflicts(&other.specialized) {
            return Some(ConstraintRef::slot(ConstraintKind::Specialized));
        }
        if self.memory.conflicts(&other.memory) {
            return Some(ConstraintRef::slot(ConstraintKind::Memory));
        }
        if self.ordering.conflicts(&other.ordering, total_dims) {
            return Some(ConstraintRef::slot(ConstraintKind::Ordering));
        }
        if self.field.conflicts(&other.field) {
            return Some(ConstraintRef::slot(ConstraintKind::Field));
        }
        if self.pointer.conflicts(&other.pointer) {
            return Some(ConstraintRef::slot(ConstraintKind::Pointer));
        }
        if self.padding.conflicts(&other.padding) {
            return Some(ConstraintRef::slot(ConstraintKind::Padding));
        }
        conflicts_pairwise(
            &self.tilings,
            &other.tilings,
            ConstraintKind::Tiling,
            TilingConstraint::conflicts,
        )
        .or_else(|| {
            conflicts_pairwise(
                &self.dimensions,
                &other.dimensions,
                ConstraintKind::Dimension,
                DimensionConstraint::conflicts,
            )
        })
        .or_else(|| {
            conflicts_pairwise(
                &self.alignments,
                &other.alignments,
                ConstraintKind::Alignment,
                AlignmentConstraint::conflicts,
            )
        })
        .or_else(|| {
            conflicts_pairwise(
                &self.offsets,
                &other.offsets,
                ConstraintKind::Offset,
                OffsetConstraint::conflicts,
            )
        })
    }
}

impl WireEncode for LayoutConstraintSet {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        self.specialized.encode(sink);
        self.memory.encode(sink);
        self.ordering.encode(sink);
        self.field.encode(sink);
        self.pointer.encode(sink);
        self.padding.encode(sink);
        sink.put_len(self.tilings.len());
        for entry in &self.tilings {
            entry.encode(sink);
        }
        sink.put_len(self.dimensions.len());
        for entry in &self.dimensions {
            entry.encode(sink);
        }
        sink.put_len(self.alignments.len());
        for entry in &self.alignments {
            entry.encode(sink);
        }
        sink.put_len(self.offsets.len());
        for entry in &self.offsets {
            entry.encode(sink);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let specialized = SpecializedConstraint::decode(source)?;
        let memory = MemoryConstraint::decode(source)?;
        let ordering = OrderingConstraint::decode(source)?;
        let field = FieldConstraint::decode(source)?;
        let pointer = PointerConstraint::decode(source)?;
        let padding = PaddingConstraint::decode(source)?;

        let mut tilings = SmallVec::new();
        for _ in 0..source.get_len()? {
            tilings.push(TilingConstraint::decode(source)?);
        }
        let mut dimensions = SmallVec::new();
        for _ in 0..source.get_len()? {
            dimensions.push(DimensionConstraint::decode(source)?);
        }
        let mut alignments = SmallVec::new();
        for _ in 0..source.get_len()? {
            alignments.push(AlignmentConstraint::decode(source)?);
        }
        let mut offsets = SmallVec::new();
        for _ in 0..source.get_len()? {
            offsets.push(OffsetConstraint::decode(source)?);
        }
        Ok(Self {
            specialized,
            memory,
            ordering,
            field,
            pointer,
            padding,
            tilings,
            dimensions,
            alignments,
            offsets,
        })
    }
}

/// The full set of constraints describing an acceptable execution target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionConstraintSet {
    /// Processor slot.
    pub processor: ProcessorConstraint,
    /// Resource-bound entries.
    pub resources: SmallVec<[ResourceConstraint; 2]>,
    /// Launch-geometry entries.
    pub launches: SmallVec<[LaunchConstraint; 2]>,
    /// Colocation entries.
    pub colocations: SmallVec<[ColocationConstraint; 1]>,
}

impl ExecutionConstraintSet {
    /// Creates an empty (fully unconstrained) set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the processor slot.
    #[must_use]
    pub fn processor(mut self, constraint: ProcessorConstraint) -> Self {
        self.processor = constraint;
        self
    }

    /// Appends a resource bound.
    #[must_use]
    pub fn resource(mut self, constraint: ResourceConstraint) -> Self {
        self.resources.push(constraint);
        self
    }

    /// Appends a launch-geometry entry.
    #[must_use]
    pub fn launch(mut self, constraint: LaunchConstraint) -> Self {
        self.launches.push(constraint);
        self
    }

    /// Appends a colocation entry.
    #[must_use]
    pub fn colocate(mut self, constraint: ColocationConstraint) -> Self {
        self.colocations.push(constraint);
        self
    }

    /// True iff any target satisfying `self` also satisfies `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self.entails_explain(other).is_ok()
    }

    /// [`entails`](Self::entails), reporting the first requirement of
    /// `other` this set fails to guarantee.
    pub fn entails_explain(&self, other: &Self) -> Result<(), ConstraintRef> {
        if !self.processor.entails(&other.processor) {
            return Err(ConstraintRef::slot(ConstraintKind::Processor));
        }
        entails_existential(
            &self.resources,
            &other.resources,
            ConstraintKind::Resource,
            ResourceConstraint::entails,
        )?;
        entails_existential(
            &self.launches,
            &other.launches,
            ConstraintKind::Launch,
            LaunchConstraint::entails,
        )?;
        entails_existential(
            &self.colocations,
            &other.colocations,
            ConstraintKind::Colocation,
            ColocationConstraint::entails,
        )
    }

    /// True iff no target can satisfy both sets; reports the first
    /// offending sub-constraint of `other`.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> Option<ConstraintRef> {
        if self.processor.conflicts(&other.processor) {
            return Some(ConstraintRef::slot(ConstraintKind::Processor));
        }
        conflicts_pairwise(
            &self.resources,
            &other.resources,
            ConstraintKind::Resource,
            ResourceConstraint::conflicts,
        )
        .or_else(|| {
            conflicts_pairwise(
                &self.launches,
                &other.launches,
                ConstraintKind::Launch,
                LaunchConstraint::conflicts,
            )
        })
    }
}

impl WireEncode for ExecutionConstraintSet {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        self.processor.encode(sink);
        sink.put_len(self.resources.len());
        for entry in &self.resources {
            entry.encode(sink);
        }
        sink.put_len(self.launches.len());
        for entry in &self.launches {
            entry.encode(sink);
        }
        sink.put_len(self.colocations.len());
        for entry in &self.colocations {
            entry.encode(sink);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let processor = ProcessorConstraint::decode(source)?;
        let mut resources = SmallVec::new();
        for _ in 0..source.get_len()? {
            resources.push(ResourceConstraint::decode(source)?);
        }
        let mut launches = SmallVec::new();
        for _ in 0..source.get_len()? {
            launches.push(LaunchConstraint::decode(source)?);
        }
        let mut colocations = SmallVec::new();
        for _ in 0..source.get_len()? {
            colocations.push(ColocationConstraint::decode(source)?);
        }
        Ok(Self {
            processor,
            resources,
            launches,
            colocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::bound::BoundOp;
    use crate::types::DimensionKind::{X, Y, Z};
    use crate::types::FieldId;

    fn sample_layout() -> LayoutConstraintSet {
        LayoutConstraintSet::new()
            .memory(MemoryKind::System)
            .order(OrderingConstraint::new(vec![X, Y, Z], false))
            .fields(FieldConstraint::new(
                vec![FieldId(1), FieldId(2)],
                false,
                true,
            ))
            .tile(TilingConstraint::new(X, 32))
            .dimension(DimensionConstraint::new(Y, BoundOp::Le, 1024))
            .align(AlignmentConstraint::new(FieldId(1), BoundOp::Ge, 16))
    }

    #[test]
    fn reflexive_entailment() {
        let set = sample_layout();
        assert!(set.entails(&set, 0));
        assert!(set.conflicts(&set, 0).is_none());
    }

    #[test]
    fn singleton_mismatch_reported_before_vectors() {
        let a = sample_layout();
        // Differs in the memory singleton AND carries a conflicting tiling;
        // the memory slot must be reported and the vectors never scanned.
        let b = sample_layout()
            .memory(MemoryKind::Framebuffer)
            .tile(TilingConstraint::new(X, 64));

        let conflict = a.conflicts(&b, 0).expect("sets must conflict");
        assert_eq!(conflict.kind, ConstraintKind::Memory);
        assert_eq!(conflict.index, None);
    }

    #[test]
    fn existential_matching_over_vectors() {
        let have = LayoutConstraintSet::new()
            .dimension(DimensionConstraint::new(X, BoundOp::Eq, 64))
            .dimension(DimensionConstraint::new(Y, BoundOp::Lt, 100));
        let want =
            LayoutConstraintSet::new().dimension(DimensionConstraint::new(Y, BoundOp::Le, 100));
        assert!(have.entails(&want, 0));

        let unmet =
            LayoutConstraintSet::new().dimension(DimensionConstraint::new(Z, BoundOp::Le, 10));
        let failure = have.entails_explain(&unmet, 0).unwrap_err();
        assert_eq!(failure.kind, ConstraintKind::Dimension);
        assert_eq!(failure.index, Some(0));
    }

    #[test]
    fn vector_conflicts_are_pairwise() {
        let a = LayoutConstraintSet::new().tile(TilingConstraint::new(X, 32));
        let b = LayoutConstraintSet::new()
            .tile(TilingConstraint::new(Y, 8))
            .tile(TilingConstraint::new(X, 16));
        let conflict = a.conflicts(&b, 0).expect("tilings conflict");
        assert_eq!(conflict.kind, ConstraintKind::Tiling);
        assert_eq!(conflict.index, Some(1));
    }

    #[test]
    fn empty_set_round_trip() {
        let empty = LayoutConstraintSet::new();
        let mut buf = Vec::new();
        empty.encode(&mut buf);
        let mut src: &[u8] = &buf;
        assert_eq!(LayoutConstraintSet::decode(&mut src).unwrap(), empty);
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn populated_set_round_trip() {
        let set = sample_layout()
            .pointer(PointerConstraint::new(
                crate::types::MemoryId::from_raw(5),
                64,
            ))
            .padding(PaddingConstraint::new(vec![1, -1], vec![0, 0]))
            .offset(OffsetConstraint::new(FieldId(2), 128))
            .offset(OffsetConstraint::new(FieldId(1), 0));
        let mut buf = Vec::new();
        set.encode(&mut buf);
        let mut src: &[u8] = &buf;
        assert_eq!(LayoutConstraintSet::decode(&mut src).unwrap(), set);
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn execution_set_relations_and_round_trip() {
        let cpu_only = ExecutionConstraintSet::new()
            .processor(ProcessorConstraint::new(crate::types::ProcessorKind::Cpu))
            .resource(ResourceConstraint::new(
                crate::types::ResourceKind::SharedMemory,
                BoundOp::Le,
                48 << 10,
            ));
        let anywhere = ExecutionConstraintSet::new();
        assert!(cpu_only.entails(&anywhere));
        assert!(!anywhere.entails(&cpu_only));

        let gpu_only = ExecutionConstraintSet::new()
            .processor(ProcessorConstraint::new(crate::types::ProcessorKind::Gpu));
        let conflict = cpu_only.conflicts(&gpu_only).expect("kinds conflict");
        assert_eq!(conflict.kind, ConstraintKind::Processor);

        let mut buf = Vec::new();
        cpu_only.encode(&mut buf);
        let mut src: &[u8] = &buf;
        assert_eq!(ExecutionConstraintSet::decode(&mut src).unwrap(), cpu_only);
    }

    #[test]
    fn unconstrained_defaults_are_neutral() {
        let empty = LayoutConstraintSet::new();
        let full = sample_layout();
        // Absent constraints are always entailed and never conflict.
        assert!(full.entails(&empty, 0));
        assert!(empty.conflicts(&full, 0).is_none());
        assert!(!empty.entails(&full, 0));
    }
}
