//! Algebraic properties of the constraint relations at the crate surface.
//!
//! # Laws Tested
//!
//! - Reflexivity: every well-formed constraint entails itself
//! - Bound tables: the literal operator-pair cases, not interval reasoning
//! - Ordering: subsequence matching with the contiguity run rule
//! - Round trip: decode(encode(S)) == S for layout and execution sets
//! - Diagnostics: singleton mismatches are reported before vectors

use placer::constraint::{
    AlignmentConstraint, BoundOp, ColocationConstraint, ConstraintKind, DimensionConstraint,
    ExecutionConstraintSet, FieldConstraint, LaunchConstraint, LayoutConstraintSet,
    OffsetConstraint, OrderingConstraint, PointerConstraint, ProcessorConstraint,
    ResourceConstraint, SpecializedConstraint, SpecializedKind, TilingConstraint,
};
use placer::constraint::PaddingConstraint;
use placer::types::DimensionKind::{F, X, Y, Z};
use placer::types::{
    FieldId, LaunchKind, MemoryId, MemoryKind, ProcessorKind, ResourceKind,
};
use placer::wire::{WireEncode, WireSource};

fn full_layout() -> LayoutConstraintSet {
    LayoutConstraintSet::new()
        .specialize(SpecializedConstraint::new(
            SpecializedKind::AffineReduction,
            7,
        ))
        .memory(MemoryKind::Framebuffer)
        .order(OrderingConstraint::new(vec![F, X, Y, Z], true))
        .fields(FieldConstraint::new(
            vec![FieldId(4), FieldId(5), FieldId(6)],
            true,
            true,
        ))
        .pointer(PointerConstraint::new(MemoryId::from_raw(3), 0x4000))
        .padding(PaddingConstraint::new(vec![0, 1, -1], vec![0, 1, 2]))
        .tile(TilingConstraint::new(X, 32))
        .tile(TilingConstraint::new(Y, 16))
        .dimension(DimensionConstraint::new(X, BoundOp::Le, 4096))
        .align(AlignmentConstraint::new(FieldId(4), BoundOp::Ge, 64))
        .offset(OffsetConstraint::new(FieldId(5), 8))
}

fn full_execution() -> ExecutionConstraintSet {
    ExecutionConstraintSet::new()
        .processor(ProcessorConstraint::new(ProcessorKind::Gpu))
        .resource(ResourceConstraint::new(
            ResourceKind::SharedMemory,
            BoundOp::Le,
            48 << 10,
        ))
        .launch(LaunchConstraint::new(LaunchKind::BlockX, 256))
        .colocate(ColocationConstraint::new(vec![0, 1], vec![FieldId(4)]))
}

#[test]
fn reflexivity_over_full_sets() {
    let layout = full_layout();
    assert!(layout.entails(&layout, 0));
    assert!(layout.conflicts(&layout, 0).is_none());

    let execution = full_execution();
    assert!(execution.entails(&execution));
    assert!(execution.conflicts(&execution).is_none());
}

#[test]
fn bound_table_spot_checks() {
    use placer::constraint::{bound_conflicts, bound_entails};
    assert!(bound_entails(BoundOp::Lt, 5, BoundOp::Le, 5));
    assert!(!bound_entails(BoundOp::Lt, 5, BoundOp::Lt, 4));
    assert!(bound_entails(BoundOp::Eq, 5, BoundOp::Ne, 6));
    assert!(bound_conflicts(BoundOp::Ne, 5, BoundOp::Eq, 5));
}

#[test]
fn ordering_contiguity_run_rule() {
    let loose = OrderingConstraint::new(vec![X, Y, Z], false);
    let adjacent = OrderingConstraint::new(vec![Y, Z], true);
    assert!(loose.entails(&adjacent, 0));

    let scrambled = OrderingConstraint::new(vec![X, Z, Y], false);
    assert!(!scrambled.entails(&adjacent, 0));
}

#[test]
fn layout_round_trip_with_repeated_entries() {
    let set = full_layout();
    let mut buf = Vec::new();
    set.encode(&mut buf);
    let mut src: &[u8] = &buf;
    let decoded = LayoutConstraintSet::decode(&mut src).expect("well-formed stream");
    assert_eq!(decoded, set);
    assert_eq!(src.remaining(), 0);
}

#[test]
fn empty_layout_round_trip() {
    let set = LayoutConstraintSet::new();
    let mut buf = Vec::new();
    set.encode(&mut buf);
    let mut src: &[u8] = &buf;
    assert_eq!(LayoutConstraintSet::decode(&mut src).unwrap(), set);
}

#[test]
fn execution_round_trip() {
    let set = full_execution();
    let mut buf = Vec::new();
    set.encode(&mut buf);
    let mut src: &[u8] = &buf;
    assert_eq!(ExecutionConstraintSet::decode(&mut src).unwrap(), set);
}

#[test]
fn truncated_stream_is_rejected() {
    let set = full_layout();
    let mut buf = Vec::new();
    set.encode(&mut buf);
    buf.truncate(buf.len() - 1);
    let mut src: &[u8] = &buf;
    assert!(LayoutConstraintSet::decode(&mut src).is_err());
}

#[test]
fn memory_conflict_short_circuits_before_vectors() {
    // The sets also disagree on tilings, but the singleton memory slot must
    // be reported without the vectors being consulted.
    let a = full_layout();
    let mut b = full_layout().tile(TilingConstraint::new(X, 64));
    b.memory = placer::constraint::MemoryConstraint::new(MemoryKind::System);

    let conflict = a.conflicts(&b, 0).expect("sets conflict");
    assert_eq!(conflict.kind, ConstraintKind::Memory);
    assert_eq!(conflict.index, None);
}

#[test]
fn entailment_diagnostics_name_the_unmet_requirement() {
    let weak = LayoutConstraintSet::new().memory(MemoryKind::System);
    let strong = full_layout();
    let failure = weak.entails_explain(&strong, 0).unwrap_err();
    // The first singleton slot that fails is the specialization.
    assert_eq!(failure.kind, ConstraintKind::Specialized);
}
