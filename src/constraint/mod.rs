//! Constraint algebra: pairwise entailment and conflict relations over
//! layout and execution constraints, and their set-level composition.
//!
//! Entailment (`A.entails(B)`: satisfying A guarantees B) and conflict
//! (`A.conflicts(B)`: nothing satisfies both) are computed structurally,
//! with no search. Neither relation is assumed symmetric or anti-symmetric;
//! each kind defines its own tables. Unset constraints are neutral: always
//! entailed, never conflicting.

pub mod bound;
pub mod execution;
pub mod field;
pub mod ordering;
pub mod set;
pub mod singleton;
pub mod specialize;
pub mod vectored;

pub use bound::{bound_conflicts, bound_entails, BoundOp};
pub use execution::{
    ColocationConstraint, LaunchConstraint, ProcessorConstraint, ResourceConstraint,
};
pub use field::FieldConstraint;
pub use ordering::OrderingConstraint;
pub use set::{ConstraintKind, ConstraintRef, ExecutionConstraintSet, LayoutConstraintSet};
pub use singleton::{MemoryConstraint, PaddingConstraint, PointerConstraint, PointerEntry};
pub use specialize::{ReductionOpId, SpecializedConstraint, SpecializedKind};
pub use vectored::{AlignmentConstraint, DimensionConstraint, OffsetConstraint, TilingConstraint};
