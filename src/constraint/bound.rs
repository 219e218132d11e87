//! Numeric-bound relations shared by dimension, alignment, and resource
//! constraints.
//!
//! A bound pairs a comparison operator with a value; entailment and conflict
//! between two bounds are fixed case tables over the operator pair. The
//! tables are deliberately literal: some pairs (notably `!=` against `!=`)
//! are narrower than interval arithmetic would allow, and the runtime's
//! diagnostics depend on those exact answers.

use crate::wire::{WireError, WireSink, WireSource};

/// Comparison operator of a numeric bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BoundOp {
    /// Strictly less than.
    Lt = 0,
    /// Less than or equal.
    Le = 1,
    /// Strictly greater than.
    Gt = 2,
    /// Greater than or equal.
    Ge = 3,
    /// Equal.
    Eq = 4,
    /// Not equal.
    Ne = 5,
}

impl BoundOp {
    /// Decodes a wire tag.
    pub(crate) fn from_wire(tag: u8) -> Result<Self, WireError> {
        match tag {
            0 => Ok(Self::Lt),
            1 => Ok(Self::Le),
            2 => Ok(Self::Gt),
            3 => Ok(Self::Ge),
            4 => Ok(Self::Eq),
            5 => Ok(Self::Ne),
            value => Err(WireError::BadDiscriminant {
                what: "bound op",
                value,
            }),
        }
    }
}

/// True iff satisfying `op1 v1` guarantees `op2 v2`.
///
/// Case table, one arm per operator pair. Pairs absent from a row never
/// entail.
#[must_use]
pub const fn bound_entails(op1: BoundOp, v1: u64, op2: BoundOp, v2: u64) -> bool {
    use BoundOp::{Eq, Ge, Gt, Le, Lt, Ne};
    match (op1, op2) {
        (Lt, Lt | Le) => v1 <= v2,
        (Lt, Ne) => v1 <= v2,
        (Le, Lt) => v1 < v2,
        (Le, Le) => v1 <= v2,
        (Le, Ne) => v1 < v2,
        (Gt, Gt | Ge) => v1 >= v2,
        (Gt, Ne) => v2 <= v1,
        (Ge, Gt) => v1 > v2,
        (Ge, Ge) => v1 >= v2,
        (Ge, Ne) => v2 < v1,
        (Eq, Lt) => v1 < v2,
        (Eq, Le) => v1 <= v2,
        (Eq, Gt) => v1 > v2,
        (Eq, Ge) => v1 >= v2,
        (Eq, Eq) => v1 == v2,
        (Eq, Ne) => v1 != v2,
        (Ne, Ne) => v1 == v2,
        _ => false,
    }
}

/// True iff no value can satisfy both `op1 v1` and `op2 v2`.
///
/// Conservative in the same sense as [`bound_entails`]: a pair is reported
/// as conflicting only when the table says so, not whenever integer
/// reasoning could prove emptiness.
#[must_use]
pub const fn bound_conflicts(op1: BoundOp, v1: u64, op2: BoundOp, v2: u64) -> bool {
    use BoundOp::{Eq, Ge, Gt, Le, Lt, Ne};
    match (op1, op2) {
        (Lt, Gt | Ge) => v2 >= v1,
        (Lt, Eq) => v2 >= v1,
        (Le, Gt) => v2 >= v1,
        (Le, Ge | Eq) => v2 > v1,
        (Gt, Lt | Le) => v2 <= v1,
        (Gt, Eq) => v2 <= v1,
        (Ge, Lt) => v2 <= v1,
        (Ge, Le | Eq) => v2 < v1,
        (Eq, Lt) => v1 >= v2,
        (Eq, Le) => v1 > v2,
        (Eq, Gt) => v1 <= v2,
        (Eq, Ge) => v1 < v2,
        (Eq, Eq) => v1 != v2,
        (Eq, Ne) | (Ne, Eq) => v1 == v2,
        _ => false,
    }
}

pub(crate) fn encode_bound<S: WireSink>(sink: &mut S, op: BoundOp, value: u64) {
    sink.put_u8(op as u8);
    sink.put_u64(value);
}

pub(crate) fn decode_bound<R: WireSource>(source: &mut R) -> Result<(BoundOp, u64), WireError> {
    let op = BoundOp::from_wire(source.get_u8()?)?;
    let value = source.get_u64()?;
    Ok((op, value))
}

#[cfg(test)]
mod tests {
    use super::BoundOp::{Eq, Ge, Gt, Le, Lt, Ne};
    use super::*;

    #[test]
    fn less_than_row() {
        assert!(bound_entails(Lt, 5, Le, 5));
        assert!(bound_entails(Lt, 5, Lt, 5));
        assert!(!bound_entails(Lt, 5, Lt, 4));
        assert!(!bound_entails(Lt, 5, Gt, 1));
        assert!(bound_entails(Lt, 5, Ne, 9));
    }

    #[test]
    fn equality_row() {
        assert!(bound_entails(Eq, 5, Ne, 6));
        assert!(!bound_entails(Eq, 5, Ne, 5));
        assert!(bound_entails(Eq, 5, Le, 5));
        assert!(bound_entails(Eq, 5, Ge, 5));
        assert!(!bound_entails(Eq, 5, Gt, 5));
    }

    #[test]
    fn not_equal_is_narrow() {
        // NE only entails the identical NE; never an interval.
        assert!(bound_entails(Ne, 5, Ne, 5));
        assert!(!bound_entails(Ne, 5, Ne, 6));
        assert!(!bound_entails(Ne, 5, Lt, 100));
    }

    #[test]
    fn reflexive_entailment() {
        for op in [Lt, Le, Gt, Ge, Eq, Ne] {
            assert!(bound_entails(op, 7, op, 7), "{op:?} should entail itself");
        }
    }

    #[test]
    fn conflict_table() {
        assert!(bound_conflicts(Ne, 5, Eq, 5));
        assert!(bound_conflicts(Eq, 5, Ne, 5));
        assert!(!bound_conflicts(Ne, 5, Eq, 6));
        assert!(bound_conflicts(Lt, 5, Gt, 5));
        assert!(!bound_conflicts(Lt, 5, Gt, 3));
        assert!(bound_conflicts(Eq, 3, Eq, 4));
        assert!(bound_conflicts(Le, 2, Ge, 3));
        assert!(!bound_conflicts(Le, 3, Ge, 3));
        assert!(!bound_conflicts(Ne, 5, Ne, 5));
    }

    #[test]
    fn entailing_bounds_never_conflict() {
        for op1 in [Lt, Le, Gt, Ge, Eq, Ne] {
            for op2 in [Lt, Le, Gt, Ge, Eq, Ne] {
                for v1 in [0u64, 1, 5, 9] {
                    for v2 in [0u64, 1, 5, 9] {
                        if bound_entails(op1, v1, op2, v2) {
                            assert!(
                                !bound_conflicts(op1, v1, op2, v2),
                                "{op1:?} {v1} entails {op2:?} {v2} yet conflicts"
                            );
                        }
                    }
                }
            }
        }
    }
}
