//! Dimension-ordering constraints.

use crate::types::DimensionKind;
use crate::wire::{WireEncode, WireError, WireSink, WireSource};

/// Declares the traversal order of an instance's dimensions.
///
/// The order lists dimensions from innermost (fastest varying) to outermost.
/// Placing [`DimensionKind::F`] first yields struct-of-arrays; placing it
/// last yields array-of-structs. `contiguous` additionally requires that the
/// listed dimensions are laid out with no padding between consecutive
/// elements.
///
/// An empty order is the unconstrained default: it is entailed by anything
/// and conflicts with nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OrderingConstraint {
    /// Innermost-to-outermost dimension order.
    pub order: Vec<DimensionKind>,
    /// Whether the listed dimensions must be unbroken in memory.
    pub contiguous: bool,
}

/// Dimensions at or above `total_dims` cannot occur in an instance of that
/// dimensionality, so entailment and conflict checks skip them. The field
/// pseudo-dimension is always kept. `total_dims == 0` disables filtering.
fn skip_dim(dim: DimensionKind, total_dims: u32) -> bool {
    if total_dims == 0 {
        return false;
    }
    match dim.spatial_index() {
        Some(index) => index >= total_dims,
        None => false,
    }
}

impl OrderingConstraint {
    /// Creates an ordering constraint.
    #[must_use]
    pub fn new(order: Vec<DimensionKind>, contiguous: bool) -> Self {
        Self { order, contiguous }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.order.is_empty()
    }

    /// True iff any order satisfying `self` also satisfies `other`.
    ///
    /// Every dimension named by `other` must appear in `self` in the same
    /// relative order; when `other` requires contiguity, the matched
    /// positions in `self` must form one unbroken run. `total_dims` filters
    /// trailing spatial dimensions an instance of that dimensionality does
    /// not have.
    #[must_use]
    pub fn entails(&self, other: &Self, total_dims: u32) -> bool {
        let needed: Vec<DimensionKind> = other
            .order
            .iter()
            .copied()
            .filter(|&d| !skip_dim(d, total_dims))
            .collect();
        if needed.is_empty() {
            return true;
        }
        let have: Vec<DimensionKind> = self
            .order
            .iter()
            .copied()
            .filter(|&d| !skip_dim(d, total_dims))
            .collect();

        let mut previous: Option<usize> = None;
        for dim in needed {
            let Some(position) = have.iter().position(|&d| d == dim) else {
                return false;
            };
            if let Some(prev) = previous {
                if position <= prev {
                    return false;
                }
                if other.contiguous && position != prev + 1 {
                    return false;
                }
            }
            previous = Some(position);
        }
        true
    }

    /// True iff no dimension order can satisfy both constraints.
    ///
    /// Two orderings conflict when some pair of dimensions named by both
    /// appears in opposite relative order.
    #[must_use]
    pub fn conflicts(&self, other: &Self, total_dims: u32) -> bool {
        if self.order.is_empty() || other.order.is_empty() {
            return false;
        }
        let ours: Vec<DimensionKind> = self
            .order
            .iter()
            .copied()
            .filter(|&d| !skip_dim(d, total_dims))
            .collect();
        let theirs: Vec<DimensionKind> = other
            .order
            .iter()
            .copied()
            .filter(|&d| !skip_dim(d, total_dims))
            .collect();

        for (i, &a) in theirs.iter().enumerate() {
            for &b in &theirs[i + 1..] {
                let (Some(pa), Some(pb)) = (
                    ours.iter().position(|&d| d == a),
                    ours.iter().position(|&d| d == b),
                ) else {
                    continue;
                };
                if pa > pb {
                    return true;
                }
            }
        }
        false
    }
}

impl WireEncode for OrderingConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_bool(self.contiguous);
        sink.put_len(self.order.len());
        for dim in &self.order {
            sink.put_u8(*dim as u8);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let contiguous = source.get_bool()?;
        let len = source.get_len()?;
        let mut order = Vec::with_capacity(len);
        for _ in 0..len {
            let tag = source.get_u8()?;
            let dim = DimensionKind::from_wire(tag).ok_or(WireError::BadDiscriminant {
                what: "dimension",
                value: tag,
            })?;
            order.push(dim);
        }
        Ok(Self { order, contiguous })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DimensionKind::{F, X, Y, Z};

    #[test]
    fn subsequence_entails() {
        let full = OrderingConstraint::new(vec![X, Y, Z], false);
        let tail = OrderingConstraint::new(vec![Y, Z], true);
        // Y and Z are adjacent and in order, so contiguity is satisfied.
        assert!(full.entails(&tail, 0));

        let scrambled = OrderingConstraint::new(vec![X, Z, Y], false);
        assert!(!scrambled.entails(&tail, 0));
    }

    #[test]
    fn contiguity_requires_an_unbroken_run() {
        let full = OrderingConstraint::new(vec![X, Y, Z], false);
        let gapped = OrderingConstraint::new(vec![X, Z], true);
        assert!(!full.entails(&gapped, 0));
        let loose = OrderingConstraint::new(vec![X, Z], false);
        assert!(full.entails(&loose, 0));
    }

    #[test]
    fn reflexive() {
        let c = OrderingConstraint::new(vec![F, X, Y], true);
        assert!(c.entails(&c, 0));
        assert!(!c.conflicts(&c, 0));
    }

    #[test]
    fn total_dims_drops_unused_trailing_dims() {
        // A 1-D instance has no Y; requiring [X, Y] degenerates to [X].
        let have = OrderingConstraint::new(vec![F, X], false);
        let want = OrderingConstraint::new(vec![X, Y], false);
        assert!(!have.entails(&want, 0));
        assert!(have.entails(&want, 1));
    }

    #[test]
    fn opposite_orders_conflict() {
        let a = OrderingConstraint::new(vec![X, Y], false);
        let b = OrderingConstraint::new(vec![Y, X], false);
        assert!(a.conflicts(&b, 0));
        assert!(b.conflicts(&a, 0));

        let disjoint = OrderingConstraint::new(vec![Z, F], false);
        assert!(!a.conflicts(&disjoint, 0));
    }

    #[test]
    fn unconstrained_is_neutral() {
        let none = OrderingConstraint::default();
        let some = OrderingConstraint::new(vec![X, Y], true);
        assert!(some.entails(&none, 0));
        assert!(!none.entails(&some, 0));
        assert!(!none.conflicts(&some, 0));
    }

    #[test]
    fn wire_round_trip() {
        let c = OrderingConstraint::new(vec![F, X, Y, Z], true);
        let mut buf = Vec::new();
        c.encode(&mut buf);
        let mut src: &[u8] = &buf;
        assert_eq!(OrderingConstraint::decode(&mut src).unwrap(), c);
        assert_eq!(src.remaining(), 0);
    }
}
