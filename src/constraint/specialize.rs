//! Specialization constraints.

use crate::wire::{WireEncode, WireError, WireSink, WireSource};

/// Identifier of a reduction operator; zero is the wildcard.
pub type ReductionOpId = u32;

/// Structural specialization of an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpecializedKind {
    /// No specialization required.
    #[default]
    None = 0,
    /// Dense affine layout.
    Affine = 1,
    /// Compact sparse layout.
    Compact = 2,
    /// Affine layout dedicated to a reduction operator.
    AffineReduction = 3,
    /// Compact layout dedicated to a reduction operator.
    CompactReduction = 4,
    /// Virtual instance with no physical backing.
    Virtual = 5,
}

impl SpecializedKind {
    /// Whether this kind carries a reduction operator on the wire.
    #[must_use]
    pub const fn is_reduction(self) -> bool {
        matches!(self, Self::AffineReduction | Self::CompactReduction)
    }

    fn from_wire(tag: u8) -> Result<Self, WireError> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Affine),
            2 => Ok(Self::Compact),
            3 => Ok(Self::AffineReduction),
            4 => Ok(Self::CompactReduction),
            5 => Ok(Self::Virtual),
            value => Err(WireError::BadDiscriminant {
                what: "specialized kind",
                value,
            }),
        }
    }
}

/// Constrains the structural specialization of an instance, the reduction
/// operator it serves, and how much sparsity overhead is tolerable.
///
/// `max_pieces` bounds the number of compact pieces; `max_overhead` bounds
/// the relative space overhead a compact representation may add. Both are
/// upper bounds, so a *smaller* value is the stronger constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecializedConstraint {
    /// Required structural specialization.
    pub kind: SpecializedKind,
    /// Reduction operator; zero accepts any.
    pub redop: ReductionOpId,
    /// Upper bound on compact pieces.
    pub max_pieces: u32,
    /// Upper bound on compact space overhead, in percent.
    pub max_overhead: u32,
}

impl Default for SpecializedConstraint {
    fn default() -> Self {
        Self {
            kind: SpecializedKind::None,
            redop: 0,
            max_pieces: u32::MAX,
            max_overhead: u32::MAX,
        }
    }
}

impl SpecializedConstraint {
    /// Creates a specialization constraint with unbounded resources.
    #[must_use]
    pub fn new(kind: SpecializedKind, redop: ReductionOpId) -> Self {
        Self {
            kind,
            redop,
            ..Self::default()
        }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.kind == SpecializedKind::None
    }

    /// True iff satisfying `self` guarantees `other`.
    ///
    /// Holds when `other` requires no specialization, or when the kinds
    /// match, the reduction operators agree (or `other`'s is the wildcard),
    /// and our resource bounds sit within `other`'s.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        if other.kind == SpecializedKind::None {
            return true;
        }
        self.kind == other.kind
            && (other.redop == 0 || self.redop == other.redop)
            && self.max_pieces <= other.max_pieces
            && self.max_overhead <= other.max_overhead
    }

    /// True iff no instance satisfies both constraints.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        if self.kind == SpecializedKind::None || other.kind == SpecializedKind::None {
            return false;
        }
        if self.kind != other.kind {
            return true;
        }
        self.redop != 0 && other.redop != 0 && self.redop != other.redop
    }
}

impl WireEncode for SpecializedConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u8(self.kind as u8);
        if self.kind.is_reduction() {
            sink.put_u32(self.redop);
        }
        if matches!(
            self.kind,
            SpecializedKind::Compact | SpecializedKind::CompactReduction
        ) {
            sink.put_u32(self.max_pieces);
            sink.put_u32(self.max_overhead);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let kind = SpecializedKind::from_wire(source.get_u8()?)?;
        let redop = if kind.is_reduction() {
            source.get_u32()?
        } else {
            0
        };
        let (max_pieces, max_overhead) = if matches!(
            kind,
            SpecializedKind::Compact | SpecializedKind::CompactReduction
        ) {
            (source.get_u32()?, source.get_u32()?)
        } else {
            (u32::MAX, u32::MAX)
        };
        Ok(Self {
            kind,
            redop,
            max_pieces,
            max_overhead,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anything_entails_the_default() {
        let none = SpecializedConstraint::default();
        let affine = SpecializedConstraint::new(SpecializedKind::Affine, 0);
        assert!(affine.entails(&none));
        assert!(none.entails(&none));
        assert!(!none.entails(&affine));
    }

    #[test]
    fn wildcard_redop_accepts_any() {
        let specific = SpecializedConstraint::new(SpecializedKind::AffineReduction, 7);
        let wildcard = SpecializedConstraint::new(SpecializedKind::AffineReduction, 0);
        assert!(specific.entails(&wildcard));
        assert!(!wildcard.entails(&specific));

        let different = SpecializedConstraint::new(SpecializedKind::AffineReduction, 8);
        assert!(!specific.entails(&different));
        assert!(specific.conflicts(&different));
    }

    #[test]
    fn resource_bounds_must_tighten() {
        let mut tight = SpecializedConstraint::new(SpecializedKind::Compact, 0);
        tight.max_pieces = 4;
        tight.max_overhead = 10;
        let mut loose = tight;
        loose.max_pieces = 8;
        assert!(tight.entails(&loose));
        assert!(!loose.entails(&tight));
    }

    #[test]
    fn kind_mismatch_conflicts() {
        let affine = SpecializedConstraint::new(SpecializedKind::Affine, 0);
        let compact = SpecializedConstraint::new(SpecializedKind::Compact, 0);
        assert!(affine.conflicts(&compact));
        assert!(!affine.conflicts(&SpecializedConstraint::default()));
    }

    #[test]
    fn conditional_fields_on_the_wire() {
        // Affine writes no redop and no bounds: one tag byte only.
        let affine = SpecializedConstraint::new(SpecializedKind::Affine, 0);
        let mut buf = Vec::new();
        affine.encode(&mut buf);
        assert_eq!(buf.len(), 1);

        let mut compact = SpecializedConstraint::new(SpecializedKind::CompactReduction, 9);
        compact.max_pieces = 3;
        compact.max_overhead = 50;
        let mut buf = Vec::new();
        compact.encode(&mut buf);
        assert_eq!(buf.len(), 1 + 4 + 4 + 4);

        let mut src: &[u8] = &buf;
        assert_eq!(SpecializedConstraint::decode(&mut src).unwrap(), compact);
    }
}
