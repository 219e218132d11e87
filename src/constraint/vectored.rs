//! Repeatable constraints: tiling, dimension bounds, alignment, offsets.
//!
//! Unlike the singleton constraints, any number of these may appear in a
//! constraint set. Two entries about *different* dimensions or fields are
//! unrelated: they neither entail nor conflict.

use crate::constraint::bound::{bound_conflicts, bound_entails, decode_bound, encode_bound, BoundOp};
use crate::types::{DimensionKind, FieldId};
use crate::wire::{WireEncode, WireError, WireSink, WireSource};

fn decode_dimension<R: WireSource>(source: &mut R) -> Result<DimensionKind, WireError> {
    let tag = source.get_u8()?;
    DimensionKind::from_wire(tag).ok_or(WireError::BadDiscriminant {
        what: "dimension",
        value: tag,
    })
}

/// Requires a dimension to be tiled with a given tile size or tile count.
///
/// `tiles` selects the interpretation of `value`: the number of tiles when
/// true, the extent of each tile when false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilingConstraint {
    /// The dimension being tiled.
    pub dim: DimensionKind,
    /// Tile extent or tile count, per `tiles`.
    pub value: u64,
    /// Whether `value` counts tiles rather than elements.
    pub tiles: bool,
}

impl TilingConstraint {
    /// Creates a tiling constraint with `value` as the tile extent.
    #[must_use]
    pub const fn new(dim: DimensionKind, value: u64) -> Self {
        Self {
            dim,
            value,
            tiles: false,
        }
    }

    /// True iff satisfying `self` guarantees `other`.
    ///
    /// Tilings carry no partial order: only an identical tiling of the same
    /// dimension is entailed.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self == other
    }

    /// True iff both tile the same dimension differently.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        self.dim == other.dim && (self.value != other.value || self.tiles != other.tiles)
    }
}

impl WireEncode for TilingConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u8(self.dim as u8);
        sink.put_u64(self.value);
        sink.put_bool(self.tiles);
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            dim: decode_dimension(source)?,
            value: source.get_u64()?,
            tiles: source.get_bool()?,
        })
    }
}

/// Bounds the extent of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionConstraint {
    /// The dimension whose extent is bounded.
    pub dim: DimensionKind,
    /// Comparison operator.
    pub op: BoundOp,
    /// Bound value.
    pub value: u64,
}

impl DimensionConstraint {
    /// Creates a dimension-extent bound.
    #[must_use]
    pub const fn new(dim: DimensionKind, op: BoundOp, value: u64) -> Self {
        Self { dim, op, value }
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self.dim == other.dim && bound_entails(self.op, self.value, other.op, other.value)
    }

    /// True iff both bound the same dimension incompatibly.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        self.dim == other.dim && bound_conflicts(self.op, self.value, other.op, other.value)
    }
}

impl WireEncode for DimensionConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u8(self.dim as u8);
        encode_bound(sink, self.op, self.value);
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let dim = decode_dimension(source)?;
        let (op, value) = decode_bound(source)?;
        Ok(Self { dim, op, value })
    }
}

/// Bounds the base-address alignment of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignmentConstraint {
    /// The field whose alignment is bounded.
    pub field: FieldId,
    /// Comparison operator.
    pub op: BoundOp,
    /// Alignment in bytes.
    pub alignment: u64,
}

impl AlignmentConstraint {
    /// Creates an alignment bound for a field.
    #[must_use]
    pub const fn new(field: FieldId, op: BoundOp, alignment: u64) -> Self {
        Self {
            field,
            op,
            alignment,
        }
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self.field == other.field
            && bound_entails(self.op, self.alignment, other.op, other.alignment)
    }

    /// True iff both bound the same field incompatibly.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        self.field == other.field
            && bound_conflicts(self.op, self.alignment, other.op, other.alignment)
    }
}

impl WireEncode for AlignmentConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u32(self.field.0);
        encode_bound(sink, self.op, self.alignment);
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let field = FieldId(source.get_u32()?);
        let (op, alignment) = decode_bound(source)?;
        Ok(Self {
            field,
            op,
            alignment,
        })
    }
}

/// Pins the byte offset of one field from the instance base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetConstraint {
    /// The field being pinned.
    pub field: FieldId,
    /// Byte offset from the instance base.
    pub offset: i64,
}

impl OffsetConstraint {
    /// Creates an offset constraint.
    #[must_use]
    pub const fn new(field: FieldId, offset: i64) -> Self {
        Self { field, offset }
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        self == other
    }

    /// True iff both pin the same field at different offsets.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        self.field == other.field && self.offset != other.offset
    }
}

impl WireEncode for OffsetConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_u32(self.field.0);
        sink.put_i64(self.offset);
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        Ok(Self {
            field: FieldId(source.get_u32()?),
            offset: source.get_i64()?,
        })
    }
}
