//! Memory-kind, pointer, and padding constraints.
//!
//! These are the simplest singleton constraints: direct equality or bound
//! checks, where the unset state entails everything it is asked nothing of
//! and never conflicts.

use crate::types::{MemoryId, MemoryKind};
use crate::wire::{WireEncode, WireError, WireSink, WireSource};

/// Pins the kind of memory an instance must live in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MemoryConstraint {
    /// Required memory kind, or `None` for unconstrained.
    pub kind: Option<MemoryKind>,
}

impl MemoryConstraint {
    /// Creates a constraint requiring the given memory kind.
    #[must_use]
    pub const fn new(kind: MemoryKind) -> Self {
        Self { kind: Some(kind) }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.kind.is_none()
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        match other.kind {
            None => true,
            Some(required) => self.kind == Some(required),
        }
    }

    /// True iff both pin different kinds.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        matches!((self.kind, other.kind), (Some(a), Some(b)) if a != b)
    }
}

impl WireEncode for MemoryConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        match self.kind {
            None => sink.put_bool(false),
            Some(kind) => {
                sink.put_bool(true);
                sink.put_u8(kind as u8);
            }
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        if !source.get_bool()? {
            return Ok(Self::default());
        }
        let tag = source.get_u8()?;
        let kind = MemoryKind::from_wire(tag).ok_or(WireError::BadDiscriminant {
            what: "memory kind",
            value: tag,
        })?;
        Ok(Self { kind: Some(kind) })
    }
}

/// Pins an instance to an exact base address in an exact memory.
///
/// Used when application code hands the runtime pre-allocated buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PointerConstraint {
    /// The required placement, or `None` for unconstrained.
    pub entry: Option<PointerEntry>,
}

/// The memory and address a pointer constraint pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerEntry {
    /// Memory holding the buffer.
    pub memory: MemoryId,
    /// Base address within that memory.
    pub address: u64,
}

impl PointerConstraint {
    /// Creates a constraint pinning the given address.
    #[must_use]
    pub const fn new(memory: MemoryId, address: u64) -> Self {
        Self {
            entry: Some(PointerEntry { memory, address }),
        }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.entry.is_none()
    }

    /// True iff satisfying `self` guarantees `other`.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        match other.entry {
            None => true,
            Some(required) => self.entry == Some(required),
        }
    }

    /// True iff both pin different placements.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        matches!((self.entry, other.entry), (Some(a), Some(b)) if a != b)
    }
}

impl WireEncode for PointerConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        match self.entry {
            None => sink.put_bool(false),
            Some(entry) => {
                sink.put_bool(true);
                sink.put_u64(entry.memory.into_raw());
                sink.put_u64(entry.address);
            }
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        if !source.get_bool()? {
            return Ok(Self::default());
        }
        let memory = MemoryId::from_raw(source.get_u64()?);
        let address = source.get_u64()?;
        Ok(Self::new(memory, address))
    }
}

/// Requires padding elements around an instance's bounds, per dimension.
///
/// A negative delta leaves that side of that dimension unspecified. An empty
/// constraint (no dimensions) is the unconstrained default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PaddingConstraint {
    /// Padding below the lower bound, per dimension.
    pub lo: Vec<i64>,
    /// Padding above the upper bound, per dimension.
    pub hi: Vec<i64>,
}

impl PaddingConstraint {
    /// Creates a padding constraint. `lo` and `hi` must be the same length.
    #[must_use]
    pub fn new(lo: Vec<i64>, hi: Vec<i64>) -> Self {
        debug_assert_eq!(lo.len(), hi.len(), "padding deltas must cover equal dims");
        Self { lo, hi }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.lo.is_empty()
    }

    /// True iff satisfying `self` guarantees `other`.
    ///
    /// Requires matching dimensionality; each delta `other` specifies must
    /// be matched exactly, while its negative (unspecified) deltas accept
    /// anything.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        if other.is_unconstrained() {
            return true;
        }
        if self.lo.len() != other.lo.len() {
            return false;
        }
        let sides = [(&self.lo, &other.lo), (&self.hi, &other.hi)];
        sides.iter().all(|(ours, theirs)| {
            ours.iter()
                .zip(theirs.iter())
                .all(|(&mine, &required)| required < 0 || mine == required)
        })
    }

    /// True iff both specify a delta for the same side of the same
    /// dimension with different values.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        if self.is_unconstrained() || other.is_unconstrained() {
            return false;
        }
        if self.lo.len() != other.lo.len() {
            return true;
        }
        let sides = [(&self.lo, &other.lo), (&self.hi, &other.hi)];
        sides.iter().any(|(ours, theirs)| {
            ours.iter()
                .zip(theirs.iter())
                .any(|(&mine, &required)| mine >= 0 && required >= 0 && mine != required)
        })
    }
}

impl WireEncode for PaddingConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_len(self.lo.len());
        for &delta in &self.lo {
            sink.put_i64(delta);
        }
        for &delta in &self.hi {
            sink.put_i64(delta);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let dims = source.get_len()?;
        let mut lo = Vec::with_capacity(dims);
        for _ in 0..dims {
            lo.push(source.get_i64()?);
        }
        let mut hi = Vec::with_capacity(dims);
        for _ in 0..dims {
            hi.push(source.get_i64()?);
        }
        Ok(Self { lo, hi })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_kind_equality() {
        let sys = MemoryConstraint::new(MemoryKind::System);
        let fb = MemoryConstraint::new(MemoryKind::Framebuffer);
        let none = MemoryConstraint::default();
        assert!(sys.entails(&sys));
        assert!(sys.entails(&none));
        assert!(!none.entails(&sys));
        assert!(sys.conflicts(&fb));
        assert!(!sys.conflicts(&none));
    }

    #[test]
    fn pointer_identity() {
        let a = PointerConstraint::new(MemoryId::from_raw(1), 0x1000);
        let b = PointerConstraint::new(MemoryId::from_raw(1), 0x2000);
        assert!(a.entails(&a));
        assert!(a.conflicts(&b));
        assert!(!a.conflicts(&PointerConstraint::default()));
    }

    #[test]
    fn padding_unspecified_sides() {
        let exact = PaddingConstraint::new(vec![1, 0], vec![1, 0]);
        let partial = PaddingConstraint::new(vec![1, -1], vec![-1, 0]);
        assert!(exact.entails(&partial));
        assert!(!partial.entails(&exact));
        assert!(!exact.conflicts(&partial));

        let different = PaddingConstraint::new(vec![2, 0], vec![1, 0]);
        assert!(exact.conflicts(&different));
    }

    #[test]
    fn wire_round_trips() {
        let mem = MemoryConstraint::new(MemoryKind::ZeroCopy);
        let ptr = PointerConstraint::new(MemoryId::from_raw(42), 0xbeef);
        let pad = PaddingConstraint::new(vec![1, -1], vec![0, 2]);

        let mut buf = Vec::new();
        mem.encode(&mut buf);
        ptr.encode(&mut buf);
        pad.encode(&mut buf);

        let mut src: &[u8] = &buf;
        assert_eq!(MemoryConstraint::decode(&mut src).unwrap(), mem);
        assert_eq!(PointerConstraint::decode(&mut src).unwrap(), ptr);
        assert_eq!(PaddingConstraint::decode(&mut src).unwrap(), pad);
        assert_eq!(src.remaining(), 0);
    }
}
