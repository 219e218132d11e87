//! Field-set constraints.

use crate::types::FieldId;
use crate::wire::{WireEncode, WireError, WireSink, WireSource};

/// Declares which fields an instance holds, and how.
///
/// `contiguous` requires the listed fields to occupy one unbroken span of
/// the instance's field layout; `inorder` requires them to appear in the
/// listed order. The two flags combine into four distinct matching rules
/// for entailment, keyed on what the *required* side demands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldConstraint {
    /// The fields the instance must hold.
    pub fields: Vec<FieldId>,
    /// Whether the fields must form one unbroken span.
    pub contiguous: bool,
    /// Whether the fields must appear in the listed order.
    pub inorder: bool,
}

impl FieldConstraint {
    /// Creates a field constraint.
    #[must_use]
    pub fn new(fields: Vec<FieldId>, contiguous: bool, inorder: bool) -> Self {
        Self {
            fields,
            contiguous,
            inorder,
        }
    }

    /// Returns true if this constraint imposes nothing.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.fields.is_empty()
    }

    /// True iff any layout satisfying `self` also satisfies `other`.
    ///
    /// Four cases on `other`'s flags:
    /// - neither: `other`'s fields are a subset of ours;
    /// - `inorder`: ours must also be inorder, and `other`'s fields appear
    ///   in ours in the same relative order;
    /// - `contiguous`: ours must also be contiguous, and `other`'s fields
    ///   occupy consecutive positions in ours (any internal order);
    /// - both: ours must carry both flags, and `other`'s fields are an
    ///   unbroken, order-preserving run of ours.
    #[must_use]
    pub fn entails(&self, other: &Self) -> bool {
        if other.fields.is_empty() {
            return true;
        }
        match (other.contiguous, other.inorder) {
            (false, false) => other.fields.iter().all(|f| self.fields.contains(f)),
            (false, true) => self.inorder && self.matches_in_order(&other.fields),
            (true, false) => self.contiguous && self.matches_contiguously(&other.fields),
            (true, true) => {
                self.contiguous && self.inorder && self.matches_as_run(&other.fields)
            }
        }
    }

    /// True iff no layout satisfies both constraints.
    ///
    /// Field sets never conflict on membership alone (a layout can always
    /// hold the union); they conflict when both sides pin the order of some
    /// common pair of fields differently.
    #[must_use]
    pub fn conflicts(&self, other: &Self) -> bool {
        if !(self.inorder && other.inorder) {
            return false;
        }
        for (i, &a) in other.fields.iter().enumerate() {
            for &b in &other.fields[i + 1..] {
                let (Some(pa), Some(pb)) = (
                    self.fields.iter().position(|&f| f == a),
                    self.fields.iter().position(|&f| f == b),
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

    /// Positions of `needed` in `self.fields`, strictly increasing.
    fn matches_in_order(&self, needed: &[FieldId]) -> bool {
        let mut previous: Option<usize> = None;
        for field in needed {
            let Some(position) = self.fields.iter().position(|f| f == field) else {
                return false;
            };
            if previous.is_some_and(|prev| position <= prev) {
                return false;
            }
            previous = Some(position);
        }
        true
    }

    /// `needed`'s positions in `self.fields` form one unbroken block,
    /// irrespective of internal order.
    fn matches_contiguously(&self, needed: &[FieldId]) -> bool {
        let mut positions = Vec::with_capacity(needed.len());
        for field in needed {
            let Some(position) = self.fields.iter().position(|f| f == field) else {
                return false;
            };
            positions.push(position);
        }
        positions.sort_unstable();
        positions.windows(2).all(|w| w[1] == w[0] + 1)
    }

    /// `needed` appears in `self.fields` as one consecutive run in order.
    fn matches_as_run(&self, needed: &[FieldId]) -> bool {
        let Some(start) = self.fields.iter().position(|f| f == &needed[0]) else {
            return false;
        };
        if start + needed.len() > self.fields.len() {
            return false;
        }
        &self.fields[start..start + needed.len()] == needed
    }
}

impl WireEncode for FieldConstraint {
    fn encode<S: WireSink>(&self, sink: &mut S) {
        sink.put_bool(self.contiguous);
        sink.put_bool(self.inorder);
        sink.put_len(self.fields.len());
        for field in &self.fields {
            sink.put_u32(field.0);
        }
    }

    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError> {
        let contiguous = source.get_bool()?;
        let inorder = source.get_bool()?;
        let len = source.get_len()?;
        let mut fields = Vec::with_capacity(len);
        for _ in 0..len {
            fields.push(FieldId(source.get_u32()?));
        }
        Ok(Self {
            fields,
            contiguous,
            inorder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fids(ids: &[u32]) -> Vec<FieldId> {
        ids.iter().map(|&i| FieldId(i)).collect()
    }

    #[test]
    fn subset_rule() {
        let have = FieldConstraint::new(fids(&[1, 2, 3]), false, false);
        let want = FieldConstraint::new(fids(&[3, 1]), false, false);
        assert!(have.entails(&want));
        let missing = FieldConstraint::new(fids(&[4]), false, false);
        assert!(!have.entails(&missing));
    }

    #[test]
    fn inorder_rule_needs_inorder_on_both_sides() {
        let unordered = FieldConstraint::new(fids(&[1, 2, 3]), false, false);
        let ordered = FieldConstraint::new(fids(&[1, 3]), false, true);
        // An unordered holder cannot promise relative order.
        assert!(!unordered.entails(&ordered));

        let holder = FieldConstraint::new(fids(&[1, 2, 3]), false, true);
        assert!(holder.entails(&ordered));
        let reversed = FieldConstraint::new(fids(&[3, 1]), false, true);
        assert!(!holder.entails(&reversed));
    }

    #[test]
    fn contiguous_block_any_order() {
        let holder = FieldConstraint::new(fids(&[4, 1, 2, 9]), true, false);
        let block = FieldConstraint::new(fids(&[2, 1]), true, false);
        assert!(holder.entails(&block));
        let gapped = FieldConstraint::new(fids(&[4, 2]), true, false);
        assert!(!holder.entails(&gapped));
    }

    #[test]
    fn contiguous_inorder_run() {
        let holder = FieldConstraint::new(fids(&[4, 1, 2, 9]), true, true);
        let run = FieldConstraint::new(fids(&[1, 2]), true, true);
        assert!(holder.entails(&run));
        let broken = FieldConstraint::new(fids(&[1, 9]), true, true);
        assert!(!holder.entails(&broken));
        let out_of_order = FieldConstraint::new(fids(&[2, 1]), true, true);
        assert!(!holder.entails(&out_of_order));
    }

    #[test]
    fn reflexive() {
        for (contiguous, inorder) in [(false, false), (false, true), (true, false), (true, true)] {
            let c = FieldConstraint::new(fids(&[7, 8, 9]), contiguous, inorder);
            assert!(c.entails(&c), "cont={contiguous} inorder={inorder}");
        }
    }

    #[test]
    fn order_disagreement_conflicts() {
        let a = FieldConstraint::new(fids(&[1, 2]), false, true);
        let b = FieldConstraint::new(fids(&[2, 1]), false, true);
        assert!(a.conflicts(&b));
        let loose = FieldConstraint::new(fids(&[2, 1]), false, false);
        assert!(!a.conflicts(&loose));
    }

    #[test]
    fn wire_round_trip() {
        let c = FieldConstraint::new(fids(&[10, 20, 30]), true, false);
        let mut buf = Vec::new();
        c.encode(&mut buf);
        let mut src: &[u8] = &buf;
        assert_eq!(FieldConstraint::decode(&mut src).unwrap(), c);
    }
}
