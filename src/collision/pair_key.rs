//! Order-independent key for a pair of shapes.

use crate::shapes::ShapeId;

/// A unique key for an unordered pair of shapes: the lower id in the high
/// 32 bits and the higher id in the low 32 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(pub u64);

impl PairKey {
    #[inline]
    pub fn new(a: ShapeId, b: ShapeId) -> Self {
        let (lo, hi) = if a.raw() < b.raw() {
            (a.raw(), b.raw())
        } else {
            (b.raw(), a.raw())
        };
        Self(((lo as u64) << 32) | hi as u64)
    }
}
