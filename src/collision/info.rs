use glam::Vec3;

use super::pair_key::PairKey;
use crate::shapes::{ShapeId, ShapeSet};

/// The result of one pairwise shape test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionInfo {
    /// The shape that was tested. Always present.
    pub shape_a: ShapeId,
    /// The other shape, or `None` when A hit something outside the shape set.
    pub shape_b: Option<ShapeId>,
    /// Deepest point of A inside B, on the surface of A.
    pub contact_point: Vec3,
    /// Points from A into B; its length is the penetration depth.
    pub penetration: Vec3,
}

impl CollisionInfo {
    pub fn new(shape_a: ShapeId, shape_b: Option<ShapeId>, contact_point: Vec3, penetration: Vec3) -> Self {
        Self {
            shape_a,
            shape_b,
            contact_point,
            penetration,
        }
    }

    pub fn depth(&self) -> f32 {
        self.penetration.length()
    }

    /// Key of the shape pair, `None` without a second shape.
    pub fn shape_pair_key(&self) -> Option<PairKey> {
        self.shape_b.map(|b| PairKey::new(self.shape_a, b))
    }

    /// Accumulates the positional correction onto the shapes involved.
    ///
    /// Each shape moves in proportion to its share of the pair's inverse mass;
    /// a missing `shape_b` is treated as immovable. Nothing moves until the
    /// shapes' accumulated deltas are applied.
    pub fn apply(&self, shapes: &mut ShapeSet) {
        let Some(inv_mass_a) = shapes.get(self.shape_a).map(|a| a.inverse_mass()) else {
            return;
        };
        let inv_mass_b = self
            .shape_b
            .and_then(|b| shapes.get(b))
            .map_or(0.0, |b| b.inverse_mass());
        let total_inv_mass = inv_mass_a + inv_mass_b;
        if total_inv_mass <= 0.0 {
            return;
        }
        if inv_mass_b > 0.0 {
            if let Some(b) = self.shape_b.and_then(|b| shapes.get_mut(b)) {
                b.accumulate_delta(self.penetration * (inv_mass_b / total_inv_mass));
            }
        }
        if inv_mass_a > 0.0 {
            if let Some(a) = shapes.get_mut(self.shape_a) {
                a.accumulate_delta(-self.penetration * (inv_mass_a / total_inv_mass));
            }
        }
    }
}
