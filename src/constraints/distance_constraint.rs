use glam::Vec3;

use super::Constraint;
use crate::shapes::{ShapeId, ShapeSet};

/// Keeps the centers of two shapes at a fixed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceConstraint {
    pub shape_a: ShapeId,
    pub shape_b: ShapeId,
    /// The target distance between the shape centers.
    pub distance: f32,
}

impl DistanceConstraint {
    pub fn new(shape_a: ShapeId, shape_b: ShapeId, distance: f32) -> Self {
        assert!(distance >= 0.0, "Distance cannot be negative");
        Self {
            shape_a,
            shape_b,
            distance,
        }
    }

    /// A constraint holding the shapes at their current separation
    /// (zero if either shape is missing).
    pub fn from_current(shape_a: ShapeId, shape_b: ShapeId, shapes: &ShapeSet) -> Self {
        let distance = match (shapes.get(shape_a), shapes.get(shape_b)) {
            (Some(a), Some(b)) => a.translation.distance(b.translation),
            _ => 0.0,
        };
        Self::new(shape_a, shape_b, distance)
    }
}

impl Constraint for DistanceConstraint {
    /// Moves both centers along the line between them, each in proportion to
    /// its inverse mass (PBD style).
    fn enforce(&self, shapes: &mut ShapeSet) -> f32 {
        if self.shape_a == self.shape_b {
            return 0.0;
        }
        let (Some(a), Some(b)) = (shapes.get(self.shape_a), shapes.get(self.shape_b)) else {
            return 0.0;
        };
        let (position_a, inv_mass_a) = (a.translation, a.inverse_mass());
        let (position_b, inv_mass_b) = (b.translation, b.inverse_mass());

        // 1. Current separation and error
        let delta = position_b - position_a;
        let current_distance = delta.length();
        let error = current_distance - self.distance;
        if error.abs() < 1e-7 {
            return 0.0;
        }

        // 2. Both static: nothing can move
        let total_inv_mass = inv_mass_a + inv_mass_b;
        if total_inv_mass == 0.0 {
            return error.abs();
        }

        // 3. Coincident centers: pick an arbitrary axis to separate along
        let direction = if current_distance > 1e-7 {
            delta / current_distance
        } else {
            Vec3::Y
        };

        // 4. Apply the weighted correction
        let correction = direction * (error / total_inv_mass);
        if let Some(a) = shapes.get_mut(self.shape_a) {
            a.translation += correction * inv_mass_a;
        }
        if let Some(b) = shapes.get_mut(self.shape_b) {
            b.translation -= correction * inv_mass_b;
        }
        error.abs()
    }
}
