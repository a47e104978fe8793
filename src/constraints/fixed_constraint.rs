use glam::Vec3;

use super::Constraint;
use crate::shapes::{ShapeId, ShapeSet};

/// Pins the center of a shape to a point in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedConstraint {
    pub shape: ShapeId,
    pub anchor: Vec3,
}

impl FixedConstraint {
    pub fn new(shape: ShapeId, anchor: Vec3) -> Self {
        Self { shape, anchor }
    }
}

impl Constraint for FixedConstraint {
    fn enforce(&self, shapes: &mut ShapeSet) -> f32 {
        let Some(shape) = shapes.get_mut(self.shape) else {
            return 0.0;
        };
        let error = shape.translation.distance(self.anchor);
        shape.translation = self.anchor;
        error
    }
}
