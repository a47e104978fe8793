use std::collections::HashSet;

use glam::Vec3;

use crate::integration::integrator;
use crate::shapes::{ShapeId, ShapeSet};

/// Something made of shapes that a simulation can collide.
pub trait PhysicsEntity: std::fmt::Debug {
    /// Shapes of the entity; indices into this slice identify shapes in
    /// [`PhysicsEntity::collisions_are_enabled`].
    fn shapes(&self) -> &[ShapeId];

    /// Whether the entity's `i`th and `j`th shapes may collide with each other.
    fn collisions_are_enabled(&self, _i: usize, _j: usize) -> bool {
        true
    }

    /// Advances the entity's own motion.
    fn step_forward(&mut self, _delta_time: f32, _shapes: &mut ShapeSet) {}
}

/// A set of shapes moving together with one linear velocity.
#[derive(Debug, Clone)]
pub struct RigidEntity {
    shapes: Vec<ShapeId>,
    /// Shape index pairs, stored low index first, that never collide.
    disabled_pairs: HashSet<(usize, usize)>,

    pub linear_velocity: Vec3,
    pub force: Vec3, // Accumulator for forces applied during a step

    pub mass: f32,
    pub inv_mass: f32,
}

impl RigidEntity {
    /// Creates an entity over `shapes`. A mass of zero (or less) makes it static.
    pub fn new(mass: f32, shapes: Vec<ShapeId>) -> Self {
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        Self {
            shapes,
            disabled_pairs: HashSet::new(),
            linear_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: mass.max(0.0),
            inv_mass,
        }
    }

    pub fn new_static(shapes: Vec<ShapeId>) -> Self {
        Self::new(0.0, shapes)
    }

    pub fn with_disabled_pair(mut self, i: usize, j: usize) -> Self {
        self.disable_collisions(i, j);
        self
    }

    pub fn disable_collisions(&mut self, i: usize, j: usize) {
        self.disabled_pairs.insert((i.min(j), i.max(j)));
    }

    pub fn enable_collisions(&mut self, i: usize, j: usize) {
        self.disabled_pairs.remove(&(i.min(j), i.max(j)));
    }

    pub fn apply_force(&mut self, force: Vec3) {
        if self.inv_mass > 0.0 {
            self.force += force;
        }
    }

    pub fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
    }
}

impl PhysicsEntity for RigidEntity {
    fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    fn collisions_are_enabled(&self, i: usize, j: usize) -> bool {
        !self.disabled_pairs.contains(&(i.min(j), i.max(j)))
    }

    fn step_forward(&mut self, delta_time: f32, shapes: &mut ShapeSet) {
        let displacement = integrator::integrate(self, delta_time);
        if displacement == Vec3::ZERO {
            return;
        }
        for &id in &self.shapes {
            if let Some(shape) = shapes.get_mut(id) {
                shape.translation += displacement;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_rigid_entity_new() {
        let e = RigidEntity::new(2.0, vec![]);
        assert!((e.inv_mass - 0.5).abs() < EPSILON);
        let s = RigidEntity::new_static(vec![]);
        assert_eq!(s.inv_mass, 0.0);
        assert_eq!(s.mass, 0.0);
    }

    #[test]
    fn test_disabled_pairs_are_symmetric() {
        let mut e = RigidEntity::new(1.0, vec![]).with_disabled_pair(2, 1);
        assert!(!e.collisions_are_enabled(1, 2));
        assert!(!e.collisions_are_enabled(2, 1));
        assert!(e.collisions_are_enabled(0, 1));
        e.enable_collisions(1, 2);
        assert!(e.collisions_are_enabled(2, 1));
    }

    #[test]
    fn test_step_moves_all_shapes() {
        let mut set = ShapeSet::new();
        let a = set.insert(Shape::sphere(0.5));
        let b = set.insert(Shape::capsule(0.2, 1.0).with_translation(Vec3::Y));
        let mut e = RigidEntity::new(1.0, vec![a, b]);
        e.linear_velocity = Vec3::new(1.0, 0.0, 0.0);
        e.step_forward(0.5, &mut set);
        assert!((set[a].translation - Vec3::new(0.5, 0.0, 0.0)).length() < EPSILON);
        assert!((set[b].translation - Vec3::new(0.5, 1.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_static_entity_ignores_force() {
        let mut set = ShapeSet::new();
        let a = set.insert(Shape::sphere(0.5));
        let mut e = RigidEntity::new_static(vec![a]);
        e.apply_force(Vec3::new(0.0, -100.0, 0.0));
        e.step_forward(1.0, &mut set);
        assert_eq!(set[a].translation, Vec3::ZERO);
    }
}
