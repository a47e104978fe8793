use glam::Vec3;

use crate::constraints::{Constraint, DistanceConstraint};
use crate::integration::integrator;
use crate::shapes::{ShapeId, ShapeSet};

/// An articulated body whose shapes are held together by constraints.
pub trait Ragdoll: std::fmt::Debug {
    fn shapes(&self) -> &[ShapeId];

    /// Advances the ragdoll's points by `delta_time`.
    fn step_forward(&mut self, delta_time: f32, shapes: &mut ShapeSet);

    /// Runs every constraint once and returns the largest violation found.
    fn enforce_constraints(&mut self, shapes: &mut ShapeSet) -> f32;

    fn mass_scale(&self) -> f32;

    /// Scales the mass of every shape of the ragdoll.
    fn set_mass_scale(&mut self, scale: f32, shapes: &mut ShapeSet);

    /// Moves the ragdoll so its root is back at its target translation.
    /// With `accumulate_movement`, most of the correction is remembered as
    /// movement the owner should apply to whatever drives the ragdoll.
    fn remove_root_offset(&mut self, accumulate_movement: bool, shapes: &mut ShapeSet);

    /// Tells the ragdoll where the frame its shapes live in sits in the world.
    fn set_simulation_translation(&mut self, _translation: Vec3) {}

    /// Returns the movement gathered by [`Ragdoll::remove_root_offset`] and resets it.
    fn take_accumulated_movement(&mut self) -> Vec3 {
        Vec3::ZERO
    }
}

/// Corrections at or below this length are treated as drift and never accumulated.
const MIN_ROOT_OFFSET: f32 = 0.02;

const EPSILON: f32 = 1e-6;

/// A ragdoll whose points are the centres of its shapes, integrated with
/// Verlet and held together by a list of constraints.
#[derive(Debug)]
pub struct JointedRagdoll {
    shapes: Vec<ShapeId>,
    previous: Vec<Vec3>,
    constraints: Vec<Box<dyn Constraint>>,
    root_index: usize,
    /// World position the root is held at.
    translation: Vec3,
    simulation_translation: Vec3,
    accumulated_movement: Vec3,
    mass_scale: f32,
    pub gravity: Vec3,
    /// Fraction of the implied velocity kept each step.
    pub damping: f32,
}

impl JointedRagdoll {
    /// Creates a ragdoll at rest over `shapes`; the first shape is the root.
    pub fn new(shapes: Vec<ShapeId>, set: &ShapeSet) -> Self {
        let previous: Vec<Vec3> = shapes
            .iter()
            .map(|&id| set.get(id).map_or(Vec3::ZERO, |s| s.translation))
            .collect();
        let translation = previous.first().copied().unwrap_or(Vec3::ZERO);
        Self {
            shapes,
            previous,
            constraints: Vec::new(),
            root_index: 0,
            translation,
            simulation_translation: Vec3::ZERO,
            accumulated_movement: Vec3::ZERO,
            mass_scale: 1.0,
            gravity: Vec3::ZERO,
            damping: 1.0,
        }
    }

    /// Makes the `root_index`th shape the root, held where it currently is.
    pub fn with_root(mut self, root_index: usize) -> Self {
        self.root_index = root_index;
        if let Some(&position) = self.previous.get(root_index) {
            self.translation = position + self.simulation_translation;
        }
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) {
        self.constraints.push(constraint);
    }

    /// Joins shapes `i` and `j` at their current distance.
    pub fn connect(&mut self, i: usize, j: usize, set: &ShapeSet) {
        if let (Some(&a), Some(&b)) = (self.shapes.get(i), self.shapes.get(j)) {
            self.add_constraint(Box::new(DistanceConstraint::from_current(a, b, set)));
        }
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn root_shape(&self) -> Option<ShapeId> {
        self.shapes.get(self.root_index).copied()
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    /// Where the root is held, relative to the simulation's translation.
    pub fn translation_in_simulation_frame(&self) -> Vec3 {
        self.translation - self.simulation_translation
    }

    pub fn set_translation_in_simulation_frame(&mut self, translation: Vec3) {
        self.translation = translation + self.simulation_translation;
    }

    pub fn accumulated_movement(&self) -> Vec3 {
        self.accumulated_movement
    }
}

impl Ragdoll for JointedRagdoll {
    fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    fn step_forward(&mut self, delta_time: f32, shapes: &mut ShapeSet) {
        for (&id, previous) in self.shapes.iter().zip(self.previous.iter_mut()) {
            let Some(shape) = shapes.get_mut(id) else {
                continue;
            };
            if shape.is_static() {
                *previous = shape.translation;
                continue;
            }
            integrator::verlet_step(&mut shape.translation, previous, self.gravity, self.damping, delta_time);
        }
    }

    fn enforce_constraints(&mut self, shapes: &mut ShapeSet) -> f32 {
        self.constraints
            .iter()
            .map(|c| c.enforce(shapes))
            .fold(0.0, f32::max)
    }

    fn mass_scale(&self) -> f32 {
        self.mass_scale
    }

    fn set_mass_scale(&mut self, scale: f32, shapes: &mut ShapeSet) {
        self.mass_scale = scale;
        for &id in &self.shapes {
            if let Some(shape) = shapes.get_mut(id) {
                shape.set_mass_scale(scale);
            }
        }
    }

    fn remove_root_offset(&mut self, accumulate_movement: bool, shapes: &mut ShapeSet) {
        let Some(root) = self.root_shape().and_then(|id| shapes.get(id)) else {
            return;
        };
        let offset = self.translation_in_simulation_frame() - root.translation;
        let length = offset.length();
        if length <= EPSILON {
            return;
        }
        for (&id, previous) in self.shapes.iter().zip(self.previous.iter_mut()) {
            if let Some(shape) = shapes.get_mut(id) {
                shape.translation += offset;
            }
            *previous += offset;
        }
        if accumulate_movement && length > MIN_ROOT_OFFSET {
            self.accumulated_movement -= offset * (1.0 - MIN_ROOT_OFFSET / length);
        }
    }

    fn set_simulation_translation(&mut self, translation: Vec3) {
        self.simulation_translation = translation;
    }

    fn take_accumulated_movement(&mut self) -> Vec3 {
        std::mem::take(&mut self.accumulated_movement)
    }
}
