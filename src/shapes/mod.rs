pub mod capsule;
pub mod plane;
pub mod sphere;

use std::ops::{Index, IndexMut};

use glam::{Quat, Vec3};

use crate::common::Material;
use crate::objects::EntityId;

pub use capsule::Capsule;
pub use plane::Plane;
pub use sphere::Sphere;

/// Handle of a shape inside a [`ShapeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub(crate) u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Geometry of a collidable primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Sphere(Sphere),
    Capsule(Capsule),
    Plane(Plane),
}

/// A collidable primitive placed in the world.
///
/// Collision resolution never moves a shape directly: corrections are
/// accumulated with [`Shape::accumulate_delta`] and applied once, averaged,
/// by [`Shape::apply_accumulated_delta`].
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub translation: Vec3,
    pub rotation: Quat,
    /// Mass in kilograms. Zero or infinite mass makes the shape immovable.
    pub mass: f32,
    pub material: Material,
    mass_scale: f32,
    entity: Option<EntityId>,
    accumulated_delta: Vec3,
    num_deltas: u32,
}

impl Shape {
    pub const DEFAULT_MASS: f32 = 1.0;

    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mass: Self::DEFAULT_MASS,
            material: Material::default(),
            mass_scale: 1.0,
            entity: None,
            accumulated_delta: Vec3::ZERO,
            num_deltas: 0,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ShapeKind::Sphere(Sphere::new(radius)))
    }

    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self::new(ShapeKind::Capsule(Capsule::new(radius, half_height)))
    }

    /// An immovable plane through the origin.
    pub fn plane(normal: Vec3) -> Self {
        Self::new(ShapeKind::Plane(Plane::new(normal))).with_mass(0.0)
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// The entity this shape belongs to, if it has been given to one.
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn mass_scale(&self) -> f32 {
        self.mass_scale
    }

    pub fn set_mass_scale(&mut self, scale: f32) {
        self.mass_scale = scale.max(f32::EPSILON);
    }

    pub fn effective_mass(&self) -> f32 {
        self.mass * self.mass_scale
    }

    /// Inverse of the scaled mass (0.0 for immovable shapes).
    pub fn inverse_mass(&self) -> f32 {
        let mass = self.effective_mass();
        if mass > 0.0 && mass.is_finite() {
            1.0 / mass
        } else {
            0.0
        }
    }

    pub fn is_static(&self) -> bool {
        self.inverse_mass() == 0.0
    }

    pub fn accumulate_delta(&mut self, delta: Vec3) {
        self.accumulated_delta += delta;
        self.num_deltas += 1;
    }

    pub fn accumulated_delta(&self) -> Vec3 {
        self.accumulated_delta
    }

    pub fn num_deltas(&self) -> u32 {
        self.num_deltas
    }

    /// Moves the shape by the average of its accumulated deltas and resets the accumulator.
    pub fn apply_accumulated_delta(&mut self) {
        if self.num_deltas > 0 {
            self.translation += self.accumulated_delta / self.num_deltas as f32;
            self.accumulated_delta = Vec3::ZERO;
            self.num_deltas = 0;
        }
    }
}

/// Arena owning every shape of a world. Shapes are never removed, so a
/// [`ShapeId`] stays valid for the lifetime of the set that issued it.
#[derive(Debug, Clone, Default)]
pub struct ShapeSet {
    shapes: Vec<Shape>,
}

impl ShapeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(shape);
        id
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.index())
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| (ShapeId(i as u32), shape))
    }

    pub(crate) fn set_entity(&mut self, id: ShapeId, entity: EntityId) {
        if let Some(shape) = self.shapes.get_mut(id.index()) {
            debug_assert!(
                shape.entity.is_none() || shape.entity == Some(entity),
                "shape {:?} already belongs to {:?}",
                id,
                shape.entity
            );
            shape.entity = Some(entity);
        }
    }
}

impl Index<ShapeId> for ShapeSet {
    type Output = Shape;

    fn index(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }
}

impl IndexMut<ShapeId> for ShapeSet {
    fn index_mut(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.index()]
    }
}
