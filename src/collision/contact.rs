use glam::Vec3;

use super::info::CollisionInfo;
use crate::shapes::{ShapeId, ShapeSet};

const EPSILON: f32 = 1e-6;

/// Persistent contact between two shapes, kept across frames while the pair
/// keeps colliding.
///
/// The contact remembers where it touched each shape (as offsets from the
/// shape translations) so it can push the pair apart again next step and
/// resist sliding, before the narrow phase has run.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPoint {
    /// Lower shape id of the pair.
    shape_a: ShapeId,
    shape_b: ShapeId,
    last_frame: u32,
    /// Unit normal pointing from A into B.
    normal: Vec3,
    offset_a: Vec3,
    offset_b: Vec3,
    /// Share of a correction taken by each shape (sums to 1, or both 0 when immovable).
    weight_a: f32,
    weight_b: f32,
    /// Depth pressing the pair together; bounds the friction response.
    normal_depth: f32,
    friction: f32,
    allowance: f32,
}

impl ContactPoint {
    /// Starts tracking the pair of `collision`. Returns `None` without a
    /// second shape or when either shape is missing from `shapes`.
    pub fn new(collision: &CollisionInfo, frame: u32, shapes: &ShapeSet, allowance: f32) -> Option<Self> {
        let shape_b = collision.shape_b?;
        shapes.get(collision.shape_a)?;
        shapes.get(shape_b)?;
        let mut contact = Self {
            shape_a: collision.shape_a.min(shape_b),
            shape_b: collision.shape_a.max(shape_b),
            last_frame: frame,
            normal: Vec3::Y,
            offset_a: Vec3::ZERO,
            offset_b: Vec3::ZERO,
            weight_a: 0.0,
            weight_b: 0.0,
            normal_depth: 0.0,
            friction: 0.0,
            allowance: allowance.max(0.0),
        };
        contact.anchor(collision, shapes);
        Some(contact)
    }

    /// Refreshes the contact from a new collision of the same pair.
    pub fn update_contact(&mut self, collision: &CollisionInfo, frame: u32, shapes: &ShapeSet) {
        self.last_frame = frame;
        self.anchor(collision, shapes);
    }

    fn anchor(&mut self, collision: &CollisionInfo, shapes: &ShapeSet) {
        let mut point_a = collision.contact_point;
        let mut point_b = collision.contact_point - collision.penetration;
        let mut normal = collision.penetration.try_normalize().unwrap_or(self.normal);
        if collision.shape_a != self.shape_a {
            std::mem::swap(&mut point_a, &mut point_b);
            normal = -normal;
        }
        let (Some(a), Some(b)) = (shapes.get(self.shape_a), shapes.get(self.shape_b)) else {
            return;
        };
        self.normal = normal;
        self.offset_a = point_a - a.translation;
        self.offset_b = point_b - b.translation;

        let inv_mass_a = a.inverse_mass();
        let inv_mass_b = b.inverse_mass();
        let total = inv_mass_a + inv_mass_b;
        if total > 0.0 {
            self.weight_a = inv_mass_a / total;
            self.weight_b = inv_mass_b / total;
        } else {
            self.weight_a = 0.0;
            self.weight_b = 0.0;
        }
        self.friction = a.material.combined_friction(&b.material);
        self.normal_depth = collision.depth();
    }

    pub fn shape_a(&self) -> ShapeId {
        self.shape_a
    }

    pub fn shape_b(&self) -> ShapeId {
        self.shape_b
    }

    pub fn last_frame(&self) -> u32 {
        self.last_frame
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn references_shape(&self, shape: ShapeId) -> bool {
        self.shape_a == shape || self.shape_b == shape
    }

    fn anchor_points(&self, shapes: &ShapeSet) -> Option<(Vec3, Vec3)> {
        let a = shapes.get(self.shape_a)?;
        let b = shapes.get(self.shape_b)?;
        Some((a.translation + self.offset_a, b.translation + self.offset_b))
    }

    fn move_pair(&self, shapes: &mut ShapeSet, correction: Vec3) {
        if let Some(a) = shapes.get_mut(self.shape_a) {
            a.translation -= correction * self.weight_a;
        }
        if let Some(b) = shapes.get_mut(self.shape_b) {
            b.translation += correction * self.weight_b;
        }
    }

    fn is_immovable(&self) -> bool {
        self.weight_a == 0.0 && self.weight_b == 0.0
    }

    /// Pushes the pair apart if its anchors overlap by more than the allowance.
    /// Returns the overlap that was found, or 0.0 when nothing was violated.
    pub fn enforce(&mut self, shapes: &mut ShapeSet) -> f32 {
        if self.is_immovable() {
            return 0.0;
        }
        let Some((point_a, point_b)) = self.anchor_points(shapes) else {
            return 0.0;
        };
        let overlap = (point_a - point_b).dot(self.normal);
        if overlap - self.allowance <= EPSILON {
            return 0.0;
        }
        let correction = overlap - self.allowance;
        self.move_pair(shapes, self.normal * correction);
        self.normal_depth += correction;
        overlap
    }

    /// Resists tangential slip between the two anchors.
    ///
    /// Slip up to `friction * normal_depth` is removed entirely; anything past
    /// that bound is let through and the anchors are moved to follow it.
    pub fn apply_friction(&mut self, shapes: &mut ShapeSet) {
        if self.is_immovable() || self.friction <= 0.0 {
            return;
        }
        let Some((point_a, point_b)) = self.anchor_points(shapes) else {
            return;
        };
        let separation = point_a - point_b;
        let along_normal = separation.dot(self.normal);
        if along_normal < -self.allowance {
            return;
        }
        let slip = separation - self.normal * along_normal;
        let slip_length = slip.length();
        if slip_length < EPSILON {
            return;
        }
        let max_correction = self.friction * self.normal_depth;
        let correction = if slip_length <= max_correction {
            slip
        } else {
            slip * (max_correction / slip_length)
        };
        self.move_pair(shapes, correction);
        self.offset_b += slip - correction;
    }
}
