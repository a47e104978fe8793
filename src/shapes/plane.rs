use glam::{Quat, Vec3};

/// An infinite plane passing through the shape's translation.
/// Everything on the far side of the normal is inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Outward normal in the shape's local frame.
    pub normal: Vec3,
}

impl Plane {
    /// Creates a plane, normalizing `normal`. A zero normal falls back to +Y.
    pub fn new(normal: Vec3) -> Self {
        Self {
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
        }
    }

    pub fn world_normal(&self, rotation: Quat) -> Vec3 {
        rotation * self.normal
    }

    /// Signed distance from `point` to the plane (positive on the normal side).
    pub fn signed_distance(&self, translation: Vec3, rotation: Quat, point: Vec3) -> f32 {
        (point - translation).dot(self.world_normal(rotation))
    }
}
