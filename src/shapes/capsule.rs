use glam::{Quat, Vec3};

/// A swept sphere around a segment of length `2 * half_height` that runs
/// along the shape's local +Y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub radius: f32,
    pub half_height: f32,
}

impl Capsule {
    pub fn new(radius: f32, half_height: f32) -> Self {
        assert!(radius >= 0.0, "Capsule radius cannot be negative");
        assert!(half_height >= 0.0, "Capsule half height cannot be negative");
        Self { radius, half_height }
    }

    /// World-space endpoints of the core segment (bottom, top).
    pub fn endpoints(&self, translation: Vec3, rotation: Quat) -> (Vec3, Vec3) {
        let half_axis = rotation * Vec3::Y * self.half_height;
        (translation - half_axis, translation + half_axis)
    }
}
