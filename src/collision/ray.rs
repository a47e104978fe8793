use glam::Vec3;

use crate::shapes::ShapeId;

/// A ray query and its nearest hit so far.
///
/// Shape tests only overwrite the hit when they find one nearer than
/// `hit_distance`, so one info can be run against many shape lists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersectionInfo {
    pub origin: Vec3,
    /// Unit direction of the ray.
    pub direction: Vec3,
    /// Hits farther than this are ignored.
    pub max_distance: f32,
    pub hit_distance: f32,
    pub hit_normal: Vec3,
    pub hit_shape: Option<ShapeId>,
}

impl RayIntersectionInfo {
    /// Creates a ray; `direction` is normalized (a zero direction points down).
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            max_distance,
            hit_distance: max_distance,
            hit_normal: Vec3::ZERO,
            hit_shape: None,
        }
    }

    /// A ray pointing straight down, as used for floor probes.
    pub fn downward(origin: Vec3, max_distance: f32) -> Self {
        Self::new(origin, Vec3::NEG_Y, max_distance)
    }

    pub fn has_hit(&self) -> bool {
        self.hit_shape.is_some()
    }

    pub fn hit_point(&self) -> Vec3 {
        self.origin + self.direction * self.hit_distance
    }

    /// Records a hit if it is nearer than the current one.
    pub(crate) fn record(&mut self, distance: f32, normal: Vec3, shape: ShapeId) -> bool {
        if distance >= 0.0 && distance < self.hit_distance {
            self.hit_distance = distance;
            self.hit_normal = normal;
            self.hit_shape = Some(shape);
            true
        } else {
            false
        }
    }
}
