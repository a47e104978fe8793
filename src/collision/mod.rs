pub mod contact;
pub mod detection;
pub mod info;
pub mod list;
pub mod pair_key;
pub mod ray;

// Re-export key types
pub use contact::ContactPoint;
pub use detection::{collide_shape_with_shapes, collide_shapes, collide_shapes_with_shapes, find_ray_intersection};
pub use info::CollisionInfo;
pub use list::CollisionList;
pub use pair_key::PairKey;
pub use ray::RayIntersectionInfo;
