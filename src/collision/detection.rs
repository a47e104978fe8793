//! Narrow-phase tests between pairs of shapes and between rays and shapes.
//!
//! Every hit is written to a [`CollisionList`] with the penetration pointing
//! from the first shape into the second and the contact point on the surface
//! of the first shape. A hit only counts when the list had room to store it.

use glam::Vec3;

use super::info::CollisionInfo;
use super::list::CollisionList;
use super::ray::RayIntersectionInfo;
use crate::shapes::{Plane, Shape, ShapeId, ShapeKind, ShapeSet};

const EPSILON: f32 = 1e-6;

/// Contact between two shapes: (contact point on A, penetration from A into B).
type Contact = (Vec3, Vec3);

/// Tests two shapes and records a collision if they overlap.
pub fn collide_shapes(a: ShapeId, b: ShapeId, shapes: &ShapeSet, collisions: &mut CollisionList) -> bool {
    if a == b {
        return false;
    }
    let (Some(shape_a), Some(shape_b)) = (shapes.get(a), shapes.get(b)) else {
        return false;
    };
    match check_shapes(shape_a, shape_b) {
        Some((contact_point, penetration)) => {
            collisions.push(CollisionInfo::new(a, Some(b), contact_point, penetration))
        }
        None => false,
    }
}

/// Tests `shape` against `others[start_index..]`. Returns whether anything was recorded.
pub fn collide_shape_with_shapes(
    shape: ShapeId,
    others: &[ShapeId],
    start_index: usize,
    shapes: &ShapeSet,
    collisions: &mut CollisionList,
) -> bool {
    let mut hit = false;
    for &other in others.iter().skip(start_index) {
        if collide_shapes(shape, other, shapes, collisions) {
            hit = true;
        }
    }
    hit
}

/// Tests every shape of `shapes_a` against every shape of `shapes_b`.
pub fn collide_shapes_with_shapes(
    shapes_a: &[ShapeId],
    shapes_b: &[ShapeId],
    shapes: &ShapeSet,
    collisions: &mut CollisionList,
) -> bool {
    let mut hit = false;
    for &a in shapes_a {
        if collide_shape_with_shapes(a, shapes_b, 0, shapes, collisions) {
            hit = true;
        }
    }
    hit
}

/// Casts the ray against `targets`, keeping the nearest hit in `intersection`.
/// Returns whether this call found a nearer hit.
pub fn find_ray_intersection(targets: &[ShapeId], shapes: &ShapeSet, intersection: &mut RayIntersectionInfo) -> bool {
    let mut hit = false;
    for &id in targets {
        let Some(shape) = shapes.get(id) else {
            continue;
        };
        if let Some((distance, normal)) = ray_shape(intersection.origin, intersection.direction, shape) {
            if intersection.record(distance, normal, id) {
                hit = true;
            }
        }
    }
    hit
}

/// Dispatches on the shape kinds. Plane-first pairs are computed the other
/// way around and mirrored.
fn check_shapes(a: &Shape, b: &Shape) -> Option<Contact> {
    match (&a.kind, &b.kind) {
        (ShapeKind::Plane(_), ShapeKind::Plane(_)) => None,
        (ShapeKind::Plane(_), _) => check_shapes(b, a).map(mirror),
        (_, ShapeKind::Plane(plane)) => {
            let (center, radius) = deepest_sphere_towards_plane(a, plane, b)?;
            check_sphere_plane(center, radius, b.translation, plane.world_normal(b.rotation))
        }
        _ => {
            let (center_a, radius_a, center_b, radius_b) = closest_spheres(a, b)?;
            check_sphere_sphere(center_a, radius_a, center_b, radius_b)
        }
    }
}

/// Swaps the roles of A and B in a contact.
fn mirror((contact_point, penetration): Contact) -> Contact {
    (contact_point - penetration, -penetration)
}

/// Reduces a sphere/capsule pair to the two spheres that are closest to each other.
fn closest_spheres(a: &Shape, b: &Shape) -> Option<(Vec3, f32, Vec3, f32)> {
    match (&a.kind, &b.kind) {
        (ShapeKind::Sphere(sa), ShapeKind::Sphere(sb)) => Some((a.translation, sa.radius, b.translation, sb.radius)),
        (ShapeKind::Sphere(sa), ShapeKind::Capsule(cb)) => {
            let (p, q) = cb.endpoints(b.translation, b.rotation);
            let (closest, _) = closest_point_on_segment(p, q, a.translation);
            Some((a.translation, sa.radius, closest, cb.radius))
        }
        (ShapeKind::Capsule(ca), ShapeKind::Sphere(sb)) => {
            let (p, q) = ca.endpoints(a.translation, a.rotation);
            let (closest, _) = closest_point_on_segment(p, q, b.translation);
            Some((closest, ca.radius, b.translation, sb.radius))
        }
        (ShapeKind::Capsule(ca), ShapeKind::Capsule(cb)) => {
            let (p1, q1) = ca.endpoints(a.translation, a.rotation);
            let (p2, q2) = cb.endpoints(b.translation, b.rotation);
            let (c1, c2) = closest_points_between_segments(p1, q1, p2, q2);
            Some((c1, ca.radius, c2, cb.radius))
        }
        _ => None,
    }
}

/// The sphere of `shape` that reaches deepest below `plane`, placed by `plane_shape`.
fn deepest_sphere_towards_plane(shape: &Shape, plane: &Plane, plane_shape: &Shape) -> Option<(Vec3, f32)> {
    match &shape.kind {
        ShapeKind::Sphere(s) => Some((shape.translation, s.radius)),
        ShapeKind::Capsule(c) => {
            let (p, q) = c.endpoints(shape.translation, shape.rotation);
            let dp = plane.signed_distance(plane_shape.translation, plane_shape.rotation, p);
            let dq = plane.signed_distance(plane_shape.translation, plane_shape.rotation, q);
            // A capsule lying flat touches along its whole length; use its middle
            let center = if (dp - dq).abs() < EPSILON {
                shape.translation
            } else if dp < dq {
                p
            } else {
                q
            };
            Some((center, c.radius))
        }
        ShapeKind::Plane(_) => None,
    }
}

/// Checks for overlap between two spheres.
pub fn check_sphere_sphere(center_a: Vec3, radius_a: f32, center_b: Vec3, radius_b: f32) -> Option<Contact> {
    let ab = center_b - center_a;
    let dist_sq = ab.length_squared();
    let radii_sum = radius_a + radius_b;
    if dist_sq >= radii_sum * radii_sum {
        return None;
    }
    let distance = dist_sq.sqrt();
    let normal = if distance > EPSILON {
        ab / distance
    } else {
        // Concentric spheres: any direction separates them
        Vec3::Y
    };
    let penetration = normal * (radii_sum - distance);
    let contact_point = center_a + normal * radius_a;
    Some((contact_point, penetration))
}

/// Checks a sphere against the inside half-space of a plane.
pub fn check_sphere_plane(center: Vec3, radius: f32, plane_point: Vec3, plane_normal: Vec3) -> Option<Contact> {
    let distance = (center - plane_point).dot(plane_normal);
    if distance >= radius {
        return None;
    }
    let penetration = -plane_normal * (radius - distance);
    let contact_point = center - plane_normal * radius;
    Some((contact_point, penetration))
}

/// Finds the point on segment `ab` closest to `point`, with its parameter `t` in [0, 1].
pub fn closest_point_on_segment(a: Vec3, b: Vec3, point: Vec3) -> (Vec3, f32) {
    let segment = b - a;
    let length_sq = segment.length_squared();
    if length_sq < EPSILON * EPSILON {
        return (a, 0.0);
    }
    let t = ((point - a).dot(segment) / length_sq).clamp(0.0, 1.0);
    (a + segment * t, t)
}

/// Closest points between segments `p1q1` and `p2q2`.
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= EPSILON && e <= EPSILON {
        (0.0, 0.0)
    } else if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            // Parallel segments: pick any s and let t follow
            let s = if denom > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

fn ray_shape(origin: Vec3, direction: Vec3, shape: &Shape) -> Option<(f32, Vec3)> {
    match &shape.kind {
        ShapeKind::Sphere(s) => ray_sphere(origin, direction, shape.translation, s.radius),
        ShapeKind::Capsule(c) => {
            let (p, q) = c.endpoints(shape.translation, shape.rotation);
            ray_capsule(origin, direction, p, q, c.radius)
        }
        ShapeKind::Plane(plane) => ray_plane(origin, direction, shape.translation, plane.world_normal(shape.rotation)),
    }
}

/// Distance along the ray and surface normal of the first hit with a sphere.
/// A ray starting inside the sphere does not hit it.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let m = origin - center;
    let b = m.dot(direction);
    let c = m.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    if t < 0.0 {
        return None;
    }
    let normal = (origin + direction * t - center).try_normalize().unwrap_or(-direction);
    Some((t, normal))
}

fn ray_capsule(origin: Vec3, direction: Vec3, p: Vec3, q: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let mut best = nearest(ray_sphere(origin, direction, p, radius), ray_sphere(origin, direction, q, radius));

    let axis = q - p;
    let length = axis.length();
    if length > EPSILON {
        let axis = axis / length;
        let m = origin - p;
        let d_perp = direction - axis * direction.dot(axis);
        let m_perp = m - axis * m.dot(axis);
        let a = d_perp.length_squared();
        if a > EPSILON {
            let b = m_perp.dot(d_perp);
            let c = m_perp.length_squared() - radius * radius;
            let discriminant = b * b - a * c;
            if discriminant >= 0.0 {
                let t = (-b - discriminant.sqrt()) / a;
                if t >= 0.0 {
                    let hit = origin + direction * t;
                    let h = (hit - p).dot(axis);
                    if (0.0..=length).contains(&h) {
                        let normal = (hit - (p + axis * h)).try_normalize().unwrap_or(-direction);
                        best = nearest(best, Some((t, normal)));
                    }
                }
            }
        }
    }
    best
}

fn ray_plane(origin: Vec3, direction: Vec3, point: Vec3, normal: Vec3) -> Option<(f32, Vec3)> {
    let denom = normal.dot(direction);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (point - origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }
    // Report the face the ray arrived at
    let facing = if denom < 0.0 { normal } else { -normal };
    Some((t, facing))
}

fn nearest(a: Option<(f32, Vec3)>, b: Option<(f32, Vec3)>) -> Option<(f32, Vec3)> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if y.0 < x.0 { y } else { x }),
        (x, None) => x,
        (None, y) => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    fn set_with(shapes: Vec<Shape>) -> (ShapeSet, Vec<ShapeId>) {
        let mut set = ShapeSet::new();
        let ids = shapes.into_iter().map(|s| set.insert(s)).collect();
        (set, ids)
    }

    #[test]
    fn test_sphere_sphere_overlap() {
        let (set, ids) = set_with(vec![
            Shape::sphere(1.0),
            Shape::sphere(1.0).with_translation(Vec3::new(1.5, 0.0, 0.0)),
        ]);
        let mut list = CollisionList::new(8);
        assert!(collide_shapes(ids[0], ids[1], &set, &mut list));
        let c = list.get(0).copied().unwrap();
        assert_eq!(c.shape_a, ids[0]);
        assert_eq!(c.shape_b, Some(ids[1]));
        assert_abs_diff_eq!(c.penetration, Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(c.contact_point, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_sphere_touching_is_not_collision() {
        let (set, ids) = set_with(vec![
            Shape::sphere(1.0),
            Shape::sphere(1.0).with_translation(Vec3::new(2.0, 0.0, 0.0)),
        ]);
        let mut list = CollisionList::new(8);
        assert!(!collide_shapes(ids[0], ids[1], &set, &mut list));
        assert!(list.is_empty());
    }

    #[test]
    fn test_missing_shapes_are_skipped() {
        let (set, ids) = set_with(vec![Shape::sphere(1.0)]);
        let missing = ShapeId(4);
        let mut list = CollisionList::new(8);
        assert!(!collide_shapes(ids[0], missing, &set, &mut list));
        assert!(!collide_shapes_with_shapes(&[missing], &ids, &set, &mut list));
        assert!(list.is_empty());

        let mut ray = RayIntersectionInfo::downward(Vec3::new(0.0, 5.0, 0.0), 100.0);
        assert!(find_ray_intersection(&[missing, ids[0]], &set, &mut ray));
        assert_eq!(ray.hit_shape, Some(ids[0]));
    }

    #[test]
    fn test_shape_does_not_collide_with_itself() {
        let (set, ids) = set_with(vec![Shape::sphere(1.0)]);
        let mut list = CollisionList::new(8);
        assert!(!collide_shapes(ids[0], ids[0], &set, &mut list));
    }

    #[test]
    fn test_sphere_capsule_side_hit() {
        // Upright capsule at origin spanning y in [-1, 1], radius 0.5
        let (set, ids) = set_with(vec![
            Shape::sphere(0.5).with_translation(Vec3::new(0.8, 0.5, 0.0)),
            Shape::capsule(0.5, 1.0),
        ]);
        let mut list = CollisionList::new(8);
        assert!(collide_shapes(ids[0], ids[1], &set, &mut list));
        let c = list.get(0).copied().unwrap();
        // Sphere is pushed towards -X, so penetration points into the capsule (-X)
        assert_abs_diff_eq!(c.penetration, Vec3::new(-0.2, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_capsule_crossing() {
        // One upright, one lying along X, centers 0.8 apart in Z
        let (set, ids) = set_with(vec![
            Shape::capsule(0.5, 1.0),
            Shape::capsule(0.5, 1.0)
                .with_rotation(Quat::from_rotation_z(FRAC_PI_2))
                .with_translation(Vec3::new(0.0, 0.0, 0.8)),
        ]);
        let mut list = CollisionList::new(8);
        assert!(collide_shapes(ids[0], ids[1], &set, &mut list));
        let c = list.get(0).copied().unwrap();
        assert_abs_diff_eq!(c.penetration, Vec3::new(0.0, 0.0, 0.2), epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_plane_and_mirror() {
        let (set, ids) = set_with(vec![
            Shape::sphere(1.0).with_translation(Vec3::new(0.0, 0.75, 0.0)),
            Shape::plane(Vec3::Y),
        ]);
        let mut list = CollisionList::new(8);
        assert!(collide_shapes(ids[0], ids[1], &set, &mut list));
        assert!(collide_shapes(ids[1], ids[0], &set, &mut list));
        let sphere_first = list.get(0).copied().unwrap();
        let plane_first = list.get(1).copied().unwrap();
        assert_abs_diff_eq!(sphere_first.penetration, Vec3::new(0.0, -0.25, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(sphere_first.contact_point, Vec3::new(0.0, -0.25, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(plane_first.penetration, Vec3::new(0.0, 0.25, 0.0), epsilon = 1e-5);
        // Contact moves onto the plane's surface
        assert_abs_diff_eq!(plane_first.contact_point, Vec3::new(0.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_tilted_capsule_plane_uses_lowest_end() {
        let (set, ids) = set_with(vec![
            Shape::capsule(0.25, 1.0)
                .with_rotation(Quat::from_rotation_z(0.3))
                .with_translation(Vec3::new(0.0, 1.0, 0.0)),
            Shape::plane(Vec3::Y),
        ]);
        let mut list = CollisionList::new(8);
        assert!(collide_shapes(ids[0], ids[1], &set, &mut list));
        let c = list.get(0).copied().unwrap();
        let lowest_end_y = 1.0 - 0.3f32.cos();
        assert_abs_diff_eq!(c.depth(), 0.25 - lowest_end_y, epsilon = 1e-5);
    }

    #[test]
    fn test_plane_plane_never_collides() {
        let (set, ids) = set_with(vec![Shape::plane(Vec3::Y), Shape::plane(Vec3::X)]);
        let mut list = CollisionList::new(8);
        assert!(!collide_shapes(ids[0], ids[1], &set, &mut list));
    }

    #[test]
    fn test_full_list_reports_no_hit() {
        let (set, ids) = set_with(vec![
            Shape::sphere(1.0),
            Shape::sphere(1.0).with_translation(Vec3::X),
        ]);
        let mut list = CollisionList::new(0);
        assert!(!collide_shapes(ids[0], ids[1], &set, &mut list));
        assert_eq!(list.dropped(), 1);
    }

    #[test]
    fn test_collide_shape_with_shapes_start_index() {
        let (set, ids) = set_with(vec![
            Shape::sphere(1.0),
            Shape::sphere(1.0).with_translation(Vec3::X),
            Shape::sphere(1.0).with_translation(Vec3::new(10.0, 0.0, 0.0)),
        ]);
        let mut list = CollisionList::new(8);
        assert!(!collide_shape_with_shapes(ids[0], &ids, 2, &set, &mut list));
        assert!(collide_shape_with_shapes(ids[0], &ids, 0, &set, &mut list));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_collide_shapes_with_shapes() {
        let (set, ids) = set_with(vec![
            Shape::sphere(1.0),
            Shape::sphere(1.0).with_translation(Vec3::new(0.0, 1.0, 0.0)),
            Shape::sphere(1.0).with_translation(Vec3::new(0.0, 0.5, 1.0)),
            Shape::sphere(0.1).with_translation(Vec3::new(0.0, 9.0, 0.0)),
        ]);
        let mut list = CollisionList::new(8);
        assert!(collide_shapes_with_shapes(&ids[0..2], &ids[2..4], &set, &mut list));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_closest_points_between_segments() {
        let (c1, c2) = closest_points_between_segments(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        );
        assert_abs_diff_eq!(c1, Vec3::ZERO, epsilon = 1e-5);
        assert_abs_diff_eq!(c2, Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_closest_point_on_segment_clamps() {
        let (p, t) = closest_point_on_segment(Vec3::ZERO, Vec3::X, Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(p, Vec3::X);
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_ray_hits_nearest_shape() {
        let (set, ids) = set_with(vec![
            Shape::plane(Vec3::Y),
            Shape::sphere(0.5).with_translation(Vec3::new(0.0, 2.0, 0.0)),
        ]);
        let mut ray = RayIntersectionInfo::downward(Vec3::new(0.0, 5.0, 0.0), 100.0);
        assert!(find_ray_intersection(&ids, &set, &mut ray));
        assert_eq!(ray.hit_shape, Some(ids[1]));
        assert_abs_diff_eq!(ray.hit_distance, 2.5, epsilon = 1e-5);
        assert_abs_diff_eq!(ray.hit_normal, Vec3::Y, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_misses_and_plane_hit() {
        let (set, ids) = set_with(vec![
            Shape::plane(Vec3::Y).with_translation(Vec3::new(0.0, -1.0, 0.0)),
            Shape::sphere(0.5).with_translation(Vec3::new(5.0, 2.0, 0.0)),
        ]);
        let mut ray = RayIntersectionInfo::downward(Vec3::new(0.0, 5.0, 0.0), 100.0);
        assert!(find_ray_intersection(&ids, &set, &mut ray));
        assert_eq!(ray.hit_shape, Some(ids[0]));
        assert_abs_diff_eq!(ray.hit_distance, 6.0, epsilon = 1e-5);

        let mut up = RayIntersectionInfo::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, 100.0);
        assert!(!find_ray_intersection(&ids, &set, &mut up));
    }

    #[test]
    fn test_ray_capsule_side_and_cap() {
        let (set, ids) = set_with(vec![Shape::capsule(0.5, 1.0)]);
        let mut side = RayIntersectionInfo::new(Vec3::new(-5.0, 0.5, 0.0), Vec3::X, 100.0);
        assert!(find_ray_intersection(&ids, &set, &mut side));
        assert_abs_diff_eq!(side.hit_distance, 4.5, epsilon = 1e-4);
        assert_abs_diff_eq!(side.hit_normal, Vec3::NEG_X, epsilon = 1e-4);

        let mut top = RayIntersectionInfo::downward(Vec3::new(0.0, 5.0, 0.0), 100.0);
        assert!(find_ray_intersection(&ids, &set, &mut top));
        assert_abs_diff_eq!(top.hit_distance, 3.5, epsilon = 1e-4);
    }
}
