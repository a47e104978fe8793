use glam::Vec3;

use crate::objects::entity::RigidEntity;

/// Integrates an entity's linear state forward in time using Semi-Implicit Euler.
/// Returns how far the entity moved.
pub fn integrate(body: &mut RigidEntity, dt: f32) -> Vec3 {
    if body.inv_mass == 0.0 {
        // Static object, do not integrate
        body.clear_accumulators();
        return Vec3::ZERO;
    }

    // a = F / m
    let linear_acceleration = body.force * body.inv_mass;
    // v = v + a * dt
    body.linear_velocity += linear_acceleration * dt;
    // Clear force accumulator for the next step
    body.clear_accumulators();

    body.linear_velocity * dt
}

/// Advances one Verlet point. The velocity is implied by `position - previous`,
/// scaled by `damping` (1.0 keeps it all).
pub fn verlet_step(position: &mut Vec3, previous: &mut Vec3, acceleration: Vec3, damping: f32, dt: f32) {
    let velocity = (*position - *previous) * damping;
    *previous = *position;
    *position += velocity + acceleration * (dt * dt);
}
