//! Tunables shared by a simulation and the objects it steps.

/// Capacities and contact tuning for a [`Simulation`](crate::world::Simulation).
///
/// A config is handed to the simulation at construction; nothing here is
/// global, so two simulations may run with different limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Maximum number of "other" ragdolls a simulation tracks.
    pub max_dolls_per_simulation: usize,
    /// Maximum number of "other" entities a simulation tracks.
    pub max_entities_per_simulation: usize,
    /// Capacity of the per-iteration collision buffer.
    pub max_collisions_per_simulation: usize,
    /// A contact not refreshed for more than this many frames is pruned.
    pub max_contact_frame_lifetime: u32,
    /// Mass scale given to "other" ragdolls so the primary ragdoll yields to them.
    pub other_ragdoll_mass_scale: f32,
    /// Depth a contact may overlap before it is enforced. Enforcement leaves
    /// this much overlap so a resting pair keeps colliding.
    pub contact_penetration_allowance: f32,
}

impl SimulationConfig {
    pub const MAX_DOLLS_PER_SIMULATION: usize = 16;
    pub const MAX_ENTITIES_PER_SIMULATION: usize = 64;
    pub const MAX_COLLISIONS_PER_SIMULATION: usize = 256;
    pub const MAX_CONTACT_FRAME_LIFETIME: u32 = 2;
    pub const OTHER_RAGDOLL_MASS_SCALE: f32 = 10.0;
    pub const CONTACT_PENETRATION_ALLOWANCE: f32 = 0.01;
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_dolls_per_simulation: Self::MAX_DOLLS_PER_SIMULATION,
            max_entities_per_simulation: Self::MAX_ENTITIES_PER_SIMULATION,
            max_collisions_per_simulation: Self::MAX_COLLISIONS_PER_SIMULATION,
            max_contact_frame_lifetime: Self::MAX_CONTACT_FRAME_LIFETIME,
            other_ragdoll_mass_scale: Self::OTHER_RAGDOLL_MASS_SCALE,
            contact_penetration_allowance: Self::CONTACT_PENETRATION_ALLOWANCE,
        }
    }
}
