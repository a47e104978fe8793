//! Position-based ragdoll simulation.
//!
//! A [`PhysicsWorld`] owns shapes, entities and ragdolls. A [`Simulation`]
//! steps one primary entity and ragdoll against the entities and ragdolls
//! added to it: it integrates motion, detects and resolves collisions,
//! keeps persistent contacts with friction, and relaxes ragdoll constraints
//! within an iteration, error and wall-clock budget.

pub mod collision;
pub mod common;
pub mod constraints;
pub mod error;
pub mod integration;
pub mod objects;
pub mod shapes;
pub mod timing;
pub mod world;

// Re-export key types for easier use
pub use collision::{CollisionInfo, CollisionList, ContactPoint, PairKey, RayIntersectionInfo};
pub use common::{Material, SimulationConfig};
pub use constraints::{Constraint, DistanceConstraint, FixedConstraint};
pub use error::MembershipError;
pub use objects::{EntityId, JointedRagdoll, PhysicsEntity, Ragdoll, RagdollId, RigidEntity};
pub use shapes::{Shape, ShapeId, ShapeKind, ShapeSet};
pub use timing::{Clock, ManualClock, MonotonicClock};
pub use world::{PhysicsWorld, Simulation, SimulationId, StepStats};
