//! Errors reported by the membership API of a simulation.

use thiserror::Error;

use crate::objects::{EntityId, RagdollId};
use crate::world::SimulationId;

/// Why an entity or ragdoll could not join (or become primary in) a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("entity {0:?} does not exist in this world")]
    UnknownEntity(EntityId),
    #[error("ragdoll {0:?} does not exist in this world")]
    UnknownRagdoll(RagdollId),
    #[error("already simulated by {owner:?}")]
    OwnedElsewhere { owner: SimulationId },
    #[error("already a member of this simulation in the other role")]
    PrimaryConflict,
    #[error("entity list is full ({capacity})")]
    EntityCapacity { capacity: usize },
    #[error("ragdoll list is full ({capacity})")]
    RagdollCapacity { capacity: usize },
}
