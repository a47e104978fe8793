pub mod entity;
pub mod ragdoll;

pub use entity::{PhysicsEntity, RigidEntity};
pub use ragdoll::{JointedRagdoll, Ragdoll};

/// Handle of an entity stored in a [`PhysicsWorld`](crate::world::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a ragdoll stored in a [`PhysicsWorld`](crate::world::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RagdollId(pub(crate) u32);

impl RagdollId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
