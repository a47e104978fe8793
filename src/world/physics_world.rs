use crate::{
    objects::{EntityId, PhysicsEntity, Ragdoll, RagdollId},
    shapes::{Shape, ShapeId, ShapeSet},
};

use super::SimulationId;

#[derive(Debug)]
pub(crate) struct EntitySlot {
    pub(crate) entity: Box<dyn PhysicsEntity>,
    /// The simulation currently stepping this entity.
    pub(crate) simulation: Option<SimulationId>,
}

#[derive(Debug)]
pub(crate) struct RagdollSlot {
    pub(crate) ragdoll: Box<dyn Ragdoll>,
    pub(crate) simulation: Option<SimulationId>,
}

/// Owns every shape, entity and ragdoll that simulations operate on.
///
/// Simulations only hold handles; each entity and ragdoll records which
/// simulation (if any) it currently belongs to.
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    pub(crate) shapes: ShapeSet,
    pub(crate) entities: Vec<EntitySlot>,
    pub(crate) ragdolls: Vec<RagdollSlot>,
}

impl PhysicsWorld {
    /// Creates a new, empty physics world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape to the world and returns its handle.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        self.shapes.insert(shape)
    }

    /// Adds an entity and marks its shapes as owned by it.
    pub fn add_entity(&mut self, entity: impl PhysicsEntity + 'static) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        for &shape in entity.shapes() {
            self.shapes.set_entity(shape, id);
        }
        self.entities.push(EntitySlot {
            entity: Box::new(entity),
            simulation: None,
        });
        id
    }

    pub fn add_ragdoll(&mut self, ragdoll: impl Ragdoll + 'static) -> RagdollId {
        let id = RagdollId(self.ragdolls.len() as u32);
        self.ragdolls.push(RagdollSlot {
            ragdoll: Box::new(ragdoll),
            simulation: None,
        });
        id
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    pub fn shapes(&self) -> &ShapeSet {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut ShapeSet {
        &mut self.shapes
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn PhysicsEntity> {
        self.entities.get(id.index()).map(|slot| slot.entity.as_ref())
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut (dyn PhysicsEntity + 'static)> {
        self.entities.get_mut(id.index()).map(|slot| slot.entity.as_mut())
    }

    pub fn ragdoll(&self, id: RagdollId) -> Option<&dyn Ragdoll> {
        self.ragdolls.get(id.index()).map(|slot| slot.ragdoll.as_ref())
    }

    /// Mutable access to a ragdoll together with the shapes it moves.
    pub fn ragdoll_mut(&mut self, id: RagdollId) -> Option<(&mut (dyn Ragdoll + 'static), &mut ShapeSet)> {
        let slot = self.ragdolls.get_mut(id.index())?;
        Some((slot.ragdoll.as_mut(), &mut self.shapes))
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn num_ragdolls(&self) -> usize {
        self.ragdolls.len()
    }

    /// The simulation currently holding the entity, if any.
    pub fn entity_simulation(&self, id: EntityId) -> Option<SimulationId> {
        self.entities.get(id.index()).and_then(|slot| slot.simulation)
    }

    pub fn ragdoll_simulation(&self, id: RagdollId) -> Option<SimulationId> {
        self.ragdolls.get(id.index()).and_then(|slot| slot.simulation)
    }

    /// Detaches everything still recorded as owned by `simulation`.
    ///
    /// For simulations dropped without [`Simulation::clear`](super::Simulation::clear).
    /// Mass scales of ragdolls are left as they are.
    pub fn release_simulation(&mut self, simulation: SimulationId) {
        for slot in &mut self.entities {
            if slot.simulation == Some(simulation) {
                slot.simulation = None;
            }
        }
        for slot in &mut self.ragdolls {
            if slot.simulation == Some(simulation) {
                slot.simulation = None;
            }
        }
    }
}
