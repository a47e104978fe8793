use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use log::{debug, trace, warn};

use crate::{
    collision::{self, CollisionList, ContactPoint, PairKey, RayIntersectionInfo},
    common::SimulationConfig,
    error::MembershipError,
    objects::{EntityId, RagdollId},
    shapes::ShapeId,
    timing::{Clock, MonotonicClock},
};

use super::PhysicsWorld;

static NEXT_SIMULATION_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a [`Simulation`], unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimulationId(u32);

impl SimulationId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SIMULATION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// What one call to [`Simulation::step_forward`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepStats {
    pub frame: u32,
    /// Passes through the relaxation loop (always at least one).
    pub iterations: u32,
    /// Largest constraint error left after the last pass.
    pub error: f32,
    /// Collisions found by the last pass.
    pub collisions: usize,
    /// Whether the primary entity hit any other entity during the step.
    pub collided_with_other: bool,
    pub elapsed_usec: u64,
}

/// Steps one primary entity and ragdoll together with the entities and
/// ragdolls around it.
///
/// The simulation holds handles into a [`PhysicsWorld`]; every operation
/// that reads or moves objects takes the world explicitly.
#[derive(Debug)]
pub struct Simulation {
    id: SimulationId,
    config: SimulationConfig,
    clock: Box<dyn Clock>,

    entity: Option<EntityId>,
    other_entities: Vec<EntityId>,
    ragdoll: Option<RagdollId>,
    other_ragdolls: Vec<RagdollId>,

    contacts: HashMap<PairKey, ContactPoint>,
    collisions: CollisionList,
    frame_count: u32,
    translation: Vec3,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_clock(config, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: SimulationConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            id: SimulationId::next(),
            config,
            clock,
            entity: None,
            other_entities: Vec::new(),
            ragdoll: None,
            other_ragdolls: Vec::new(),
            contacts: HashMap::new(),
            collisions: CollisionList::new(config.max_collisions_per_simulation),
            frame_count: 0,
            translation: Vec3::ZERO,
        }
    }

    pub fn id(&self) -> SimulationId {
        self.id
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn ragdoll(&self) -> Option<RagdollId> {
        self.ragdoll
    }

    pub fn other_entities(&self) -> &[EntityId] {
        &self.other_entities
    }

    pub fn other_ragdolls(&self) -> &[RagdollId] {
        &self.other_ragdolls
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entity == Some(id) || self.other_entities.contains(&id)
    }

    pub fn contains_ragdoll(&self, id: RagdollId) -> bool {
        self.ragdoll == Some(id) || self.other_ragdolls.contains(&id)
    }

    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    pub fn contact(&self, key: PairKey) -> Option<&ContactPoint> {
        self.contacts.get(&key)
    }

    pub fn contacts(&self) -> impl Iterator<Item = (&PairKey, &ContactPoint)> {
        self.contacts.iter()
    }

    /// Collisions found by the most recent detection pass.
    pub fn collisions(&self) -> &CollisionList {
        &self.collisions
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Translation of the simulation frame in the world. Shapes live in this
    /// frame; ragdoll root targets are measured against it.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    // --- Membership ---

    /// Adds `id` to the other entities. Adding a member again succeeds without duplicating it.
    pub fn try_add_entity(&mut self, world: &mut PhysicsWorld, id: EntityId) -> Result<(), MembershipError> {
        let slot = world
            .entities
            .get_mut(id.index())
            .ok_or(MembershipError::UnknownEntity(id))?;
        if self.entity == Some(id) {
            return Err(MembershipError::PrimaryConflict);
        }
        if self.other_entities.contains(&id) {
            return Ok(());
        }
        if let Some(owner) = slot.simulation.filter(|&owner| owner != self.id) {
            return Err(MembershipError::OwnedElsewhere { owner });
        }
        let capacity = self.config.max_entities_per_simulation;
        if self.other_entities.len() >= capacity {
            return Err(MembershipError::EntityCapacity { capacity });
        }
        debug_assert!(slot.simulation.is_none(), "entity {:?} has a stale owner", id);
        slot.simulation = Some(self.id);
        self.other_entities.push(id);
        debug!("{:?}: added entity {:?}", self.id, id);
        Ok(())
    }

    pub fn add_entity(&mut self, world: &mut PhysicsWorld, id: EntityId) -> bool {
        let result = self.try_add_entity(world, id);
        self.report(result, "add entity")
    }

    /// Adds `id` to the other ragdolls and gives it the heavy "other" mass scale.
    pub fn try_add_ragdoll(&mut self, world: &mut PhysicsWorld, id: RagdollId) -> Result<(), MembershipError> {
        let slot = world
            .ragdolls
            .get_mut(id.index())
            .ok_or(MembershipError::UnknownRagdoll(id))?;
        if self.ragdoll == Some(id) {
            return Err(MembershipError::PrimaryConflict);
        }
        if self.other_ragdolls.contains(&id) {
            return Ok(());
        }
        if let Some(owner) = slot.simulation.filter(|&owner| owner != self.id) {
            return Err(MembershipError::OwnedElsewhere { owner });
        }
        let capacity = self.config.max_dolls_per_simulation;
        if self.other_ragdolls.len() >= capacity {
            return Err(MembershipError::RagdollCapacity { capacity });
        }
        debug_assert!(slot.simulation.is_none(), "ragdoll {:?} has a stale owner", id);
        slot.simulation = Some(self.id);
        slot.ragdoll
            .set_mass_scale(self.config.other_ragdoll_mass_scale, &mut world.shapes);
        self.other_ragdolls.push(id);
        debug!("{:?}: added ragdoll {:?}", self.id, id);
        Ok(())
    }

    pub fn add_ragdoll(&mut self, world: &mut PhysicsWorld, id: RagdollId) -> bool {
        let result = self.try_add_ragdoll(world, id);
        self.report(result, "add ragdoll")
    }

    /// Removes a primary or other entity along with every contact on its shapes.
    pub fn remove_entity(&mut self, world: &mut PhysicsWorld, id: EntityId) {
        if self.entity == Some(id) {
            self.entity = None;
        } else if let Some(index) = self.other_entities.iter().position(|&e| e == id) {
            self.other_entities.swap_remove(index);
        } else {
            return;
        }
        self.remove_shapes(world, id);
        self.release_entity(world, id);
        debug!("{:?}: removed entity {:?}", self.id, id);
    }

    /// Removes a primary or other ragdoll. Other ragdolls get their mass scale back to 1.0.
    pub fn remove_ragdoll(&mut self, world: &mut PhysicsWorld, id: RagdollId) {
        if self.ragdoll == Some(id) {
            self.ragdoll = None;
        } else if let Some(index) = self.other_ragdolls.iter().position(|&d| d == id) {
            self.other_ragdolls.swap_remove(index);
            if let Some(slot) = world.ragdolls.get_mut(id.index()) {
                slot.ragdoll.set_mass_scale(1.0, &mut world.shapes);
            }
        } else {
            return;
        }
        self.release_ragdoll(world, id);
        debug!("{:?}: removed ragdoll {:?}", self.id, id);
    }

    /// Replaces the primary entity. `None` only clears the slot.
    pub fn try_set_entity(&mut self, world: &mut PhysicsWorld, entity: Option<EntityId>) -> Result<(), MembershipError> {
        if let Some(id) = entity {
            if self.entity == Some(id) {
                return Ok(());
            }
            let slot = world.entities.get(id.index()).ok_or(MembershipError::UnknownEntity(id))?;
            if self.other_entities.contains(&id) {
                return Err(MembershipError::PrimaryConflict);
            }
            if let Some(owner) = slot.simulation {
                if owner != self.id {
                    return Err(MembershipError::OwnedElsewhere { owner });
                }
            }
        }
        if let Some(previous) = self.entity.take() {
            self.remove_shapes(world, previous);
            self.release_entity(world, previous);
        }
        if let Some(id) = entity {
            if let Some(slot) = world.entities.get_mut(id.index()) {
                debug_assert!(slot.simulation.is_none(), "entity {:?} has a stale owner", id);
                slot.simulation = Some(self.id);
            }
            self.entity = Some(id);
        }
        debug!("{:?}: primary entity is now {:?}", self.id, entity);
        Ok(())
    }

    pub fn set_entity(&mut self, world: &mut PhysicsWorld, entity: Option<EntityId>) -> bool {
        let result = self.try_set_entity(world, entity);
        self.report(result, "set entity")
    }

    /// Replaces the primary ragdoll. `None` only clears the slot.
    pub fn try_set_ragdoll(&mut self, world: &mut PhysicsWorld, ragdoll: Option<RagdollId>) -> Result<(), MembershipError> {
        if let Some(id) = ragdoll {
            if self.ragdoll == Some(id) {
                return Ok(());
            }
            let slot = world
                .ragdolls
                .get(id.index())
                .ok_or(MembershipError::UnknownRagdoll(id))?;
            if self.other_ragdolls.contains(&id) {
                return Err(MembershipError::PrimaryConflict);
            }
            if let Some(owner) = slot.simulation {
                if owner != self.id {
                    return Err(MembershipError::OwnedElsewhere { owner });
                }
            }
        }
        if let Some(previous) = self.ragdoll.take() {
            self.release_ragdoll(world, previous);
        }
        if let Some(id) = ragdoll {
            if let Some(slot) = world.ragdolls.get_mut(id.index()) {
                debug_assert!(slot.simulation.is_none(), "ragdoll {:?} has a stale owner", id);
                slot.simulation = Some(self.id);
            }
            self.ragdoll = Some(id);
        }
        debug!("{:?}: primary ragdoll is now {:?}", self.id, ragdoll);
        Ok(())
    }

    pub fn set_ragdoll(&mut self, world: &mut PhysicsWorld, ragdoll: Option<RagdollId>) -> bool {
        let result = self.try_set_ragdoll(world, ragdoll);
        self.report(result, "set ragdoll")
    }

    /// Detaches every entity and ragdoll and forgets all contacts.
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for id in std::mem::take(&mut self.other_ragdolls) {
            if let Some(slot) = world.ragdolls.get_mut(id.index()) {
                slot.ragdoll.set_mass_scale(1.0, &mut world.shapes);
            }
            self.release_ragdoll(world, id);
        }
        if let Some(id) = self.ragdoll.take() {
            self.release_ragdoll(world, id);
        }
        for id in std::mem::take(&mut self.other_entities) {
            self.release_entity(world, id);
        }
        if let Some(id) = self.entity.take() {
            self.release_entity(world, id);
        }
        self.contacts.clear();
        self.collisions.clear();
        debug!("{:?}: cleared", self.id);
    }

    fn report(&self, result: Result<(), MembershipError>, operation: &str) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                warn!("{:?}: cannot {}: {}", self.id, operation, err);
                false
            }
        }
    }

    fn release_entity(&self, world: &mut PhysicsWorld, id: EntityId) {
        if let Some(slot) = world.entities.get_mut(id.index()) {
            if slot.simulation == Some(self.id) {
                slot.simulation = None;
            }
        }
    }

    fn release_ragdoll(&self, world: &mut PhysicsWorld, id: RagdollId) {
        if let Some(slot) = world.ragdolls.get_mut(id.index()) {
            if slot.simulation == Some(self.id) {
                slot.simulation = None;
            }
        }
    }

    // --- Collisions and contacts ---

    /// Fills the collision list for this pass: the primary entity against
    /// itself, then against every other entity. Returns whether any other
    /// entity was hit.
    pub fn compute_collisions(&mut self, world: &PhysicsWorld) -> bool {
        self.collisions.clear();
        let Some(primary) = self.entity.and_then(|id| world.entity(id)) else {
            return false;
        };
        let own_shapes = primary.shapes();

        for i in 0..own_shapes.len() {
            for j in (i + 1)..own_shapes.len() {
                if primary.collisions_are_enabled(i, j) {
                    collision::collide_shapes(own_shapes[i], own_shapes[j], &world.shapes, &mut self.collisions);
                }
            }
        }

        let mut collided_with_other = false;
        for &other in &self.other_entities {
            let Some(entity) = world.entity(other) else {
                continue;
            };
            if collision::collide_shapes_with_shapes(own_shapes, entity.shapes(), &world.shapes, &mut self.collisions) {
                collided_with_other = true;
            }
        }

        if self.collisions.dropped() > 0 {
            warn!(
                "{:?}: collision list full ({}), dropped {} collisions",
                self.id,
                self.collisions.capacity(),
                self.collisions.dropped()
            );
        }
        collided_with_other
    }

    /// Creates or refreshes a contact for every collision of the last pass.
    pub fn update_contacts(&mut self, world: &PhysicsWorld) {
        let frame = self.frame_count;
        let allowance = self.config.contact_penetration_allowance;
        for info in self.collisions.iter() {
            let Some(key) = info.shape_pair_key() else {
                continue;
            };
            match self.contacts.entry(key) {
                Entry::Occupied(mut entry) => entry.get_mut().update_contact(info, frame, &world.shapes),
                Entry::Vacant(entry) => {
                    if let Some(contact) = ContactPoint::new(info, frame, &world.shapes, allowance) {
                        entry.insert(contact);
                    }
                }
            }
        }
    }

    /// Pushes every tracked contact apart. Returns the largest overlap found.
    pub fn enforce_contacts(&mut self, world: &mut PhysicsWorld) -> f32 {
        self.contacts
            .values_mut()
            .map(|contact| contact.enforce(&mut world.shapes))
            .fold(0.0, f32::max)
    }

    pub fn apply_contact_friction(&mut self, world: &mut PhysicsWorld) {
        for contact in self.contacts.values_mut() {
            contact.apply_friction(&mut world.shapes);
        }
    }

    /// Drops contacts that were not refreshed within the configured lifetime.
    pub fn prune_contacts(&mut self) {
        let frame = self.frame_count;
        let lifetime = self.config.max_contact_frame_lifetime;
        self.contacts
            .retain(|_, contact| frame.wrapping_sub(contact.last_frame()) <= lifetime);
    }

    /// Drops every contact touching a shape of `entity`.
    pub fn remove_shapes(&mut self, world: &PhysicsWorld, entity: EntityId) {
        let Some(entity) = world.entity(entity) else {
            return;
        };
        let shapes = entity.shapes();
        self.contacts
            .retain(|_, contact| !shapes.iter().any(|&shape| contact.references_shape(shape)));
    }

    pub fn remove_shape(&mut self, shape: ShapeId) {
        self.contacts.retain(|_, contact| !contact.references_shape(shape));
    }

    /// Moves the shapes of every collision apart. Each shape moves once, by
    /// the average of the corrections it received.
    pub fn resolve_collisions(&mut self, world: &mut PhysicsWorld) {
        let mut touched = HashSet::new();
        for info in self.collisions.iter() {
            info.apply(&mut world.shapes);
            touched.insert(info.shape_a);
            if let Some(b) = info.shape_b {
                touched.insert(b);
            }
        }
        for id in touched {
            if let Some(shape) = world.shapes.get_mut(id) {
                shape.apply_accumulated_delta();
            }
        }
    }

    // --- Stepping ---

    fn integrate(&self, world: &mut PhysicsWorld, delta_time: f32) {
        let PhysicsWorld { shapes, entities, ragdolls } = world;
        for &id in &self.other_entities {
            if let Some(slot) = entities.get_mut(id.index()) {
                slot.entity.step_forward(delta_time, shapes);
            }
        }
        for id in self.ragdoll.iter().chain(&self.other_ragdolls) {
            if let Some(slot) = ragdolls.get_mut(id.index()) {
                slot.ragdoll.step_forward(delta_time, shapes);
            }
        }
    }

    /// Enforces the constraints of every ragdoll once. Returns the largest error.
    fn enforce_ragdolls(&self, world: &mut PhysicsWorld) -> f32 {
        let PhysicsWorld { shapes, ragdolls, .. } = world;
        let mut error: f32 = 0.0;
        for id in self.ragdoll.iter().chain(&self.other_ragdolls) {
            if let Some(slot) = ragdolls.get_mut(id.index()) {
                error = error.max(slot.ragdoll.enforce_constraints(shapes));
            }
        }
        error
    }

    fn remove_root_offsets(&self, world: &mut PhysicsWorld, collided_with_other: bool) {
        let PhysicsWorld { shapes, ragdolls, .. } = world;
        if let Some(slot) = self.ragdoll.and_then(|id| ragdolls.get_mut(id.index())) {
            slot.ragdoll.set_simulation_translation(self.translation);
            slot.ragdoll.remove_root_offset(collided_with_other, shapes);
        }
        for id in &self.other_ragdolls {
            if let Some(slot) = ragdolls.get_mut(id.index()) {
                slot.ragdoll.set_simulation_translation(self.translation);
                slot.ragdoll.remove_root_offset(false, shapes);
            }
        }
    }

    /// Advances everything by `delta_time` and relaxes collisions and
    /// constraints until the step converges or runs out of budget.
    ///
    /// The relaxation loop always runs once. It repeats while the last pass
    /// found collisions, fewer than `max_iterations` passes have run, the
    /// constraint error is above `min_error` and `max_usec` microseconds have
    /// not elapsed since the step began.
    pub fn step_forward(
        &mut self,
        world: &mut PhysicsWorld,
        delta_time: f32,
        min_error: f32,
        max_iterations: u32,
        max_usec: u64,
    ) -> StepStats {
        self.frame_count = self.frame_count.wrapping_add(1);
        let start = self.clock.now_usec();
        let expiry = start.saturating_add(max_usec);

        self.integrate(world, delta_time);
        self.enforce_contacts(world);
        let mut error = self.enforce_ragdolls(world);
        trace!("{:?}: frame {} starts with constraint error {}", self.id, self.frame_count, error);

        let mut iterations = 0;
        let mut collided_with_other = false;
        let mut now;
        loop {
            if self.compute_collisions(world) {
                collided_with_other = true;
            }
            self.update_contacts(world);
            self.resolve_collisions(world);
            error = self.enforce_ragdolls(world);
            self.apply_contact_friction(world);
            iterations += 1;

            now = self.clock.now_usec();
            let keep_going =
                !self.collisions.is_empty() && iterations < max_iterations && error > min_error && now < expiry;
            if !keep_going {
                break;
            }
        }

        self.remove_root_offsets(world, collided_with_other);
        self.prune_contacts();

        let stats = StepStats {
            frame: self.frame_count,
            iterations,
            error,
            collisions: self.collisions.len(),
            collided_with_other,
            elapsed_usec: now.saturating_sub(start),
        };
        trace!("{:?}: {:?}", self.id, stats);
        stats
    }

    // --- Queries ---

    /// Casts `intersection` against the other entities, keeping the nearest hit.
    pub fn find_floor_ray_intersection(&self, world: &PhysicsWorld, intersection: &mut RayIntersectionInfo) -> bool {
        let mut hit = false;
        for &id in &self.other_entities {
            if let Some(entity) = world.entity(id) {
                if collision::find_ray_intersection(entity.shapes(), &world.shapes, intersection) {
                    hit = true;
                }
            }
        }
        hit
    }

    /// Collides `shape` against the other entities, writing hits to `collisions`.
    pub fn get_shape_collisions(&self, world: &PhysicsWorld, shape: ShapeId, collisions: &mut CollisionList) -> bool {
        let mut hit = false;
        for &id in &self.other_entities {
            if let Some(entity) = world.entity(id) {
                if collision::collide_shape_with_shapes(shape, entity.shapes(), 0, &world.shapes, collisions) {
                    hit = true;
                }
            }
        }
        hit
    }
}
