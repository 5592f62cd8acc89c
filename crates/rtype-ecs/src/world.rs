//! The [`World`] facade: entities, components, systems, and deferred
//! destruction behind one explicitly-owned value.
//!
//! There is deliberately no global coordinator: the simulation loop owns a
//! `World` and threads it through every system call, which keeps tests
//! parallel-safe and makes every mutation path visible at the call site.
//!
//! Structural changes go through the facade so the three sub-structures stay
//! consistent: adding or removing a component mutates the storage, updates
//! the entity's signature, and re-evaluates system membership in one step.
//!
//! # Destruction
//!
//! Systems never destroy entities directly. They call
//! [`request_destroy`](World::request_destroy), and the simulation driver
//! calls [`apply_destructions`](World::apply_destructions) between phases so
//! every phase observes a stable set of live entities.

use std::collections::VecDeque;

use crate::entity::{EntityId, EntityStore, Signature};
use crate::storage::{ComponentManager, ComponentStorage, ComponentTypeId};
use crate::system::{SystemId, SystemRegistry};
use crate::EcsError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Top-level ECS container.
#[derive(Debug)]
pub struct World {
    entities: EntityStore,
    components: ComponentManager,
    systems: SystemRegistry,
    /// FIFO queue of destruction requests, applied by the driver.
    destroy_queue: VecDeque<EntityId>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            entities: EntityStore::new(),
            components: ComponentManager::new(),
            systems: SystemRegistry::new(),
            destroy_queue: VecDeque::new(),
        }
    }

    // -- registration -------------------------------------------------------

    /// Register component type `T`, allocating its signature bit.
    pub fn register_component<T: 'static + Send>(&mut self) -> ComponentTypeId {
        self.components.register::<T>()
    }

    /// Register a system by its required signature.
    pub fn register_system(&mut self, name: &str, required: Signature) -> SystemId {
        self.systems.register(name, required)
    }

    /// Build a required signature from registered component type ids.
    pub fn signature_of(&self, types: &[ComponentTypeId]) -> Signature {
        let mut sig = Signature::EMPTY;
        for ty in types {
            sig.insert(ty.bit());
        }
        sig
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Allocate a new entity with no components.
    ///
    /// # Errors
    ///
    /// [`EcsError::CapacityExceeded`] when the pool is full.
    pub fn create_entity(&mut self) -> Result<EntityId, EcsError> {
        self.entities.create()
    }

    /// Destroy an entity immediately: every storage's removal hook runs,
    /// system working sets drop it, and the slot is recycled.
    ///
    /// Prefer [`request_destroy`](Self::request_destroy) from inside a
    /// system pass.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        if !self.entities.is_alive(entity) {
            return;
        }
        self.components.entity_destroyed(entity);
        self.systems.entity_destroyed(entity);
        self.entities.destroy(entity);
    }

    /// Queue an entity for destruction at the next
    /// [`apply_destructions`](Self::apply_destructions).
    pub fn request_destroy(&mut self, entity: EntityId) {
        if self.entities.is_alive(entity) && !self.destroy_queue.contains(&entity) {
            self.destroy_queue.push_back(entity);
        }
    }

    /// Drain the destruction queue in FIFO order.
    ///
    /// Returns the ids that were actually destroyed (requests against
    /// entities that died in the meantime are skipped).
    pub fn apply_destructions(&mut self) -> Vec<EntityId> {
        let mut destroyed = Vec::with_capacity(self.destroy_queue.len());
        while let Some(entity) = self.destroy_queue.pop_front() {
            if self.entities.is_alive(entity) {
                self.destroy_entity(entity);
                destroyed.push(entity);
            }
        }
        destroyed
    }

    /// Whether a destruction request is pending for `entity`.
    pub fn destruction_pending(&self, entity: EntityId) -> bool {
        self.destroy_queue.contains(&entity)
    }

    /// Whether `entity` is currently live.
    #[inline]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// The signature of `entity`.
    pub fn signature(&self, entity: EntityId) -> Signature {
        self.entities.signature(entity)
    }

    // -- components ---------------------------------------------------------

    /// Attach a component, updating the signature and system membership.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] for a dead entity,
    /// [`EcsError::ComponentAlreadyPresent`] on duplicates. Both are
    /// programmer bugs in system code; callers on the hot path may ignore
    /// the result (the world stays consistent either way).
    pub fn add_component<T: 'static + Send>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> Result<(), EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::EntityNotAlive { entity });
        }
        let ty = self.components.register::<T>();
        self.components
            .storage_mut::<T>()
            .expect("storage exists after register")
            .insert(entity, value)?;

        let mut sig = self.entities.signature(entity);
        sig.insert(ty.bit());
        self.entities.set_signature(entity, sig);
        self.systems.signature_changed(entity, sig);
        Ok(())
    }

    /// Detach a component, updating the signature and system membership.
    pub fn remove_component<T: 'static>(&mut self, entity: EntityId) -> Result<T, EcsError> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::EntityNotAlive { entity });
        }
        let ty = self
            .components
            .type_id::<T>()
            .ok_or(EcsError::ComponentMissing { entity })?;
        let value = self
            .components
            .storage_mut::<T>()
            .expect("registered type has storage")
            .remove(entity)?;

        let mut sig = self.entities.signature(entity);
        sig.remove(ty.bit());
        self.entities.set_signature(entity, sig);
        self.systems.signature_changed(entity, sig);
        Ok(value)
    }

    /// Shared access to `entity`'s `T` component.
    #[inline]
    pub fn get<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        self.components.storage::<T>()?.get(entity)
    }

    /// Mutable access to `entity`'s `T` component.
    #[inline]
    pub fn get_mut<T: 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.components.storage_mut::<T>()?.get_mut(entity)
    }

    /// Whether `entity` holds a `T` component.
    #[inline]
    pub fn has<T: 'static>(&self, entity: EntityId) -> bool {
        self.components
            .storage::<T>()
            .is_some_and(|s| s.contains(entity))
    }

    /// The full storage for `T` (snapshot building, bulk scans).
    pub fn storage<T: 'static>(&self) -> Option<&ComponentStorage<T>> {
        self.components.storage::<T>()
    }

    // -- systems ------------------------------------------------------------

    /// The current working set of `system`, in insertion order.
    pub fn members(&self, system: SystemId) -> &[EntityId] {
        self.systems.members(system)
    }

    /// A copy of `system`'s working set.
    ///
    /// Phases iterate over this copy so that spawns and membership churn
    /// during the pass cannot invalidate the iteration: every phase sees the
    /// set of entities that matched at its start.
    pub fn members_snapshot(&self, system: SystemId) -> Vec<EntityId> {
        self.systems.members(system).to_vec()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
