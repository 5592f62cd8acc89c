//! rtype-ecs -- Sparse-set Entity Component System with signature matching.
//!
//! This crate provides the data plane of the game server. Entities are plain
//! `u32` handles from a fixed pool of 5000 slots; each component type lives
//! in its own dense array with swap-delete removal; systems declare a
//! required signature bitmask and the registry keeps their working sets in
//! sync whenever an entity gains or loses a component.
//!
//! # Quick Start
//!
//! ```
//! use rtype_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! struct Velocity { vx: f32, vy: f32 }
//!
//! let mut world = World::new();
//! let pos = world.register_component::<Position>();
//! let vel = world.register_component::<Velocity>();
//! let movement = world.register_system("movement", world.signature_of(&[pos, vel]));
//!
//! let e = world.create_entity().unwrap();
//! world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
//! world.add_component(e, Velocity { vx: 1.0, vy: 0.0 }).unwrap();
//!
//! for entity in world.members_snapshot(movement) {
//!     let v = world.get::<Velocity>(entity).copied().unwrap();
//!     let p = world.get_mut::<Position>(entity).unwrap();
//!     p.x += v.vx;
//! }
//! assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 0.0 }));
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod storage;
pub mod system;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// `CapacityExceeded` is an expected runtime condition (the spawn is simply
/// refused). The component errors indicate bugs in system wiring; callers on
/// the simulation path log them and continue, so no error ever escapes the
/// loop.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity pool is full (5000 live entities).
    #[error("entity capacity exceeded")]
    CapacityExceeded,

    /// The entity is not live (destroyed or never created).
    #[error("entity {entity:?} is not alive")]
    EntityNotAlive { entity: entity::EntityId },

    /// The entity already holds a component of this type.
    #[error("component already present on {entity:?}")]
    ComponentAlreadyPresent { entity: entity::EntityId },

    /// The entity holds no component of this type.
    #[error("component missing on {entity:?}")]
    ComponentMissing { entity: entity::EntityId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityId, EntityStore, Signature, MAX_COMPONENT_TYPES, MAX_ENTITIES};
    pub use crate::storage::{ComponentManager, ComponentStorage, ComponentTypeId};
    pub use crate::system::{SystemId, SystemRegistry};
    pub use crate::world::World;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Transform {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        vx: f32,
        vy: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);

    // -- signature/storage consistency --------------------------------------

    #[test]
    fn signature_mirrors_storages_through_churn() {
        let mut world = World::new();
        let t = world.register_component::<Transform>();
        let v = world.register_component::<Velocity>();
        let h = world.register_component::<Health>();

        let e = world.create_entity().unwrap();
        world.add_component(e, Transform { x: 0.0, y: 0.0 }).unwrap();
        world.add_component(e, Velocity { vx: 0.0, vy: 0.0 }).unwrap();
        world.add_component(e, Health(100)).unwrap();

        let sig = world.signature(e);
        assert!(sig.contains(t.bit()) && world.has::<Transform>(e));
        assert!(sig.contains(v.bit()) && world.has::<Velocity>(e));
        assert!(sig.contains(h.bit()) && world.has::<Health>(e));

        world.remove_component::<Velocity>(e).unwrap();
        let sig = world.signature(e);
        assert!(!sig.contains(v.bit()));
        assert!(!world.has::<Velocity>(e));
        assert!(sig.contains(t.bit()) && world.has::<Transform>(e));
    }

    // -- recycled slots start clean ------------------------------------------

    #[test]
    fn recycled_entity_has_no_stale_components() {
        let mut world = World::new();
        world.register_component::<Health>();

        // Fill the pool so the next create after a destroy reuses the slot.
        let mut ids = Vec::new();
        for _ in 0..MAX_ENTITIES {
            ids.push(world.create_entity().unwrap());
        }
        let victim = ids[42];
        world.add_component(victim, Health(5)).unwrap();
        world.destroy_entity(victim);

        let reused = world.create_entity().unwrap();
        assert_eq!(reused, victim);
        assert!(world.signature(reused).is_empty());
        assert!(!world.has::<Health>(reused));
    }

    // -- cross-system membership under interleaved edits ---------------------

    #[test]
    fn multiple_systems_stay_consistent() {
        let mut world = World::new();
        let t = world.register_component::<Transform>();
        let v = world.register_component::<Velocity>();
        let h = world.register_component::<Health>();

        let movement = world.register_system("movement", world.signature_of(&[t, v]));
        let health = world.register_system("health", world.signature_of(&[h]));

        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();

        world.add_component(a, Transform { x: 0.0, y: 0.0 }).unwrap();
        world.add_component(a, Velocity { vx: 1.0, vy: 0.0 }).unwrap();
        world.add_component(b, Transform { x: 0.0, y: 0.0 }).unwrap();
        world.add_component(b, Health(50)).unwrap();

        assert_eq!(world.members(movement), &[a]);
        assert_eq!(world.members(health), &[b]);

        world.add_component(b, Velocity { vx: 0.0, vy: 1.0 }).unwrap();
        assert_eq!(world.members(movement), &[a, b]);

        world.request_destroy(a);
        world.apply_destructions();
        assert_eq!(world.members(movement), &[b]);
        assert_eq!(world.members(health), &[b]);
    }
}
