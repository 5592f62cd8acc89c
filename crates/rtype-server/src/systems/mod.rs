//! Per-tick behavior systems, one module per phase.
//!
//! Execution order is fixed by the kernel: input → ai → movement → boundary
//! → spawner → collision → health → lifetime. Every system iterates a copy
//! of its working set taken at phase start, so entities spawned during a
//! phase become visible to *later* phases and destruction is only ever
//! queued, never applied mid-phase.

pub mod ai;
pub mod boundary;
pub mod collision;
pub mod health;
pub mod input;
pub mod lifetime;
pub mod movement;
pub mod spawner;

use rtype_ecs::prelude::*;

use crate::components::ComponentSet;

/// Handles for every registered system and snapshot view.
#[derive(Debug, Clone, Copy)]
pub struct SystemHandles {
    pub input: SystemId,
    pub ai: SystemId,
    pub movement: SystemId,
    pub boundary: SystemId,
    pub spawner: SystemId,
    pub collision: SystemId,
    pub health: SystemId,
    pub lifetime: SystemId,
    /// Anything with a position and a faction; the AI scans this for targets.
    pub targets: SystemId,
    /// Snapshot views.
    pub players: SystemId,
    pub enemies: SystemId,
    pub projectiles: SystemId,
}

impl SystemHandles {
    /// Register every system against its required signature.
    pub fn register(world: &mut World, c: &ComponentSet) -> Self {
        Self {
            input: world.register_system("input", world.signature_of(&[c.player_input, c.velocity])),
            ai: world.register_system(
                "ai",
                world.signature_of(&[c.transform, c.velocity, c.ai, c.health, c.team]),
            ),
            movement: world
                .register_system("movement", world.signature_of(&[c.transform, c.velocity])),
            boundary: world
                .register_system("boundary", world.signature_of(&[c.transform, c.boundary])),
            spawner: world
                .register_system("spawner", world.signature_of(&[c.spawner, c.transform])),
            collision: world.register_system(
                "collision",
                world.signature_of(&[c.transform, c.collider, c.team]),
            ),
            health: world.register_system("health", world.signature_of(&[c.health])),
            lifetime: world.register_system("lifetime", world.signature_of(&[c.lifetime])),
            targets: world.register_system("targets", world.signature_of(&[c.transform, c.team])),
            players: world.register_system(
                "players_view",
                world.signature_of(&[c.player_tag, c.transform, c.health]),
            ),
            enemies: world.register_system(
                "enemies_view",
                world.signature_of(&[c.enemy_tag, c.transform, c.health]),
            ),
            projectiles: world.register_system(
                "projectiles_view",
                world.signature_of(&[c.projectile_tag, c.transform]),
            ),
        }
    }
}
