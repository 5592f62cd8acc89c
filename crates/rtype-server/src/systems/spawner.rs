//! Spawner system: periodic entity emission.
//!
//! Entities spawned here become visible to the phases that follow in the
//! same tick (collision onward), per the kernel's phase ordering.

use rtype_ecs::prelude::*;

use crate::components::{SpawnKind, Spawner, Team, Transform, TEAM_NEUTRAL};
use crate::config::GameConfig;
use crate::spawn;

/// Advance every spawner's timer and emit when due.
pub fn run(world: &mut World, system: SystemId, dt: f32, cfg: &GameConfig) {
    for entity in world.members_snapshot(system) {
        let Some(&spawner) = world.get::<Spawner>(entity) else {
            continue;
        };
        let Some(&at) = world.get::<Transform>(entity) else {
            continue;
        };

        let mut next = spawner;
        next.timer += dt;
        if next.timer >= next.cooldown && next.has_budget() {
            next.timer = 0.0;
            let x = at.x + next.offset_x;
            let y = at.y + next.offset_y;
            let spawned = match next.kind {
                SpawnKind::Projectile => {
                    let team = world
                        .get::<Team>(entity)
                        .map(|t| t.id)
                        .unwrap_or(TEAM_NEUTRAL);
                    let damage = match team {
                        crate::components::TEAM_ENEMIES => cfg.enemy_projectile_damage,
                        _ => cfg.player_projectile_damage,
                    };
                    spawn::spawn_projectile(
                        world,
                        cfg,
                        x,
                        y,
                        next.velocity_x,
                        next.velocity_y,
                        damage,
                        team,
                        entity,
                    )
                }
                SpawnKind::Enemy => spawn::spawn_enemy(world, cfg, x, y).map(|e| {
                    if let Some(v) = world.get_mut::<crate::components::Velocity>(e) {
                        v.vx = next.velocity_x;
                        v.vy = next.velocity_y;
                    }
                    e
                }),
                SpawnKind::Powerup => spawn::spawn_powerup(world, cfg, x, y),
            };
            match spawned {
                Ok(_) => next.spawned += 1,
                // Pool exhausted: refuse the spawn, try again next cooldown.
                Err(e) => tracing::debug!(spawner = %entity, error = %e, "spawn refused"),
            }
        }

        if let Some(slot) = world.get_mut::<Spawner>(entity) {
            *slot = next;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
