//! Collision system: pair tests, damage application, kill credit.
//!
//! Pairs come from the collision view (transform + collider + team).
//! Everything collides as a circle; boxes use their larger half-extent.
//! Same-team contacts are filtered out before any damage is considered.

use rtype_ecs::prelude::*;

use crate::components::{Collider, Damager, Health, ProjectileTag, Team, Transform, TEAM_PLAYERS};
use crate::config::GameConfig;

/// A confirmed kill by a player-owned projectile, for score accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillCredit {
    /// The entity that fired the lethal projectile.
    pub shooter: EntityId,
}

/// Test all unordered pairs and resolve damage.
///
/// Returns the kill credits earned this tick so the session layer can score
/// them; the hit entities themselves are only *queued* for destruction.
pub fn run(world: &mut World, system: SystemId, cfg: &GameConfig) -> Vec<KillCredit> {
    let members = world.members_snapshot(system);
    let mut credits = Vec::new();

    for i in 0..members.len() {
        for j in i + 1..members.len() {
            let a = members[i];
            let b = members[j];
            // An entity consumed earlier this phase (a projectile that
            // already hit) takes no further part in collisions.
            if world.destruction_pending(a) || world.destruction_pending(b) {
                continue;
            }
            if !intersects(world, a, b) {
                continue;
            }
            let (Some(team_a), Some(team_b)) = (world.get::<Team>(a), world.get::<Team>(b)) else {
                continue;
            };
            if team_a.id == team_b.id {
                continue;
            }

            apply_damage(world, a, b, cfg, &mut credits);
            apply_damage(world, b, a, cfg, &mut credits);
        }
    }
    credits
}

/// Circle intersection with the bounding-radius approximation.
fn intersects(world: &World, a: EntityId, b: EntityId) -> bool {
    let (Some(ta), Some(tb)) = (world.get::<Transform>(a), world.get::<Transform>(b)) else {
        return false;
    };
    let (Some(ca), Some(cb)) = (world.get::<Collider>(a), world.get::<Collider>(b)) else {
        return false;
    };
    let dx = ta.x - tb.x;
    let dy = ta.y - tb.y;
    let reach = ca.bounding_radius() + cb.bounding_radius();
    dx * dx + dy * dy <= reach * reach
}

/// One direction of a contact: `source` damages `target` if it can.
fn apply_damage(
    world: &mut World,
    source: EntityId,
    target: EntityId,
    cfg: &GameConfig,
    credits: &mut Vec<KillCredit>,
) {
    let Some(&damager) = world.get::<Damager>(source) else {
        return;
    };
    let Some(&health) = world.get::<Health>(target) else {
        return;
    };
    if health.invincible || health.invincibility_timer > 0.0 {
        return;
    }

    let mut after = health;
    after.current -= damager.damage;
    after.invincibility_timer = cfg.invincibility_window;
    if let Some(h) = world.get_mut::<Health>(target) {
        *h = after;
    }

    if after.current <= 0 {
        if let Some(&tag) = world.get::<ProjectileTag>(source) {
            let source_team = world.get::<Team>(source).map(|t| t.id);
            let target_is_enemy = world.has::<crate::components::EnemyTag>(target);
            if source_team == Some(TEAM_PLAYERS) && target_is_enemy {
                credits.push(KillCredit { shooter: tag.shooter });
            }
        }
    }

    // A non-trigger damager is consumed by the hit.
    let consumed = world
        .get::<Collider>(source)
        .map(|c| !c.is_trigger)
        .unwrap_or(false);
    if consumed {
        world.request_destroy(source);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
