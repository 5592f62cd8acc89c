//! AI system: a small per-entity state machine.
//!
//! Decisions re-evaluate on a cooldown; the chosen behavior steers the
//! entity's velocity every tick. Target references are ids, never borrowed
//! data, and are re-validated at each decision so a despawned target drops
//! the controller back to Idle instead of chasing a recycled slot.

use rtype_ecs::prelude::*;

use crate::components::{AIController, AiState, Health, Team, Transform, Velocity};
use crate::config::GameConfig;

/// Tick every AI controller.
///
/// `targets` is the scan view (anything with a position and a faction).
pub fn run(world: &mut World, system: SystemId, targets: SystemId, dt: f32, cfg: &GameConfig) {
    let candidates = world.members_snapshot(targets);

    for entity in world.members_snapshot(system) {
        let Some(&ai) = world.get::<AIController>(entity) else {
            continue;
        };
        let Some(&me) = world.get::<Transform>(entity) else {
            continue;
        };
        let my_team = world.get::<Team>(entity).map(|t| t.id);
        let health_fraction = world.get::<Health>(entity).map(|h| h.fraction()).unwrap_or(1.0);

        let mut next = ai;
        next.decision_timer += dt;

        if next.decision_timer >= next.decision_cooldown {
            next.decision_timer = 0.0;

            // Stale target ids are dropped before they can steer anything.
            if let Some(target) = next.target {
                if !world.is_alive(target) || world.get::<Transform>(target).is_none() {
                    next.target = None;
                    next.state = AiState::Idle;
                }
            }

            let nearest = nearest_hostile(world, &candidates, entity, my_team, me);
            if health_fraction < next.flee_health_threshold {
                match nearest {
                    Some((target, _)) => {
                        next.state = AiState::Flee;
                        next.target = Some(target);
                    }
                    None => {
                        next.state = AiState::Idle;
                        next.target = None;
                    }
                }
            } else {
                match nearest {
                    Some((target, dist)) if dist <= next.attack_range => {
                        next.state = AiState::Attack;
                        next.target = Some(target);
                    }
                    Some((target, dist)) if dist <= next.detection_range => {
                        next.state = AiState::Chase;
                        next.target = Some(target);
                    }
                    _ => {
                        next.state = AiState::Patrol;
                        next.target = None;
                    }
                }
            }
        }

        // Behavior execution. Patrol advances its sinusoid phase; the other
        // states derive velocity from the (validated) target position.
        let velocity = match next.state {
            AiState::Idle | AiState::Attack => Some((0.0, 0.0)),
            AiState::Patrol => {
                next.patrol_phase += dt * cfg.ai_patrol_frequency;
                Some((
                    -cfg.ai_patrol_speed,
                    next.patrol_phase.sin() * cfg.ai_patrol_amplitude,
                ))
            }
            AiState::Chase => steer(world, &next, me, cfg.ai_chase_speed, 1.0),
            AiState::Flee => steer(world, &next, me, cfg.ai_flee_speed, -1.0),
        };

        match velocity {
            Some((vx, vy)) => {
                if let Some(v) = world.get_mut::<Velocity>(entity) {
                    v.vx = vx;
                    v.vy = vy;
                }
            }
            None => {
                // Target vanished between decisions.
                next.state = AiState::Idle;
                next.target = None;
                if let Some(v) = world.get_mut::<Velocity>(entity) {
                    v.vx = 0.0;
                    v.vy = 0.0;
                }
            }
        }

        if let Some(slot) = world.get_mut::<AIController>(entity) {
            *slot = next;
        }
    }
}

/// Velocity toward (`sign` = 1) or away from (`sign` = -1) the target.
fn steer(
    world: &World,
    ai: &AIController,
    me: Transform,
    speed: f32,
    sign: f32,
) -> Option<(f32, f32)> {
    let target = ai.target?;
    let t = world.get::<Transform>(target)?;
    let dx = t.x - me.x;
    let dy = t.y - me.y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist < f32::EPSILON {
        return Some((0.0, 0.0));
    }
    Some((sign * speed * dx / dist, sign * speed * dy / dist))
}

/// Nearest candidate on a different team, with its distance.
fn nearest_hostile(
    world: &World,
    candidates: &[EntityId],
    me: EntityId,
    my_team: Option<u8>,
    at: Transform,
) -> Option<(EntityId, f32)> {
    let mut best: Option<(EntityId, f32)> = None;
    for &other in candidates {
        if other == me {
            continue;
        }
        let Some(team) = world.get::<Team>(other) else {
            continue;
        };
        if Some(team.id) == my_team {
            continue;
        }
        let Some(t) = world.get::<Transform>(other) else {
            continue;
        };
        let dx = t.x - at.x;
        let dy = t.y - at.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((other, dist));
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
