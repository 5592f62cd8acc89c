//! Entity construction helpers.
//!
//! Every archetype the game spawns (player, enemy, projectile, powerup) is
//! assembled here so the component recipes live in one place. Spawning can
//! fail only on pool exhaustion, which callers treat as "refuse the spawn".

use rtype_ecs::prelude::*;

use crate::components::*;
use crate::config::GameConfig;

/// Spawn a player ship at the default spawn point.
pub fn spawn_player(world: &mut World, cfg: &GameConfig) -> Result<EntityId, EcsError> {
    let e = world.create_entity()?;
    world.add_component(
        e,
        Transform {
            x: cfg.player_spawn_x,
            y: cfg.player_spawn_y,
            rotation: 0.0,
        },
    )?;
    world.add_component(e, Velocity::default())?;
    world.add_component(e, PlayerInput::default())?;
    world.add_component(
        e,
        Boundary {
            min_x: 0.0,
            max_x: cfg.world_width,
            min_y: 0.0,
            max_y: cfg.world_height,
            wrap: false,
            destroy: false,
        },
    )?;
    world.add_component(e, Health::full(cfg.player_hp))?;
    world.add_component(e, Team { id: TEAM_PLAYERS })?;
    world.add_component(e, Collider::circle(cfg.player_radius))?;
    world.add_component(e, PlayerTag { client_id: e.raw() })?;
    Ok(e)
}

/// Spawn an enemy entering from the right edge at height `y`.
pub fn spawn_enemy(world: &mut World, cfg: &GameConfig, x: f32, y: f32) -> Result<EntityId, EcsError> {
    let e = world.create_entity()?;
    world.add_component(e, Transform { x, y, rotation: 0.0 })?;
    world.add_component(
        e,
        Velocity {
            vx: -cfg.enemy_speed,
            vy: 0.0,
        },
    )?;
    world.add_component(
        e,
        Boundary {
            min_x: -100.0,
            max_x: cfg.enemy_spawn_x,
            min_y: 0.0,
            max_y: cfg.world_height,
            wrap: false,
            destroy: true,
        },
    )?;
    world.add_component(e, Health::full(cfg.enemy_hp))?;
    world.add_component(e, Team { id: TEAM_ENEMIES })?;
    world.add_component(e, Collider::circle(cfg.enemy_radius))?;
    world.add_component(
        e,
        Damager {
            damage: cfg.enemy_contact_damage,
        },
    )?;
    world.add_component(e, AIController::from_config(cfg))?;
    world.add_component(
        e,
        EnemyTag {
            shoot_cooldown: cfg.enemy_fire_cooldown,
        },
    )?;
    Ok(e)
}

/// Spawn a projectile travelling with `(vx, vy)` for `team`, remembering the
/// shooter for kill attribution.
#[allow(clippy::too_many_arguments)]
pub fn spawn_projectile(
    world: &mut World,
    cfg: &GameConfig,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    damage: i32,
    team: u8,
    shooter: EntityId,
) -> Result<EntityId, EcsError> {
    let e = world.create_entity()?;
    world.add_component(e, Transform { x, y, rotation: 0.0 })?;
    world.add_component(e, Velocity { vx, vy })?;
    world.add_component(e, Collider::circle(cfg.projectile_radius))?;
    world.add_component(e, Damager { damage })?;
    world.add_component(e, Team { id: team })?;
    world.add_component(
        e,
        Lifetime {
            time_left: cfg.projectile_lifetime,
        },
    )?;
    world.add_component(
        e,
        Boundary {
            min_x: -100.0,
            max_x: cfg.enemy_spawn_x,
            min_y: -100.0,
            max_y: cfg.world_height + 100.0,
            wrap: false,
            destroy: true,
        },
    )?;
    world.add_component(e, ProjectileTag { shooter })?;
    Ok(e)
}

/// Spawn a projectile from `shooter`'s muzzle, facing right for players and
/// left for enemies.
pub fn spawn_projectile_from(
    world: &mut World,
    cfg: &GameConfig,
    shooter: EntityId,
    from_player: bool,
) -> Result<EntityId, EcsError> {
    let Some(&origin) = world.get::<Transform>(shooter) else {
        return Err(EcsError::ComponentMissing { entity: shooter });
    };
    let team = world
        .get::<Team>(shooter)
        .map(|t| t.id)
        .unwrap_or(TEAM_NEUTRAL);
    let (offset, vx, damage) = if from_player {
        (
            cfg.projectile_offset,
            cfg.player_projectile_speed,
            cfg.player_projectile_damage,
        )
    } else {
        (
            -cfg.projectile_offset,
            -cfg.enemy_projectile_speed,
            cfg.enemy_projectile_damage,
        )
    };
    spawn_projectile(
        world,
        cfg,
        origin.x + offset,
        origin.y,
        vx,
        0.0,
        damage,
        team,
        shooter,
    )
}

/// Spawn an inert neutral powerup: a trigger, so the collision filter never
/// consumes or damages through it.
pub fn spawn_powerup(world: &mut World, cfg: &GameConfig, x: f32, y: f32) -> Result<EntityId, EcsError> {
    let e = world.create_entity()?;
    world.add_component(e, Transform { x, y, rotation: 0.0 })?;
    world.add_component(e, Velocity::default())?;
    world.add_component(e, Team { id: TEAM_NEUTRAL })?;
    world.add_component(
        e,
        Collider {
            shape: ColliderShape::Circle {
                radius: cfg.powerup_radius,
            },
            is_trigger: true,
        },
    )?;
    world.add_component(
        e,
        Lifetime {
            time_left: cfg.powerup_lifetime,
        },
    )?;
    Ok(e)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
