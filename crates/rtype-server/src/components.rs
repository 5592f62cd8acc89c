//! Gameplay component types and their registration bundle.
//!
//! Components are plain value structs; behavior lives in the systems. The
//! [`ComponentSet`] registers every type once at startup and keeps the
//! resulting type ids so system signatures can be built without re-lookups.

use rtype_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// Faction ids used by the collision filter.
pub const TEAM_PLAYERS: u8 = 0;
pub const TEAM_ENEMIES: u8 = 1;
pub const TEAM_NEUTRAL: u8 = 2;

// ---------------------------------------------------------------------------
// Spatial components
// ---------------------------------------------------------------------------

/// World position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

/// Per-second displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

/// Out-of-bounds policy: wrap to the opposite edge, request destruction, or
/// (neither flag) clamp to the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub wrap: bool,
    pub destroy: bool,
}

// ---------------------------------------------------------------------------
// Gameplay components
// ---------------------------------------------------------------------------

/// Latest input from the owning peer. Direction uses the numpad layout in
/// screen coordinates (y grows downward): 6 = right, 8 = up, 5 = idle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub direction: u8,
    pub fire: bool,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self {
            direction: 5,
            fire: false,
        }
    }
}

/// Faction for collision filtering and firing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u8,
}

/// Hit points and the hit-recovery window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    pub invincible: bool,
    pub invincibility_timer: f32,
}

impl Health {
    pub fn full(max: i32) -> Self {
        Self {
            current: max,
            max,
            invincible: false,
            invincibility_timer: 0.0,
        }
    }

    /// Fraction of hit points remaining, in [0, 1].
    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            (self.current.max(0) as f32) / (self.max as f32)
        }
    }
}

/// Damage dealt when this entity's collider hits something damageable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damager {
    pub damage: i32,
}

/// Intersection primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Circle { radius: f32 },
    Box { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Triggers report contact but are not consumed by it.
    pub is_trigger: bool,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Circle { radius },
            is_trigger: false,
        }
    }

    /// Circle approximation used by the collision test: boxes collide as a
    /// circle of their larger half-extent.
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            ColliderShape::Circle { radius } => radius,
            ColliderShape::Box { width, height } => width.max(height) * 0.5,
        }
    }
}

/// Seconds before automatic destruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub time_left: f32,
}

/// What a [`Spawner`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    Projectile,
    Enemy,
    Powerup,
}

/// Periodic entity emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    pub kind: SpawnKind,
    pub cooldown: f32,
    pub timer: f32,
    pub spawned: i32,
    /// Negative means unlimited.
    pub max_spawns: i32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
}

impl Spawner {
    /// Whether the spawn budget still allows an emission.
    pub fn has_budget(&self) -> bool {
        self.max_spawns < 0 || self.spawned < self.max_spawns
    }
}

/// Behavior FSM states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Patrol,
    Chase,
    Flee,
    Attack,
}

/// Behavior controller for server-driven entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AIController {
    pub state: AiState,
    pub target: Option<EntityId>,
    pub decision_timer: f32,
    pub decision_cooldown: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub flee_health_threshold: f32,
    /// Phase accumulator for the patrol sinusoid.
    pub patrol_phase: f32,
}

impl AIController {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            state: AiState::Patrol,
            target: None,
            decision_timer: 0.0,
            decision_cooldown: cfg.ai_decision_cooldown,
            detection_range: cfg.ai_detection_range,
            attack_range: cfg.ai_attack_range,
            flee_health_threshold: cfg.ai_flee_health_threshold,
            patrol_phase: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Marker components
// ---------------------------------------------------------------------------

/// Marks a player-controlled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTag {
    pub client_id: u32,
}

/// Marks an enemy and carries its firing timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyTag {
    pub shoot_cooldown: f32,
}

/// Marks a projectile and remembers who fired it (kill attribution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileTag {
    pub shooter: EntityId,
}

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// Type ids of every registered gameplay component.
#[derive(Debug, Clone, Copy)]
pub struct ComponentSet {
    pub transform: ComponentTypeId,
    pub velocity: ComponentTypeId,
    pub player_input: ComponentTypeId,
    pub team: ComponentTypeId,
    pub health: ComponentTypeId,
    pub damager: ComponentTypeId,
    pub collider: ComponentTypeId,
    pub lifetime: ComponentTypeId,
    pub boundary: ComponentTypeId,
    pub spawner: ComponentTypeId,
    pub ai: ComponentTypeId,
    pub player_tag: ComponentTypeId,
    pub enemy_tag: ComponentTypeId,
    pub projectile_tag: ComponentTypeId,
}

impl ComponentSet {
    /// Register every component type on a fresh world.
    pub fn register(world: &mut World) -> Self {
        Self {
            transform: world.register_component::<Transform>(),
            velocity: world.register_component::<Velocity>(),
            player_input: world.register_component::<PlayerInput>(),
            team: world.register_component::<Team>(),
            health: world.register_component::<Health>(),
            damager: world.register_component::<Damager>(),
            collider: world.register_component::<Collider>(),
            lifetime: world.register_component::<Lifetime>(),
            boundary: world.register_component::<Boundary>(),
            spawner: world.register_component::<Spawner>(),
            ai: world.register_component::<AIController>(),
            player_tag: world.register_component::<PlayerTag>(),
            enemy_tag: world.register_component::<EnemyTag>(),
            projectile_tag: world.register_component::<ProjectileTag>(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
