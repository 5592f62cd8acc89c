//! Input system: numpad direction → velocity.
//!
//! Directions use the numpad layout in screen coordinates (y grows
//! downward). Diagonals are normalized so speed is the same in all eight
//! directions.

use rtype_ecs::prelude::*;

use crate::components::{PlayerInput, Velocity};

const DIAG: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Unit vector for a numpad direction; `5` (and anything unmapped) is idle.
fn direction_vector(direction: u8) -> (f32, f32) {
    match direction {
        1 => (-DIAG, DIAG),
        2 => (0.0, 1.0),
        3 => (DIAG, DIAG),
        4 => (-1.0, 0.0),
        6 => (1.0, 0.0),
        7 => (-DIAG, -DIAG),
        8 => (0.0, -1.0),
        9 => (DIAG, -DIAG),
        _ => (0.0, 0.0),
    }
}

/// Apply the latest input of every controlled entity to its velocity.
pub fn run(world: &mut World, system: SystemId, player_speed: f32) {
    for entity in world.members_snapshot(system) {
        let Some(&input) = world.get::<PlayerInput>(entity) else {
            continue;
        };
        let (dx, dy) = direction_vector(input.direction);
        if let Some(vel) = world.get_mut::<Velocity>(entity) {
            vel.vx = dx * player_speed;
            vel.vy = dy * player_speed;
        }
    }
}
