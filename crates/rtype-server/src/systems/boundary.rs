//! Boundary system: wrap, destroy, or clamp entities leaving their bounds.

use rtype_ecs::prelude::*;

use crate::components::{Boundary, Transform};

/// Enforce each entity's out-of-bounds policy.
pub fn run(world: &mut World, system: SystemId) {
    for entity in world.members_snapshot(system) {
        let Some(&bounds) = world.get::<Boundary>(entity) else {
            continue;
        };
        let Some(&t) = world.get::<Transform>(entity) else {
            continue;
        };
        let outside = t.x < bounds.min_x || t.x > bounds.max_x || t.y < bounds.min_y || t.y > bounds.max_y;
        if !outside {
            continue;
        }

        if bounds.destroy && !bounds.wrap {
            world.request_destroy(entity);
            continue;
        }

        let (new_x, new_y) = if bounds.wrap {
            let x = if t.x < bounds.min_x {
                bounds.max_x
            } else if t.x > bounds.max_x {
                bounds.min_x
            } else {
                t.x
            };
            let y = if t.y < bounds.min_y {
                bounds.max_y
            } else if t.y > bounds.max_y {
                bounds.min_y
            } else {
                t.y
            };
            (x, y)
        } else {
            (
                t.x.clamp(bounds.min_x, bounds.max_x),
                t.y.clamp(bounds.min_y, bounds.max_y),
            )
        };
        if let Some(t) = world.get_mut::<Transform>(entity) {
            t.x = new_x;
            t.y = new_y;
        }
    }
}
