//! Lifetime system: timed auto-destruction.

use rtype_ecs::prelude::*;

use crate::components::Lifetime;

/// Burn down lifetimes and queue destruction on expiry.
pub fn run(world: &mut World, system: SystemId, dt: f32) {
    for entity in world.members_snapshot(system) {
        let Some(l) = world.get_mut::<Lifetime>(entity) else {
            continue;
        };
        l.time_left -= dt;
        if l.time_left <= 0.0 {
            world.request_destroy(entity);
        }
    }
}
