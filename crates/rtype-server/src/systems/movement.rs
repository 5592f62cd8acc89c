//! Movement system: integrate velocity over the fixed timestep.

use rtype_ecs::prelude::*;

use crate::components::{Transform, Velocity};

/// `transform += velocity * dt` for every moving entity.
pub fn run(world: &mut World, system: SystemId, dt: f32) {
    for entity in world.members_snapshot(system) {
        let Some(&vel) = world.get::<Velocity>(entity) else {
            continue;
        };
        if let Some(t) = world.get_mut::<Transform>(entity) {
            t.x += vel.vx * dt;
            t.y += vel.vy * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentSet;

    #[test]
    fn integrates_at_fixed_dt() {
        let mut world = World::new();
        let c = ComponentSet::register(&mut world);
        let sys = world.register_system("movement", world.signature_of(&[c.transform, c.velocity]));

        let e = world.create_entity().unwrap();
        world
            .add_component(e, Transform { x: 10.0, y: 20.0, rotation: 0.0 })
            .unwrap();
        world
            .add_component(e, Velocity { vx: 60.0, vy: -30.0 })
            .unwrap();

        for _ in 0..60 {
            run(&mut world, sys, 1.0 / 60.0);
        }
        let t = world.get::<Transform>(e).unwrap();
        assert!((t.x - 70.0).abs() < 1e-3);
        assert!((t.y - (-10.0)).abs() < 1e-3);
    }
}
