//! Health system: invincibility timers and death.

use rtype_ecs::prelude::*;

use crate::components::Health;

/// Wind down hit-recovery windows and queue destruction at zero hit points.
pub fn run(world: &mut World, system: SystemId, dt: f32) {
    for entity in world.members_snapshot(system) {
        let Some(h) = world.get_mut::<Health>(entity) else {
            continue;
        };
        if h.invincibility_timer > 0.0 {
            h.invincibility_timer = (h.invincibility_timer - dt).max(0.0);
        }
        if h.current <= 0 {
            world.request_destroy(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentSet;

    fn setup() -> (World, SystemId) {
        let mut world = World::new();
        let c = ComponentSet::register(&mut world);
        let sys = world.register_system("health", world.signature_of(&[c.health]));
        (world, sys)
    }

    #[test]
    fn timer_counts_down_to_zero() {
        let (mut world, sys) = setup();
        let e = world.create_entity().unwrap();
        let mut h = Health::full(100);
        h.invincibility_timer = 0.05;
        world.add_component(e, h).unwrap();

        run(&mut world, sys, 1.0 / 60.0);
        let timer = world.get::<Health>(e).unwrap().invincibility_timer;
        assert!(timer > 0.0 && timer < 0.05);

        for _ in 0..10 {
            run(&mut world, sys, 1.0 / 60.0);
        }
        assert_eq!(world.get::<Health>(e).unwrap().invincibility_timer, 0.0);
    }

    #[test]
    fn zero_hp_queues_destruction() {
        let (mut world, sys) = setup();
        let e = world.create_entity().unwrap();
        let mut h = Health::full(10);
        h.current = 0;
        world.add_component(e, h).unwrap();

        run(&mut world, sys, 1.0 / 60.0);
        assert!(world.destruction_pending(e));
        assert!(world.is_alive(e), "death is deferred to end of tick");
    }

    #[test]
    fn positive_hp_survives() {
        let (mut world, sys) = setup();
        let e = world.create_entity().unwrap();
        world.add_component(e, Health::full(1)).unwrap();
        run(&mut world, sys, 1.0 / 60.0);
        assert!(!world.destruction_pending(e));
    }
}
