//! Snapshot builder: the authoritative world → STATE packets.
//!
//! Record lists come from the registered snapshot views, whose
//! insertion-ordered working sets make the encoding deterministic: the same
//! world state always serializes to the same bytes. A blake3 digest over
//! the encoded stream backs the determinism tests.

use rtype_ecs::prelude::*;
use rtype_protocol::prelude::*;

use crate::components::{Health, Transform};
use crate::systems::SystemHandles;

// ---------------------------------------------------------------------------
// SnapshotBuilder
// ---------------------------------------------------------------------------

/// Builds one [`StateSnapshot`] per tick per peer with server-monotonic
/// message ids.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    next_msg_id: u32,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot of the current world, consuming the next msg id.
    ///
    /// Clients treat a later `msg_id` as superseding every earlier one, so
    /// ids must be handed out strictly increasing -- one call per packet.
    pub fn build(&mut self, world: &World, views: &SystemHandles, tick: u64) -> StateSnapshot {
        self.next_msg_id += 1;
        StateSnapshot {
            msg_id: self.next_msg_id,
            tick: tick as u32,
            players: entity_records(world, views.players),
            enemies: entity_records(world, views.enemies),
            projectiles: projectile_records(world, views.projectiles),
        }
    }

    /// The id the next snapshot will carry.
    pub fn peek_next_msg_id(&self) -> u32 {
        self.next_msg_id + 1
    }
}

fn entity_records(world: &World, view: SystemId) -> Vec<EntityRecord> {
    world
        .members(view)
        .iter()
        .filter_map(|&e| {
            let t = world.get::<Transform>(e)?;
            let h = world.get::<Health>(e)?;
            Some(EntityRecord {
                id: e.raw(),
                x: t.x,
                y: t.y,
                hp: h.current.max(0) as u32,
            })
        })
        .collect()
}

fn projectile_records(world: &World, view: SystemId) -> Vec<ProjectileRecord> {
    world
        .members(view)
        .iter()
        .filter_map(|&e| {
            let t = world.get::<Transform>(e)?;
            Some(ProjectileRecord {
                id: e.raw(),
                x: t.x,
                y: t.y,
            })
        })
        .collect()
}

/// Blake3 hex digest of a snapshot's encoded bytes, msg id excluded.
///
/// Two runs are considered identical when every tick's digest matches; the
/// msg id is zeroed first because it counts packets (per peer), not world
/// state.
pub fn state_digest(snapshot: &StateSnapshot) -> String {
    let mut canonical = snapshot.clone();
    canonical.msg_id = 0;
    let bytes = encode(&Packet::State(canonical));
    blake3::hash(&bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
