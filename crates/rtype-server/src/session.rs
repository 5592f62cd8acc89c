//! Session management: peer address ↔ player entity bookkeeping.
//!
//! A session is created on the first HELLO from an unknown address and torn
//! down when the transport reports the peer idle. The session holds a
//! non-owning entity id; when the player entity dies the session stays
//! behind in a *player-dead* substate (score and start time intact) until
//! the peer disconnects, so the final scoreboard can still name them.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;

use rtype_ecs::prelude::*;
use rtype_protocol::prelude::*;

use crate::components::PlayerInput;
use crate::config::GameConfig;
use crate::spawn;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-peer server-side record.
#[derive(Debug)]
pub struct Session {
    /// The bound player entity; `None` once the player has died.
    pub entity: Option<EntityId>,
    /// The id sent in WELCOME, kept for idempotent replays even after death.
    pub welcome_id: u32,
    /// Accrued score.
    pub score: u32,
    /// Monotonic time of the HELLO that created this session.
    pub start_time: f64,
    /// Seconds until the next shot is allowed.
    pub shoot_cooldown: f32,
    /// STATE msg ids sent but not yet acknowledged (metrics only; snapshots
    /// are idempotent and never retransmitted).
    pub pending_acks: HashSet<u32>,
}

impl Session {
    /// Whether the bound player entity is still in the world.
    pub fn player_alive(&self) -> bool {
        self.entity.is_some()
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// All live sessions, keyed by peer address.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<SocketAddr, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle HELLO: bind a new player entity, or replay the WELCOME for a
    /// peer we already know. Returns `None` when the entity pool is
    /// exhausted -- the client gets no WELCOME and will retry or give up.
    pub fn handle_hello(
        &mut self,
        peer: SocketAddr,
        world: &mut World,
        cfg: &GameConfig,
        now: f64,
    ) -> Option<Packet> {
        if let Some(session) = self.sessions.get(&peer) {
            return Some(Packet::Welcome {
                entity_id: session.welcome_id,
            });
        }

        let entity = match spawn::spawn_player(world, cfg) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(%peer, error = %e, "refusing HELLO");
                return None;
            }
        };
        tracing::info!(%peer, %entity, "session opened");
        self.sessions.insert(
            peer,
            Session {
                entity: Some(entity),
                welcome_id: entity.raw(),
                score: 0,
                start_time: now,
                shoot_cooldown: 0.0,
                pending_acks: HashSet::new(),
            },
        );
        Some(Packet::Welcome {
            entity_id: entity.raw(),
        })
    }

    /// Handle INPUT: update the bound entity's input component. Unknown
    /// peers and dead players are dropped silently.
    pub fn handle_input(&mut self, peer: SocketAddr, world: &mut World, direction: u8, fire: bool) {
        let Some(entity) = self.sessions.get(&peer).and_then(|s| s.entity) else {
            tracing::debug!(%peer, "INPUT from unknown or dead peer dropped");
            return;
        };
        if let Some(input) = world.get_mut::<PlayerInput>(entity) {
            input.direction = direction;
            input.fire = fire;
        }
    }

    /// Handle ACK: clear the msg id from the peer's pending set.
    pub fn handle_ack(&mut self, peer: SocketAddr, msg_id: u32) {
        if let Some(session) = self.sessions.get_mut(&peer) {
            session.pending_acks.remove(&msg_id);
        }
    }

    /// Record a snapshot sent to `peer` as awaiting acknowledgement.
    pub fn record_pending(&mut self, peer: SocketAddr, msg_id: u32) {
        if let Some(session) = self.sessions.get_mut(&peer) {
            session.pending_acks.insert(msg_id);
        }
    }

    /// Tick down every session's shoot cooldown.
    pub fn tick_cooldowns(&mut self, dt: f32) {
        for session in self.sessions.values_mut() {
            session.shoot_cooldown -= dt;
        }
    }

    /// Switch sessions whose entity was just destroyed into the player-dead
    /// substate.
    pub fn note_destroyed(&mut self, destroyed: &[EntityId]) {
        for session in self.sessions.values_mut() {
            if let Some(entity) = session.entity {
                if destroyed.contains(&entity) {
                    tracing::info!(player = %entity, "player died");
                    session.entity = None;
                }
            }
        }
    }

    /// Credit a kill to the session owning `shooter`, if any.
    pub fn add_kill_credit(&mut self, shooter: EntityId, points: u32) {
        for session in self.sessions.values_mut() {
            if session.entity == Some(shooter) {
                session.score += points;
                return;
            }
        }
    }

    /// Close a session (idle reap or shutdown), returning it so the caller
    /// can destroy the player entity.
    pub fn close(&mut self, peer: SocketAddr) -> Option<Session> {
        let session = self.sessions.remove(&peer);
        if session.is_some() {
            tracing::info!(%peer, "session closed");
        }
        session
    }

    pub fn get(&self, peer: &SocketAddr) -> Option<&Session> {
        self.sessions.get(peer)
    }

    pub fn contains(&self, peer: &SocketAddr) -> bool {
        self.sessions.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Peers with a session, in sorted order for deterministic iteration.
    pub fn peers(&self) -> Vec<SocketAddr> {
        let mut peers: Vec<SocketAddr> = self.sessions.keys().copied().collect();
        peers.sort();
        peers
    }

    /// Sessions eligible to fire this tick: alive, trigger held, cooldown
    /// expired. Returns `(peer, entity)` pairs in sorted peer order.
    pub fn ready_to_fire(&self, world: &World) -> Vec<(SocketAddr, EntityId)> {
        let mut ready: Vec<(SocketAddr, EntityId)> = self
            .sessions
            .iter()
            .filter_map(|(&peer, session)| {
                let entity = session.entity?;
                if session.shoot_cooldown > 0.0 {
                    return None;
                }
                let input = world.get::<PlayerInput>(entity)?;
                input.fire.then_some((peer, entity))
            })
            .collect();
        ready.sort_by_key(|&(peer, _)| peer);
        ready
    }

    /// Reset the shoot cooldown after a shot.
    pub fn reset_cooldown(&mut self, peer: SocketAddr, cooldown: f32) {
        if let Some(session) = self.sessions.get_mut(&peer) {
            session.shoot_cooldown = cooldown;
        }
    }

    /// Whether at least one session exists and every one is player-dead.
    pub fn all_players_dead(&self) -> bool {
        !self.sessions.is_empty() && self.sessions.values().all(|s| s.entity.is_none())
    }

    /// Scoreboard rows: `(welcome id, score, seconds survived)` per session,
    /// sorted by peer for a stable wire order.
    pub fn scoreboard(&self, now: f64) -> Vec<ScoreEntry> {
        let mut rows: Vec<(SocketAddr, ScoreEntry)> = self
            .sessions
            .iter()
            .map(|(&peer, s)| {
                (
                    peer,
                    ScoreEntry {
                        player_id: s.welcome_id,
                        score: s.score,
                        time_survived: (now - s.start_time).max(0.0) as f32,
                    },
                )
            })
            .collect();
        rows.sort_by_key(|&(peer, _)| peer);
        rows.into_iter().map(|(_, entry)| entry).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
