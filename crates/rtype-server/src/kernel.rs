//! Simulation kernel: the fixed-timestep tick and the server outer loop.
//!
//! [`Game`] owns every piece of simulation state and is completely
//! socket-free -- tests feed it decoded frames and hand-stepped ticks.
//! [`Server`] wraps a [`Game`] with the transport and the wall clock and
//! runs the real loop: drain datagrams, reap idle peers, integrate fixed
//! steps, broadcast snapshots, sleep.
//!
//! # Tick order
//!
//! Within [`Game::step`] the phases run in a fixed order, and each phase
//! observes a stable entity set at its start: cooldowns, input, ai,
//! movement, boundary, spawner, collision, health, lifetime, firing, wave
//! spawning, then the single deferred-destruction pass. Spawns made by a
//! phase are visible to later phases of the same tick; destructions are
//! visible only after the final pass.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rtype_ecs::prelude::*;
use rtype_protocol::prelude::*;

use crate::clock::{Clock, MonotonicClock};
use crate::components::{ComponentSet, EnemyTag};
use crate::config::GameConfig;
use crate::lobby::LobbyManager;
use crate::session::SessionManager;
use crate::snapshot::SnapshotBuilder;
use crate::spawn;
use crate::systems::{self, SystemHandles};
use crate::transport::UdpTransport;

/// Outbound frames produced by a dispatch: `(destination, bytes)`.
pub type Outbound = Vec<(SocketAddr, Vec<u8>)>;

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// The complete, transport-free simulation state.
pub struct Game {
    pub world: World,
    pub sessions: SessionManager,
    pub lobbies: LobbyManager,
    systems: SystemHandles,
    snapshots: SnapshotBuilder,
    cfg: GameConfig,
    rng: Pcg32,
    tick: u64,
    enemy_spawn_timer: f32,
    /// Set once the end-of-game scoreboard has gone out; cleared when a new
    /// player joins.
    game_over_announced: bool,
}

impl Game {
    /// Build a fresh world with every component and system registered.
    ///
    /// `seed` drives the only randomness in the simulation (enemy spawn
    /// heights); fixing it makes runs reproducible.
    pub fn new(cfg: GameConfig, seed: u64) -> Self {
        let mut world = World::new();
        let components = ComponentSet::register(&mut world);
        let systems = SystemHandles::register(&mut world, &components);
        let lobby_capacity = cfg.lobby_capacity;
        Self {
            world,
            sessions: SessionManager::new(),
            lobbies: LobbyManager::new(lobby_capacity),
            systems,
            snapshots: SnapshotBuilder::new(),
            cfg,
            rng: Pcg32::seed_from_u64(seed),
            tick: 0,
            enemy_spawn_timer: 0.0,
            game_over_announced: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn views(&self) -> &SystemHandles {
        &self.systems
    }

    // -- frame dispatch ------------------------------------------------------

    /// Decode and dispatch one raw datagram from `peer`.
    ///
    /// Returns the frames to send back. Malformed frames, foreign versions,
    /// and packets a client has no business sending are dropped here; no
    /// error escapes to the loop.
    pub fn handle_frame(&mut self, peer: SocketAddr, frame: &[u8], now: f64) -> Outbound {
        let packet = match decode(frame, Direction::ToServer) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!(%peer, error = %e, "dropping frame");
                return Vec::new();
            }
        };
        self.handle_packet(peer, packet, now)
    }

    /// Dispatch an already-decoded packet (test entry point).
    pub fn handle_packet(&mut self, peer: SocketAddr, packet: Packet, now: f64) -> Outbound {
        let mut out = Vec::new();
        match packet {
            Packet::Hello => {
                let known = self.sessions.contains(&peer);
                if let Some(reply) =
                    self.sessions
                        .handle_hello(peer, &mut self.world, &self.cfg, now)
                {
                    if !known {
                        // A fresh player revives an ended game.
                        self.game_over_announced = false;
                    }
                    out.push((peer, encode(&reply)));
                }
            }
            Packet::Input { direction, fire } => {
                self.sessions
                    .handle_input(peer, &mut self.world, direction, fire);
            }
            Packet::Ack { msg_id } => self.sessions.handle_ack(peer, msg_id),
            Packet::ListLobbies => {
                let names = self.lobbies.waiting_names();
                out.push((peer, encode(&Packet::LobbyList { names })));
            }
            Packet::CreateLobby { name } => {
                let lobby_id = self.lobbies.create(&name, peer);
                out.push((peer, encode(&Packet::LobbyCreated { lobby_id })));
            }
            Packet::JoinLobby { lobby_id } => match self.lobbies.join(lobby_id, peer) {
                Some(members) => {
                    out.push((peer, encode(&Packet::JoinReply { success: true })));
                    let update = format!("lobby {lobby_id}: {peer} joined");
                    for member in members {
                        if member != peer {
                            out.push((
                                member,
                                encode(&Packet::LobbyUpdate {
                                    data: update.clone().into_bytes(),
                                }),
                            ));
                        }
                    }
                }
                None => out.push((peer, encode(&Packet::JoinReply { success: false }))),
            },
            Packet::StartGame => {
                if let Some(members) = self.lobbies.start(peer) {
                    let update = b"game started".to_vec();
                    for member in members {
                        out.push((
                            member,
                            encode(&Packet::LobbyUpdate {
                                data: update.clone(),
                            }),
                        ));
                    }
                }
            }
            other => {
                tracing::debug!(%peer, packet = %other, "unexpected server-bound packet dropped");
            }
        }
        out
    }

    /// Tear down everything belonging to an idle peer: the player entity,
    /// the session, and any lobby membership.
    pub fn reap_peer(&mut self, peer: SocketAddr) {
        if let Some(session) = self.sessions.close(peer) {
            if let Some(entity) = session.entity {
                self.world.destroy_entity(entity);
            }
        }
        self.lobbies.leave(peer);
    }

    // -- simulation ----------------------------------------------------------

    /// Run one fixed-timestep tick.
    pub fn step(&mut self, dt: f32) {
        // 1. Cooldowns.
        self.sessions.tick_cooldowns(dt);
        for entity in self.world.members_snapshot(self.systems.enemies) {
            if let Some(tag) = self.world.get_mut::<EnemyTag>(entity) {
                tag.shoot_cooldown -= dt;
            }
        }

        // 2-9. Behavior systems in declared order.
        systems::input::run(&mut self.world, self.systems.input, self.cfg.player_speed);
        systems::ai::run(
            &mut self.world,
            self.systems.ai,
            self.systems.targets,
            dt,
            &self.cfg,
        );
        systems::movement::run(&mut self.world, self.systems.movement, dt);
        systems::boundary::run(&mut self.world, self.systems.boundary);
        systems::spawner::run(&mut self.world, self.systems.spawner, dt, &self.cfg);
        let credits = systems::collision::run(&mut self.world, self.systems.collision, &self.cfg);
        for credit in credits {
            self.sessions
                .add_kill_credit(credit.shooter, self.cfg.kill_score);
        }
        systems::health::run(&mut self.world, self.systems.health, dt);
        systems::lifetime::run(&mut self.world, self.systems.lifetime, dt);

        // 10. Firing.
        for (peer, entity) in self.sessions.ready_to_fire(&self.world) {
            match spawn::spawn_projectile_from(&mut self.world, &self.cfg, entity, true) {
                Ok(_) => self
                    .sessions
                    .reset_cooldown(peer, self.cfg.player_fire_cooldown),
                Err(e) => tracing::debug!(%peer, error = %e, "player shot refused"),
            }
        }
        for entity in self.world.members_snapshot(self.systems.enemies) {
            let due = self
                .world
                .get::<EnemyTag>(entity)
                .map(|t| t.shoot_cooldown <= 0.0)
                .unwrap_or(false);
            if !due {
                continue;
            }
            match spawn::spawn_projectile_from(&mut self.world, &self.cfg, entity, false) {
                Ok(_) => {
                    if let Some(tag) = self.world.get_mut::<EnemyTag>(entity) {
                        tag.shoot_cooldown = self.cfg.enemy_fire_cooldown;
                    }
                }
                Err(e) => tracing::debug!(enemy = %entity, error = %e, "enemy shot refused"),
            }
        }

        // 11. Enemy wave spawning.
        self.enemy_spawn_timer += dt;
        if self.enemy_spawn_timer >= self.cfg.enemy_spawn_interval {
            self.enemy_spawn_timer = 0.0;
            let y = self
                .rng
                .gen_range(self.cfg.enemy_spawn_y_min..self.cfg.enemy_spawn_y_max);
            if let Err(e) = spawn::spawn_enemy(&mut self.world, &self.cfg, self.cfg.enemy_spawn_x, y)
            {
                tracing::debug!(error = %e, "wave spawn refused");
            }
        }

        // 12. Deferred destruction.
        let destroyed = self.world.apply_destructions();
        self.sessions.note_destroyed(&destroyed);

        self.tick += 1;
    }

    // -- outbound state ------------------------------------------------------

    /// Encode one STATE frame per connected session, each with its own
    /// monotonic msg id recorded as pending.
    pub fn snapshot_frames(&mut self) -> Outbound {
        let peers = self.sessions.peers();
        let mut out = Vec::with_capacity(peers.len());
        for peer in peers {
            let snapshot = self.snapshots.build(&self.world, &self.systems, self.tick);
            self.sessions.record_pending(peer, snapshot.msg_id);
            out.push((peer, encode(&Packet::State(snapshot))));
        }
        out
    }

    /// Build a snapshot without sending it (tests, digests).
    pub fn build_snapshot(&mut self) -> StateSnapshot {
        self.snapshots.build(&self.world, &self.systems, self.tick)
    }

    /// Emit the end-of-game scoreboard once, when every connected player is
    /// dead.
    pub fn end_of_game_frames(&mut self, now: f64) -> Outbound {
        if self.game_over_announced || !self.sessions.all_players_dead() {
            return Vec::new();
        }
        self.game_over_announced = true;
        tracing::info!("all players dead, sending scoreboard");
        self.scoreboard_frames(now)
    }

    /// Scoreboard frames for every connected peer (end of game and
    /// shutdown).
    pub fn scoreboard_frames(&self, now: f64) -> Outbound {
        let entries = self.sessions.scoreboard(now);
        let frame = encode(&Packet::Scoreboard { entries });
        self.sessions
            .peers()
            .into_iter()
            .map(|peer| (peer, frame.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// The networked outer loop around a [`Game`].
pub struct Server {
    transport: UdpTransport,
    game: Game,
    clock: MonotonicClock,
    running: Arc<AtomicBool>,
}

impl Server {
    pub fn new(transport: UdpTransport, game: Game) -> Self {
        Self {
            transport,
            game,
            clock: MonotonicClock::new(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag that stops the loop after the current iteration; hand this to
    /// the signal handler.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run until the shutdown flag clears: drain → reap → integrate →
    /// snapshot → sleep. On exit, a final scoreboard goes to every peer.
    pub fn run(&mut self) {
        let fixed_dt = self.game.cfg.fixed_dt;
        let mut accumulator: f32 = 0.0;
        let mut last = self.clock.now();
        tracing::info!(local_addr = %self.transport.local_addr(), "server loop running");

        while self.running.load(Ordering::Relaxed) {
            let now = self.clock.now();
            accumulator += (now - last) as f32;
            last = now;

            // Drain the socket; every datagram refreshes peer liveness.
            while let Some((peer, bytes)) = self.transport.poll(now) {
                for (to, frame) in self.game.handle_frame(peer, &bytes, now) {
                    self.transport.send(to, &frame);
                }
            }

            // Idle peers lose their session and player entity.
            for peer in self
                .transport
                .reap_idle(now, self.game.cfg.idle_timeout)
            {
                self.game.reap_peer(peer);
            }

            // Integrate; the cap drops backlog instead of death-spiraling.
            accumulator = accumulator.min(self.game.cfg.max_accumulator);
            while accumulator >= fixed_dt {
                self.game.step(fixed_dt);
                accumulator -= fixed_dt;
            }

            // Authoritative state out, plus the one-shot game-over board.
            for (to, frame) in self.game.snapshot_frames() {
                self.transport.send(to, &frame);
            }
            for (to, frame) in self.game.end_of_game_frames(now) {
                self.transport.send(to, &frame);
            }

            std::thread::sleep(Duration::from_millis(1));
        }

        let now = self.clock.now();
        for (to, frame) in self.game.scoreboard_frames(now) {
            self.transport.send(to, &frame);
        }
        tracing::info!(ticks = self.game.tick_count(), "server loop stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u16) -> SocketAddr {
        format!("10.0.0.{}:{}", n, 1000 + n).parse().unwrap()
    }

    fn hello(game: &mut Game, p: SocketAddr) -> u32 {
        let out = game.handle_packet(p, Packet::Hello, 0.0);
        match decode(&out[0].1, Direction::ToClient) {
            Ok(Packet::Welcome { entity_id }) => entity_id,
            other => panic!("expected WELCOME, got {other:?}"),
        }
    }

    #[test]
    fn tick_counter_advances() {
        let mut game = Game::new(GameConfig::default(), 1);
        let dt = game.config().fixed_dt;
        for _ in 0..10 {
            game.step(dt);
        }
        assert_eq!(game.tick_count(), 10);
    }

    #[test]
    fn wave_spawner_emits_on_interval() {
        let mut game = Game::new(GameConfig::default(), 1);
        let dt = game.config().fixed_dt;
        let interval = game.config().enemy_spawn_interval;
        let ticks = (interval / dt).ceil() as usize + 1;
        for _ in 0..ticks {
            game.step(dt);
        }
        assert_eq!(game.world.members(game.views().enemies).len(), 1);
    }

    #[test]
    fn snapshot_frames_track_sessions() {
        let mut game = Game::new(GameConfig::default(), 1);
        hello(&mut game, peer(1));
        hello(&mut game, peer(2));

        let frames = game.snapshot_frames();
        assert_eq!(frames.len(), 2);
        for (to, bytes) in frames {
            let Packet::State(state) = decode(&bytes, Direction::ToClient).unwrap() else {
                panic!("expected STATE");
            };
            assert_eq!(state.players.len(), 2);
            // Each peer's msg id lands in its pending set.
            assert!(game
                .sessions
                .get(&to)
                .unwrap()
                .pending_acks
                .contains(&state.msg_id));
        }
    }

    #[test]
    fn reap_removes_player_from_world_and_snapshots() {
        let mut game = Game::new(GameConfig::default(), 1);
        let id = hello(&mut game, peer(1));
        assert_eq!(game.world.entity_count(), 1);

        game.reap_peer(peer(1));
        assert_eq!(game.world.entity_count(), 0);
        assert!(game.sessions.is_empty());

        let snapshot = game.build_snapshot();
        assert!(snapshot.players.iter().all(|p| p.id != id));
    }

    #[test]
    fn end_of_game_scoreboard_fires_once() {
        let mut game = Game::new(GameConfig::default(), 1);
        hello(&mut game, peer(1));
        let entity = game.sessions.get(&peer(1)).unwrap().entity.unwrap();

        assert!(game.end_of_game_frames(1.0).is_empty(), "player still alive");

        game.world.request_destroy(entity);
        game.step(game.config().fixed_dt);

        let frames = game.end_of_game_frames(2.0);
        assert_eq!(frames.len(), 1);
        assert!(matches!(
            decode(&frames[0].1, Direction::ToClient),
            Ok(Packet::Scoreboard { .. })
        ));
        assert!(game.end_of_game_frames(3.0).is_empty(), "announced once");
    }

    #[test]
    fn lobby_flow_over_packets() {
        let mut game = Game::new(GameConfig::default(), 1);

        let out = game.handle_packet(peer(1), Packet::CreateLobby { name: "alpha".into() }, 0.0);
        let Ok(Packet::LobbyCreated { lobby_id }) = decode(&out[0].1, Direction::ToClient) else {
            panic!("expected LobbyCreated");
        };

        let out = game.handle_packet(peer(2), Packet::JoinLobby { lobby_id }, 0.0);
        // Reply to the joiner plus an update to the owner.
        assert_eq!(out.len(), 2);
        assert_eq!(
            decode(&out[0].1, Direction::ToClient),
            Ok(Packet::JoinReply { success: true })
        );
        assert_eq!(out[1].0, peer(1));
        assert!(matches!(
            decode(&out[1].1, Direction::ToClient),
            Ok(Packet::LobbyUpdate { .. })
        ));

        let out = game.handle_packet(peer(3), Packet::ListLobbies, 0.0);
        assert_eq!(
            decode(&out[0].1, Direction::ToClient),
            Ok(Packet::LobbyList { names: vec!["alpha".into()] })
        );

        // Non-owner cannot start; owner can, and both members hear it.
        assert!(game.handle_packet(peer(2), Packet::StartGame, 0.0).is_empty());
        let out = game.handle_packet(peer(1), Packet::StartGame, 0.0);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn malformed_frames_are_dropped_quietly() {
        let mut game = Game::new(GameConfig::default(), 1);
        assert!(game.handle_frame(peer(1), &[], 0.0).is_empty());
        assert!(game.handle_frame(peer(1), &[1, 2, 0, 0], 0.0).is_empty());
        // And the server keeps serving well-formed frames afterwards.
        let out = game.handle_frame(peer(1), &encode(&Packet::Hello), 0.0);
        assert_eq!(out.len(), 1);
    }
}
