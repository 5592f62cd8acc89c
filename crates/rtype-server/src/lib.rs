//! rtype-server -- Authoritative server core for a side-scrolling shooter.
//!
//! The server owns the single source of truth for every entity: clients
//! send compact input datagrams, the simulation advances at a fixed 60 Hz,
//! and self-contained STATE snapshots stream back to each connected peer.
//! Everything above the socket -- sessions, lobbies, the ECS world, the
//! tick order -- lives in [`kernel::Game`], which is deliberately
//! transport-free so the whole simulation is drivable from tests.
//!
//! Module map:
//! - [`config`] -- bind address resolution and gameplay tuning
//! - [`clock`] -- monotonic time seam
//! - [`transport`] -- non-blocking UDP with idle-peer reaping
//! - [`components`] / [`spawn`] -- gameplay data and entity recipes
//! - [`systems`] -- one module per tick phase
//! - [`session`] / [`lobby`] -- per-peer and pre-game state machines
//! - [`snapshot`] -- world → STATE serialization
//! - [`kernel`] -- the tick driver and the networked outer loop

#![deny(unsafe_code)]

pub mod clock;
pub mod components;
pub mod config;
pub mod kernel;
pub mod lobby;
pub mod session;
pub mod snapshot;
pub mod spawn;
pub mod systems;
pub mod transport;

/// Convenience re-exports for binaries and tests.
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, MonotonicClock};
    pub use crate::components::*;
    pub use crate::config::{GameConfig, ServerConfig};
    pub use crate::kernel::{Game, Outbound, Server};
    pub use crate::lobby::{Lobby, LobbyManager, LobbyState};
    pub use crate::session::{Session, SessionManager};
    pub use crate::snapshot::{state_digest, SnapshotBuilder};
    pub use crate::spawn::{
        spawn_enemy, spawn_player, spawn_powerup, spawn_projectile, spawn_projectile_from,
    };
    pub use crate::systems::SystemHandles;
    pub use crate::transport::UdpTransport;
}
