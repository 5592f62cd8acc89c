//! Server and gameplay configuration.
//!
//! Network settings resolve in order: positional `[ip port]` command-line
//! arguments, then the `RTYPE_SERVER_IP` / `RTYPE_SERVER_PORT` environment
//! variables, then the built-in default `127.0.0.1:4242`. Gameplay tuning is
//! a plain value struct so tests can tweak individual knobs.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the bind address.
pub const ENV_IP: &str = "RTYPE_SERVER_IP";
/// Environment variable overriding the bind port.
pub const ENV_PORT: &str = "RTYPE_SERVER_PORT";

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Network-facing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: IpAddr::from([127, 0, 0, 1]),
            port: 4242,
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration from positional args and the environment.
    ///
    /// `args` excludes the program name. Unparseable values fall through to
    /// the next source with a log line rather than aborting; a server that
    /// can start on the default port is more useful than one that refuses.
    pub fn resolve(args: &[String]) -> Self {
        let mut config = Self::default();

        if let Ok(ip) = std::env::var(ENV_IP) {
            match ip.parse() {
                Ok(ip) => config.ip = ip,
                Err(_) => tracing::warn!(%ip, "ignoring unparseable {ENV_IP}"),
            }
        }
        if let Ok(port) = std::env::var(ENV_PORT) {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!(%port, "ignoring unparseable {ENV_PORT}"),
            }
        }

        if let Some(ip) = args.first() {
            match ip.parse() {
                Ok(ip) => config.ip = ip,
                Err(_) => tracing::warn!(%ip, "ignoring unparseable ip argument"),
            }
        }
        if let Some(port) = args.get(1) {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!(%port, "ignoring unparseable port argument"),
            }
        }

        config
    }

    /// The socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Gameplay tuning: every constant the simulation consumes, chosen once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed simulation timestep in seconds.
    pub fixed_dt: f32,
    /// Accumulator clamp; slower hosts drop time instead of spiraling.
    pub max_accumulator: f32,
    /// Seconds of silence before a peer's session is reaped.
    pub idle_timeout: f64,

    /// Playfield size.
    pub world_width: f32,
    pub world_height: f32,

    /// Player tuning.
    pub player_spawn_x: f32,
    pub player_spawn_y: f32,
    pub player_speed: f32,
    pub player_hp: i32,
    pub player_radius: f32,
    pub player_fire_cooldown: f32,

    /// Projectile tuning.
    pub player_projectile_speed: f32,
    pub player_projectile_damage: i32,
    pub enemy_projectile_speed: f32,
    pub enemy_projectile_damage: i32,
    pub projectile_radius: f32,
    pub projectile_lifetime: f32,
    /// Muzzle offset along the firing direction.
    pub projectile_offset: f32,

    /// Enemy tuning.
    pub enemy_spawn_interval: f32,
    pub enemy_spawn_x: f32,
    pub enemy_spawn_y_min: f32,
    pub enemy_spawn_y_max: f32,
    pub enemy_speed: f32,
    pub enemy_hp: i32,
    pub enemy_contact_damage: i32,
    pub enemy_radius: f32,
    pub enemy_fire_cooldown: f32,

    /// Combat tuning.
    pub invincibility_window: f32,
    pub kill_score: u32,

    /// AI tuning.
    pub ai_decision_cooldown: f32,
    pub ai_detection_range: f32,
    pub ai_attack_range: f32,
    pub ai_flee_health_threshold: f32,
    pub ai_patrol_speed: f32,
    pub ai_patrol_amplitude: f32,
    pub ai_patrol_frequency: f32,
    pub ai_chase_speed: f32,
    pub ai_flee_speed: f32,

    /// Powerup tuning.
    pub powerup_radius: f32,
    pub powerup_lifetime: f32,

    /// Lobby member cap.
    pub lobby_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_accumulator: 0.25,
            idle_timeout: 10.0,

            world_width: 800.0,
            world_height: 600.0,

            player_spawn_x: 400.0,
            player_spawn_y: 300.0,
            player_speed: 250.0,
            player_hp: 100,
            player_radius: 18.0,
            player_fire_cooldown: 0.3,

            player_projectile_speed: 400.0,
            player_projectile_damage: 10,
            enemy_projectile_speed: 200.0,
            enemy_projectile_damage: 15,
            projectile_radius: 5.0,
            projectile_lifetime: 3.0,
            projectile_offset: 25.0,

            enemy_spawn_interval: 2.0,
            enemy_spawn_x: 900.0,
            enemy_spawn_y_min: 50.0,
            enemy_spawn_y_max: 550.0,
            enemy_speed: 80.0,
            enemy_hp: 1,
            enemy_contact_damage: 10,
            enemy_radius: 20.0,
            enemy_fire_cooldown: 2.0,

            invincibility_window: 0.5,
            kill_score: 10,

            ai_decision_cooldown: 1.0,
            ai_detection_range: 300.0,
            ai_attack_range: 50.0,
            ai_flee_health_threshold: 0.3,
            ai_patrol_speed: 40.0,
            ai_patrol_amplitude: 30.0,
            ai_patrol_frequency: 2.0,
            ai_chase_speed: 120.0,
            ai_flee_speed: 150.0,

            powerup_radius: 12.0,
            powerup_lifetime: 10.0,

            lobby_capacity: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind_address() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:4242");
    }

    #[test]
    fn positional_args_win() {
        // Env reads are process-global, so only the arg path is exercised
        // here; resolve() consults env before args, args win.
        let args = vec!["0.0.0.0".to_string(), "5000".to_string()];
        let config = ServerConfig::resolve(&args);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn bad_args_fall_back_to_defaults() {
        let args = vec!["not-an-ip".to_string(), "not-a-port".to_string()];
        let config = ServerConfig::resolve(&args);
        assert_eq!(config.port, 4242);
    }
}
