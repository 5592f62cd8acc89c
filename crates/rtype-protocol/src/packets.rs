//! Packet and payload definitions.
//!
//! Every datagram is one frame: `[opcode: u8][version: u8][length: u16 BE]`
//! followed by `length` payload bytes. The payload shapes are fixed per
//! opcode; three opcodes (7, 8, 9) are request/response pairs whose payload
//! depends on the travel direction.

use std::fmt;

/// Protocol version carried in every frame. Frames with any other version
/// are discarded by the receiver.
pub const PROTOCOL_VERSION: u8 = 1;

/// Frame header size: opcode + version + big-endian payload length.
pub const HEADER_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// Wire opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Hello = 1,
    Welcome = 2,
    Input = 3,
    State = 4,
    Ack = 5,
    Scoreboard = 6,
    ListLobbies = 7,
    CreateLobby = 8,
    JoinLobby = 9,
    StartGame = 10,
    LobbyUpdate = 11,
}

impl Opcode {
    /// Map a raw opcode byte, if it names a known opcode.
    pub fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            1 => Opcode::Hello,
            2 => Opcode::Welcome,
            3 => Opcode::Input,
            4 => Opcode::State,
            5 => Opcode::Ack,
            6 => Opcode::Scoreboard,
            7 => Opcode::ListLobbies,
            8 => Opcode::CreateLobby,
            9 => Opcode::JoinLobby,
            10 => Opcode::StartGame,
            11 => Opcode::LobbyUpdate,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which way a frame travels. Opcodes 7/8/9 reuse one opcode for the request
/// and its response, so decoding needs to know the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client → server (the server decodes with this).
    ToServer,
    /// Server → client (clients and tests decode with this).
    ToClient,
}

// ---------------------------------------------------------------------------
// Snapshot records
// ---------------------------------------------------------------------------

/// One replicated player or enemy in a STATE snapshot.
///
/// Encoded as `{u32 id, u8 kind, f32 x, f32 y, u32 hp}`; kind is 0 for
/// players and 1 for enemies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub hp: u32,
}

/// One replicated projectile: `{u32 id, u8 kind = 2, f32 x, f32 y}`, no hp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// The full authoritative world description sent each tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateSnapshot {
    /// Server-monotonic snapshot id; later ids supersede earlier ones.
    pub msg_id: u32,
    /// Simulation tick the snapshot was taken at.
    pub tick: u32,
    pub players: Vec<EntityRecord>,
    pub enemies: Vec<EntityRecord>,
    pub projectiles: Vec<ProjectileRecord>,
}

/// One row of the end-of-game scoreboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEntry {
    pub player_id: u32,
    pub score: u32,
    pub time_survived: f32,
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Handshake request (client → server), empty payload.
    Hello,
    /// Handshake reply carrying the assigned player entity id.
    Welcome { entity_id: u32 },
    /// Latest input: numpad direction 1..=9 (5 = idle) and fire flag,
    /// packed as `(direction & 0x0F) | (fire ? 0x10 : 0)`.
    Input { direction: u8, fire: bool },
    /// Authoritative world snapshot.
    State(StateSnapshot),
    /// Acknowledges a prior STATE by msg id.
    Ack { msg_id: u32 },
    /// End-of-game scores.
    Scoreboard { entries: Vec<ScoreEntry> },
    /// Lobby listing request (client → server), empty payload.
    ListLobbies,
    /// Lobby listing response: names of lobbies still waiting for players.
    LobbyList { names: Vec<String> },
    /// Lobby creation request with a length-prefixed name.
    CreateLobby { name: String },
    /// Lobby creation response carrying the assigned lobby id.
    LobbyCreated { lobby_id: u32 },
    /// Join request by lobby id.
    JoinLobby { lobby_id: u32 },
    /// Join response: 1 on success, 0 on unknown or full lobby.
    JoinReply { success: bool },
    /// Owner's request to start the match, empty payload.
    StartGame,
    /// Free-form lobby broadcast (membership changes, chatter).
    LobbyUpdate { data: Vec<u8> },
}

impl Packet {
    /// The opcode this packet is framed with.
    pub fn opcode(&self) -> Opcode {
        match self {
            Packet::Hello => Opcode::Hello,
            Packet::Welcome { .. } => Opcode::Welcome,
            Packet::Input { .. } => Opcode::Input,
            Packet::State(_) => Opcode::State,
            Packet::Ack { .. } => Opcode::Ack,
            Packet::Scoreboard { .. } => Opcode::Scoreboard,
            Packet::ListLobbies | Packet::LobbyList { .. } => Opcode::ListLobbies,
            Packet::CreateLobby { .. } | Packet::LobbyCreated { .. } => Opcode::CreateLobby,
            Packet::JoinLobby { .. } | Packet::JoinReply { .. } => Opcode::JoinLobby,
            Packet::StartGame => Opcode::StartGame,
            Packet::LobbyUpdate { .. } => Opcode::LobbyUpdate,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::State(s) => write!(
                f,
                "State(msg_id={}, tick={}, {}P/{}E/{}B)",
                s.msg_id,
                s.tick,
                s.players.len(),
                s.enemies.len(),
                s.projectiles.len()
            ),
            other => write!(f, "{:?}", other.opcode()),
        }
    }
}
