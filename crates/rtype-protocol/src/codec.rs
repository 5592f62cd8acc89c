//! Pure encode/decode for the datagram wire format.
//!
//! All integers are big-endian; floats travel as IEEE-754 single-precision
//! bit patterns, also big-endian. Decoding is strict: a frame whose version
//! byte is wrong, whose declared length disagrees with the buffer, or whose
//! payload does not parse exactly (no trailing bytes) is rejected, and the
//! caller drops it and moves on.

use bytes::{Buf, BufMut};

use crate::packets::{
    Direction, EntityRecord, Opcode, Packet, ProjectileRecord, ScoreEntry, StateSnapshot,
    HEADER_LEN, PROTOCOL_VERSION,
};
use crate::ProtocolError;

/// Record kind tags inside STATE payloads.
const KIND_PLAYER: u8 = 0;
const KIND_ENEMY: u8 = 1;
const KIND_PROJECTILE: u8 = 2;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a packet into a complete frame (header + payload).
pub fn encode(packet: &Packet) -> Vec<u8> {
    let payload = encode_payload(packet);
    debug_assert!(payload.len() <= u16::MAX as usize, "payload exceeds u16 length field");

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.put_u8(packet.opcode() as u8);
    frame.put_u8(PROTOCOL_VERSION);
    frame.put_u16(payload.len() as u16);
    frame.extend_from_slice(&payload);
    frame
}

fn encode_payload(packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::new();
    match packet {
        Packet::Hello | Packet::ListLobbies | Packet::StartGame => {}
        Packet::Welcome { entity_id } => buf.put_u32(*entity_id),
        Packet::Input { direction, fire } => {
            buf.put_u8((direction & 0x0F) | if *fire { 0x10 } else { 0 });
        }
        Packet::State(state) => {
            buf.put_u32(state.msg_id);
            buf.put_u32(state.tick);
            buf.put_u16(state.players.len() as u16);
            buf.put_u16(state.enemies.len() as u16);
            buf.put_u16(state.projectiles.len() as u16);
            for p in &state.players {
                put_entity_record(&mut buf, p, KIND_PLAYER);
            }
            for e in &state.enemies {
                put_entity_record(&mut buf, e, KIND_ENEMY);
            }
            for b in &state.projectiles {
                buf.put_u32(b.id);
                buf.put_u8(KIND_PROJECTILE);
                buf.put_f32(b.x);
                buf.put_f32(b.y);
            }
        }
        Packet::Ack { msg_id } => buf.put_u32(*msg_id),
        Packet::Scoreboard { entries } => {
            buf.put_u16(entries.len() as u16);
            for entry in entries {
                buf.put_u32(entry.player_id);
                buf.put_u32(entry.score);
                buf.put_f32(entry.time_survived);
            }
        }
        Packet::LobbyList { names } => {
            buf.put_u16(names.len() as u16);
            for name in names {
                put_short_string(&mut buf, name);
            }
        }
        Packet::CreateLobby { name } => put_short_string(&mut buf, name),
        Packet::LobbyCreated { lobby_id } => buf.put_u32(*lobby_id),
        Packet::JoinLobby { lobby_id } => buf.put_u32(*lobby_id),
        Packet::JoinReply { success } => buf.put_u8(u8::from(*success)),
        Packet::LobbyUpdate { data } => buf.extend_from_slice(data),
    }
    buf
}

fn put_entity_record(buf: &mut Vec<u8>, record: &EntityRecord, kind: u8) {
    buf.put_u32(record.id);
    buf.put_u8(kind);
    buf.put_f32(record.x);
    buf.put_f32(record.y);
    buf.put_u32(record.hp);
}

/// Length-prefixed string: `u8 len` + `len` UTF-8 bytes. Truncated to 255
/// bytes on encode; lobby names are short.
fn put_short_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(u8::MAX as usize);
    buf.put_u8(len as u8);
    buf.extend_from_slice(&bytes[..len]);
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one complete frame.
///
/// `direction` selects the payload shape for the opcodes shared between
/// requests and responses (7, 8, 9).
///
/// # Errors
///
/// [`ProtocolError::UnsupportedVersion`] for a foreign version byte,
/// [`ProtocolError::Malformed`] for everything else that does not parse.
pub fn decode(frame: &[u8], direction: Direction) -> Result<Packet, ProtocolError> {
    if frame.len() < HEADER_LEN {
        return Err(ProtocolError::Malformed("frame shorter than header"));
    }
    let mut buf = frame;
    let opcode_raw = buf.get_u8();
    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion { version });
    }
    let declared = buf.get_u16() as usize;
    if declared != buf.remaining() {
        return Err(ProtocolError::Malformed("length field disagrees with frame size"));
    }
    let opcode = Opcode::from_u8(opcode_raw)
        .ok_or(ProtocolError::Malformed("unknown opcode"))?;

    let packet = decode_payload(opcode, &mut buf, direction)?;
    if buf.has_remaining() {
        return Err(ProtocolError::Malformed("trailing bytes after payload"));
    }
    Ok(packet)
}

fn decode_payload(
    opcode: Opcode,
    buf: &mut &[u8],
    direction: Direction,
) -> Result<Packet, ProtocolError> {
    Ok(match opcode {
        Opcode::Hello => Packet::Hello,
        Opcode::Welcome => Packet::Welcome {
            entity_id: read_u32(buf)?,
        },
        Opcode::Input => {
            let packed = read_u8(buf)?;
            let direction_code = packed & 0x0F;
            if !(1..=9).contains(&direction_code) {
                return Err(ProtocolError::Malformed("input direction out of range"));
            }
            Packet::Input {
                direction: direction_code,
                fire: packed & 0x10 != 0,
            }
        }
        Opcode::State => Packet::State(decode_state(buf)?),
        Opcode::Ack => Packet::Ack {
            msg_id: read_u32(buf)?,
        },
        Opcode::Scoreboard => {
            let count = read_u16(buf)? as usize;
            let mut entries = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                entries.push(ScoreEntry {
                    player_id: read_u32(buf)?,
                    score: read_u32(buf)?,
                    time_survived: read_f32(buf)?,
                });
            }
            Packet::Scoreboard { entries }
        }
        Opcode::ListLobbies => match direction {
            Direction::ToServer => Packet::ListLobbies,
            Direction::ToClient => {
                let count = read_u16(buf)? as usize;
                let mut names = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    names.push(read_short_string(buf)?);
                }
                Packet::LobbyList { names }
            }
        },
        Opcode::CreateLobby => match direction {
            Direction::ToServer => Packet::CreateLobby {
                name: read_short_string(buf)?,
            },
            Direction::ToClient => Packet::LobbyCreated {
                lobby_id: read_u32(buf)?,
            },
        },
        Opcode::JoinLobby => match direction {
            Direction::ToServer => Packet::JoinLobby {
                lobby_id: read_u32(buf)?,
            },
            Direction::ToClient => Packet::JoinReply {
                success: read_u8(buf)? != 0,
            },
        },
        Opcode::StartGame => Packet::StartGame,
        Opcode::LobbyUpdate => {
            let mut data = vec![0u8; buf.remaining()];
            buf.copy_to_slice(&mut data);
            Packet::LobbyUpdate { data }
        }
    })
}

fn decode_state(buf: &mut &[u8]) -> Result<StateSnapshot, ProtocolError> {
    let msg_id = read_u32(buf)?;
    let tick = read_u32(buf)?;
    let n_players = read_u16(buf)? as usize;
    let n_enemies = read_u16(buf)? as usize;
    let n_projectiles = read_u16(buf)? as usize;

    let mut players = Vec::with_capacity(n_players.min(4096));
    for _ in 0..n_players {
        players.push(read_entity_record(buf, KIND_PLAYER)?);
    }
    let mut enemies = Vec::with_capacity(n_enemies.min(4096));
    for _ in 0..n_enemies {
        enemies.push(read_entity_record(buf, KIND_ENEMY)?);
    }
    let mut projectiles = Vec::with_capacity(n_projectiles.min(4096));
    for _ in 0..n_projectiles {
        let id = read_u32(buf)?;
        let kind = read_u8(buf)?;
        if kind != KIND_PROJECTILE {
            return Err(ProtocolError::Malformed("unexpected record kind"));
        }
        projectiles.push(ProjectileRecord {
            id,
            x: read_f32(buf)?,
            y: read_f32(buf)?,
        });
    }

    Ok(StateSnapshot {
        msg_id,
        tick,
        players,
        enemies,
        projectiles,
    })
}

fn read_entity_record(buf: &mut &[u8], expected_kind: u8) -> Result<EntityRecord, ProtocolError> {
    let id = read_u32(buf)?;
    let kind = read_u8(buf)?;
    if kind != expected_kind {
        return Err(ProtocolError::Malformed("unexpected record kind"));
    }
    Ok(EntityRecord {
        id,
        x: read_f32(buf)?,
        y: read_f32(buf)?,
        hp: read_u32(buf)?,
    })
}

// -- length-guarded primitive reads -----------------------------------------

fn read_u8(buf: &mut &[u8]) -> Result<u8, ProtocolError> {
    if buf.remaining() < 1 {
        return Err(ProtocolError::Malformed("payload truncated"));
    }
    Ok(buf.get_u8())
}

fn read_u16(buf: &mut &[u8]) -> Result<u16, ProtocolError> {
    if buf.remaining() < 2 {
        return Err(ProtocolError::Malformed("payload truncated"));
    }
    Ok(buf.get_u16())
}

fn read_u32(buf: &mut &[u8]) -> Result<u32, ProtocolError> {
    if buf.remaining() < 4 {
        return Err(ProtocolError::Malformed("payload truncated"));
    }
    Ok(buf.get_u32())
}

fn read_f32(buf: &mut &[u8]) -> Result<f32, ProtocolError> {
    if buf.remaining() < 4 {
        return Err(ProtocolError::Malformed("payload truncated"));
    }
    Ok(buf.get_f32())
}

fn read_short_string(buf: &mut &[u8]) -> Result<String, ProtocolError> {
    let len = read_u8(buf)? as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::Malformed("string length exceeds payload"));
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| ProtocolError::Malformed("string is not UTF-8"))
}
