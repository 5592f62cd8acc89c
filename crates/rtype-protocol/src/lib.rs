//! rtype-protocol -- Binary wire codec for the game's datagram protocol.
//!
//! Pure functions, no state, no I/O: [`codec::encode`] turns a [`Packet`]
//! into a framed byte vector and [`codec::decode`] parses one back, failing
//! loudly on anything that is not a bit-exact frame. The transport and
//! session layers own the policy of what to do with failures (drop and
//! continue).
//!
//! # Quick Start
//!
//! ```
//! use rtype_protocol::prelude::*;
//!
//! let frame = encode(&Packet::Welcome { entity_id: 7 });
//! assert_eq!(&frame[..4], &[2, 1, 0, 4]); // opcode, version, length BE
//!
//! let packet = decode(&frame, Direction::ToClient).unwrap();
//! assert_eq!(packet, Packet::Welcome { entity_id: 7 });
//! ```

#![deny(unsafe_code)]

pub mod codec;
pub mod packets;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Decode failures. Policy everywhere: drop the frame, keep serving.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame does not parse: short header, bad length field, unknown
    /// opcode, truncated or oversized payload, or an interior length prefix
    /// that overruns the buffer.
    #[error("malformed packet: {0}")]
    Malformed(&'static str),

    /// The version byte is not ours; the frame is from an incompatible peer.
    #[error("unsupported protocol version {version}")]
    UnsupportedVersion { version: u8 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::codec::{decode, encode};
    pub use crate::packets::{
        Direction, EntityRecord, Opcode, Packet, ProjectileRecord, ScoreEntry, StateSnapshot,
        HEADER_LEN, PROTOCOL_VERSION,
    };
    pub use crate::ProtocolError;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
