//! Pre-game lobby state machine.
//!
//! Lobbies exist from CREATE_LOBBY until their last member departs. The
//! owner is the creator (and an automatic member); only the owner can fire
//! the Waiting → InGame transition. Gameplay itself is unaffected by lobby
//! state -- members complete their HELLO on the gameplay path as usual.

use std::collections::HashMap;
use std::net::SocketAddr;

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyState {
    Waiting,
    InGame,
}

#[derive(Debug)]
pub struct Lobby {
    pub id: u32,
    pub name: String,
    pub owner: SocketAddr,
    pub members: Vec<SocketAddr>,
    pub state: LobbyState,
}

// ---------------------------------------------------------------------------
// LobbyManager
// ---------------------------------------------------------------------------

/// All lobbies, keyed by id.
#[derive(Debug)]
pub struct LobbyManager {
    lobbies: HashMap<u32, Lobby>,
    next_id: u32,
    capacity: usize,
}

impl LobbyManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            lobbies: HashMap::new(),
            next_id: 1,
            capacity,
        }
    }

    /// Create a Waiting lobby owned (and joined) by `owner`.
    ///
    /// A peer already in some lobby leaves it first; one lobby per peer.
    pub fn create(&mut self, name: &str, owner: SocketAddr) -> u32 {
        self.leave(owner);
        let id = self.next_id;
        self.next_id += 1;
        tracing::info!(lobby = id, name, %owner, "lobby created");
        self.lobbies.insert(
            id,
            Lobby {
                id,
                name: name.to_owned(),
                owner,
                members: vec![owner],
                state: LobbyState::Waiting,
            },
        );
        id
    }

    /// Join `peer` to lobby `id`. Fails on unknown id, a full lobby, or one
    /// already in game. Success returns the member list to notify.
    pub fn join(&mut self, id: u32, peer: SocketAddr) -> Option<Vec<SocketAddr>> {
        // Capture capacity limits before the mutable borrow below.
        let capacity = self.capacity;
        let lobby = self.lobbies.get_mut(&id)?;
        if lobby.state != LobbyState::Waiting || lobby.members.len() >= capacity {
            return None;
        }
        if !lobby.members.contains(&peer) {
            lobby.members.push(peer);
        }
        tracing::info!(lobby = id, %peer, "lobby joined");
        Some(lobby.members.clone())
    }

    /// Names of all lobbies still waiting for players, in id order.
    pub fn waiting_names(&self) -> Vec<String> {
        let mut waiting: Vec<(u32, &Lobby)> = self
            .lobbies
            .iter()
            .filter(|(_, l)| l.state == LobbyState::Waiting)
            .map(|(&id, l)| (id, l))
            .collect();
        waiting.sort_by_key(|&(id, _)| id);
        waiting.into_iter().map(|(_, l)| l.name.clone()).collect()
    }

    /// Owner-initiated Waiting → InGame transition for the lobby containing
    /// `peer`. Returns the member list on success.
    pub fn start(&mut self, peer: SocketAddr) -> Option<Vec<SocketAddr>> {
        let lobby = self
            .lobbies
            .values_mut()
            .find(|l| l.members.contains(&peer))?;
        if lobby.owner != peer || lobby.state != LobbyState::Waiting {
            return None;
        }
        lobby.state = LobbyState::InGame;
        tracing::info!(lobby = lobby.id, "game started");
        Some(lobby.members.clone())
    }

    /// Remove `peer` from whatever lobby it is in. The last member leaving
    /// destroys the lobby; a departing owner hands the lobby to the next
    /// member.
    pub fn leave(&mut self, peer: SocketAddr) {
        let Some(id) = self
            .lobbies
            .values()
            .find(|l| l.members.contains(&peer))
            .map(|l| l.id)
        else {
            return;
        };
        let Some(lobby) = self.lobbies.get_mut(&id) else {
            return;
        };
        lobby.members.retain(|&m| m != peer);
        if lobby.members.is_empty() {
            tracing::info!(lobby = id, "lobby dissolved");
            self.lobbies.remove(&id);
        } else if lobby.owner == peer {
            lobby.owner = lobby.members[0];
        }
    }

    pub fn get(&self, id: u32) -> Option<&Lobby> {
        self.lobbies.get(&id)
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
