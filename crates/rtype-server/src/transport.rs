//! Non-blocking UDP transport with per-peer liveness tracking.
//!
//! One socket, one owner thread, no interior locking. Receives update a
//! `peer -> last_seen` table that the outer loop sweeps for idle peers; the
//! session layer is told which peers were reaped and tears down their state.
//!
//! Sends are best-effort: a kernel buffer that momentarily refuses a
//! datagram is indistinguishable from network loss, and the snapshot
//! protocol is idempotent, so `WouldBlock` is simply dropped.

use std::collections::HashMap;
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, UdpSocket};

/// Largest datagram we accept; comfortably above the biggest snapshot the
/// entity cap can produce for one screen of action.
pub const MAX_DATAGRAM: usize = 8192;

// ---------------------------------------------------------------------------
// UdpTransport
// ---------------------------------------------------------------------------

/// Wrapper over one non-blocking [`UdpSocket`].
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buf: Box<[u8; MAX_DATAGRAM]>,
    /// Monotonic timestamp of the last datagram from each peer.
    last_seen: HashMap<SocketAddr, f64>,
    /// Datagrams that failed to send for reasons other than `WouldBlock`.
    send_errors: u64,
}

impl UdpTransport {
    /// Bind and switch to non-blocking mode.
    ///
    /// Bind failure propagates to the caller; the binary turns it into the
    /// documented exit code 84.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        tracing::info!(%local_addr, "udp transport bound");
        Ok(Self {
            socket,
            local_addr,
            recv_buf: Box::new([0u8; MAX_DATAGRAM]),
            last_seen: HashMap::new(),
            send_errors: 0,
        })
    }

    /// The bound address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Best-effort send. `WouldBlock` counts as packet loss; other errors
    /// are logged at low verbosity and counted.
    pub fn send(&mut self, peer: SocketAddr, frame: &[u8]) {
        match self.socket.send_to(frame, peer) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => {
                self.send_errors += 1;
                tracing::debug!(%peer, error = %e, "send failed");
            }
        }
    }

    /// Receive one datagram if available, stamping the sender's liveness
    /// with `now`. Returns `None` once the socket would block; the caller
    /// loops until then to drain the queue.
    pub fn poll(&mut self, now: f64) -> Option<(SocketAddr, Vec<u8>)> {
        loop {
            match self.socket.recv_from(&mut self.recv_buf[..]) {
                Ok((len, peer)) => {
                    self.last_seen.insert(peer, now);
                    return Some((peer, self.recv_buf[..len].to_vec()));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return None,
                Err(e) => {
                    // Transient ICMP-driven errors on connectionless sockets;
                    // skip and keep draining.
                    tracing::debug!(error = %e, "recv failed");
                    continue;
                }
            }
        }
    }

    /// Peers currently tracked as live, in sorted order for determinism.
    pub fn active_peers(&self) -> Vec<SocketAddr> {
        let mut peers: Vec<SocketAddr> = self.last_seen.keys().copied().collect();
        peers.sort();
        peers
    }

    /// Remove and return every peer silent for longer than `idle_threshold`
    /// seconds as of `now`.
    pub fn reap_idle(&mut self, now: f64, idle_threshold: f64) -> Vec<SocketAddr> {
        let mut stale: Vec<SocketAddr> = self
            .last_seen
            .iter()
            .filter(|(_, &seen)| now - seen > idle_threshold)
            .map(|(&peer, _)| peer)
            .collect();
        stale.sort();
        for peer in &stale {
            self.last_seen.remove(peer);
            tracing::info!(%peer, "peer idle, reaped");
        }
        stale
    }

    /// Forget a peer immediately (session closed by other means).
    pub fn forget(&mut self, peer: SocketAddr) {
        self.last_seen.remove(&peer);
    }

    /// Count of non-WouldBlock send failures since bind.
    pub fn send_error_count(&self) -> u64 {
        self.send_errors
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
