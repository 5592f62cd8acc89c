//! Entity identifiers, signatures, and slot allocation.
//!
//! An [`EntityId`] is a plain 32-bit handle into a fixed pool of
//! [`MAX_ENTITIES`] slots. Each slot carries a [`Signature`] bitmask whose
//! bit *k* is set exactly when component type *k* is attached. Freed slots
//! are recycled through a FIFO queue, so an id may be reused after its
//! entity is destroyed, but no two *live* ids are ever equal.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::EcsError;

/// Hard cap on simultaneously live entities.
pub const MAX_ENTITIES: usize = 5000;

/// Maximum number of distinct component types (one signature bit each).
pub const MAX_COMPONENT_TYPES: usize = 64;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An opaque entity handle.
///
/// The raw value is the slot index; it is transmitted as-is on the wire,
/// which is why no generation bits are packed in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Construct from a raw slot index.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw `u32` representation (wire format).
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-bit component-presence bitmask.
///
/// Bit *k* is set iff the entity currently holds the component type that was
/// registered with index *k*. A system's *required* signature matches an
/// entity when every required bit is present.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature(u64);

impl Signature {
    /// The empty signature (no components).
    pub const EMPTY: Signature = Signature(0);

    /// Build a signature from a list of component bit indices.
    pub fn from_bits(bits: &[u8]) -> Self {
        let mut sig = Signature::EMPTY;
        for &bit in bits {
            sig.insert(bit);
        }
        sig
    }

    /// Set the bit for component type `bit`.
    #[inline]
    pub fn insert(&mut self, bit: u8) {
        debug_assert!((bit as usize) < MAX_COMPONENT_TYPES);
        self.0 |= 1 << bit;
    }

    /// Clear the bit for component type `bit`.
    #[inline]
    pub fn remove(&mut self, bit: u8) {
        self.0 &= !(1 << bit);
    }

    /// Whether the bit for component type `bit` is set.
    #[inline]
    pub fn contains(self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    /// Whether every bit of `required` is present: `(self & req) == req`.
    #[inline]
    pub fn contains_all(self, required: Signature) -> bool {
        self.0 & required.0 == required.0
    }

    /// Whether no bits are set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#018x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

/// Allocates and recycles [`EntityId`]s and tracks per-entity signatures.
///
/// All [`MAX_ENTITIES`] slots are seeded into a FIFO free queue up front, so
/// allocation order is deterministic and recycled indices are spread out over
/// time rather than concentrated on a hot slot.
#[derive(Debug)]
pub struct EntityStore {
    /// Free slot indices, popped front on create.
    free: VecDeque<u32>,
    /// Per-slot signature; `EMPTY` for dead slots.
    signatures: Vec<Signature>,
    /// Whether the slot is currently live.
    alive: Vec<bool>,
    /// Number of live entities.
    live: usize,
}

impl EntityStore {
    /// Create a store with every slot free.
    pub fn new() -> Self {
        Self {
            free: (0..MAX_ENTITIES as u32).collect(),
            signatures: vec![Signature::EMPTY; MAX_ENTITIES],
            alive: vec![false; MAX_ENTITIES],
            live: 0,
        }
    }

    /// Allocate a fresh entity with an empty signature.
    ///
    /// # Errors
    ///
    /// [`EcsError::CapacityExceeded`] once [`MAX_ENTITIES`] entities are live.
    pub fn create(&mut self) -> Result<EntityId, EcsError> {
        let Some(index) = self.free.pop_front() else {
            return Err(EcsError::CapacityExceeded);
        };
        self.alive[index as usize] = true;
        self.signatures[index as usize] = Signature::EMPTY;
        self.live += 1;
        Ok(EntityId(index))
    }

    /// Release an entity's slot back to the free queue.
    ///
    /// Returns `false` if the id was not live (double destroy is a no-op).
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let idx = id.index();
        if idx >= MAX_ENTITIES || !self.alive[idx] {
            return false;
        }
        self.alive[idx] = false;
        self.signatures[idx] = Signature::EMPTY;
        self.free.push_back(id.0);
        self.live -= 1;
        true
    }

    /// Whether `id` refers to a currently live entity.
    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index();
        idx < MAX_ENTITIES && self.alive[idx]
    }

    /// The signature of a live entity, or `EMPTY` for a dead one.
    #[inline]
    pub fn signature(&self, id: EntityId) -> Signature {
        self.signatures.get(id.index()).copied().unwrap_or_default()
    }

    /// Overwrite the signature of a live entity.
    pub fn set_signature(&mut self, id: EntityId, sig: Signature) {
        let idx = id.index();
        if idx < MAX_ENTITIES && self.alive[idx] {
            self.signatures[idx] = sig;
        }
    }

    /// Number of currently live entities.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_unique_ids() {
        let mut store = EntityStore::new();
        let ids: Vec<EntityId> = (0..100).map(|_| store.create().unwrap()).collect();
        let mut raw: Vec<u32> = ids.iter().map(|id| id.raw()).collect();
        raw.sort();
        raw.dedup();
        assert_eq!(raw.len(), 100);
        assert_eq!(store.live_count(), 100);
    }

    #[test]
    fn fifo_recycling_reuses_oldest_slot() {
        let mut store = EntityStore::new();
        let a = store.create().unwrap();
        let b = store.create().unwrap();
        store.destroy(a);
        store.destroy(b);
        // Slots come back in destruction order, after the untouched tail
        // of the initial queue drains.
        for _ in 0..MAX_ENTITIES - 2 {
            store.create().unwrap();
        }
        let reused = store.create().unwrap();
        assert_eq!(reused, a);
        let reused = store.create().unwrap();
        assert_eq!(reused, b);
    }

    #[test]
    fn capacity_exceeded_at_limit() {
        let mut store = EntityStore::new();
        for _ in 0..MAX_ENTITIES {
            store.create().unwrap();
        }
        assert!(matches!(store.create(), Err(EcsError::CapacityExceeded)));
    }

    #[test]
    fn destroy_resets_signature() {
        let mut store = EntityStore::new();
        let e = store.create().unwrap();
        store.set_signature(e, Signature::from_bits(&[0, 3]));
        assert!(store.signature(e).contains(3));
        assert!(store.destroy(e));
        assert!(store.signature(e).is_empty());
        assert!(!store.is_alive(e));
    }

    #[test]
    fn double_destroy_is_noop() {
        let mut store = EntityStore::new();
        let e = store.create().unwrap();
        assert!(store.destroy(e));
        assert!(!store.destroy(e));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn signature_set_operations() {
        let mut sig = Signature::EMPTY;
        sig.insert(0);
        sig.insert(5);
        assert!(sig.contains(0));
        assert!(sig.contains(5));
        assert!(!sig.contains(1));
        assert!(sig.contains_all(Signature::from_bits(&[0])));
        assert!(sig.contains_all(Signature::from_bits(&[0, 5])));
        assert!(!sig.contains_all(Signature::from_bits(&[0, 1])));
        sig.remove(0);
        assert!(!sig.contains(0));
        sig.remove(5);
        assert!(sig.is_empty());
    }
}
