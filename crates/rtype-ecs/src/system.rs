//! System registration and working-set maintenance.
//!
//! A *system* here is a membership predicate, not behavior: it names a
//! required [`Signature`], and the registry keeps an insertion-ordered list
//! of every entity whose signature covers it. Behavior modules hold a
//! [`SystemId`] and iterate the working set each tick; the lists are updated
//! eagerly whenever any entity's signature changes, so iteration never has
//! to re-scan the world.

use std::fmt;

use crate::entity::{EntityId, Signature};

// ---------------------------------------------------------------------------
// SystemId
// ---------------------------------------------------------------------------

/// Handle to a registered system.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) usize);

impl fmt::Debug for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// SystemRegistry
// ---------------------------------------------------------------------------

/// One registered system: its required signature and current working set.
#[derive(Debug)]
struct SystemEntry {
    /// Human-readable name for logs and diagnostics.
    name: String,
    /// Every required bit must be present for membership.
    required: Signature,
    /// Matching entities in insertion order. Order is stable within a tick;
    /// removal keeps relative order (no swap tricks here, the lists are
    /// small and iterated far more often than mutated).
    members: Vec<EntityId>,
}

/// Tracks systems and keeps their working sets in sync with signatures.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    systems: Vec<SystemEntry>,
}

impl SystemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Register a system with the given required signature.
    ///
    /// Registration order is permanent; the returned [`SystemId`] indexes it.
    pub fn register(&mut self, name: &str, required: Signature) -> SystemId {
        let id = SystemId(self.systems.len());
        self.systems.push(SystemEntry {
            name: name.to_owned(),
            required,
            members: Vec::new(),
        });
        tracing::debug!(system = name, ?required, "system registered");
        id
    }

    /// The working set of `system`, in insertion order.
    pub fn members(&self, system: SystemId) -> &[EntityId] {
        &self.systems[system.0].members
    }

    /// The required signature of `system`.
    pub fn required(&self, system: SystemId) -> Signature {
        self.systems[system.0].required
    }

    /// The registered name of `system`.
    pub fn name(&self, system: SystemId) -> &str {
        &self.systems[system.0].name
    }

    /// Re-evaluate membership of `entity` in every system after its
    /// signature changed to `signature`.
    pub fn signature_changed(&mut self, entity: EntityId, signature: Signature) {
        for entry in &mut self.systems {
            let matches = signature.contains_all(entry.required);
            let present = entry.members.contains(&entity);
            if matches && !present {
                entry.members.push(entity);
            } else if !matches && present {
                entry.members.retain(|&e| e != entity);
            }
        }
    }

    /// Drop `entity` from every working set (destruction path).
    pub fn entity_destroyed(&mut self, entity: EntityId) {
        for entry in &mut self.systems {
            entry.members.retain(|&e| e != entity);
        }
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn e(raw: u32) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn membership_tracks_signature_superset() {
        let mut reg = SystemRegistry::new();
        let sys = reg.register("movement", Signature::from_bits(&[0, 1]));

        // Only bit 0: not a member.
        reg.signature_changed(e(1), Signature::from_bits(&[0]));
        assert!(reg.members(sys).is_empty());

        // Bits 0+1: member.
        reg.signature_changed(e(1), Signature::from_bits(&[0, 1]));
        assert_eq!(reg.members(sys), &[e(1)]);

        // Superset keeps membership.
        reg.signature_changed(e(1), Signature::from_bits(&[0, 1, 4]));
        assert_eq!(reg.members(sys), &[e(1)]);

        // Losing a required bit removes.
        reg.signature_changed(e(1), Signature::from_bits(&[1, 4]));
        assert!(reg.members(sys).is_empty());
    }

    #[test]
    fn working_set_keeps_insertion_order() {
        let mut reg = SystemRegistry::new();
        let sys = reg.register("render", Signature::from_bits(&[2]));
        for raw in [5u32, 3, 9] {
            reg.signature_changed(e(raw), Signature::from_bits(&[2]));
        }
        assert_eq!(reg.members(sys), &[e(5), e(3), e(9)]);

        // Removal preserves relative order of the rest.
        reg.signature_changed(e(3), Signature::EMPTY);
        assert_eq!(reg.members(sys), &[e(5), e(9)]);
    }

    #[test]
    fn repeated_signature_change_never_duplicates() {
        let mut reg = SystemRegistry::new();
        let sys = reg.register("health", Signature::from_bits(&[3]));
        reg.signature_changed(e(1), Signature::from_bits(&[3]));
        reg.signature_changed(e(1), Signature::from_bits(&[3, 4]));
        reg.signature_changed(e(1), Signature::from_bits(&[3, 4, 5]));
        assert_eq!(reg.members(sys), &[e(1)]);
    }

    #[test]
    fn destruction_clears_all_sets() {
        let mut reg = SystemRegistry::new();
        let a = reg.register("a", Signature::from_bits(&[0]));
        let b = reg.register("b", Signature::from_bits(&[1]));
        reg.signature_changed(e(1), Signature::from_bits(&[0, 1]));
        assert_eq!(reg.members(a), &[e(1)]);
        assert_eq!(reg.members(b), &[e(1)]);

        reg.entity_destroyed(e(1));
        assert!(reg.members(a).is_empty());
        assert!(reg.members(b).is_empty());
    }

    #[test]
    fn empty_required_signature_matches_everything() {
        let mut reg = SystemRegistry::new();
        let sys = reg.register("all", Signature::EMPTY);
        reg.signature_changed(e(1), Signature::from_bits(&[7]));
        reg.signature_changed(e(2), Signature::EMPTY);
        assert_eq!(reg.members(sys), &[e(1), e(2)]);
    }
}
