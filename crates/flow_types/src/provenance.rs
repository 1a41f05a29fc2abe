//! Provenance records, chains, and the process-wide ledger
//!
//! Every token may carry an ordered chain of records saying which actors
//! touched which payload types. The ledger is an explicit collaborator
//! handed to actors at construction; when disabled, all provenance
//! operations are no-ops and tokens travel with empty chains.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{ActorRole, PayloadType};

// ─────────────────────────────────────────────────────────────────────────────
// Actor Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Stable identifier of a producing actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    /// Actor name, unique within its enclosing container
    pub name: String,
    /// Process-unique id, stable for the actor's lifetime
    pub id: uuid::Uuid,
}

impl ActorIdentity {
    /// Create a fresh identity for the given actor name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: uuid::Uuid::new_v4(),
        }
    }
}

impl std::fmt::Display for ActorIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Records and Chains
// ─────────────────────────────────────────────────────────────────────────────

/// One provenance entry, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Role the actor played
    pub role: ActorRole,
    /// Payload type consumed
    pub input_type: PayloadType,
    /// Producing actor
    pub actor: ActorIdentity,
    /// Payload type produced
    pub output_type: PayloadType,
}

impl ProvenanceRecord {
    pub fn new(
        role: ActorRole,
        input_type: PayloadType,
        actor: ActorIdentity,
        output_type: PayloadType,
    ) -> Self {
        Self {
            role,
            input_type,
            actor,
            output_type,
        }
    }
}

/// Ordered, append-only sequence of provenance records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceChain {
    records: Vec<ProvenanceRecord>,
}

impl ProvenanceChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record
    pub fn push(&mut self, record: ProvenanceRecord) {
        self.records.push(record);
    }

    /// The records in append order
    pub fn records(&self) -> &[ProvenanceRecord] {
        &self.records
    }

    /// Number of records in the chain
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the chain holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// Process-wide provenance ledger
///
/// Holds the enabled flag (read-mostly, flipped between flows) and an
/// append-only record of every provenance entry emitted while enabled.
#[derive(Debug, Default)]
pub struct ProvenanceLedger {
    enabled: AtomicBool,
    recorded: RwLock<Vec<ProvenanceRecord>>,
}

impl ProvenanceLedger {
    /// Create a ledger with the given initial enabled state
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            recorded: RwLock::new(Vec::new()),
        }
    }

    /// Check if provenance tracking is on
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Turn provenance tracking on or off (between flows, not per call)
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Build the chain for an emitted token: copy of the input chain plus
    /// the new record. Returns an empty chain when disabled.
    pub fn extend(&self, input: &ProvenanceChain, record: ProvenanceRecord) -> ProvenanceChain {
        if !self.is_enabled() {
            return ProvenanceChain::new();
        }
        let mut chain = input.clone();
        self.recorded.write().push(record.clone());
        chain.push(record);
        chain
    }

    /// Everything appended while enabled, in emission order
    pub fn recorded(&self) -> Vec<ProvenanceRecord> {
        self.recorded.read().clone()
    }

    /// Drop the global record (the enabled flag is untouched)
    pub fn clear_recorded(&self) {
        self.recorded.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ProvenanceRecord {
        ProvenanceRecord::new(
            ActorRole::FeatureGenerator,
            PayloadType::Audio,
            ActorIdentity::new(name),
            PayloadType::Row,
        )
    }

    #[test]
    fn test_extend_appends_in_order() {
        let ledger = ProvenanceLedger::new(true);
        let chain = ledger.extend(&ProvenanceChain::new(), record("a"));
        let chain = ledger.extend(&chain, record("b"));

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.records()[0].actor.name, "a");
        assert_eq!(chain.records()[1].actor.name, "b");
        assert_eq!(ledger.recorded().len(), 2);
    }

    #[test]
    fn test_disabled_ledger_is_noop() {
        let ledger = ProvenanceLedger::new(false);
        let mut input = ProvenanceChain::new();
        input.push(record("earlier"));

        let chain = ledger.extend(&input, record("a"));
        assert!(chain.is_empty());
        assert!(ledger.recorded().is_empty());
    }

    #[test]
    fn test_flag_flips() {
        let ledger = ProvenanceLedger::new(false);
        assert!(!ledger.is_enabled());
        ledger.set_enabled(true);
        assert!(ledger.is_enabled());
    }
}
