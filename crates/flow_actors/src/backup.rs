// State backup - keyed snapshots around external variable updates
//
// The engine re-binds option values between ticks; setting an option resets
// the actor and empties its queue. `backup_state()` / `restore_state()`
// bracket that update so mid-stream state survives. Snapshots are shallow:
// owned objects move into the snapshot by reference and move back out on
// restore. Entries are consumed when restored.
//
// Keys are qualified stable strings ("transformer.queue") so composed actors
// never collide.

use std::collections::HashMap;

use flow_types::{Payload, PayloadType, ProvenanceChain, Token};

use crate::algorithm::AlgorithmRef;
use crate::queue::OutputQueue;

/// Canonical key for the output queue
pub const BACKUP_QUEUE: &str = "transformer.queue";
/// Canonical key for the installed input token
pub const BACKUP_INPUT: &str = "transformer.input";
/// Canonical key for the consumed-input context used for provenance
pub const BACKUP_CONSUMED: &str = "transformer.consumed";

/// One snapshotted value
pub enum BackupEntry {
    Queue(OutputQueue),
    Token(Token),
    Payload(Payload),
    Algorithm(AlgorithmRef),
    /// Input type and provenance chain of the consumed token
    Consumed(PayloadType, ProvenanceChain),
}

impl std::fmt::Debug for BackupEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupEntry::Queue(q) => write!(f, "Queue(len={})", q.len()),
            BackupEntry::Token(t) => write!(f, "Token({})", t.payload_type()),
            BackupEntry::Payload(p) => write!(f, "Payload({})", p.type_of()),
            BackupEntry::Algorithm(a) => write!(f, "Algorithm({})", a.spec()),
            BackupEntry::Consumed(ty, chain) => {
                write!(f, "Consumed({}, chain_len={})", ty, chain.len())
            }
        }
    }
}

/// Snapshot of actor-local state, keyed by stable strings
#[derive(Debug, Default)]
pub struct StateBackup {
    entries: HashMap<String, BackupEntry>,
}

impl StateBackup {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry; subclasses extend, never overwrite, ancestor keys
    pub fn insert(&mut self, key: impl Into<String>, entry: BackupEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Remove and return an entry (restore consumes the snapshot)
    pub fn take(&mut self, key: &str) -> Option<BackupEntry> {
        self.entries.remove(key)
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop an entry without restoring it
    pub fn prune(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of entries still held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if everything has been consumed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes_entry() {
        let mut backup = StateBackup::new();
        let mut queue = OutputQueue::new();
        queue.push(Payload::Int(7));
        backup.insert(BACKUP_QUEUE, BackupEntry::Queue(queue));

        assert!(backup.contains(BACKUP_QUEUE));
        let entry = backup.take(BACKUP_QUEUE).unwrap();
        assert!(matches!(entry, BackupEntry::Queue(q) if q.len() == 1));
        assert!(backup.is_empty());
        assert!(backup.take(BACKUP_QUEUE).is_none());
    }

    #[test]
    fn test_prune_drops_entry() {
        let mut backup = StateBackup::new();
        backup.insert("actor.stale", BackupEntry::Payload(Payload::Bool(true)));
        backup.prune("actor.stale");
        assert!(!backup.contains("actor.stale"));
    }
}
