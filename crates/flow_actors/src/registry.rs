// Actor registry - explicit descriptor and factory table
//
// Actor types are declared statically and seeded at startup; there is no
// runtime scanning. The registry is what GUIs and flow editors enumerate.
//
// `NamedSetups` is the process-shared resolver behind "named setup" actors:
// pre-built algorithms registered under stable names and resolved lazily.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use flow_types::ProvenanceLedger;
use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmRef;
use crate::transformer::Transformer;

// ─────────────────────────────────────────────────────────────────────────────
// Named Setups
// ─────────────────────────────────────────────────────────────────────────────

/// Process-shared map of pre-built algorithms, resolved by name
#[derive(Default)]
pub struct NamedSetups {
    setups: DashMap<String, AlgorithmRef>,
}

impl NamedSetups {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an algorithm under a stable name
    pub fn register(&self, name: impl Into<String>, algorithm: AlgorithmRef) {
        self.setups.insert(name.into(), algorithm);
    }

    /// Resolve a name to its algorithm, if registered
    pub fn resolve(&self, name: &str) -> Option<AlgorithmRef> {
        self.setups.get(name).map(|entry| entry.value().clone())
    }

    /// Check if a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.setups.contains_key(name)
    }

    /// Remove a registered setup
    pub fn remove(&self, name: &str) {
        self.setups.remove(name);
    }
}

impl std::fmt::Debug for NamedSetups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NamedSetups(len={})", self.setups.len())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actor Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Static description of a registered actor type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDescriptor {
    /// Unique identifier (e.g., "audio/FeatureGenerator")
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Category for organisation (e.g., "Audio", "Database")
    pub category: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Factory creating a fresh actor instance wired to a ledger
pub type ActorFactory = Box<dyn Fn(Arc<ProvenanceLedger>) -> Box<dyn Transformer> + Send + Sync>;

struct ActorEntry {
    descriptor: ActorDescriptor,
    factory: ActorFactory,
}

/// Registry of all available actor types
#[derive(Default)]
pub struct ActorRegistry {
    actors: HashMap<String, ActorEntry>,
}

impl ActorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor type with its factory
    pub fn register(&mut self, descriptor: ActorDescriptor, factory: ActorFactory) {
        let id = descriptor.id.clone();
        self.actors.insert(id, ActorEntry { descriptor, factory });
    }

    /// Create a fresh instance of a registered actor type
    pub fn create(
        &self,
        id: &str,
        ledger: Arc<ProvenanceLedger>,
    ) -> Option<Box<dyn Transformer>> {
        self.actors.get(id).map(|entry| (entry.factory)(ledger))
    }

    /// Get a descriptor by ID
    pub fn descriptor(&self, id: &str) -> Option<&ActorDescriptor> {
        self.actors.get(id).map(|entry| &entry.descriptor)
    }

    /// All registered descriptors
    pub fn descriptors(&self) -> impl Iterator<Item = &ActorDescriptor> {
        self.actors.values().map(|entry| &entry.descriptor)
    }

    /// Descriptors in a given category
    pub fn actors_in_category(&self, category: &str) -> Vec<&ActorDescriptor> {
        self.actors
            .values()
            .filter(|entry| entry.descriptor.category == category)
            .map(|entry| &entry.descriptor)
            .collect()
    }

    /// All categories, sorted and deduplicated
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<_> = self
            .actors
            .values()
            .map(|entry| entry.descriptor.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Check if an actor type is registered
    pub fn contains(&self, id: &str) -> bool {
        self.actors.contains_key(id)
    }

    /// Number of registered actor types
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl std::fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActorRegistry(len={})", self.actors.len())
    }
}

/// Registry seeded with the built-in actor types
pub fn builtin_registry(setups: Arc<NamedSetups>) -> ActorRegistry {
    use crate::actors::{DocumentKeys, FeatureGenerator, NamedSetup};

    let mut registry = ActorRegistry::new();
    registry.register(
        ActorDescriptor {
            id: "audio/FeatureGenerator".to_string(),
            name: "FeatureGenerator".to_string(),
            category: "Audio".to_string(),
            description: Some(
                "Applies a feature generation algorithm to incoming audio.".to_string(),
            ),
        },
        Box::new(|ledger| Box::new(FeatureGenerator::new(ledger))),
    );
    registry.register(
        ActorDescriptor {
            id: "flow/NamedSetup".to_string(),
            name: "NamedSetup".to_string(),
            category: "Flow".to_string(),
            description: Some(
                "Applies an algorithm referenced via its global setup name.".to_string(),
            ),
        },
        Box::new(move |ledger| Box::new(NamedSetup::new(ledger, Arc::clone(&setups)))),
    );
    registry.register(
        ActorDescriptor {
            id: "database/DocumentKeys".to_string(),
            name: "DocumentKeys".to_string(),
            category: "Database".to_string(),
            description: Some(
                "Forwards all the sorted keys of the incoming document.".to_string(),
            ),
        },
        Box::new(|ledger| Box::new(DocumentKeys::new(ledger))),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Fingerprint;

    #[test]
    fn test_named_setups_resolution() {
        let setups = NamedSetups::new();
        assert!(!setups.contains("fp"));

        setups.register("fp", Arc::new(Fingerprint::default()));
        assert!(setups.contains("fp"));
        assert_eq!(setups.resolve("fp").unwrap().name(), "fingerprint");

        setups.remove("fp");
        assert!(setups.resolve("fp").is_none());
    }

    #[test]
    fn test_builtin_registry_seeded() {
        let registry = builtin_registry(Arc::new(NamedSetups::new()));
        assert!(registry.contains("audio/FeatureGenerator"));
        assert!(registry.contains("flow/NamedSetup"));
        assert!(registry.contains("database/DocumentKeys"));
        assert_eq!(registry.len(), 3);

        let categories = registry.categories();
        assert_eq!(categories, vec!["Audio", "Database", "Flow"]);
    }

    #[test]
    fn test_create_builds_fresh_instances() {
        let registry = builtin_registry(Arc::new(NamedSetups::new()));
        let ledger = Arc::new(ProvenanceLedger::new(false));

        let actor = registry
            .create("audio/FeatureGenerator", Arc::clone(&ledger))
            .unwrap();
        assert_eq!(actor.name(), "FeatureGenerator");
        assert!(registry.create("audio/Missing", ledger).is_none());
    }
}
