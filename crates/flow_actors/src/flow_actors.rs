//! Transformer-actor runtime for the flow engine
//!
//! Implements the typed transformer-actor protocol: option handling with
//! reset semantics, queued multi-output emission, state backup around
//! variable updates, provenance chaining, lifecycle sequencing, and
//! structured error reporting. Concrete actors live in `actors` and
//! specialise by composition with an `Algorithm`.

pub mod actors;
pub mod algorithm;
pub mod backup;
pub mod error;
pub mod lifecycle;
pub mod option;
pub mod queue;
pub mod registry;
pub mod transformer;

pub use algorithm::{Algorithm, AlgorithmRef, Fingerprint};
pub use backup::{BackupEntry, StateBackup, BACKUP_CONSUMED, BACKUP_INPUT, BACKUP_QUEUE};
pub use error::{ActorError, ActorResult, Severity};
pub use lifecycle::{LifecycleState, StopToken};
pub use option::{OptionDef, OptionError, OptionKind, OptionRegistry, OptionValue};
pub use queue::OutputQueue;
pub use registry::{builtin_registry, ActorDescriptor, ActorFactory, ActorRegistry, NamedSetups};
pub use transformer::{Transformer, TransformerCore};

#[cfg(test)]
mod scenarios;
