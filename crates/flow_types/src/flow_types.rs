//! Shared data model for the flow actor runtime
//!
//! Everything that travels between actors lives here: payload values, the
//! payload type descriptors used for wiring checks, the token wrapper, and
//! the provenance chain/ledger.

pub mod provenance;
pub mod token;
pub mod types;
pub mod value;

pub use provenance::{ActorIdentity, ProvenanceChain, ProvenanceLedger, ProvenanceRecord};
pub use token::{Token, TokenError};
pub use types::{ActorRole, PayloadType};
pub use value::{AudioBuffer, FeatureRow, Payload};
