//! Token - the typed message passed between actors
//!
//! A token carries exactly one payload plus an optional provenance chain.
//! Tokens are values: attaching a chain produces a new token rather than
//! mutating the original.

use serde::{Deserialize, Serialize};

use crate::provenance::ProvenanceChain;
use crate::types::PayloadType;
use crate::value::Payload;

/// Error produced when a token's payload does not match the requested type
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    #[error("wrong payload type: expected {expected}, got {actual}")]
    WrongPayloadType {
        expected: PayloadType,
        actual: PayloadType,
    },
}

/// One typed message travelling between actors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    payload: Payload,
    #[serde(default, skip_serializing_if = "ProvenanceChain::is_empty")]
    provenance: ProvenanceChain,
}

impl Token {
    /// Wrap a payload in a token with an empty provenance chain
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            provenance: ProvenanceChain::new(),
        }
    }

    /// The payload, untyped
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Runtime type of the payload
    pub fn payload_type(&self) -> PayloadType {
        self.payload.type_of()
    }

    /// The payload, if its type is compatible with `expected`
    pub fn payload_as(&self, expected: &PayloadType) -> Result<&Payload, TokenError> {
        let actual = self.payload.type_of();
        if expected.is_compatible_with(&actual) {
            Ok(&self.payload)
        } else {
            Err(TokenError::WrongPayloadType {
                expected: expected.clone(),
                actual,
            })
        }
    }

    /// Predicate form of `payload_as`
    pub fn has_payload(&self, expected: &PayloadType) -> bool {
        expected.is_compatible_with(&self.payload.type_of())
    }

    /// The provenance chain carried by this token
    pub fn provenance(&self) -> &ProvenanceChain {
        &self.provenance
    }

    /// A copy of this token carrying the given chain; `self` is untouched
    pub fn with_provenance(&self, chain: ProvenanceChain) -> Self {
        Self {
            payload: self.payload.clone(),
            provenance: chain,
        }
    }

    /// Consume the token, yielding its payload
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::{ActorIdentity, ProvenanceRecord};
    use crate::types::ActorRole;
    use crate::value::AudioBuffer;

    #[test]
    fn test_payload_as_matching() {
        let token = Token::new(AudioBuffer::new(16, vec![0.0; 4]));
        assert!(token.payload_as(&PayloadType::Audio).is_ok());
        assert!(token.payload_as(&PayloadType::Any).is_ok());
        assert!(token.has_payload(&PayloadType::Audio));
    }

    #[test]
    fn test_payload_as_mismatch() {
        let token = Token::new("just a string");
        let err = token.payload_as(&PayloadType::Audio).unwrap_err();
        assert!(matches!(err, TokenError::WrongPayloadType { .. }));
        assert!(!token.has_payload(&PayloadType::Audio));
    }

    #[test]
    fn test_with_provenance_does_not_mutate() {
        let token = Token::new(1i64);
        let mut chain = ProvenanceChain::new();
        chain.push(ProvenanceRecord::new(
            ActorRole::Preprocessor,
            PayloadType::Int,
            ActorIdentity::new("a"),
            PayloadType::Int,
        ));

        let chained = token.with_provenance(chain);
        assert!(token.provenance().is_empty());
        assert_eq!(chained.provenance().len(), 1);
        assert_eq!(chained.payload(), token.payload());
    }
}
