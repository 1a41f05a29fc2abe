// Error taxonomy for the actor protocol
//
// `execute()` and friends return these instead of panicking or using
// exceptions for control flow. Third-party algorithm failures are caught at
// the plugin boundary and mapped to `AlgorithmFailure` with the message
// preserved.

use flow_types::PayloadType;

/// How the engine should treat an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Surfaced to the engine; it decides per `stop_flow_on_error`
    Recoverable,
    /// The flow (or the engine's use of the actor) is broken
    Fatal,
}

/// Result type for actor operations
pub type ActorResult<T> = Result<T, ActorError>;

/// Errors an actor can report
///
/// Every variant carries the actor name so the surfaced single-line message
/// identifies the failing node without a stack trace.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActorError {
    #[error("{actor}: wrong payload type: expected one of [{expected}], got {actual}")]
    WrongPayloadType {
        actor: String,
        expected: String,
        actual: PayloadType,
    },

    #[error("{actor}: input token already installed and not yet consumed")]
    AlreadyHasInput { actor: String },

    #[error("{actor}: output() called with no pending output")]
    EmptyQueue { actor: String },

    #[error("{actor}: invalid option '{property}': {reason}")]
    OptionInvalid {
        actor: String,
        property: String,
        reason: String,
    },

    #[error("{actor}: {operation} failed: {cause}")]
    AlgorithmFailure {
        actor: String,
        operation: String,
        cause: String,
    },

    #[error("{actor}: missing dependency '{name}'")]
    DependencyMissing { actor: String, name: String },

    #[error("{actor}: execution stopped")]
    Stopped { actor: String },
}

impl ActorError {
    /// Build a `WrongPayloadType` from the accepted set and the actual type
    pub fn wrong_payload_type(
        actor: impl Into<String>,
        accepted: &[PayloadType],
        actual: PayloadType,
    ) -> Self {
        let expected = accepted
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ActorError::WrongPayloadType {
            actor: actor.into(),
            expected,
            actual,
        }
    }

    /// Build an `AlgorithmFailure` from an error caught at the plugin boundary
    pub fn algorithm_failure(
        actor: impl Into<String>,
        operation: impl Into<String>,
        cause: &anyhow::Error,
    ) -> Self {
        ActorError::AlgorithmFailure {
            actor: actor.into(),
            operation: operation.into(),
            cause: format!("{cause:#}"),
        }
    }

    /// The actor that reported the error
    pub fn actor(&self) -> &str {
        match self {
            ActorError::WrongPayloadType { actor, .. }
            | ActorError::AlreadyHasInput { actor }
            | ActorError::EmptyQueue { actor }
            | ActorError::OptionInvalid { actor, .. }
            | ActorError::AlgorithmFailure { actor, .. }
            | ActorError::DependencyMissing { actor, .. }
            | ActorError::Stopped { actor } => actor,
        }
    }

    /// Recovery policy for this error kind
    pub fn severity(&self) -> Severity {
        match self {
            // Engine contract violations - programmer errors in the engine
            ActorError::EmptyQueue { .. } | ActorError::AlreadyHasInput { .. } => Severity::Fatal,
            // Bad configuration is fatal to the flow at setup time
            ActorError::OptionInvalid { .. } => Severity::Fatal,
            ActorError::WrongPayloadType { .. }
            | ActorError::AlgorithmFailure { .. }
            | ActorError::DependencyMissing { .. }
            | ActorError::Stopped { .. } => Severity::Recoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let fatal = ActorError::EmptyQueue {
            actor: "a".into(),
        };
        assert_eq!(fatal.severity(), Severity::Fatal);

        let recoverable = ActorError::AlgorithmFailure {
            actor: "a".into(),
            operation: "execute".into(),
            cause: "boom".into(),
        };
        assert_eq!(recoverable.severity(), Severity::Recoverable);
    }

    #[test]
    fn test_message_carries_actor_and_cause() {
        let err = ActorError::wrong_payload_type(
            "FeatureGen",
            &[PayloadType::Audio],
            PayloadType::Text,
        );
        let msg = err.to_string();
        assert!(msg.contains("FeatureGen"));
        assert!(msg.contains("audio"));
        assert!(msg.contains("text"));
        assert_eq!(err.actor(), "FeatureGen");
    }
}
