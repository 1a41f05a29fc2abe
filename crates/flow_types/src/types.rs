// Payload type descriptors and actor roles
//
// These are the values actors exchange with the engine for static wiring
// checks (`accepts()` / `generates()`). Compatibility is a subtyping check,
// not strict equality: `Any` is the universal top type and numeric payloads
// convert between each other.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Payload Types
// ─────────────────────────────────────────────────────────────────────────────

/// Types a payload can carry through the flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum PayloadType {
    /// Boolean value
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// UTF-8 string
    Text,
    /// Array of a specific element type
    Array { element: Box<PayloadType> },
    /// Raw audio samples (see `AudioBuffer`)
    Audio,
    /// One generated feature row (see `FeatureRow`)
    Row,
    /// Structured document (JSON shaped)
    Document,
    /// Universal top type - accepts anything
    Any,
}

impl PayloadType {
    /// Check if a payload of type `other` may be delivered where `self` is
    /// expected (for `input()` gating and connection validation)
    pub fn is_compatible_with(&self, other: &PayloadType) -> bool {
        match (self, other) {
            // Exact match
            (a, b) if a == b => true,
            // Any accepts everything, and anything feeds an Any slot
            (PayloadType::Any, _) | (_, PayloadType::Any) => true,
            // Int can be implicitly converted to Float
            (PayloadType::Float, PayloadType::Int) | (PayloadType::Int, PayloadType::Float) => {
                true
            }
            // Array compatibility is element-wise
            (PayloadType::Array { element: a }, PayloadType::Array { element: b }) => {
                a.is_compatible_with(b)
            }
            _ => false,
        }
    }

    /// Create an array type with the given element type
    pub fn array_of(element: PayloadType) -> Self {
        PayloadType::Array {
            element: Box::new(element),
        }
    }

    /// Check if this is the universal top type
    pub fn is_any(&self) -> bool {
        matches!(self, PayloadType::Any)
    }
}

impl std::fmt::Display for PayloadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadType::Bool => write!(f, "bool"),
            PayloadType::Int => write!(f, "int"),
            PayloadType::Float => write!(f, "float"),
            PayloadType::Text => write!(f, "text"),
            PayloadType::Array { element } => write!(f, "array<{}>", element),
            PayloadType::Audio => write!(f, "audio"),
            PayloadType::Row => write!(f, "row"),
            PayloadType::Document => write!(f, "document"),
            PayloadType::Any => write!(f, "any"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actor Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Role an actor plays in the flow, recorded in provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    DataGenerator,
    Preprocessor,
    FeatureGenerator,
    Evaluator,
    Postprocessor,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActorRole::DataGenerator => "data-generator",
            ActorRole::Preprocessor => "preprocessor",
            ActorRole::FeatureGenerator => "feature-generator",
            ActorRole::Evaluator => "evaluator",
            ActorRole::Postprocessor => "postprocessor",
        };
        write!(f, "{}", s)
    }
}
