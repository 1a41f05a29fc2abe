//! Option registry - declared, typed configuration for every actor
//!
//! Each actor declares its full option schema once: an ordered list of
//! `(cli_name, property, default)` entries, typed by their default value.
//! The engine binds values either programmatically or from a line-oriented
//! `-cliName <value>` stream; both directions round-trip. Password options
//! are stored `{base64}`-obfuscated on the wire but round-trip to cleartext.
//!
//! Setting any option is a build-time change: the owning actor drops back to
//! New and discards derived state (see `Transformer::set_option`).

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::algorithm::AlgorithmRef;

// ─────────────────────────────────────────────────────────────────────────────
// Option Values
// ─────────────────────────────────────────────────────────────────────────────

/// Declared type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Bool,
    Int,
    Float,
    Text,
    Password,
    TextArray,
    FloatArray,
    Algorithm,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OptionKind::Bool => "bool",
            OptionKind::Int => "int",
            OptionKind::Float => "float",
            OptionKind::Text => "text",
            OptionKind::Password => "password",
            OptionKind::TextArray => "text-array",
            OptionKind::FloatArray => "float-array",
            OptionKind::Algorithm => "algorithm",
        };
        write!(f, "{}", s)
    }
}

/// Current or default value of an option
#[derive(Clone)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Cleartext in memory, `{base64}`-wrapped on the wire
    Password(String),
    TextArray(Vec<String>),
    FloatArray(Vec<f64>),
    Algorithm(AlgorithmRef),
}

impl OptionValue {
    /// Declared type of this value
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Bool(_) => OptionKind::Bool,
            OptionValue::Int(_) => OptionKind::Int,
            OptionValue::Float(_) => OptionKind::Float,
            OptionValue::Text(_) => OptionKind::Text,
            OptionValue::Password(_) => OptionKind::Password,
            OptionValue::TextArray(_) => OptionKind::TextArray,
            OptionValue::FloatArray(_) => OptionKind::FloatArray,
            OptionValue::Algorithm(_) => OptionKind::Algorithm,
        }
    }

    /// Array length, if this is an array-valued option
    pub fn array_len(&self) -> Option<usize> {
        match self {
            OptionValue::TextArray(v) => Some(v.len()),
            OptionValue::FloatArray(v) => Some(v.len()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) | OptionValue::Password(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_algorithm(&self) -> Option<AlgorithmRef> {
        match self {
            OptionValue::Algorithm(a) => Some(a.clone()),
            _ => None,
        }
    }

    /// Wire representation for the `-cliName <value>` stream
    fn to_wire(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Float(f) => f.to_string(),
            OptionValue::Text(s) => s.clone(),
            OptionValue::Password(s) => format!("{{{}}}", BASE64.encode(s.as_bytes())),
            OptionValue::TextArray(v) => serde_json::to_string(v).unwrap_or_default(),
            OptionValue::FloatArray(v) => serde_json::to_string(v).unwrap_or_default(),
            OptionValue::Algorithm(a) => a.spec(),
        }
    }
}

impl std::fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "Bool({})", b),
            OptionValue::Int(i) => write!(f, "Int({})", i),
            OptionValue::Float(v) => write!(f, "Float({})", v),
            OptionValue::Text(s) => write!(f, "Text({:?})", s),
            // never echo the cleartext
            OptionValue::Password(_) => write!(f, "Password(***)"),
            OptionValue::TextArray(v) => write!(f, "TextArray({:?})", v),
            OptionValue::FloatArray(v) => write!(f, "FloatArray({:?})", v),
            OptionValue::Algorithm(a) => write!(f, "Algorithm({})", a.spec()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Option Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// One declared option: stable names, default, and help text
#[derive(Debug, Clone)]
pub struct OptionDef {
    /// Name used in the `-cliName <value>` stream
    pub cli_name: String,
    /// Property name used by `set`/`get`
    pub property: String,
    /// Default value; the option is typed by it
    pub default: OptionValue,
    /// Tip text for GUIs and option listings
    pub help: String,
}

impl OptionDef {
    pub fn new(
        cli_name: impl Into<String>,
        property: impl Into<String>,
        default: OptionValue,
        help: impl Into<String>,
    ) -> Self {
        Self {
            cli_name: cli_name.into(),
            property: property.into(),
            default,
            help: help.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Validation failures raised by the registry
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionError {
    #[error("unknown option '{0}'")]
    Unknown(String),

    #[error("option '{property}': expected {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: OptionKind,
        actual: OptionKind,
    },

    #[error("option '{property}': {reason}")]
    Invalid { property: String, reason: String },
}

impl OptionError {
    /// The offending property name
    pub fn property(&self) -> &str {
        match self {
            OptionError::Unknown(p) => p,
            OptionError::TypeMismatch { property, .. } | OptionError::Invalid { property, .. } => {
                property
            }
        }
    }

    /// The failure description without the property prefix
    pub fn reason(&self) -> String {
        match self {
            OptionError::Unknown(_) => "unknown option".to_string(),
            OptionError::TypeMismatch {
                expected, actual, ..
            } => format!("expected {}, got {}", expected, actual),
            OptionError::Invalid { reason, .. } => reason.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Resolver turning an algorithm spec string back into an algorithm object
/// when parsing option streams
pub type AlgorithmResolver<'a> = &'a dyn Fn(&str) -> Option<AlgorithmRef>;

struct LengthCoupling {
    first: String,
    second: String,
    neutral: OptionValue,
}

/// Per-actor option schema and current values
#[derive(Default)]
pub struct OptionRegistry {
    defs: Vec<OptionDef>,
    values: HashMap<String, OptionValue>,
    couplings: Vec<LengthCoupling>,
}

impl OptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one option; the current value starts at the default
    pub fn add(&mut self, def: OptionDef) {
        self.values
            .insert(def.property.clone(), def.default.clone());
        self.defs.push(def);
    }

    /// The declared schema, in declaration order
    pub fn definitions(&self) -> &[OptionDef] {
        &self.defs
    }

    /// Current value of a property
    pub fn get(&self, property: &str) -> Option<&OptionValue> {
        self.values.get(property)
    }

    pub fn get_bool(&self, property: &str) -> Option<bool> {
        self.get(property).and_then(OptionValue::as_bool)
    }

    pub fn get_i64(&self, property: &str) -> Option<i64> {
        self.get(property).and_then(OptionValue::as_i64)
    }

    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(OptionValue::as_str)
    }

    pub fn get_algorithm(&self, property: &str) -> Option<AlgorithmRef> {
        self.get(property).and_then(OptionValue::as_algorithm)
    }

    /// Write a value after type-checking it against the declared default.
    ///
    /// The caller (the owning actor) is responsible for the reset that every
    /// successful set implies.
    pub fn set(&mut self, property: &str, value: OptionValue) -> Result<(), OptionError> {
        let def = self
            .defs
            .iter()
            .find(|d| d.property == property)
            .ok_or_else(|| OptionError::Unknown(property.to_string()))?;
        if def.default.kind() != value.kind() {
            return Err(OptionError::TypeMismatch {
                property: property.to_string(),
                expected: def.default.kind(),
                actual: value.kind(),
            });
        }
        let new_len = value.array_len();
        self.values.insert(property.to_string(), value);
        if let Some(len) = new_len {
            self.adjust_coupled(property, len);
        }
        Ok(())
    }

    /// Declare two array options as length-coupled: changing the length of
    /// one resizes the other to match, padding with `neutral`. The neutral
    /// must fit at least one of the pair; a partner of the other element
    /// kind is padded with that kind's empty value.
    pub fn couple_lengths(
        &mut self,
        first: &str,
        second: &str,
        neutral: OptionValue,
    ) -> Result<(), OptionError> {
        let mut element_kinds = Vec::with_capacity(2);
        for property in [first, second] {
            let def = self
                .defs
                .iter()
                .find(|d| d.property == property)
                .ok_or_else(|| OptionError::Unknown(property.to_string()))?;
            match def.default.kind() {
                OptionKind::TextArray => element_kinds.push(OptionKind::Text),
                OptionKind::FloatArray => element_kinds.push(OptionKind::Float),
                other => {
                    return Err(OptionError::Invalid {
                        property: property.to_string(),
                        reason: format!("length coupling requires an array option, got {}", other),
                    })
                }
            }
        }
        if !element_kinds.contains(&neutral.kind()) {
            return Err(OptionError::Invalid {
                property: first.to_string(),
                reason: format!(
                    "neutral value of kind {} fits neither coupled option",
                    neutral.kind()
                ),
            });
        }
        self.couplings.push(LengthCoupling {
            first: first.to_string(),
            second: second.to_string(),
            neutral,
        });
        Ok(())
    }

    fn adjust_coupled(&mut self, changed: &str, len: usize) {
        let partners: Vec<(String, OptionValue)> = self
            .couplings
            .iter()
            .filter_map(|c| {
                if c.first == changed {
                    Some((c.second.clone(), c.neutral.clone()))
                } else if c.second == changed {
                    Some((c.first.clone(), c.neutral.clone()))
                } else {
                    None
                }
            })
            .collect();
        for (partner, neutral) in partners {
            match self.values.get_mut(&partner) {
                Some(OptionValue::TextArray(v)) => {
                    let pad = match &neutral {
                        OptionValue::Text(s) => s.clone(),
                        _ => String::new(),
                    };
                    v.resize(len, pad);
                }
                Some(OptionValue::FloatArray(v)) => {
                    let pad = neutral.as_f64().unwrap_or(0.0);
                    v.resize(len, pad);
                }
                _ => {}
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // CLI round-trip
    // ─────────────────────────────────────────────────────────────────────

    /// Serialise current values as a line-oriented `-cliName <value>` stream
    pub fn to_cli(&self) -> String {
        let mut lines = Vec::with_capacity(self.defs.len());
        for def in &self.defs {
            if let Some(value) = self.values.get(&def.property) {
                lines.push(format!("-{} {}", def.cli_name, value.to_wire()));
            }
        }
        lines.join("\n")
    }

    /// Parse a `-cliName <value>` stream, writing each value through `set`.
    /// Algorithm-valued options are resolved through `resolver`.
    pub fn parse_cli(
        &mut self,
        text: &str,
        resolver: AlgorithmResolver<'_>,
    ) -> Result<(), OptionError> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let stripped = line.strip_prefix('-').ok_or_else(|| OptionError::Invalid {
                property: line.to_string(),
                reason: "expected a '-cliName <value>' line".to_string(),
            })?;
            let (cli_name, raw) = stripped.split_once(' ').unwrap_or((stripped, ""));
            let def = self
                .defs
                .iter()
                .find(|d| d.cli_name == cli_name)
                .ok_or_else(|| OptionError::Unknown(cli_name.to_string()))?;
            let property = def.property.clone();
            let value = Self::parse_value(&property, def.default.kind(), raw.trim(), resolver)?;
            self.set(&property, value)?;
        }
        Ok(())
    }

    fn parse_value(
        property: &str,
        kind: OptionKind,
        raw: &str,
        resolver: AlgorithmResolver<'_>,
    ) -> Result<OptionValue, OptionError> {
        let invalid = |reason: String| OptionError::Invalid {
            property: property.to_string(),
            reason,
        };
        match kind {
            OptionKind::Bool => raw
                .parse::<bool>()
                .map(OptionValue::Bool)
                .map_err(|_| invalid(format!("'{}' is not a bool", raw))),
            OptionKind::Int => raw
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| invalid(format!("'{}' is not an int", raw))),
            OptionKind::Float => raw
                .parse::<f64>()
                .map(OptionValue::Float)
                .map_err(|_| invalid(format!("'{}' is not a float", raw))),
            OptionKind::Text => Ok(OptionValue::Text(raw.to_string())),
            OptionKind::Password => {
                // `{base64}`-wrapped on the wire, cleartext accepted too
                let cleartext = match raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                    Some(inner) => {
                        let bytes = BASE64
                            .decode(inner)
                            .map_err(|e| invalid(format!("bad password encoding: {}", e)))?;
                        String::from_utf8(bytes)
                            .map_err(|_| invalid("password is not valid UTF-8".to_string()))?
                    }
                    None => raw.to_string(),
                };
                Ok(OptionValue::Password(cleartext))
            }
            OptionKind::TextArray => serde_json::from_str::<Vec<String>>(raw)
                .map(OptionValue::TextArray)
                .map_err(|e| invalid(format!("bad text array: {}", e))),
            OptionKind::FloatArray => serde_json::from_str::<Vec<f64>>(raw)
                .map(OptionValue::FloatArray)
                .map_err(|e| invalid(format!("bad float array: {}", e))),
            OptionKind::Algorithm => resolver(raw)
                .map(OptionValue::Algorithm)
                .ok_or_else(|| invalid(format!("unknown algorithm '{}'", raw))),
        }
    }
}

impl std::fmt::Debug for OptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionRegistry")
            .field("defs", &self.defs.len())
            .field("values", &self.values)
            .finish()
    }
}
