//! Payload values that flow between actors
//!
//! One `Payload` is exactly one value of an advertised type. Container
//! payloads (`AudioBuffer`, `FeatureRow`) are the concrete types the
//! reference transformers traffic in.

use serde::{Deserialize, Serialize};

use crate::types::PayloadType;

// ─────────────────────────────────────────────────────────────────────────────
// Container Types
// ─────────────────────────────────────────────────────────────────────────────

/// Raw audio samples with their sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBuffer {
    /// Samples per second
    pub sample_rate: u32,
    /// Normalized mono samples
    pub samples: Vec<f64>,
}

impl AudioBuffer {
    /// Create a buffer from raw samples
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Number of samples in the buffer
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the buffer in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// One generated feature row: named columns with JSON-shaped cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Column names, parallel to `cells`
    pub columns: Vec<String>,
    /// Cell values, parallel to `columns`
    pub cells: Vec<serde_json::Value>,
}

impl FeatureRow {
    /// Create a row from parallel columns and cells
    pub fn new(columns: Vec<String>, cells: Vec<serde_json::Value>) -> Self {
        Self { columns, cells }
    }

    /// Get a cell by column name
    pub fn cell(&self, column: &str) -> Option<&serde_json::Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.cells.get(i))
    }

    /// Number of cells in the row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row holds no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload
// ─────────────────────────────────────────────────────────────────────────────

/// One value travelling through the flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Payload {
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    Text(String),
    /// Ordered array of payloads
    Array(Vec<Payload>),
    /// Raw audio samples
    Audio(AudioBuffer),
    /// One feature row
    Row(FeatureRow),
    /// Structured document
    Document(serde_json::Value),
}

impl Payload {
    /// Runtime type of this payload
    pub fn type_of(&self) -> PayloadType {
        match self {
            Payload::Bool(_) => PayloadType::Bool,
            Payload::Int(_) => PayloadType::Int,
            Payload::Float(_) => PayloadType::Float,
            Payload::Text(_) => PayloadType::Text,
            Payload::Array(items) => {
                // Element type of the first item; heterogeneous or empty
                // arrays degrade to array<any>
                let element = match items.first() {
                    Some(first) => {
                        let ty = first.type_of();
                        if items.iter().all(|p| p.type_of() == ty) {
                            ty
                        } else {
                            PayloadType::Any
                        }
                    }
                    None => PayloadType::Any,
                };
                PayloadType::array_of(element)
            }
            Payload::Audio(_) => PayloadType::Audio,
            Payload::Row(_) => PayloadType::Row,
            Payload::Document(_) => PayloadType::Document,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Payload::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 (also converts from int)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Payload::Float(f) => Some(*f),
            Payload::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as array reference
    pub fn as_array(&self) -> Option<&[Payload]> {
        match self {
            Payload::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get as audio buffer reference
    pub fn as_audio(&self) -> Option<&AudioBuffer> {
        match self {
            Payload::Audio(buf) => Some(buf),
            _ => None,
        }
    }

    /// Get as feature row reference
    pub fn as_row(&self) -> Option<&FeatureRow> {
        match self {
            Payload::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Get as document reference
    pub fn as_document(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// From Implementations
// ─────────────────────────────────────────────────────────────────────────────

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Bool(v)
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Int(v)
    }
}

impl From<i32> for Payload {
    fn from(v: i32) -> Self {
        Payload::Int(v as i64)
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Float(v)
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Text(v)
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Text(v.to_string())
    }
}

impl From<AudioBuffer> for Payload {
    fn from(v: AudioBuffer) -> Self {
        Payload::Audio(v)
    }
}

impl From<FeatureRow> for Payload {
    fn from(v: FeatureRow) -> Self {
        Payload::Row(v)
    }
}

impl<T: Into<Payload>> From<Vec<T>> for Payload {
    fn from(v: Vec<T>) -> Self {
        Payload::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_of_primitives() {
        assert_eq!(Payload::from(true).type_of(), PayloadType::Bool);
        assert_eq!(Payload::from(42i64).type_of(), PayloadType::Int);
        assert_eq!(Payload::from(1.5).type_of(), PayloadType::Float);
        assert_eq!(Payload::from("hi").type_of(), PayloadType::Text);
    }

    #[test]
    fn test_type_of_arrays() {
        let homogeneous = Payload::from(vec![1i64, 2, 3]);
        assert_eq!(
            homogeneous.type_of(),
            PayloadType::array_of(PayloadType::Int)
        );

        let mixed = Payload::Array(vec![Payload::Int(1), Payload::Text("x".into())]);
        assert_eq!(mixed.type_of(), PayloadType::array_of(PayloadType::Any));

        let empty = Payload::Array(vec![]);
        assert_eq!(empty.type_of(), PayloadType::array_of(PayloadType::Any));
    }

    #[test]
    fn test_audio_buffer() {
        let buf = AudioBuffer::new(8, vec![0.0; 16]);
        assert_eq!(buf.len(), 16);
        assert_eq!(buf.duration_secs(), 2.0);
        assert_eq!(Payload::from(buf).type_of(), PayloadType::Audio);
    }

    #[test]
    fn test_feature_row_cells() {
        let row = FeatureRow::new(
            vec!["mean".into(), "max".into()],
            vec![serde_json::json!(0.5), serde_json::json!(1.0)],
        );
        assert_eq!(row.cell("max"), Some(&serde_json::json!(1.0)));
        assert_eq!(row.cell("missing"), None);
    }

    #[test]
    fn test_numeric_accessor_conversion() {
        assert_eq!(Payload::Int(3).as_f64(), Some(3.0));
        assert_eq!(Payload::Float(3.5).as_i64(), None);
    }
}
