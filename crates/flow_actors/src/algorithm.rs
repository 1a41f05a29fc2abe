//! Algorithm plugin seam
//!
//! Transformers specialise by composition with an algorithm object assigned
//! through their options. An algorithm takes one input payload and produces
//! a sequence of output payloads; the owning transformer wraps each element
//! in a token and pushes it onto its queue.
//!
//! Algorithms are third-party territory: they report failures through
//! `anyhow` and the transformer maps them to `AlgorithmFailure` at the
//! boundary.

use std::sync::Arc;

use flow_types::{AudioBuffer, FeatureRow, Payload, PayloadType};

use crate::lifecycle::StopToken;

// ─────────────────────────────────────────────────────────────────────────────
// Algorithm Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A wrapped third-party capability: take one input, produce a sequence
pub trait Algorithm: Send + Sync {
    /// Short identifier, used in option serialisation and quick info
    fn name(&self) -> &str;

    /// Full textual spec (name plus parameters) for quick info and
    /// round-tripping option streams
    fn spec(&self) -> String {
        self.name().to_string()
    }

    /// Payload type this algorithm consumes
    fn input_type(&self) -> PayloadType;

    /// Payload type of the rows it produces
    fn output_type(&self) -> PayloadType;

    /// Run the algorithm. Long-running implementations must poll `stop` at
    /// natural boundaries and return early; partial results are discarded by
    /// the caller.
    fn generate(&self, input: &Payload, stop: &StopToken) -> anyhow::Result<Vec<Payload>>;
}

impl std::fmt::Debug for dyn Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Algorithm({})", self.spec())
    }
}

/// Shared handle to an algorithm, the form options and backups traffic in
pub type AlgorithmRef = Arc<dyn Algorithm>;

// ─────────────────────────────────────────────────────────────────────────────
// Fingerprint
// ─────────────────────────────────────────────────────────────────────────────

/// Reference feature generator: windowed statistics over audio samples
///
/// Splits the incoming buffer into fixed-size windows and emits one feature
/// row per window (index, min, max, mean, rms).
#[derive(Debug, Clone)]
pub struct Fingerprint {
    /// Window length in samples
    pub window: usize,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self { window: 8 }
    }
}

impl Fingerprint {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    fn row_for(&self, index: usize, samples: &[f64]) -> FeatureRow {
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let rms = (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt();
        FeatureRow::new(
            vec![
                "window".into(),
                "min".into(),
                "max".into(),
                "mean".into(),
                "rms".into(),
            ],
            vec![
                serde_json::json!(index),
                serde_json::json!(min),
                serde_json::json!(max),
                serde_json::json!(mean),
                serde_json::json!(rms),
            ],
        )
    }
}

impl Algorithm for Fingerprint {
    fn name(&self) -> &str {
        "fingerprint"
    }

    fn spec(&self) -> String {
        format!("fingerprint -window {}", self.window)
    }

    fn input_type(&self) -> PayloadType {
        PayloadType::Audio
    }

    fn output_type(&self) -> PayloadType {
        PayloadType::Row
    }

    fn generate(&self, input: &Payload, stop: &StopToken) -> anyhow::Result<Vec<Payload>> {
        let audio: &AudioBuffer = input
            .as_audio()
            .ok_or_else(|| anyhow::anyhow!("expected audio input, got {}", input.type_of()))?;
        if self.window == 0 {
            anyhow::bail!("window length must be positive");
        }
        if audio.is_empty() {
            anyhow::bail!("audio buffer holds no samples");
        }

        let mut rows = Vec::new();
        for (index, chunk) in audio.samples.chunks(self.window).enumerate() {
            if stop.is_stopped() {
                break;
            }
            rows.push(Payload::Row(self.row_for(index, chunk)));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Payload {
        Payload::Audio(AudioBuffer::new(16, (0..n).map(|i| i as f64).collect()))
    }

    #[test]
    fn test_fingerprint_rows_per_window() {
        let alg = Fingerprint::default();
        let rows = alg.generate(&ramp(16), &StopToken::new()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_row().unwrap();
        assert_eq!(first.cell("window"), Some(&serde_json::json!(0)));
        assert_eq!(first.cell("min"), Some(&serde_json::json!(0.0)));
        assert_eq!(first.cell("max"), Some(&serde_json::json!(7.0)));
        assert_eq!(first.cell("mean"), Some(&serde_json::json!(3.5)));
    }

    #[test]
    fn test_fingerprint_rejects_non_audio() {
        let alg = Fingerprint::default();
        let err = alg
            .generate(&Payload::Text("nope".into()), &StopToken::new())
            .unwrap_err();
        assert!(err.to_string().contains("expected audio"));
    }

    #[test]
    fn test_fingerprint_polls_stop() {
        let alg = Fingerprint::new(1);
        let stop = StopToken::new();
        stop.request_stop();
        let rows = alg.generate(&ramp(1000), &stop).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_spec_round_trips_window() {
        assert_eq!(Fingerprint::new(4).spec(), "fingerprint -window 4");
    }
}
