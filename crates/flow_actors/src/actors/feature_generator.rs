//! FeatureGenerator - applies a feature generation algorithm to audio
//!
//! The algorithm is assigned through the `algorithm` option and owned by the
//! actor. Every generated row is queued and drained one token at a time;
//! what the actor generates depends on the algorithm's row format.

use std::sync::Arc;

use flow_types::{ActorRole, PayloadType, ProvenanceLedger};

use crate::algorithm::Fingerprint;
use crate::error::{ActorError, ActorResult};
use crate::option::{OptionDef, OptionValue};
use crate::transformer::{Transformer, TransformerCore};

/// Property name of the algorithm option
pub const OPT_ALGORITHM: &str = "algorithm";

/// Applies a feature generation algorithm to the incoming audio and forwards
/// the generated feature rows
pub struct FeatureGenerator {
    core: TransformerCore,
}

impl FeatureGenerator {
    /// Create the actor with its default `Fingerprint` algorithm
    pub fn new(ledger: Arc<ProvenanceLedger>) -> Self {
        let mut core =
            TransformerCore::new("FeatureGenerator", ActorRole::FeatureGenerator, ledger);
        core.options_mut().add(OptionDef::new(
            "algorithm",
            OPT_ALGORITHM,
            OptionValue::Algorithm(Arc::new(Fingerprint::default())),
            "The feature generation algorithm to use.",
        ));
        Self { core }
    }
}

impl Transformer for FeatureGenerator {
    fn core(&self) -> &TransformerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TransformerCore {
        &mut self.core
    }

    fn global_info(&self) -> String {
        "Applies a feature generation algorithm to the incoming audio and outputs \
         the generated feature rows."
            .to_string()
    }

    fn accepts(&self) -> Vec<PayloadType> {
        vec![PayloadType::Audio]
    }

    fn generates(&self) -> Vec<PayloadType> {
        match self.core.options().get_algorithm(OPT_ALGORITHM) {
            Some(algorithm) => vec![algorithm.output_type()],
            None => vec![PayloadType::Any],
        }
    }

    fn check_options(&self) -> ActorResult<()> {
        if self.core.options().get_algorithm(OPT_ALGORITHM).is_none() {
            return Err(ActorError::OptionInvalid {
                actor: self.name().to_string(),
                property: OPT_ALGORITHM.to_string(),
                reason: "no algorithm set".to_string(),
            });
        }
        Ok(())
    }

    fn do_execute(&mut self) -> ActorResult<()> {
        let name = self.name().to_string();
        let algorithm =
            self.core
                .options()
                .get_algorithm(OPT_ALGORITHM)
                .ok_or_else(|| ActorError::DependencyMissing {
                    actor: name.clone(),
                    name: OPT_ALGORITHM.to_string(),
                })?;
        let token = self.core.input_token().cloned().ok_or_else(|| {
            ActorError::AlgorithmFailure {
                actor: name.clone(),
                operation: "execute".to_string(),
                cause: "no input token installed".to_string(),
            }
        })?;

        let rows = algorithm
            .generate(token.payload(), self.core.stop_token())
            .map_err(|err| ActorError::algorithm_failure(&name, "generate features", &err))?;
        self.core.queue_mut().push_all(rows);
        Ok(())
    }

    fn quick_info(&self) -> Option<String> {
        self.core
            .options()
            .get_algorithm(OPT_ALGORITHM)
            .map(|algorithm| format!("algorithm: {}", algorithm.spec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_types::{AudioBuffer, Token};

    fn actor() -> FeatureGenerator {
        FeatureGenerator::new(Arc::new(ProvenanceLedger::new(true)))
    }

    fn audio_token(n: usize) -> Token {
        Token::new(AudioBuffer::new(16, (0..n).map(|i| i as f64).collect()))
    }

    #[test]
    fn test_generates_follows_algorithm_row_format() {
        let actor = actor();
        assert_eq!(actor.generates(), vec![PayloadType::Row]);
        assert_eq!(actor.accepts(), vec![PayloadType::Audio]);
    }

    #[test]
    fn test_execute_queues_one_row_per_window() {
        let mut actor = actor();
        actor.set_up().unwrap();
        actor.input(audio_token(16)).unwrap();
        actor.execute().unwrap();

        assert!(actor.has_pending_output());
        let first = actor.output().unwrap();
        assert_eq!(first.payload_type(), PayloadType::Row);
        let second = actor.output().unwrap();
        assert_eq!(second.payload_type(), PayloadType::Row);
        assert!(matches!(
            actor.output().unwrap_err(),
            ActorError::EmptyQueue { .. }
        ));
    }

    #[test]
    fn test_empty_audio_is_algorithm_failure() {
        let mut actor = actor();
        actor.set_up().unwrap();
        actor.input(audio_token(0)).unwrap();

        let err = actor.execute().unwrap_err();
        assert!(matches!(err, ActorError::AlgorithmFailure { .. }));
        assert!(err.to_string().contains("no samples"));
        assert!(actor.core().last_error().is_some());
    }

    #[test]
    fn test_quick_info_names_algorithm() {
        let actor = actor();
        assert_eq!(
            actor.quick_info().as_deref(),
            Some("algorithm: fingerprint -window 8")
        );
    }

    #[test]
    fn test_option_change_resets_and_clears_queue() {
        let mut actor = actor();
        actor.set_up().unwrap();
        actor.input(audio_token(16)).unwrap();
        actor.execute().unwrap();
        actor.output().unwrap();

        actor
            .set_option(
                OPT_ALGORITHM,
                OptionValue::Algorithm(Arc::new(Fingerprint::new(4))),
            )
            .unwrap();

        assert!(!actor.has_pending_output());
        assert!(matches!(
            actor.output().unwrap_err(),
            ActorError::EmptyQueue { .. }
        ));
        assert_eq!(
            actor.core().state(),
            crate::lifecycle::LifecycleState::New
        );
    }
}
