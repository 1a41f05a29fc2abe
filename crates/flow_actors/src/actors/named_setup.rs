//! NamedSetup - applies an algorithm referenced via its global setup name
//!
//! The referenced algorithm is resolved lazily through the shared
//! `NamedSetups` registry and cached until the next reset. Until resolution
//! the actor conservatively advertises the universal top type so static
//! wiring checks do not produce false negatives.

use std::sync::Arc;

use flow_types::{ActorRole, PayloadType, ProvenanceLedger};

use crate::algorithm::AlgorithmRef;
use crate::backup::{BackupEntry, StateBackup};
use crate::error::{ActorError, ActorResult};
use crate::option::{OptionDef, OptionValue};
use crate::registry::NamedSetups;
use crate::transformer::{Transformer, TransformerCore};

/// Property name of the setup-name option
pub const OPT_SETUP: &str = "setup";

/// Backup key for the resolved algorithm
const BACKUP_RESOLVED: &str = "named_setup.resolved";

/// Applies an algorithm that is referenced via its global setup name
pub struct NamedSetup {
    core: TransformerCore,
    setups: Arc<NamedSetups>,
    resolved: Option<AlgorithmRef>,
}

impl NamedSetup {
    pub fn new(ledger: Arc<ProvenanceLedger>, setups: Arc<NamedSetups>) -> Self {
        let mut core = TransformerCore::new("NamedSetup", ActorRole::Preprocessor, ledger);
        core.options_mut().add(OptionDef::new(
            "setup",
            OPT_SETUP,
            OptionValue::Text("name_of_setup".to_string()),
            "The name of the setup to use.",
        ));
        Self {
            core,
            setups,
            resolved: None,
        }
    }

    fn setup_name(&self) -> String {
        self.core
            .options()
            .get_str(OPT_SETUP)
            .unwrap_or_default()
            .to_string()
    }

    /// Resolve and cache the referenced algorithm
    fn actual_scheme(&mut self) -> ActorResult<AlgorithmRef> {
        if let Some(algorithm) = &self.resolved {
            return Ok(algorithm.clone());
        }
        let name = self.setup_name();
        let algorithm =
            self.setups
                .resolve(&name)
                .ok_or_else(|| ActorError::DependencyMissing {
                    actor: self.name().to_string(),
                    name: name.clone(),
                })?;
        self.resolved = Some(algorithm.clone());
        Ok(algorithm)
    }
}

impl Transformer for NamedSetup {
    fn core(&self) -> &TransformerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TransformerCore {
        &mut self.core
    }

    fn global_info(&self) -> String {
        "Applies an algorithm that is referenced via its global setup name.".to_string()
    }

    fn accepts(&self) -> Vec<PayloadType> {
        match &self.resolved {
            Some(algorithm) => vec![algorithm.input_type()],
            None => vec![PayloadType::Any],
        }
    }

    fn generates(&self) -> Vec<PayloadType> {
        match &self.resolved {
            Some(algorithm) => vec![algorithm.output_type()],
            None => vec![PayloadType::Any],
        }
    }

    fn check_options(&self) -> ActorResult<()> {
        // resolution is lazy; an unknown name at setup time is only a warning
        let name = self.setup_name();
        if !self.setups.contains(&name) {
            tracing::warn!(actor = %self.name(), setup = %name, "named setup unknown");
        }
        Ok(())
    }

    fn on_reset(&mut self) {
        self.resolved = None;
    }

    fn on_clean_up(&mut self) {
        self.resolved = None;
    }

    fn do_execute(&mut self) -> ActorResult<()> {
        let algorithm = self.actual_scheme()?;
        let name = self.name().to_string();
        let token = self.core.input_token().cloned().ok_or_else(|| {
            ActorError::AlgorithmFailure {
                actor: name.clone(),
                operation: "execute".to_string(),
                cause: "no input token installed".to_string(),
            }
        })?;

        let outputs = algorithm
            .generate(token.payload(), self.core.stop_token())
            .map_err(|err| ActorError::algorithm_failure(&name, "apply named setup", &err))?;
        self.core.queue_mut().push_all(outputs);
        Ok(())
    }

    fn backup_state_extra(&mut self, backup: &mut StateBackup) {
        if let Some(algorithm) = self.resolved.take() {
            backup.insert(BACKUP_RESOLVED, BackupEntry::Algorithm(algorithm));
        }
    }

    fn restore_state_extra(&mut self, backup: &mut StateBackup) {
        if let Some(BackupEntry::Algorithm(algorithm)) = backup.take(BACKUP_RESOLVED) {
            self.resolved = Some(algorithm);
        }
    }

    fn quick_info(&self) -> Option<String> {
        Some(format!("setup: {}", self.setup_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Fingerprint;
    use flow_types::{AudioBuffer, Token};

    fn setups_with_fingerprint() -> Arc<NamedSetups> {
        let setups = NamedSetups::new();
        setups.register("fp", Arc::new(Fingerprint::default()));
        Arc::new(setups)
    }

    fn actor(setups: Arc<NamedSetups>) -> NamedSetup {
        NamedSetup::new(Arc::new(ProvenanceLedger::new(false)), setups)
    }

    #[test]
    fn test_unresolved_advertises_top_type() {
        let actor = actor(setups_with_fingerprint());
        assert_eq!(actor.accepts(), vec![PayloadType::Any]);
        assert_eq!(actor.generates(), vec![PayloadType::Any]);
    }

    #[test]
    fn test_execute_resolves_and_caches() {
        let mut actor = actor(setups_with_fingerprint());
        actor.set_option(OPT_SETUP, OptionValue::Text("fp".into())).unwrap();
        actor.set_up().unwrap();
        actor
            .input(Token::new(AudioBuffer::new(16, vec![0.0; 8])))
            .unwrap();
        actor.execute().unwrap();

        assert!(actor.has_pending_output());
        // cached resolution narrows the advertised types
        assert_eq!(actor.generates(), vec![PayloadType::Row]);
    }

    #[test]
    fn test_missing_setup_is_dependency_missing() {
        let mut actor = actor(Arc::new(NamedSetups::new()));
        actor
            .set_option(OPT_SETUP, OptionValue::Text("absent".into()))
            .unwrap();
        actor.set_up().unwrap();
        actor
            .input(Token::new(AudioBuffer::new(16, vec![0.0; 8])))
            .unwrap();

        let err = actor.execute().unwrap_err();
        assert!(matches!(err, ActorError::DependencyMissing { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_reset_clears_cached_resolution() {
        let mut actor = actor(setups_with_fingerprint());
        actor.set_option(OPT_SETUP, OptionValue::Text("fp".into())).unwrap();
        actor.set_up().unwrap();
        actor
            .input(Token::new(AudioBuffer::new(16, vec![0.0; 8])))
            .unwrap();
        actor.execute().unwrap();
        assert_eq!(actor.generates(), vec![PayloadType::Row]);

        actor.set_option(OPT_SETUP, OptionValue::Text("fp".into())).unwrap();
        assert_eq!(actor.generates(), vec![PayloadType::Any]);
    }

    #[test]
    fn test_backup_carries_cached_resolution() {
        let mut actor = actor(setups_with_fingerprint());
        actor.set_option(OPT_SETUP, OptionValue::Text("fp".into())).unwrap();
        actor.set_up().unwrap();
        actor
            .input(Token::new(AudioBuffer::new(16, vec![0.0; 8])))
            .unwrap();
        actor.execute().unwrap();

        let mut backup = actor.backup_state();
        actor.reset();
        assert_eq!(actor.generates(), vec![PayloadType::Any]);

        actor.restore_state(&mut backup);
        assert_eq!(actor.generates(), vec![PayloadType::Row]);
        assert!(actor.has_pending_output());
    }
}
