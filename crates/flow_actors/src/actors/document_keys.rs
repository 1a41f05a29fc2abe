//! DocumentKeys - forwards the sorted keys of the incoming document
//!
//! Keys are emitted one-by-one by default; the `output_array` option
//! switches to a single array payload. `generates()` reflects the option, so
//! the engine must query again after changing it.

use std::sync::Arc;

use flow_types::{ActorRole, Payload, PayloadType, ProvenanceLedger};

use crate::error::{ActorError, ActorResult};
use crate::option::{OptionDef, OptionValue};
use crate::transformer::{Transformer, TransformerCore};

/// Property name of the output-array option
pub const OPT_OUTPUT_ARRAY: &str = "output_array";

/// Forwards all the sorted keys of the incoming document
pub struct DocumentKeys {
    core: TransformerCore,
}

impl DocumentKeys {
    pub fn new(ledger: Arc<ProvenanceLedger>) -> Self {
        let mut core = TransformerCore::new("DocumentKeys", ActorRole::Preprocessor, ledger);
        core.options_mut().add(OptionDef::new(
            "output-array",
            OPT_OUTPUT_ARRAY,
            OptionValue::Bool(false),
            "If enabled, the keys are output as an array rather than one-by-one.",
        ));
        Self { core }
    }

    fn output_array(&self) -> bool {
        self.core.options().get_bool(OPT_OUTPUT_ARRAY).unwrap_or(false)
    }
}

impl Transformer for DocumentKeys {
    fn core(&self) -> &TransformerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TransformerCore {
        &mut self.core
    }

    fn global_info(&self) -> String {
        "Forwards all the sorted keys of the incoming document.".to_string()
    }

    fn accepts(&self) -> Vec<PayloadType> {
        vec![PayloadType::Document]
    }

    fn generates(&self) -> Vec<PayloadType> {
        if self.output_array() {
            vec![PayloadType::array_of(PayloadType::Text)]
        } else {
            vec![PayloadType::Text]
        }
    }

    fn do_execute(&mut self) -> ActorResult<()> {
        let name = self.name().to_string();
        let document = self
            .core
            .input_token()
            .and_then(|t| t.payload().as_document())
            .cloned()
            .ok_or_else(|| ActorError::AlgorithmFailure {
                actor: name.clone(),
                operation: "execute".to_string(),
                cause: "no document installed".to_string(),
            })?;

        let mut keys: Vec<String> = match document.as_object() {
            Some(map) => map.keys().cloned().collect(),
            None => Vec::new(),
        };
        keys.sort();

        if self.output_array() {
            self.core
                .queue_mut()
                .push(Payload::Array(keys.into_iter().map(Payload::Text).collect()));
        } else {
            self.core
                .queue_mut()
                .push_all(keys.into_iter().map(Payload::Text));
        }
        Ok(())
    }

    fn quick_info(&self) -> Option<String> {
        Some(if self.output_array() {
            "as array".to_string()
        } else {
            "one-by-one".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_types::Token;

    fn actor() -> DocumentKeys {
        DocumentKeys::new(Arc::new(ProvenanceLedger::new(false)))
    }

    fn document() -> Token {
        Token::new(Payload::Document(serde_json::json!({
            "zulu": 1, "alpha": 2, "mike": 3
        })))
    }

    #[test]
    fn test_keys_one_by_one_sorted() {
        let mut actor = actor();
        actor.set_up().unwrap();
        actor.input(document()).unwrap();
        actor.execute().unwrap();

        let mut keys = Vec::new();
        while actor.has_pending_output() {
            keys.push(actor.output().unwrap().payload().as_str().unwrap().to_string());
        }
        assert_eq!(keys, vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn test_keys_as_array() {
        let mut actor = actor();
        actor
            .set_option(OPT_OUTPUT_ARRAY, OptionValue::Bool(true))
            .unwrap();
        assert_eq!(
            actor.generates(),
            vec![PayloadType::array_of(PayloadType::Text)]
        );

        actor.set_up().unwrap();
        actor.input(document()).unwrap();
        actor.execute().unwrap();

        let token = actor.output().unwrap();
        let items = token.payload().as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_str(), Some("alpha"));
        assert!(!actor.has_pending_output());
    }

    #[test]
    fn test_rejects_non_document() {
        let mut actor = actor();
        actor.set_up().unwrap();
        let err = actor.input(Token::new(42i64)).unwrap_err();
        assert!(matches!(err, ActorError::WrongPayloadType { .. }));
    }

    #[test]
    fn test_quick_info_reflects_option() {
        let mut actor = actor();
        assert_eq!(actor.quick_info().as_deref(), Some("one-by-one"));
        actor
            .set_option(OPT_OUTPUT_ARRAY, OptionValue::Bool(true))
            .unwrap();
        assert_eq!(actor.quick_info().as_deref(), Some("as array"));
    }
}
