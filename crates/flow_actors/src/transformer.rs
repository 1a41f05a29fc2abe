//! Transformer contract - the protocol every actor honours
//!
//! A transformer accepts one token, produces zero-or-more output payloads,
//! and lets the engine drain them one token at a time. The engine calls
//! `input` / `execute` / `has_pending_output` / `output` in strictly that
//! serialised order, drains all pending output before supplying a new input,
//! and may bracket option re-binds with `backup_state` / `restore_state`.
//!
//! Specialisation is by composition: concrete actors embed a
//! `TransformerCore` (options, lifecycle state, input slot, queue) and
//! implement the handful of required methods; the protocol itself is
//! provided by the trait.

use std::sync::Arc;

use flow_types::{
    ActorIdentity, ActorRole, PayloadType, ProvenanceChain, ProvenanceLedger, ProvenanceRecord,
    Token,
};

use crate::backup::{BackupEntry, StateBackup, BACKUP_CONSUMED, BACKUP_INPUT, BACKUP_QUEUE};
use crate::error::{ActorError, ActorResult};
use crate::lifecycle::{LifecycleState, StopToken};
use crate::option::{OptionRegistry, OptionValue};
use crate::queue::OutputQueue;

// ─────────────────────────────────────────────────────────────────────────────
// Transformer Core
// ─────────────────────────────────────────────────────────────────────────────

/// State every transformer owns: options, lifecycle, input slot, queue
pub struct TransformerCore {
    identity: ActorIdentity,
    role: ActorRole,
    options: OptionRegistry,
    state: LifecycleState,
    input: Option<Token>,
    queue: OutputQueue,
    /// Type and chain of the token consumed by the current `execute()`,
    /// kept so provenance can be finalised when outputs are drained
    consumed: Option<(PayloadType, ProvenanceChain)>,
    last_error: Option<ActorError>,
    stop: StopToken,
    stop_flow_on_error: bool,
    ledger: Arc<ProvenanceLedger>,
}

impl TransformerCore {
    /// Create a core for the named actor with the given role and ledger
    pub fn new(name: impl Into<String>, role: ActorRole, ledger: Arc<ProvenanceLedger>) -> Self {
        Self {
            identity: ActorIdentity::new(name),
            role,
            options: OptionRegistry::new(),
            state: LifecycleState::New,
            input: None,
            queue: OutputQueue::new(),
            consumed: None,
            last_error: None,
            stop: StopToken::new(),
            stop_flow_on_error: false,
            ledger,
        }
    }

    /// Actor name, unique within its enclosing container
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Stable identity used in provenance records
    pub fn identity(&self) -> &ActorIdentity {
        &self.identity
    }

    /// Role recorded in provenance
    pub fn role(&self) -> ActorRole {
        self.role
    }

    /// Declared options and current values
    pub fn options(&self) -> &OptionRegistry {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionRegistry {
        &mut self.options
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Token installed for the next/current `execute()`, if any
    pub fn input_token(&self) -> Option<&Token> {
        self.input.as_ref()
    }

    /// The output queue
    pub fn queue(&self) -> &OutputQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut OutputQueue {
        &mut self.queue
    }

    /// The cooperative stop flag; clone it into owned subordinates
    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    /// Last error reported by this actor; kept across `wrap_up()`
    pub fn last_error(&self) -> Option<&ActorError> {
        self.last_error.as_ref()
    }

    /// Whether the engine should stop the whole flow on this actor's errors
    pub fn stop_flow_on_error(&self) -> bool {
        self.stop_flow_on_error
    }

    pub fn set_stop_flow_on_error(&mut self, stop: bool) {
        self.stop_flow_on_error = stop;
    }

    /// The provenance collaborator
    pub fn ledger(&self) -> &Arc<ProvenanceLedger> {
        &self.ledger
    }

    /// Discard derived state: back to New, queue emptied, input dropped
    fn reset(&mut self) {
        self.state = LifecycleState::New;
        self.queue.clear();
        self.input = None;
        self.consumed = None;
        self.last_error = None;
        self.stop.clear();
    }
}

impl std::fmt::Debug for TransformerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerCore")
            .field("name", &self.identity.name)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .field("has_input", &self.input.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transformer Trait
// ─────────────────────────────────────────────────────────────────────────────

/// The transformer-actor protocol
///
/// Implementors supply `core`/`core_mut`, the type declarations, and
/// `do_execute`; everything else is provided. No actor method is safe to
/// call concurrently - the engine serialises all calls.
pub trait Transformer {
    /// The embedded core state
    fn core(&self) -> &TransformerCore;

    fn core_mut(&mut self) -> &mut TransformerCore;

    /// One-paragraph description for tooling
    fn global_info(&self) -> String;

    /// Types this actor will consume. Non-empty.
    fn accepts(&self) -> Vec<PayloadType>;

    /// Types this actor may produce. May depend on current option values;
    /// callers must query again after any option change.
    fn generates(&self) -> Vec<PayloadType>;

    /// Process the installed input token, populating the queue through
    /// `core_mut().queue_mut()`. The input token stays installed for the
    /// duration of the call and is cleared by the caller afterwards.
    fn do_execute(&mut self) -> ActorResult<()>;

    // ─────────────────────────────────────────────────────────────────────
    // Hooks
    // ─────────────────────────────────────────────────────────────────────

    /// Validate current option values; called by `set_up()`. Errors are
    /// fatal and leave the actor in New.
    fn check_options(&self) -> ActorResult<()> {
        Ok(())
    }

    /// Drop cached sub-objects after a reset
    fn on_reset(&mut self) {}

    /// Discard owned algorithm objects and subordinates
    fn on_clean_up(&mut self) {}

    /// Add subclass-declared keys to a snapshot; extend, never overwrite,
    /// ancestor keys
    fn backup_state_extra(&mut self, _backup: &mut StateBackup) {}

    /// Reinstate subclass-declared keys from a snapshot
    fn restore_state_extra(&mut self, _backup: &mut StateBackup) {}

    /// Remove keys that would be stale if restored
    fn prune_backup(&self, _backup: &mut StateBackup) {}

    /// Short human-readable summary of the current configuration
    fn quick_info(&self) -> Option<String> {
        None
    }

    // ─────────────────────────────────────────────────────────────────────
    // Provided protocol
    // ─────────────────────────────────────────────────────────────────────

    /// Actor name
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Move a fresh actor to Initialized
    fn initialize(&mut self) {
        self.core_mut().state = LifecycleState::Initialized;
    }

    /// Validate options and make the actor ready to execute. On error the
    /// actor stays in New and the error is fatal to the flow.
    fn set_up(&mut self) -> ActorResult<()> {
        if let Err(err) = self.check_options() {
            tracing::warn!(actor = %self.name(), error = %err, "setup failed");
            self.core_mut().last_error = Some(err.clone());
            return Err(err);
        }
        self.core_mut().state = LifecycleState::SetUp;
        Ok(())
    }

    /// Install a token for the next `execute()`. Fails if one is already
    /// installed or the payload type is not accepted; the actor's state is
    /// unchanged on failure.
    fn input(&mut self, token: Token) -> ActorResult<()> {
        if self.core().input.is_some() {
            return Err(ActorError::AlreadyHasInput {
                actor: self.name().to_string(),
            });
        }
        let accepted = self.accepts();
        let actual = token.payload_type();
        if !accepted.iter().any(|t| t.is_compatible_with(&actual)) {
            return Err(ActorError::wrong_payload_type(self.name(), &accepted, actual));
        }
        self.core_mut().input = Some(token);
        Ok(())
    }

    /// Consume the installed input and populate the output queue.
    ///
    /// A cooperative stop empties the queue and returns success - cancelled
    /// executions are never surfaced as failures. Other errors are recorded
    /// in `last_error` and returned.
    fn execute(&mut self) -> ActorResult<()> {
        {
            let core = self.core_mut();
            core.state = LifecycleState::Executing;
            core.queue.clear();
            core.consumed = core
                .input
                .as_ref()
                .map(|t| (t.payload_type(), t.provenance().clone()));
        }
        tracing::debug!(actor = %self.name(), "executing");

        let result = self.do_execute();

        let stopped = self.core().stop.is_stopped();
        let core = self.core_mut();
        core.input = None;
        if stopped || matches!(result, Err(ActorError::Stopped { .. })) {
            core.queue.clear();
            tracing::debug!(actor = %core.identity.name, "execution stopped, queue discarded");
            return Ok(());
        }
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(actor = %core.identity.name, error = %err, "execute failed");
                core.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Check for pending output; does not mutate state
    fn has_pending_output(&self) -> bool {
        !self.core().queue.is_empty()
    }

    /// Pop the head of the queue, wrap it in a token, and finalise its
    /// provenance before returning. Fails when nothing is pending.
    fn output(&mut self) -> ActorResult<Token> {
        let core = self.core_mut();
        let payload = core.queue.pop().ok_or_else(|| ActorError::EmptyQueue {
            actor: core.identity.name.clone(),
        })?;
        let output_type = payload.type_of();
        let token = Token::new(payload);
        let token = match &core.consumed {
            Some((input_type, chain)) => {
                let record = ProvenanceRecord::new(
                    core.role,
                    input_type.clone(),
                    core.identity.clone(),
                    output_type,
                );
                token.with_provenance(core.ledger.extend(chain, record))
            }
            None => token,
        };
        Ok(token)
    }

    /// Request a cooperative stop; forwarded to subordinates through the
    /// shared `StopToken`
    fn stop_execution(&self) {
        tracing::debug!(actor = %self.name(), "stop requested");
        self.core().stop.request_stop();
    }

    /// Check if a stop was requested
    fn is_stopped(&self) -> bool {
        self.core().stop.is_stopped()
    }

    /// Drain the queue and release transient resources. `last_error` is
    /// kept so post-mortems remain available.
    fn wrap_up(&mut self) {
        let core = self.core_mut();
        core.queue.clear();
        core.input = None;
        core.consumed = None;
        core.state = LifecycleState::WrappedUp;
    }

    /// Discard owned subordinates and algorithm objects
    fn clean_up(&mut self) {
        self.on_clean_up();
        let core = self.core_mut();
        core.queue.clear();
        core.state = LifecycleState::CleanedUp;
    }

    /// Set an option value. Every option is a build-time parameter, so a
    /// successful set resets the actor: derived state and cached sub-objects
    /// are discarded and the queue is emptied.
    fn set_option(&mut self, property: &str, value: OptionValue) -> ActorResult<()> {
        let name = self.name().to_string();
        self.core_mut()
            .options
            .set(property, value)
            .map_err(|err| ActorError::OptionInvalid {
                actor: name,
                property: err.property().to_string(),
                reason: err.reason(),
            })?;
        self.reset();
        Ok(())
    }

    /// Back to New: discard derived state, cached sub-objects, and the queue
    fn reset(&mut self) {
        self.core_mut().reset();
        self.on_reset();
    }

    /// Snapshot actor-local state before the engine re-binds options.
    /// Captured objects are detached from the actor; restore reattaches.
    fn backup_state(&mut self) -> StateBackup {
        let mut backup = StateBackup::new();
        {
            let core = self.core_mut();
            backup.insert(BACKUP_QUEUE, BackupEntry::Queue(core.queue.detach()));
            if let Some(token) = core.input.take() {
                backup.insert(BACKUP_INPUT, BackupEntry::Token(token));
            }
            if let Some((ty, chain)) = core.consumed.take() {
                backup.insert(BACKUP_CONSUMED, BackupEntry::Consumed(ty, chain));
            }
        }
        self.backup_state_extra(&mut backup);
        self.prune_backup(&mut backup);
        backup
    }

    /// Reinstate snapshot entries; each restored entry is removed from the
    /// snapshot
    fn restore_state(&mut self, backup: &mut StateBackup) {
        {
            let core = self.core_mut();
            if let Some(BackupEntry::Queue(queue)) = backup.take(BACKUP_QUEUE) {
                core.queue = queue;
            }
            if let Some(BackupEntry::Token(token)) = backup.take(BACKUP_INPUT) {
                core.input = Some(token);
            }
            if let Some(BackupEntry::Consumed(ty, chain)) = backup.take(BACKUP_CONSUMED) {
                core.consumed = Some((ty, chain));
            }
        }
        self.restore_state_extra(backup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_types::Payload;

    /// Doubles every int it receives and also emits the original
    struct Doubler {
        core: TransformerCore,
    }

    impl Doubler {
        fn new(ledger: Arc<ProvenanceLedger>) -> Self {
            Self {
                core: TransformerCore::new("Doubler", ActorRole::Preprocessor, ledger),
            }
        }
    }

    impl Transformer for Doubler {
        fn core(&self) -> &TransformerCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut TransformerCore {
            &mut self.core
        }

        fn global_info(&self) -> String {
            "Emits the incoming int followed by its double.".to_string()
        }

        fn accepts(&self) -> Vec<PayloadType> {
            vec![PayloadType::Int]
        }

        fn generates(&self) -> Vec<PayloadType> {
            vec![PayloadType::Int]
        }

        fn do_execute(&mut self) -> ActorResult<()> {
            let value = self
                .core
                .input_token()
                .and_then(|t| t.payload().as_i64())
                .expect("gate guarantees an int");
            self.core
                .queue_mut()
                .push_all(vec![Payload::Int(value), Payload::Int(value * 2)]);
            Ok(())
        }
    }

    fn ledger() -> Arc<ProvenanceLedger> {
        Arc::new(ProvenanceLedger::new(true))
    }

    #[test]
    fn test_accept_guard_leaves_state_unchanged() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();

        let err = actor.input(Token::new("not an int")).unwrap_err();
        assert!(matches!(err, ActorError::WrongPayloadType { .. }));
        assert_eq!(actor.core().state(), LifecycleState::SetUp);
        assert!(!actor.has_pending_output());
        assert!(actor.core().input_token().is_none());
    }

    #[test]
    fn test_already_has_input() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(1i64)).unwrap();

        let err = actor.input(Token::new(2i64)).unwrap_err();
        assert!(matches!(err, ActorError::AlreadyHasInput { .. }));
    }

    #[test]
    fn test_fifo_drain_and_empty_queue() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(21i64)).unwrap();
        actor.execute().unwrap();

        assert!(actor.has_pending_output());
        // input token is consumed on execute
        assert!(actor.core().input_token().is_none());

        assert_eq!(actor.output().unwrap().payload().as_i64(), Some(21));
        assert_eq!(actor.output().unwrap().payload().as_i64(), Some(42));
        let err = actor.output().unwrap_err();
        assert!(matches!(err, ActorError::EmptyQueue { .. }));
        assert_eq!(err.severity(), crate::error::Severity::Fatal);
    }

    #[test]
    fn test_provenance_chain_extended() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(3i64)).unwrap();
        actor.execute().unwrap();

        let first = actor.output().unwrap();
        assert_eq!(first.provenance().len(), 1);
        let record = &first.provenance().records()[0];
        assert_eq!(record.input_type, PayloadType::Int);
        assert_eq!(record.output_type, PayloadType::Int);
        assert_eq!(record.actor.name, "Doubler");

        // chains on successive outputs both start from the input's chain
        let second = actor.output().unwrap();
        assert_eq!(second.provenance().len(), 1);
    }

    #[test]
    fn test_provenance_disabled_yields_empty_chains() {
        let mut actor = Doubler::new(Arc::new(ProvenanceLedger::new(false)));
        actor.set_up().unwrap();
        actor.input(Token::new(3i64)).unwrap();
        actor.execute().unwrap();
        assert!(actor.output().unwrap().provenance().is_empty());
    }

    #[test]
    fn test_wrap_up_keeps_last_error() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(1i64)).unwrap();
        actor.execute().unwrap();

        actor.core_mut().last_error = Some(ActorError::AlgorithmFailure {
            actor: "Doubler".into(),
            operation: "execute".into(),
            cause: "boom".into(),
        });
        actor.wrap_up();

        assert!(!actor.has_pending_output());
        assert!(actor.core().last_error().is_some());
        assert_eq!(actor.core().state(), LifecycleState::WrappedUp);
    }

    #[test]
    fn test_stop_discards_queue_and_returns_ok() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(1i64)).unwrap();
        actor.stop_execution();

        assert!(actor.execute().is_ok());
        assert!(!actor.has_pending_output());
        assert!(actor.core().last_error().is_none());
    }

    #[test]
    fn test_backup_restore_round_trip() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(5i64)).unwrap();
        actor.execute().unwrap();

        let mut backup = actor.backup_state();
        assert!(!actor.has_pending_output());

        // a reset in between must not lose the snapshotted state
        actor.reset();
        actor.restore_state(&mut backup);
        assert!(backup.is_empty());

        assert_eq!(actor.output().unwrap().payload().as_i64(), Some(5));
        assert_eq!(actor.output().unwrap().payload().as_i64(), Some(10));
    }

    #[test]
    fn test_has_pending_output_is_idempotent() {
        let mut actor = Doubler::new(ledger());
        actor.set_up().unwrap();
        actor.input(Token::new(1i64)).unwrap();
        actor.execute().unwrap();

        assert_eq!(actor.has_pending_output(), actor.has_pending_output());
        actor.output().unwrap();
        actor.output().unwrap();
        assert_eq!(actor.has_pending_output(), actor.has_pending_output());
        assert!(!actor.has_pending_output());
    }
}
