//! End-to-end scenarios driving actors the way the engine does:
//! input / execute / has_pending_output / output, with option re-binds,
//! backups, and cooperative stops in between.

use std::sync::Arc;

use flow_types::{
    ActorIdentity, ActorRole, AudioBuffer, Payload, PayloadType, ProvenanceChain,
    ProvenanceLedger, ProvenanceRecord, Token,
};

use crate::actors::{FeatureGenerator, OPT_ALGORITHM};
use crate::algorithm::{Algorithm, Fingerprint};
use crate::error::ActorError;
use crate::lifecycle::StopToken;
use crate::option::OptionValue;
use crate::transformer::Transformer;

fn feature_gen(enabled: bool) -> FeatureGenerator {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    FeatureGenerator::new(Arc::new(ProvenanceLedger::new(enabled)))
}

/// Sixteen ramp samples, two fingerprint windows
fn ramp_token() -> Token {
    Token::new(AudioBuffer::new(16, (0..16).map(|i| i as f64).collect()))
}

fn window_index(payload: &Payload) -> i64 {
    payload
        .as_row()
        .and_then(|row| row.cell("window"))
        .and_then(|cell| cell.as_i64())
        .expect("fingerprint row with a window cell")
}

/// Produces rows until stopped; requests the stop itself partway through,
/// standing in for an engine-side stop arriving mid-execute
struct Endless {
    stop_after: usize,
}

impl Algorithm for Endless {
    fn name(&self) -> &str {
        "endless"
    }

    fn input_type(&self) -> PayloadType {
        PayloadType::Audio
    }

    fn output_type(&self) -> PayloadType {
        PayloadType::Int
    }

    fn generate(&self, _input: &Payload, stop: &StopToken) -> anyhow::Result<Vec<Payload>> {
        let mut rows = Vec::new();
        for i in 0.. {
            if stop.is_stopped() {
                break;
            }
            if i == self.stop_after {
                stop.request_stop();
            }
            rows.push(Payload::Int(i as i64));
        }
        Ok(rows)
    }
}

#[test]
fn s1_feature_generation_drains_in_order() {
    let mut actor = feature_gen(true);
    actor.set_up().unwrap();
    actor.input(ramp_token()).unwrap();

    assert!(actor.execute().is_ok());
    assert!(actor.has_pending_output());

    let r1 = actor.output().unwrap();
    let r2 = actor.output().unwrap();
    assert_eq!(window_index(r1.payload()), 0);
    assert_eq!(window_index(r2.payload()), 1);

    let err = actor.output().unwrap_err();
    assert!(matches!(err, ActorError::EmptyQueue { .. }));
}

#[test]
fn s2_type_mismatch_rejected_at_input() {
    let mut actor = feature_gen(true);
    actor.set_up().unwrap();

    let err = actor.input(Token::new("a plain string")).unwrap_err();
    assert!(matches!(err, ActorError::WrongPayloadType { .. }));
    assert!(!actor.has_pending_output());
}

#[test]
fn s3_option_change_clears_queue() {
    let mut actor = feature_gen(true);
    actor.set_up().unwrap();
    actor.input(ramp_token()).unwrap();
    actor.execute().unwrap();
    actor.output().unwrap();

    actor
        .set_option(
            OPT_ALGORITHM,
            OptionValue::Algorithm(Arc::new(Fingerprint::default())),
        )
        .unwrap();

    assert!(!actor.has_pending_output());
    let err = actor.output().unwrap_err();
    assert!(matches!(err, ActorError::EmptyQueue { .. }));
}

#[test]
fn s4_backup_preserves_outputs_across_variable_update() {
    let mut actor = feature_gen(true);
    actor.set_up().unwrap();
    actor.input(ramp_token()).unwrap();
    actor.execute().unwrap();

    let mut backup = actor.backup_state();

    // variable-driven option refresh triggers a reset
    actor
        .set_option(
            OPT_ALGORITHM,
            OptionValue::Algorithm(Arc::new(Fingerprint::new(4))),
        )
        .unwrap();
    assert!(!actor.has_pending_output());

    actor.restore_state(&mut backup);
    assert!(backup.is_empty());

    let r1 = actor.output().unwrap();
    let r2 = actor.output().unwrap();
    assert_eq!(window_index(r1.payload()), 0);
    assert_eq!(window_index(r2.payload()), 1);
    assert!(!actor.has_pending_output());
}

#[test]
fn s5_cancellation_leaves_no_output() {
    let mut actor = feature_gen(true);
    actor
        .set_option(
            OPT_ALGORITHM,
            OptionValue::Algorithm(Arc::new(Endless { stop_after: 100 })),
        )
        .unwrap();
    actor.set_up().unwrap();
    actor.input(ramp_token()).unwrap();

    assert!(actor.execute().is_ok());
    assert!(!actor.has_pending_output());
    assert!(actor.core().last_error().is_none());
}

#[test]
fn s6_provenance_disabled_behaves_identically() {
    let mut actor = feature_gen(false);
    actor.set_up().unwrap();
    actor.input(ramp_token()).unwrap();
    actor.execute().unwrap();

    let r1 = actor.output().unwrap();
    let r2 = actor.output().unwrap();
    assert!(r1.provenance().is_empty());
    assert!(r2.provenance().is_empty());
    assert_eq!(window_index(r1.payload()), 0);
    assert_eq!(window_index(r2.payload()), 1);
}

#[test]
fn provenance_chain_appends_to_incoming_chain() {
    let mut actor = feature_gen(true);
    actor.set_up().unwrap();

    // the input token already carries one upstream record
    let mut upstream = ProvenanceChain::new();
    upstream.push(ProvenanceRecord::new(
        ActorRole::DataGenerator,
        PayloadType::Any,
        ActorIdentity::new("Source"),
        PayloadType::Audio,
    ));
    let token = ramp_token().with_provenance(upstream.clone());
    actor.input(token).unwrap();
    actor.execute().unwrap();

    let out = actor.output().unwrap();
    let records = out.provenance().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], upstream.records()[0]);
    assert_eq!(records[1].role, ActorRole::FeatureGenerator);
    assert_eq!(records[1].input_type, PayloadType::Audio);
    assert_eq!(records[1].output_type, PayloadType::Row);
    assert_eq!(records[1].actor.name, "FeatureGenerator");
}
