use crate::fixtures::*;
use covault::application::CreateSessionRequest;
use covault::foundation::{CoordinatorError, ErrorCode};
use pallas_codec::minicbor;
use pallas_primitives::alonzo::Tx;

fn sweep_request() -> CreateSessionRequest {
    CreateSessionRequest { mode: "sweep".to_string(), ..Default::default() }
}

#[tokio::test]
async fn test_full_flow_when_threshold_met_then_submitted_and_cleared() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[SIGNER_A]), None).expect("witness a");
    let status = rig.coordinator.status(&created.session_id).expect("status");
    assert_eq!(status.phase, "collecting");

    rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[SIGNER_B]), None).expect("witness b");
    let status = rig.coordinator.status(&created.session_id).expect("status");
    assert_eq!(status.phase, "ready");
    assert_eq!(status.collected.len(), 2);

    let outcome = rig.coordinator.submit(&created.session_id).await.expect("submit");
    assert_eq!(outcome.tx_hash.len(), 64);
    assert_eq!(rig.gateway.submission_count(), 1);

    // the submitted transaction carries both key witnesses and the native script
    let submitted = rig.gateway.submissions().pop().expect("submitted bytes");
    let tx: Tx = minicbor::decode(&submitted).expect("decode final tx");
    assert_eq!(tx.transaction_witness_set.vkeywitness.as_ref().map(|v| v.len()), Some(2));
    assert_eq!(tx.transaction_witness_set.native_script.as_ref().map(|v| v.len()), Some(1));

    // success destroys the session
    let err = rig.coordinator.status(&created.session_id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SessionNotFound);
}

#[tokio::test]
async fn test_witness_resubmission_is_idempotent() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    let first = rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[SIGNER_A]), None).expect("first");
    let second = rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[SIGNER_A]), None).expect("second");
    assert_eq!(first.collected, 1);
    assert_eq!(second.collected, 1);

    let listed = rig.coordinator.list_witnesses(&created.session_id).expect("list");
    assert_eq!(listed.witnesses.len(), 1);
    assert_eq!(listed.witnesses[0].signer, signer_key_hash(SIGNER_A).to_string());
}

#[tokio::test]
async fn test_witness_from_unknown_signer_only_is_authorization_failure() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    let err = rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[OUTSIDER]), None).unwrap_err();
    match err {
        CoordinatorError::SignerNotAllowed { observed, required } => {
            assert_eq!(observed, vec![signer_key_hash(OUTSIDER).to_string()]);
            assert_eq!(required.len(), 2);
        }
        other => panic!("expected SignerNotAllowed, got {other:?}"),
    }
    assert_eq!(rig.coordinator.status(&created.session_id).expect("status").collected.len(), 0);
}

#[tokio::test]
async fn test_garbage_witness_blob_is_invalid_cbor() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    let err = rig.coordinator.submit_witness(&created.session_id, "deadbeef", None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidWitnessCbor);
}

#[tokio::test]
async fn test_submit_rejection_leaves_session_for_retry() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");
    rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[SIGNER_A, SIGNER_B]), None).expect("witnesses");

    rig.gateway.reject_next_submit("ValueNotConservedUTxO");
    let err = rig.coordinator.submit(&created.session_id).await.unwrap_err();
    match err {
        CoordinatorError::SubmitRejected { diagnostic } => assert!(diagnostic.contains("ValueNotConserved")),
        other => panic!("expected SubmitRejected, got {other:?}"),
    }

    // session intact, second attempt succeeds
    assert_eq!(rig.coordinator.status(&created.session_id).expect("status").phase, "ready");
    rig.coordinator.submit(&created.session_id).await.expect("retry submit");
    assert_eq!(rig.gateway.submission_count(), 1);
}

#[tokio::test]
async fn test_rebuilding_the_same_body_joins_the_existing_session() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let first = rig.coordinator.create_session(sweep_request()).await.expect("create");
    rig.coordinator.submit_witness(&first.session_id, &witness_blob_hex(&[SIGNER_A]), None).expect("witness");

    let second = rig.coordinator.create_session(sweep_request()).await.expect("recreate");
    assert_eq!(first.session_id, second.session_id);
    assert_eq!(rig.coordinator.status(&second.session_id).expect("status").collected.len(), 1);
}

#[tokio::test]
async fn test_reset_clears_one_session_or_all() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    let outcome = rig.coordinator.reset(Some(&created.session_id)).expect("reset one");
    assert_eq!(outcome.cleared, 1);
    assert_eq!(rig.coordinator.status(&created.session_id).unwrap_err().code(), ErrorCode::SessionNotFound);

    let recreated = rig.coordinator.create_session(sweep_request()).await.expect("recreate");
    let outcome = rig.coordinator.reset(None).expect("reset all");
    assert_eq!(outcome.cleared, 1);
    assert_eq!(rig.coordinator.status(&recreated.session_id).unwrap_err().code(), ErrorCode::SessionNotFound);
}

#[tokio::test]
async fn test_describe_script_reports_threshold_keys_and_address() {
    let rig = rig(&[SIGNER_A, SIGNER_B, SIGNER_C], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let info = rig.coordinator.describe_script().expect("describe");

    assert_eq!(info.m_required, 2);
    assert_eq!(info.required_key_hashes.len(), 3);
    assert_eq!(info.enterprise_address, rig.config.multisig_address);
    assert_eq!(info.trace[0].kind, "at_least");
    assert!(info.invalid_before.is_none());
}

#[tokio::test]
async fn test_operations_on_unknown_session_are_not_found() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let missing = "ab".repeat(32);

    assert_eq!(rig.coordinator.get_body(&missing).unwrap_err().code(), ErrorCode::SessionNotFound);
    assert_eq!(rig.coordinator.status(&missing).unwrap_err().code(), ErrorCode::SessionNotFound);
    assert_eq!(rig.coordinator.list_witnesses(&missing).unwrap_err().code(), ErrorCode::SessionNotFound);
    assert_eq!(rig.coordinator.submit(&missing).await.unwrap_err().code(), ErrorCode::SessionNotFound);
    assert_eq!(rig.coordinator.submit_witness(&missing, &witness_blob_hex(&[SIGNER_A]), None).unwrap_err().code(), ErrorCode::SessionNotFound);

    // malformed ids behave like unknown ids
    assert_eq!(rig.coordinator.status("not-a-session").unwrap_err().code(), ErrorCode::SessionNotFound);
}

#[tokio::test]
async fn test_full_transaction_blob_is_accepted_as_witness_source() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    // a signer returns the whole signed transaction instead of a witness set
    let body = rig.coordinator.get_body(&created.session_id).expect("body");
    let mut tx: Tx = minicbor::decode(&hex::decode(&body.tx_hex).expect("hex")).expect("decode tx");
    let set_with_key = hex::decode(witness_blob_hex(&[SIGNER_B])).expect("hex");
    let decoded_set: pallas_primitives::alonzo::WitnessSet = minicbor::decode(&set_with_key).expect("decode set");
    tx.transaction_witness_set.vkeywitness = decoded_set.vkeywitness;
    let full_tx_hex = hex::encode(covault::domain::codec::encode_cbor(&tx).expect("encode tx"));

    let outcome = rig.coordinator.submit_witness(&created.session_id, &full_tx_hex, None).expect("submit witness");
    assert_eq!(outcome.accepted, vec![signer_key_hash(SIGNER_B).to_string()]);
    assert_eq!(outcome.collected, 1);
}
