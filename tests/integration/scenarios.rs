use crate::fixtures::*;
use covault::application::CreateSessionRequest;
use covault::domain::script::summarize;
use covault::domain::value::AmountEntry;
use covault::foundation::{CoordinatorError, ErrorCode};

fn sweep_request() -> CreateSessionRequest {
    CreateSessionRequest { mode: "sweep_all".to_string(), ..Default::default() }
}

#[tokio::test]
async fn test_sweep_single_coin_utxo_end_to_end() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    assert_eq!(created.m_required, 2);
    assert_eq!(created.required_key_hashes, vec![signer_key_hash(SIGNER_A).to_string(), signer_key_hash(SIGNER_B).to_string()]);

    let fee: u64 = created.preview.fee.parse().expect("fee");
    let dest = rig.config.dest_address.clone().expect("dest");
    assert_eq!(created.preview.outputs[0].address, dest);
    assert_eq!(created.preview.outputs[0].coin, MIN_ADA.to_string());
    assert_eq!(created.preview.outputs[1].address, dest);
    assert_eq!(created.preview.outputs[1].coin, (10_000_000 - MIN_ADA - fee).to_string());

    // the declared fee covers the size-linear minimum with the witness buffer on top
    let body = rig.coordinator.get_body(&created.session_id).expect("body");
    let tx_size = body.tx_hex.len() / 2;
    let floor = MIN_FEE_A * tx_size as u64 + MIN_FEE_B;
    assert!(fee >= floor, "fee {fee} below minimum {floor}");
    assert!(fee <= floor + MIN_FEE_A * 300 * 2, "fee {fee} exceeds buffered minimum");
}

#[tokio::test]
async fn test_sweep_with_tokens_end_to_end() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![token_utxo(4, 0, 5_000_000, 0xAB, b"nimbus", 7)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    let fee: u64 = created.preview.fee.parse().expect("fee");
    assert_eq!(created.preview.outputs[0].coin, MIN_ADA.to_string());
    assert_eq!(
        created.preview.outputs[0].assets,
        vec![AmountEntry { unit: unit_for(0xAB, b"nimbus"), quantity: "7".to_string() }]
    );
    assert_eq!(created.preview.outputs[1].coin, (5_000_000 - MIN_ADA - fee).to_string());
    assert!(created.preview.outputs[1].assets.is_empty());
}

#[tokio::test]
async fn test_explicit_request_for_absent_tokens_is_rejected() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![token_utxo(4, 0, 10_000_000, 0xAB, b"nimbus", 5)]);
    let request = CreateSessionRequest {
        mode: "explicit".to_string(),
        outputs: Some(vec![covault::application::OutputRequest {
            address: payment_address(0x55),
            coin: Some("1500000".to_string()),
            assets: vec![AmountEntry { unit: unit_for(0xAB, b"nimbus"), quantity: "6".to_string() }],
        }]),
        ..Default::default()
    };

    let err = rig.coordinator.create_session(request).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientTokens);
}

#[tokio::test]
async fn test_witness_intake_enforces_allow_list() {
    let rig = rig(&[SIGNER_A, SIGNER_B, SIGNER_C], 3, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    let blob = witness_blob_hex(&[SIGNER_A, OUTSIDER]);
    let outcome = rig.coordinator.submit_witness(&created.session_id, &blob, None).expect("submit witness");
    assert_eq!(outcome.accepted, vec![signer_key_hash(SIGNER_A).to_string()]);
    assert_eq!(outcome.ignored, vec![signer_key_hash(OUTSIDER).to_string()]);
    assert_eq!(outcome.collected, 1);
    assert_eq!(outcome.required, 3);
}

#[tokio::test]
async fn test_submit_is_gated_on_threshold_and_touches_no_gateway() {
    let rig = rig(&[SIGNER_A, SIGNER_B], 2, vec![coin_utxo(3, 0, 10_000_000)]);
    let created = rig.coordinator.create_session(sweep_request()).await.expect("create");

    rig.coordinator.submit_witness(&created.session_id, &witness_blob_hex(&[SIGNER_A]), None).expect("witness");
    let err = rig.coordinator.submit(&created.session_id).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::NotEnoughWitnesses { collected: 1, required: 2 }));
    assert_eq!(rig.gateway.submission_count(), 0);
}

#[test]
fn test_script_summary_of_at_least_tree() {
    let script_bytes = at_least_script(2, &[SIGNER_A, SIGNER_B, SIGNER_C]);
    let summary = summarize(&script_bytes).expect("summarize");

    assert_eq!(summary.m_required, 2);
    assert_eq!(summary.required_key_hashes.len(), 3);
    for seed in [SIGNER_A, SIGNER_B, SIGNER_C] {
        assert!(summary.required_key_hashes.contains(&signer_key_hash(seed)));
    }
    assert_eq!(summary.script_hash.as_bytes().len(), 28);

    // deterministic: summarizing again yields the same hash
    assert_eq!(summarize(&script_bytes).expect("summarize").script_hash, summary.script_hash);
}
