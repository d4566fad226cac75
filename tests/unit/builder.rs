use crate::fixtures::*;
use covault::domain::tx::builder::{build, BuildRequest, OutputSpec};
use covault::domain::tx::fee::{min_fee, witness_buffer};
use covault::domain::tx::{TxMode, Utxo};
use covault::domain::value::{AmountEntry, Value};
use covault::foundation::CoordinatorError;

fn sweep_request(signer_seeds: &[u8], m: u32) -> BuildRequest {
    let script_bytes = at_least_script(m, signer_seeds);
    BuildRequest {
        mode: TxMode::SweepAll,
        multisig_address: multisig_address_for(&script_bytes),
        script_bytes,
        required_key_hashes: signer_seeds.iter().map(|seed| signer_key_hash(*seed)).collect(),
        m_required: m,
        dest_address: Some(payment_address(0x77)),
        outputs: Vec::new(),
        min_ada_lovelace: MIN_ADA,
    }
}

fn explicit_request(signer_seeds: &[u8], m: u32, outputs: Vec<OutputSpec>) -> BuildRequest {
    BuildRequest { mode: TxMode::Explicit, dest_address: None, outputs, ..sweep_request(signer_seeds, m) }
}

fn coin_of(entry_coin: &str) -> u64 {
    entry_coin.parse().expect("decimal coin")
}

fn preview_conserves(preview: &covault::domain::tx::TxPreview) {
    let fee: u64 = preview.fee.parse().expect("fee");
    let in_coin: u64 = preview.inputs.iter().map(|input| coin_of(&input.coin)).sum();
    let out_coin: u64 = preview.outputs.iter().map(|output| coin_of(&output.coin)).sum();
    assert_eq!(in_coin, out_coin + fee, "coin conservation");

    let mut in_assets: Vec<AmountEntry> = preview.inputs.iter().flat_map(|input| input.assets.clone()).collect();
    let mut out_assets: Vec<AmountEntry> = preview.outputs.iter().flat_map(|output| output.assets.clone()).collect();
    in_assets.sort_by(|a, b| a.unit.cmp(&b.unit));
    out_assets.sort_by(|a, b| a.unit.cmp(&b.unit));
    assert_eq!(in_assets, out_assets, "asset conservation");
}

#[test]
fn test_sweep_when_single_coin_utxo_then_min_ada_out_plus_change() {
    let request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    let artifact = build(&request, &[coin_utxo(3, 0, 10_000_000)], &test_params()).expect("build");

    let preview = &artifact.preview;
    assert_eq!(preview.outputs.len(), 2);
    assert_eq!(preview.outputs[0].address, payment_address(0x77));
    assert_eq!(preview.outputs[0].coin, MIN_ADA.to_string());
    assert!(preview.outputs[0].assets.is_empty());
    assert_eq!(preview.outputs[1].address, payment_address(0x77));
    assert_eq!(coin_of(&preview.outputs[1].coin), 10_000_000 - MIN_ADA - artifact.fee);
    preview_conserves(preview);

    // fee sits between the size-linear minimum and minimum + witness buffer
    let params = test_params();
    let size = artifact.unsigned_tx_bytes.len();
    assert!(artifact.fee >= min_fee(size, &params));
    assert!(artifact.fee <= min_fee(size, &params) + witness_buffer(&params, 2));
}

#[test]
fn test_sweep_when_tokens_present_then_all_tokens_ride_first_output() {
    let request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    let artifact = build(&request, &[token_utxo(4, 1, 5_000_000, 0xAB, b"nimbus", 7)], &test_params()).expect("build");

    let preview = &artifact.preview;
    assert_eq!(preview.outputs.len(), 2);
    assert_eq!(preview.outputs[0].coin, MIN_ADA.to_string());
    assert_eq!(preview.outputs[0].assets, vec![AmountEntry { unit: unit_for(0xAB, b"nimbus"), quantity: "7".to_string() }]);
    assert_eq!(coin_of(&preview.outputs[1].coin), 5_000_000 - MIN_ADA - artifact.fee);
    assert!(preview.outputs[1].assets.is_empty());
    preview_conserves(preview);
}

#[test]
fn test_explicit_when_tokens_exceed_inputs_then_insufficient_tokens() {
    let mut value = Value::default();
    value.add_wire_amount("lovelace", "1500000").expect("coin");
    value.add_wire_amount(&unit_for(0xAB, b"nimbus"), "6").expect("tokens");
    let request = explicit_request(&[SIGNER_A, SIGNER_B], 2, vec![OutputSpec { address: payment_address(0x55), value }]);

    let err = build(&request, &[token_utxo(4, 0, 10_000_000, 0xAB, b"nimbus", 5)], &test_params()).unwrap_err();
    match err {
        CoordinatorError::InsufficientTokens { available, needed, .. } => {
            assert_eq!(available, 5);
            assert_eq!(needed, 6);
        }
        other => panic!("expected InsufficientTokens, got {other:?}"),
    }
}

#[test]
fn test_empty_utxo_set_fails_in_both_modes() {
    let sweep = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    assert!(matches!(build(&sweep, &[], &test_params()), Err(CoordinatorError::InsufficientAda { .. })));

    let mut value = Value::default();
    value.add_wire_amount("lovelace", "1000000").expect("coin");
    let explicit = explicit_request(&[SIGNER_A, SIGNER_B], 2, vec![OutputSpec { address: payment_address(0x55), value }]);
    assert!(matches!(build(&explicit, &[], &test_params()), Err(CoordinatorError::InsufficientAda { .. })));
}

#[test]
fn test_explicit_when_token_output_has_no_coin_then_bumped_to_floor() {
    let mut value = Value::default();
    value.add_wire_amount(&unit_for(0xAB, b"nimbus"), "5").expect("tokens");
    let request = explicit_request(&[SIGNER_A, SIGNER_B], 2, vec![OutputSpec { address: payment_address(0x55), value }]);

    let artifact = build(&request, &[token_utxo(4, 0, 10_000_000, 0xAB, b"nimbus", 5)], &test_params()).expect("build");
    let preview = &artifact.preview;
    assert_eq!(preview.outputs[0].coin, MIN_ADA.to_string());
    // change goes back to the multisig address and carries the coin remainder
    assert_eq!(preview.outputs[1].address, request.multisig_address);
    assert_eq!(coin_of(&preview.outputs[1].coin), 10_000_000 - MIN_ADA - artifact.fee);
    preview_conserves(preview);
}

#[test]
fn test_explicit_when_token_change_below_floor_then_rejected() {
    let mut value = Value::default();
    value.add_wire_amount(&unit_for(0xAB, b"nimbus"), "4").expect("tokens");
    let request = explicit_request(&[SIGNER_A, SIGNER_B], 2, vec![OutputSpec { address: payment_address(0x55), value }]);

    // one token stays behind; the residual coin cannot reach the floor
    let err = build(&request, &[token_utxo(4, 0, 4_000_000, 0xAB, b"nimbus", 5)], &test_params()).unwrap_err();
    assert!(matches!(err, CoordinatorError::ChangeBelowMinAda { floor: 2_000_000, .. }));
}

#[test]
fn test_explicit_when_token_change_remains_then_change_keeps_tokens_and_floor() {
    let mut value = Value::default();
    value.add_wire_amount("lovelace", "2000000").expect("coin");
    value.add_wire_amount(&unit_for(0xAB, b"nimbus"), "2").expect("tokens");
    let request = explicit_request(&[SIGNER_A, SIGNER_B], 2, vec![OutputSpec { address: payment_address(0x55), value }]);

    let artifact = build(&request, &[token_utxo(4, 0, 10_000_000, 0xAB, b"nimbus", 5)], &test_params()).expect("build");
    let preview = &artifact.preview;
    assert_eq!(preview.outputs.len(), 2);
    let change = &preview.outputs[1];
    assert_eq!(change.address, request.multisig_address);
    assert_eq!(change.assets, vec![AmountEntry { unit: unit_for(0xAB, b"nimbus"), quantity: "3".to_string() }]);
    assert!(coin_of(&change.coin) >= MIN_ADA);
    preview_conserves(preview);
}

#[test]
fn test_sweep_when_coin_cannot_cover_floor_and_fee_then_insufficient_ada() {
    let request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    let err = build(&request, &[coin_utxo(3, 0, 2_100_000)], &test_params()).unwrap_err();
    match err {
        CoordinatorError::InsufficientAda { available, needed } => {
            assert_eq!(available, 2_100_000);
            assert!(needed > available);
        }
        other => panic!("expected InsufficientAda, got {other:?}"),
    }
}

#[test]
fn test_build_is_deterministic_across_utxo_order() {
    let request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    let utxos = vec![coin_utxo(9, 1, 4_000_000), coin_utxo(2, 0, 6_000_000), coin_utxo(9, 0, 1_000_000)];
    let mut shuffled = utxos.clone();
    shuffled.reverse();

    let first = build(&request, &utxos, &test_params()).expect("build");
    let second = build(&request, &shuffled, &test_params()).expect("build");
    assert_eq!(first.session_id, second.session_id);
    assert_eq!(first.body_bytes, second.body_bytes);
}

#[test]
fn test_build_when_script_does_not_match_address_then_invalid_script() {
    let mut request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    let unrelated = at_least_script(1, &[SIGNER_C]);
    request.multisig_address = multisig_address_for(&unrelated);

    let err = build(&request, &[coin_utxo(3, 0, 10_000_000)], &test_params()).unwrap_err();
    assert!(matches!(err, CoordinatorError::InvalidScript(_)));
}

#[test]
fn test_sweep_without_destination_is_missing_params() {
    let mut request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    request.dest_address = None;
    let err = build(&request, &[coin_utxo(3, 0, 10_000_000)], &test_params()).unwrap_err();
    assert!(matches!(err, CoordinatorError::MissingParams(_)));
}

#[test]
fn test_required_signers_are_marked_in_the_body() {
    let request = sweep_request(&[SIGNER_A, SIGNER_B], 2);
    let artifact = build(&request, &[coin_utxo(3, 0, 10_000_000)], &test_params()).expect("build");

    let body: pallas_primitives::alonzo::TransactionBody =
        pallas_codec::minicbor::decode(&artifact.body_bytes).expect("decode body");
    let required = body.required_signers.expect("required signers");
    assert_eq!(required.len(), 2);
    assert_eq!(required[0].as_ref(), signer_key_hash(SIGNER_A).as_ref());

    let utxo: Vec<Utxo> = vec![coin_utxo(3, 0, 10_000_000)];
    let again = build(&request, &utxo, &test_params()).expect("rebuild");
    assert_eq!(artifact.session_id, again.session_id);
}
