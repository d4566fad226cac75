//! Deterministic construction of the unsigned transaction body.
//!
//! The builder consumes every UTxO at the source address (naive selection is
//! the contract), lays out outputs per mode, and runs a two-pass buffered
//! min-fee computation so the declared fee stays valid once the key witnesses
//! are appended after body finalization.

use crate::domain::codec::{encode_cbor, witness_set};
use crate::domain::hashes::body_hash;
use crate::domain::script::{self, ScriptSummary};
use crate::domain::tx::fee::{min_fee, witness_buffer, WITNESS_SIZE_ESTIMATE};
use crate::domain::tx::results::{BuildArtifact, PreviewInput, PreviewOutput, TxPreview};
use crate::domain::tx::{ProtocolParams, TxMode, Utxo};
use crate::domain::value::{AmountEntry, Value};
use crate::foundation::{CoordinatorError, KeyHash, Result};
use log::{debug, info};
use pallas_codec::utils::{Bytes, KeyValuePairs, Nullable};
use pallas_crypto::hash::Hash;
use pallas_primitives::alonzo::{NativeScript, TransactionBody, TransactionInput, TransactionOutput, Tx, Value as ChainValue};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    pub address: String,
    pub value: Value,
}

#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub mode: TxMode,
    pub multisig_address: String,
    pub script_bytes: Vec<u8>,
    /// Witness allow-list; taken from configuration, not re-derived from the script.
    pub required_key_hashes: Vec<KeyHash>,
    pub m_required: u32,
    pub dest_address: Option<String>,
    pub outputs: Vec<OutputSpec>,
    pub min_ada_lovelace: u64,
}

pub fn build(req: &BuildRequest, utxos: &[Utxo], params: &ProtocolParams) -> Result<BuildArtifact> {
    if req.required_key_hashes.is_empty() {
        return Err(CoordinatorError::MissingParams("required_key_hashes".to_string()));
    }
    if req.m_required == 0 || req.m_required as usize > req.required_key_hashes.len() {
        return Err(CoordinatorError::MissingParams(format!(
            "m_required must be in 1..={}, got {}",
            req.required_key_hashes.len(),
            req.m_required
        )));
    }

    let summary = script::summarize(&req.script_bytes)?;
    let credential = script::payment_script_hash_of(&req.multisig_address)?;
    if summary.script_hash != credential {
        return Err(CoordinatorError::InvalidScript(format!(
            "script hash {} does not match the payment credential {} of {}",
            summary.script_hash, credential, req.multisig_address
        )));
    }
    let native_script = script::parse_script(&req.script_bytes)?;

    // One fetch per build; sort so identical UTxO sets produce identical bodies.
    let mut inputs = utxos.to_vec();
    inputs.sort_by(|a, b| a.tx_hash.cmp(&b.tx_hash).then(a.output_index.cmp(&b.output_index)));
    if inputs.is_empty() {
        return Err(CoordinatorError::InsufficientAda { available: 0, needed: req.min_ada_lovelace });
    }

    let total_in = inputs.iter().fold(Value::default(), |acc, utxo| acc.add(&utxo.value));
    debug!("build inputs mode={} utxo_count={} total_coin={}", req.mode, inputs.len(), total_in.coin);

    let (outputs, change_address) = plan_outputs(req, &total_in)?;
    let outputs_sum = outputs.iter().fold(Value::default(), |acc, out| acc.add(&out.value));

    // Token sufficiency is independent of the fee; surface it before fee math.
    total_in.sub(&outputs_sum)?;

    let buffer = witness_buffer(params, req.m_required);

    // Pass 1: fee over the body without change.
    let tx0 = serialize_unsigned(&make_body(&inputs, &outputs, None, 0, &summary, &req.required_key_hashes)?, &native_script)?;
    let fee1 = min_fee(tx0.len(), params).saturating_add(buffer);
    let change1 = compute_change(&total_in, &outputs_sum, fee1, req.min_ada_lovelace, change_address)?;

    // Pass 2: recompute with the change output present and re-level the change.
    let tx1 = serialize_unsigned(&make_body(&inputs, &outputs, change1.as_ref(), fee1, &summary, &req.required_key_hashes)?, &native_script)?;
    let fee = min_fee(tx1.len(), params).saturating_add(buffer);
    let change = compute_change(&total_in, &outputs_sum, fee, req.min_ada_lovelace, change_address)?;

    let body = make_body(&inputs, &outputs, change.as_ref(), fee, &summary, &req.required_key_hashes)?;
    let unsigned_tx_bytes = serialize_unsigned(&body, &native_script)?;

    let projected_size = unsigned_tx_bytes.len() + (WITNESS_SIZE_ESTIMATE as usize) * req.m_required as usize;
    if projected_size > params.max_tx_size as usize {
        return Err(CoordinatorError::TxTooLarge { size: projected_size, max: params.max_tx_size as usize });
    }

    let mut all_outputs = outputs.clone();
    if let Some(change_out) = &change {
        all_outputs.push(change_out.clone());
    }
    verify_conservation(&total_in, &all_outputs, fee)?;

    let body_bytes = encode_cbor(&body)?;
    let session_id = body_hash(&body_bytes);
    info!(
        "built unsigned tx session_id={} mode={} inputs={} outputs={} fee={} size={}",
        session_id,
        req.mode,
        inputs.len(),
        all_outputs.len(),
        fee,
        unsigned_tx_bytes.len()
    );

    Ok(BuildArtifact {
        session_id,
        body_bytes,
        unsigned_tx_bytes,
        script_bytes: req.script_bytes.clone(),
        fee,
        preview: preview(&inputs, &all_outputs, fee),
    })
}

/// Outputs before change, plus the address change is sent to.
fn plan_outputs<'a>(req: &'a BuildRequest, total_in: &Value) -> Result<(Vec<OutputSpec>, &'a str)> {
    match req.mode {
        TxMode::SweepAll => {
            let dest = req.dest_address.as_deref().ok_or_else(|| CoordinatorError::MissingParams("dest_address".to_string()))?;
            script::address_bytes(dest)?;
            let swept = Value::new(req.min_ada_lovelace, total_in.assets().clone());
            Ok((vec![OutputSpec { address: dest.to_string(), value: swept }], dest))
        }
        TxMode::Explicit => {
            if req.outputs.is_empty() {
                return Err(CoordinatorError::MissingParams("outputs".to_string()));
            }
            let mut outputs = Vec::with_capacity(req.outputs.len());
            for spec in &req.outputs {
                script::address_bytes(&spec.address)?;
                if spec.value.is_empty() {
                    return Err(CoordinatorError::MissingParams(format!("output to {} has no value", spec.address)));
                }
                outputs.push(OutputSpec {
                    address: spec.address.clone(),
                    value: spec.value.clone().ensure_min_ada_if_tokens(req.min_ada_lovelace),
                });
            }
            Ok((outputs, req.multisig_address.as_str()))
        }
    }
}

fn compute_change(
    total_in: &Value,
    outputs_sum: &Value,
    fee: u64,
    min_ada: u64,
    change_address: &str,
) -> Result<Option<OutputSpec>> {
    let needed = outputs_sum.add(&Value::from_coin(fee));
    let residual = total_in.sub(&needed).map_err(|err| match err {
        CoordinatorError::InsufficientAda { .. } => CoordinatorError::InsufficientAda { available: total_in.coin, needed: needed.coin },
        other => other,
    })?;
    if residual.is_empty() {
        return Ok(None);
    }
    if residual.has_assets() && residual.coin < min_ada {
        return Err(CoordinatorError::ChangeBelowMinAda { coin: residual.coin, floor: min_ada });
    }
    Ok(Some(OutputSpec { address: change_address.to_string(), value: residual }))
}

fn make_body(
    inputs: &[Utxo],
    outputs: &[OutputSpec],
    change: Option<&OutputSpec>,
    fee: u64,
    summary: &ScriptSummary,
    required: &[KeyHash],
) -> Result<TransactionBody> {
    let tx_inputs = inputs
        .iter()
        .map(|utxo| TransactionInput { transaction_id: Hash::new(utxo.tx_hash.into_bytes()), index: utxo.output_index as u64 })
        .collect();

    let mut tx_outputs = Vec::with_capacity(outputs.len() + 1);
    for spec in outputs.iter().chain(change) {
        tx_outputs.push(to_tx_output(spec)?);
    }

    Ok(TransactionBody {
        inputs: tx_inputs,
        outputs: tx_outputs,
        fee,
        ttl: summary.invalid_hereafter,
        certificates: None,
        withdrawals: None,
        update: None,
        auxiliary_data_hash: None,
        validity_interval_start: summary.invalid_before,
        mint: None,
        script_data_hash: None,
        collateral: None,
        required_signers: Some(required.iter().map(|kh| Hash::new(kh.into_bytes())).collect()),
        network_id: None,
    })
}

fn to_tx_output(spec: &OutputSpec) -> Result<TransactionOutput> {
    Ok(TransactionOutput {
        address: Bytes::from(script::address_bytes(&spec.address)?),
        amount: to_chain_value(&spec.value),
        datum_hash: None,
    })
}

fn to_chain_value(value: &Value) -> ChainValue {
    if !value.has_assets() {
        return ChainValue::Coin(value.coin);
    }
    let policies: Vec<_> = value
        .assets()
        .iter()
        .map(|(policy, names)| {
            let entries: Vec<(Bytes, u64)> =
                names.iter().map(|(name, qty)| (Bytes::from(name.as_bytes().to_vec()), *qty)).collect();
            (Hash::new(policy.into_bytes()), KeyValuePairs::from(entries))
        })
        .collect();
    ChainValue::Multiasset(value.coin, KeyValuePairs::from(policies))
}

/// The unsigned transaction: body plus a witness set holding only the native
/// script. Key witnesses are appended at assembly.
fn serialize_unsigned(body: &TransactionBody, native_script: &NativeScript) -> Result<Vec<u8>> {
    let tx = Tx {
        transaction_body: body.clone(),
        transaction_witness_set: witness_set(None, Some(vec![native_script.clone()])),
        success: true,
        auxiliary_data: Nullable::Null,
    };
    encode_cbor(&tx)
}

/// `Σ inputs == Σ outputs + fee`, exactly, per component.
fn verify_conservation(total_in: &Value, all_outputs: &[OutputSpec], fee: u64) -> Result<()> {
    let spent = all_outputs.iter().fold(Value::from_coin(fee), |acc, out| acc.add(&out.value));
    if spent != *total_in {
        return Err(CoordinatorError::ConservationViolated(format!(
            "inputs carry coin={} but outputs+fee account for coin={}",
            total_in.coin, spent.coin
        )));
    }
    Ok(())
}

fn preview(inputs: &[Utxo], all_outputs: &[OutputSpec], fee: u64) -> TxPreview {
    TxPreview {
        outputs: all_outputs
            .iter()
            .map(|out| PreviewOutput {
                address: out.address.clone(),
                coin: out.value.coin.to_string(),
                assets: amount_entries(&out.value),
            })
            .collect(),
        fee: fee.to_string(),
        inputs: inputs
            .iter()
            .map(|utxo| PreviewInput {
                tx_hash: utxo.tx_hash.to_string(),
                output_index: utxo.output_index,
                coin: utxo.value.coin.to_string(),
                assets: amount_entries(&utxo.value),
            })
            .collect(),
    }
}

fn amount_entries(value: &Value) -> Vec<AmountEntry> {
    value.asset_entries().into_iter().map(|(unit, qty)| AmountEntry { unit, quantity: qty.to_string() }).collect()
}
