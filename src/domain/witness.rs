//! Witness intake: parse a submitted blob, extract key witnesses, enforce the
//! allow-list, and normalize each accepted witness into a fresh single-key
//! witness set so signers cannot smuggle extra witness-set fields.

use crate::domain::codec::{decode_cbor, encode_cbor, single_key_witness_set};
use crate::domain::hashes::key_hash_of_vkey;
use crate::foundation::{CoordinatorError, KeyHash, Result};
use log::debug;
use pallas_primitives::alonzo::{Tx, VKeyWitness, WitnessSet};

#[derive(Clone, Debug)]
pub struct WitnessIngest {
    pub accepted: Vec<KeyHash>,
    pub ignored: Vec<KeyHash>,
    /// Normalized single-key witness sets, ready for storage, keyed by signer.
    pub entries: Vec<(KeyHash, Vec<u8>)>,
}

/// Accepts either a serialized witness set or a serialized full transaction
/// (the witness set is extracted from the latter).
pub fn ingest(blob: &[u8], allow_list: &[KeyHash]) -> Result<WitnessIngest> {
    let witnesses = extract_key_witnesses(blob)?;
    debug!("witness blob decoded key_witness_count={}", witnesses.len());

    let mut accepted = Vec::new();
    let mut ignored = Vec::new();
    let mut entries: Vec<(KeyHash, Vec<u8>)> = Vec::new();
    for witness in witnesses {
        let key_hash = key_hash_of_vkey(witness.vkey.as_slice());
        if !allow_list.contains(&key_hash) {
            if !ignored.contains(&key_hash) {
                ignored.push(key_hash);
            }
            continue;
        }
        let normalized = encode_cbor(&single_key_witness_set(witness))?;
        // same key twice in one blob: last one wins
        entries.retain(|(kh, _)| *kh != key_hash);
        entries.push((key_hash, normalized));
        if !accepted.contains(&key_hash) {
            accepted.push(key_hash);
        }
    }

    if accepted.is_empty() {
        return Err(CoordinatorError::SignerNotAllowed {
            observed: ignored.iter().map(|kh| kh.to_string()).collect(),
            required: allow_list.iter().map(|kh| kh.to_string()).collect(),
        });
    }

    Ok(WitnessIngest { accepted, ignored, entries })
}

fn extract_key_witnesses(blob: &[u8]) -> Result<Vec<VKeyWitness>> {
    if let Ok(witness_set) = decode_cbor::<WitnessSet>(blob) {
        return Ok(witness_set.vkeywitness.unwrap_or_default());
    }
    match decode_cbor::<Tx>(blob) {
        Ok(tx) => Ok(tx.transaction_witness_set.vkeywitness.unwrap_or_default()),
        Err(err) => Err(CoordinatorError::InvalidWitnessCbor(err.to_string())),
    }
}
