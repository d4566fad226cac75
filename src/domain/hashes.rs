//! Chain hashing rules. Everything here is blake2b, per the chain spec:
//! 224-bit for credentials (keys, scripts), 256-bit for transaction bodies.

use crate::foundation::{KeyHash, ScriptHash, SessionId, TxId};
use pallas_crypto::hash::{Hash, Hasher};

fn bytes28(hash: Hash<28>) -> [u8; 28] {
    let mut out = [0u8; 28];
    out.copy_from_slice(hash.as_ref());
    out
}

fn bytes32(hash: Hash<32>) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_ref());
    out
}

/// Hash of a serialized native script: the script bytes prefixed with the
/// native-script language tag (0), then blake2b-224.
pub fn script_hash_of_bytes(script_bytes: &[u8]) -> ScriptHash {
    let mut payload = Vec::with_capacity(script_bytes.len() + 1);
    payload.push(0);
    payload.extend_from_slice(script_bytes);
    ScriptHash::new(bytes28(Hasher::<224>::hash(&payload)))
}

/// Signer identity: blake2b-224 of the ed25519 verification key.
pub fn key_hash_of_vkey(vkey: &[u8]) -> KeyHash {
    KeyHash::new(bytes28(Hasher::<224>::hash(vkey)))
}

/// The session id IS the body hash: blake2b-256 over the serialized body.
pub fn body_hash(body_bytes: &[u8]) -> SessionId {
    SessionId::new(bytes32(Hasher::<256>::hash(body_bytes)))
}

/// A transaction id is the same digest as the body hash, typed for post-submit use.
pub fn tx_id_of_body(body_bytes: &[u8]) -> TxId {
    TxId::new(bytes32(Hasher::<256>::hash(body_bytes)))
}
