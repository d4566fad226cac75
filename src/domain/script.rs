//! Native-script analysis: decode the CBOR tree, derive the effective signing
//! threshold, the signer allow-list, the script hash, and validity bounds.
//! Also derives the bech32 addresses controlled by a script credential.

use crate::domain::codec::decode_cbor;
use crate::domain::hashes::script_hash_of_bytes;
use crate::foundation::{CoordinatorError, KeyHash, Result, ScriptHash};
use pallas_addresses::{Address, Network, ShelleyAddress, ShelleyDelegationPart, ShelleyPaymentPart};
use pallas_crypto::hash::Hash;
use pallas_primitives::alonzo::NativeScript;
use serde::Serialize;
use std::collections::BTreeSet;

/// Flattened structure description of a script tree, for human review.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ScriptTraceNode {
    pub depth: u32,
    pub kind: &'static str,
    pub detail: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ScriptSummary {
    pub m_required: u32,
    pub required_key_hashes: Vec<KeyHash>,
    pub script_hash: ScriptHash,
    pub invalid_before: Option<u64>,
    pub invalid_hereafter: Option<u64>,
    pub trace: Vec<ScriptTraceNode>,
}

#[derive(Default)]
struct Walk {
    at_least: Vec<u32>,
    any_seen: bool,
    invalid_before: Option<u64>,
    invalid_hereafter: Option<u64>,
    trace: Vec<ScriptTraceNode>,
}

impl Walk {
    /// Returns the distinct key hashes reachable from this node, so every
    /// `at_least` threshold can be checked against what its own subtree can
    /// actually produce.
    fn visit(&mut self, script: &NativeScript, depth: u32) -> Result<BTreeSet<KeyHash>> {
        match script {
            NativeScript::ScriptPubkey(key_hash) => {
                let kh = KeyHash::new(key_hash_bytes(key_hash));
                self.trace.push(ScriptTraceNode { depth, kind: "pubkey", detail: Some(kh.to_string()) });
                Ok(BTreeSet::from([kh]))
            }
            NativeScript::ScriptAll(subs) => {
                self.trace.push(ScriptTraceNode { depth, kind: "all", detail: Some(format!("{} branches", subs.len())) });
                self.visit_children(subs, depth)
            }
            NativeScript::ScriptAny(subs) => {
                self.any_seen = true;
                self.trace.push(ScriptTraceNode { depth, kind: "any", detail: Some(format!("{} branches", subs.len())) });
                self.visit_children(subs, depth)
            }
            NativeScript::ScriptNOfK(n, subs) => {
                self.trace.push(ScriptTraceNode { depth, kind: "at_least", detail: Some(format!("{n} of {}", subs.len())) });
                let keys = self.visit_children(subs, depth)?;
                if *n == 0 || *n as usize > keys.len() {
                    return Err(CoordinatorError::InvalidScript(format!(
                        "at_least requires {n} signatures but its subtree reaches {} distinct keys",
                        keys.len()
                    )));
                }
                self.at_least.push(*n);
                Ok(keys)
            }
            NativeScript::InvalidBefore(slot) => {
                self.trace.push(ScriptTraceNode { depth, kind: "invalid_before", detail: Some(slot.to_string()) });
                self.invalid_before = Some(self.invalid_before.map_or(*slot, |cur| cur.max(*slot)));
                Ok(BTreeSet::new())
            }
            NativeScript::InvalidHereafter(slot) => {
                self.trace.push(ScriptTraceNode { depth, kind: "invalid_hereafter", detail: Some(slot.to_string()) });
                self.invalid_hereafter = Some(self.invalid_hereafter.map_or(*slot, |cur| cur.min(*slot)));
                Ok(BTreeSet::new())
            }
        }
    }

    fn visit_children(&mut self, subs: &[NativeScript], depth: u32) -> Result<BTreeSet<KeyHash>> {
        let mut keys = BTreeSet::new();
        for sub in subs {
            keys.extend(self.visit(sub, depth + 1)?);
        }
        Ok(keys)
    }
}

pub fn parse_script(script_bytes: &[u8]) -> Result<NativeScript> {
    decode_cbor::<NativeScript>(script_bytes).map_err(|err| CoordinatorError::InvalidScript(err.to_string()))
}

/// One walk over the decoded tree. The threshold rule:
/// max `n` over `at_least` nodes when present, else 1 when any `any` node is
/// present, else the full key count (the tree behaves as `all`).
///
/// The summary upholds `m_required <= |required_key_hashes|`: a tree whose
/// threshold cannot be met by the keys it reaches is rejected rather than
/// surfaced as an unsatisfiable session.
pub fn summarize(script_bytes: &[u8]) -> Result<ScriptSummary> {
    let script = parse_script(script_bytes)?;
    let mut walk = Walk::default();
    let keys = walk.visit(&script, 0)?;

    let key_count = keys.len() as u32;
    let m_required = if let Some(max_n) = walk.at_least.iter().max() {
        *max_n
    } else if walk.any_seen {
        1
    } else {
        key_count
    };
    if m_required > key_count {
        return Err(CoordinatorError::InvalidScript(format!(
            "script requires {m_required} signatures but reaches only {key_count} distinct keys"
        )));
    }

    Ok(ScriptSummary {
        m_required,
        required_key_hashes: keys.into_iter().collect(),
        script_hash: script_hash_of_bytes(script_bytes),
        invalid_before: walk.invalid_before,
        invalid_hereafter: walk.invalid_hereafter,
        trace: walk.trace,
    })
}

fn key_hash_bytes(hash: &Hash<28>) -> [u8; 28] {
    let mut out = [0u8; 28];
    out.copy_from_slice(hash.as_ref());
    out
}

fn network_from_id(network_id: u8) -> Result<Network> {
    match network_id {
        0 => Ok(Network::Testnet),
        1 => Ok(Network::Mainnet),
        other => Err(CoordinatorError::InvalidAddress(format!("unknown network id {other}"))),
    }
}

/// Enterprise address (payment script only, no staking part).
pub fn enterprise_address(payment: &ScriptHash, network_id: u8) -> Result<String> {
    let network = network_from_id(network_id)?;
    let address =
        ShelleyAddress::new(network, ShelleyPaymentPart::Script(Hash::new(payment.into_bytes())), ShelleyDelegationPart::Null);
    Ok(address.to_bech32()?)
}

/// Base address: payment script plus stake script.
pub fn base_address(payment: &ScriptHash, stake: &ScriptHash, network_id: u8) -> Result<String> {
    let network = network_from_id(network_id)?;
    let address = ShelleyAddress::new(
        network,
        ShelleyPaymentPart::Script(Hash::new(payment.into_bytes())),
        ShelleyDelegationPart::Script(Hash::new(stake.into_bytes())),
    );
    Ok(address.to_bech32()?)
}

/// The payment credential of a bech32 address, which must be a script hash.
pub fn payment_script_hash_of(address: &str) -> Result<ScriptHash> {
    match Address::from_bech32(address)? {
        Address::Shelley(shelley) => match shelley.payment() {
            ShelleyPaymentPart::Script(hash) => Ok(ScriptHash::new(key_hash_bytes(hash))),
            ShelleyPaymentPart::Key(_) => {
                Err(CoordinatorError::InvalidAddress(format!("payment credential of {address} is a key, expected a script")))
            }
        },
        _ => Err(CoordinatorError::InvalidAddress(format!("{address} is not a shelley-era address"))),
    }
}

/// Raw address bytes for embedding in a transaction output.
pub fn address_bytes(address: &str) -> Result<Vec<u8>> {
    let parsed = Address::from_bech32(address)?;
    Ok(parsed.to_vec())
}
