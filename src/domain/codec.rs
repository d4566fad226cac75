//! Thin wrappers over the chain CBOR codec so encode/decode failures map to
//! crate errors in one place.

use crate::foundation::{CoordinatorError, Result};
use pallas_codec::minicbor;
use pallas_primitives::alonzo::{NativeScript, VKeyWitness, WitnessSet};

pub fn encode_cbor<T>(value: &T) -> Result<Vec<u8>>
where
    T: minicbor::Encode<()>,
{
    minicbor::to_vec(value)
        .map_err(|err| CoordinatorError::SerializationError { format: "cbor".to_string(), details: err.to_string() })
}

pub fn decode_cbor<'b, T>(bytes: &'b [u8]) -> Result<T>
where
    T: minicbor::Decode<'b, ()>,
{
    minicbor::decode(bytes).map_err(CoordinatorError::from)
}

/// Witness-set constructor; the Plutus-era fields stay empty for native-script spends.
pub fn witness_set(vkeys: Option<Vec<VKeyWitness>>, native_scripts: Option<Vec<NativeScript>>) -> WitnessSet {
    WitnessSet {
        vkeywitness: vkeys,
        native_script: native_scripts,
        bootstrap_witness: None,
        plutus_script: None,
        plutus_data: None,
        redeemer: None,
    }
}

pub fn single_key_witness_set(witness: VKeyWitness) -> WitnessSet {
    witness_set(Some(vec![witness]), None)
}
