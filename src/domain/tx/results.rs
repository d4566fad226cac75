use crate::domain::value::AmountEntry;
use crate::foundation::SessionId;
use serde::{Deserialize, Serialize};

/// Literal view of what will be signed, for human verification. All
/// quantities are decimal strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxPreview {
    pub outputs: Vec<PreviewOutput>,
    pub fee: String,
    pub inputs: Vec<PreviewInput>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewOutput {
    pub address: String,
    pub coin: String,
    pub assets: Vec<AmountEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewInput {
    pub tx_hash: String,
    pub output_index: u32,
    pub coin: String,
    pub assets: Vec<AmountEntry>,
}

/// Everything a build produces; the body hash doubles as the session id.
#[derive(Clone, Debug)]
pub struct BuildArtifact {
    pub session_id: SessionId,
    pub body_bytes: Vec<u8>,
    pub unsigned_tx_bytes: Vec<u8>,
    pub script_bytes: Vec<u8>,
    pub fee: u64,
    pub preview: TxPreview,
}
