pub mod builder;
pub mod fee;
pub mod results;

pub use builder::{build, BuildRequest, OutputSpec};
pub use results::{BuildArtifact, PreviewInput, PreviewOutput, TxPreview};

use crate::domain::value::Value;
use crate::foundation::{CoordinatorError, Result, TxId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An unspent output at the controlled script address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    pub tx_hash: TxId,
    pub output_index: u32,
    pub value: Value,
}

/// Chain parameters the builder needs; fetched fresh for every build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub pool_deposit: u64,
    pub key_deposit: u64,
    pub max_val_size: u64,
    pub max_tx_size: u64,
    pub coins_per_utxo_size: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxMode {
    SweepAll,
    Explicit,
}

impl FromStr for TxMode {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sweep_all" | "sweep" => Ok(TxMode::SweepAll),
            "explicit" | "outputs" => Ok(TxMode::Explicit),
            other => Err(CoordinatorError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for TxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxMode::SweepAll => write!(f, "sweep_all"),
            TxMode::Explicit => write!(f, "explicit"),
        }
    }
}
