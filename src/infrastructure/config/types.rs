use crate::domain::script;
use crate::foundation::util::encoding::decode_hex_prefixed;
use crate::foundation::{CoordinatorError, KeyHash, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MIN_ADA_LOVELACE: u64 = 2_000_000;
pub const DEFAULT_GATEWAY_DEADLINE_SECS: u64 = 30;

/// Which chain deployment the coordinator talks to. Selects both the indexer
/// base URL and the address network id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Mainnet,
    #[default]
    Preprod,
}

impl NetworkKind {
    pub fn network_id(&self) -> u8 {
        match self {
            NetworkKind::Mainnet => 1,
            NetworkKind::Preprod => 0,
        }
    }

    pub fn indexer_base_url(&self) -> &'static str {
        match self {
            NetworkKind::Mainnet => "https://cardano-mainnet.blockfrost.io/api/v0",
            NetworkKind::Preprod => "https://cardano-preprod.blockfrost.io/api/v0",
        }
    }
}

impl FromStr for NetworkKind {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkKind::Mainnet),
            "preprod" => Ok(NetworkKind::Preprod),
            other => Err(CoordinatorError::ConfigError(format!("unknown network {other:?}, expected mainnet or preprod"))),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Mainnet => write!(f, "mainnet"),
            NetworkKind::Preprod => write!(f, "preprod"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub network: NetworkKind,
    /// Opaque header value authenticating against the indexer.
    pub indexer_project_id: String,
    /// Floor for the coin component of any token-carrying output.
    #[serde(default = "default_min_ada")]
    pub min_ada_lovelace: u64,
    /// Consumed by the HTTP layer; carried here so one file configures a deployment.
    #[serde(default)]
    pub allowed_origin: Option<String>,
    /// The script-controlled spend source.
    pub multisig_address: String,
    /// Serialized payment script whose hash is the address's payment credential.
    pub payment_script_cbor_hex: String,
    /// Witness allow-list, in presentation order.
    pub required_key_hashes: Vec<KeyHash>,
    pub m_required: u32,
    /// Default sweep destination; may be overridden per request.
    #[serde(default)]
    pub dest_address: Option<String>,
    #[serde(default = "default_deadline_secs")]
    pub gateway_deadline_secs: u64,
}

fn default_min_ada() -> u64 {
    DEFAULT_MIN_ADA_LOVELACE
}

fn default_deadline_secs() -> u64 {
    DEFAULT_GATEWAY_DEADLINE_SECS
}

impl CoordinatorConfig {
    pub fn script_bytes(&self) -> Result<Vec<u8>> {
        decode_hex_prefixed(&self.payment_script_cbor_hex)
            .map_err(|err| CoordinatorError::ConfigError(format!("payment_script_cbor_hex: {err}")))
    }

    /// Cross-check the deployment: the script must hash to the address's
    /// payment credential, and the threshold must fit the allow-list. A
    /// threshold differing from the script's own is logged, not rejected
    /// (the configured value is authoritative for witness validation).
    pub fn validate(&self) -> Result<()> {
        if self.indexer_project_id.trim().is_empty() {
            return Err(CoordinatorError::ConfigError("indexer_project_id must not be empty".to_string()));
        }
        if self.required_key_hashes.is_empty() {
            return Err(CoordinatorError::ConfigError("required_key_hashes must not be empty".to_string()));
        }
        if self.m_required == 0 || self.m_required as usize > self.required_key_hashes.len() {
            return Err(CoordinatorError::ConfigError(format!(
                "m_required must be in 1..={}, got {}",
                self.required_key_hashes.len(),
                self.m_required
            )));
        }

        let script_bytes = self.script_bytes()?;
        let summary = script::summarize(&script_bytes)?;
        let credential = script::payment_script_hash_of(&self.multisig_address)?;
        if summary.script_hash != credential {
            return Err(CoordinatorError::ConfigError(format!(
                "payment script hashes to {} but {} has payment credential {}",
                summary.script_hash, self.multisig_address, credential
            )));
        }
        if summary.m_required != self.m_required {
            warn!(
                "configured m_required={} differs from script threshold {}; configuration wins",
                self.m_required, summary.m_required
            );
        }
        for key_hash in &summary.required_key_hashes {
            if !self.required_key_hashes.contains(key_hash) {
                warn!("script references key hash {} that is missing from the configured allow-list", key_hash);
            }
        }

        if let Some(dest) = &self.dest_address {
            script::address_bytes(dest)?;
        }
        Ok(())
    }
}
