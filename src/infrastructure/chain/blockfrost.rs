//! HTTP indexer client (Blockfrost-style API). One network request per
//! gateway call, each under the caller-supplied deadline.

use crate::domain::tx::{ProtocolParams, Utxo};
use crate::domain::value::{AmountEntry, Value};
use crate::foundation::{ChainFault, CoordinatorError, Result, TxId};
use crate::infrastructure::config::NetworkKind;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;

use super::ChainGateway;

const PROJECT_ID_HEADER: &str = "project_id";
const UTXO_PAGE_SIZE: usize = 100;

pub struct BlockfrostGateway {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    deadline: Duration,
}

impl BlockfrostGateway {
    pub fn for_network(network: NetworkKind, project_id: impl Into<String>, deadline: Duration) -> Self {
        Self::new(network.indexer_base_url(), project_id, deadline)
    }

    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>, deadline: Duration) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), project_id: project_id.into(), deadline }
    }

    async fn with_deadline<F, T>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("gateway deadline exceeded operation={} deadline_secs={}", operation, self.deadline.as_secs());
                Err(ChainFault::Timeout { secs: self.deadline.as_secs() }.into())
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).header(PROJECT_ID_HEADER, &self.project_id).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainFault::IndexerStatus { status: status.as_u16(), body }.into());
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ChainGateway for BlockfrostGateway {
    async fn utxos_at(&self, address: &str) -> Result<Vec<Utxo>> {
        self.with_deadline("utxos_at", async {
            let mut out = Vec::new();
            let mut page = 1usize;
            loop {
                let path = format!("/addresses/{address}/utxos?order=desc&count={UTXO_PAGE_SIZE}&page={page}");
                let batch: Vec<UtxoJson> = match self.get_json(&path).await {
                    Ok(batch) => batch,
                    // The indexer reports a never-used address as 404.
                    Err(CoordinatorError::Chain(ChainFault::IndexerStatus { status: 404, .. })) if page == 1 => Vec::new(),
                    Err(err) => return Err(err),
                };
                let batch_len = batch.len();
                for entry in batch {
                    out.push(entry.into_utxo()?);
                }
                if batch_len < UTXO_PAGE_SIZE {
                    break;
                }
                page += 1;
            }
            debug!("fetched utxos address={} count={}", address, out.len());
            Ok(out)
        })
        .await
    }

    async fn protocol_parameters(&self) -> Result<ProtocolParams> {
        self.with_deadline("protocol_parameters", async {
            let raw: ParamsJson = self.get_json("/epochs/latest/parameters").await?;
            raw.into_params()
        })
        .await
    }

    async fn submit(&self, tx_bytes: &[u8]) -> Result<TxId> {
        self.with_deadline("submit", async {
            let url = format!("{}/tx/submit", self.base_url);
            let response = self
                .http
                .post(&url)
                .header(PROJECT_ID_HEADER, &self.project_id)
                .header(reqwest::header::CONTENT_TYPE, "application/cbor")
                .body(tx_bytes.to_vec())
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                warn!("submit rejected status={} body={}", status.as_u16(), body);
                return Err(CoordinatorError::SubmitRejected { diagnostic: body });
            }
            let hash_text = serde_json::from_str::<String>(&body).unwrap_or_else(|_| body.trim().trim_matches('"').to_string());
            let tx_id = TxId::from_str(&hash_text)?;
            info!("submit accepted tx_hash={}", tx_id);
            Ok(tx_id)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct UtxoJson {
    tx_hash: String,
    output_index: u32,
    amount: Vec<AmountEntry>,
}

impl UtxoJson {
    fn into_utxo(self) -> Result<Utxo> {
        let value = Value::from_wire_amounts(self.amount.iter().map(|entry| (entry.unit.as_str(), entry.quantity.as_str())))?;
        Ok(Utxo { tx_hash: TxId::from_str(&self.tx_hash)?, output_index: self.output_index, value })
    }
}

/// Parameter quantities arrive as numbers or decimal strings depending on
/// magnitude; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> std::result::Result<u64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
        }
    }
}

fn u64_flexible<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_u64()
}

fn u64_flexible_opt<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(raw) => raw.into_u64().map(Some),
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct ParamsJson {
    #[serde(deserialize_with = "u64_flexible")]
    min_fee_a: u64,
    #[serde(deserialize_with = "u64_flexible")]
    min_fee_b: u64,
    #[serde(deserialize_with = "u64_flexible")]
    pool_deposit: u64,
    #[serde(deserialize_with = "u64_flexible")]
    key_deposit: u64,
    #[serde(deserialize_with = "u64_flexible")]
    max_val_size: u64,
    #[serde(deserialize_with = "u64_flexible")]
    max_tx_size: u64,
    #[serde(default, deserialize_with = "u64_flexible_opt")]
    coins_per_utxo_size: Option<u64>,
    /// Legacy field name still served by older indexer deployments.
    #[serde(default, deserialize_with = "u64_flexible_opt")]
    coins_per_utxo_byte: Option<u64>,
}

impl ParamsJson {
    fn into_params(self) -> Result<ProtocolParams> {
        let coins_per_utxo_size = self
            .coins_per_utxo_size
            .or(self.coins_per_utxo_byte)
            .ok_or_else(|| CoordinatorError::EncodingError("parameters carry neither coins_per_utxo_size nor coins_per_utxo_byte".to_string()))?;
        Ok(ProtocolParams {
            min_fee_a: self.min_fee_a,
            min_fee_b: self.min_fee_b,
            pool_deposit: self.pool_deposit,
            key_deposit: self.key_deposit,
            max_val_size: self.max_val_size,
            max_tx_size: self.max_tx_size,
            coins_per_utxo_size,
        })
    }
}
