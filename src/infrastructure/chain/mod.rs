//! Chain gateway: the abstract read/write interface over the indexer.

use crate::domain::tx::{ProtocolParams, Utxo};
use crate::foundation::{CoordinatorError, Result, TxId};
use async_trait::async_trait;
use pallas_crypto::hash::Hasher;
use std::sync::Mutex;

#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// All unspent outputs at a bech32 address. Ordering is the indexer's;
    /// callers needing determinism must sort.
    async fn utxos_at(&self, address: &str) -> Result<Vec<Utxo>>;

    async fn protocol_parameters(&self) -> Result<ProtocolParams>;

    /// Submit a serialized transaction; returns its hash on acceptance.
    async fn submit(&self, tx_bytes: &[u8]) -> Result<TxId>;
}

/// Test double: seeded UTxOs and parameters, recorded submissions.
pub struct MockGateway {
    utxos: Mutex<Vec<Utxo>>,
    params: Mutex<ProtocolParams>,
    submitted: Mutex<Vec<Vec<u8>>>,
    reject_submit_with: Mutex<Option<String>>,
}

impl MockGateway {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            utxos: Mutex::new(Vec::new()),
            params: Mutex::new(params),
            submitted: Mutex::new(Vec::new()),
            reject_submit_with: Mutex::new(None),
        }
    }

    pub fn with_utxos(params: ProtocolParams, utxos: Vec<Utxo>) -> Self {
        let gateway = Self::new(params);
        if let Ok(mut entries) = gateway.utxos.lock() {
            *entries = utxos;
        }
        gateway
    }

    pub fn push_utxo(&self, utxo: Utxo) {
        if let Ok(mut entries) = self.utxos.lock() {
            entries.push(utxo);
        }
    }

    pub fn reject_next_submit(&self, diagnostic: impl Into<String>) {
        if let Ok(mut slot) = self.reject_submit_with.lock() {
            *slot = Some(diagnostic.into());
        }
    }

    pub fn submissions(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().map(|entries| entries.clone()).unwrap_or_default()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn utxos_at(&self, _address: &str) -> Result<Vec<Utxo>> {
        let entries = self.utxos.lock().map_err(|_| CoordinatorError::storage("mock utxo lock", "poisoned"))?;
        Ok(entries.clone())
    }

    async fn protocol_parameters(&self) -> Result<ProtocolParams> {
        let params = self.params.lock().map_err(|_| CoordinatorError::storage("mock params lock", "poisoned"))?;
        Ok(*params)
    }

    async fn submit(&self, tx_bytes: &[u8]) -> Result<TxId> {
        if let Ok(mut slot) = self.reject_submit_with.lock() {
            if let Some(diagnostic) = slot.take() {
                return Err(CoordinatorError::SubmitRejected { diagnostic });
            }
        }
        if let Ok(mut entries) = self.submitted.lock() {
            entries.push(tx_bytes.to_vec());
        }
        let digest = Hasher::<256>::hash(tx_bytes);
        TxId::from_slice(digest.as_ref())
    }
}

pub mod blockfrost;

pub use blockfrost::BlockfrostGateway;
