//! The coordinator owns the published operation surface: it orchestrates the
//! gateway, the builder, witness intake, and the session store. Transports
//! (HTTP or otherwise) are thin shells over these methods.

use crate::application::lifecycle::{LifecycleObserver, NoopObserver};
use crate::domain::codec::{decode_cbor, encode_cbor, witness_set};
use crate::domain::hashes::tx_id_of_body;
use crate::domain::script::{enterprise_address, parse_script, summarize, ScriptTraceNode};
use crate::domain::session::{ensure_valid_transition, SessionPhase, SessionRecord};
use crate::domain::tx::builder::{build, BuildRequest, OutputSpec};
use crate::domain::tx::{TxMode, TxPreview};
use crate::domain::value::{AmountEntry, Value, LOVELACE_UNIT};
use crate::domain::witness;
use crate::foundation::util::encoding::decode_hex_prefixed;
use crate::foundation::{CoordinatorError, KeyHash, Result, SessionId};
use crate::infrastructure::chain::ChainGateway;
use crate::infrastructure::config::CoordinatorConfig;
use crate::infrastructure::store::SessionStore;
use log::{debug, error, info, warn};
use pallas_codec::utils::Nullable;
use pallas_primitives::alonzo::{TransactionBody, Tx, VKeyWitness, WitnessSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputRequest {
    pub address: String,
    /// Decimal lovelace; omitted means "tokens only" (the min-ada bump applies).
    #[serde(default)]
    pub coin: Option<String>,
    #[serde(default)]
    pub assets: Vec<AmountEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub mode: String,
    #[serde(default)]
    pub dest_address: Option<String>,
    #[serde(default)]
    pub outputs: Option<Vec<OutputRequest>>,
    /// Per-request overrides of the deployment defaults.
    #[serde(default)]
    pub multisig_address: Option<String>,
    #[serde(default)]
    pub payment_script_cbor_hex: Option<String>,
    #[serde(default)]
    pub required_key_hashes: Option<Vec<KeyHash>>,
    #[serde(default)]
    pub m_required: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub preview: TxPreview,
    pub m_required: u32,
    pub required_key_hashes: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionBody {
    pub tx_hex: String,
    pub tx_body_hex: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct WitnessEntry {
    pub signer: String,
    pub witness_hex: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct WitnessList {
    pub witnesses: Vec<WitnessEntry>,
    pub m_required: u32,
    pub required_key_hashes: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WitnessAccepted {
    pub accepted: Vec<String>,
    pub ignored: Vec<String>,
    pub collected: usize,
    pub required: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionStatusView {
    pub session_id: String,
    pub phase: String,
    pub m_required: u32,
    pub required_key_hashes: Vec<String>,
    pub collected: Vec<String>,
    pub preview: TxPreview,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmitOutcome {
    pub tx_hash: String,
}

/// Analysis of the configured payment script, for signer-facing UIs.
#[derive(Clone, Debug, Serialize)]
pub struct ScriptInfo {
    pub script_hash: String,
    pub m_required: u32,
    pub required_key_hashes: Vec<String>,
    pub invalid_before: Option<u64>,
    pub invalid_hereafter: Option<u64>,
    pub trace: Vec<ScriptTraceNode>,
    pub enterprise_address: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetOutcome {
    pub cleared: usize,
}

/// The multisig target a build runs against: deployment defaults, unless the
/// request supplies its own.
struct SpendTarget {
    multisig_address: String,
    script_bytes: Vec<u8>,
    required_key_hashes: Vec<KeyHash>,
    m_required: u32,
    dest_address: Option<String>,
}

pub struct Coordinator {
    gateway: Arc<dyn ChainGateway>,
    store: Arc<dyn SessionStore>,
    observer: Arc<dyn LifecycleObserver>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(gateway: Arc<dyn ChainGateway>, store: Arc<dyn SessionStore>, config: CoordinatorConfig) -> Self {
        debug!("coordinator created network={}", config.network);
        Self { gateway, store, observer: Arc::new(NoopObserver), config }
    }

    pub fn with_observer(
        gateway: Arc<dyn ChainGateway>,
        store: Arc<dyn SessionStore>,
        observer: Arc<dyn LifecycleObserver>,
        config: CoordinatorConfig,
    ) -> Self {
        Self { gateway, store, observer, config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionCreated> {
        let mode = TxMode::from_str(&request.mode)?;
        let target = self.resolve_target(&request)?;
        let outputs = match &request.outputs {
            Some(entries) => entries.iter().map(output_spec).collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        info!(
            "create_session mode={} address={} outputs={} m_required={}",
            mode, target.multisig_address, outputs.len(), target.m_required
        );

        let utxos = self.gateway.utxos_at(&target.multisig_address).await?;
        let params = self.gateway.protocol_parameters().await?;

        let artifact = build(
            &BuildRequest {
                mode,
                multisig_address: target.multisig_address,
                script_bytes: target.script_bytes,
                required_key_hashes: target.required_key_hashes.clone(),
                m_required: target.m_required,
                dest_address: target.dest_address,
                outputs,
                min_ada_lovelace: self.config.min_ada_lovelace,
            },
            &utxos,
            &params,
        )?;

        let session_id = artifact.session_id;
        self.store.create(SessionRecord {
            session_id,
            body_bytes: artifact.body_bytes,
            unsigned_tx_bytes: artifact.unsigned_tx_bytes,
            script_bytes: artifact.script_bytes,
            m_required: target.m_required,
            required_key_hashes: target.required_key_hashes.clone(),
            preview: artifact.preview.clone(),
            witnesses: BTreeMap::new(),
        })?;
        self.observer.on_session_created(&session_id, target.m_required);

        Ok(SessionCreated {
            session_id: session_id.to_string(),
            preview: artifact.preview,
            m_required: target.m_required,
            required_key_hashes: hex_list(&target.required_key_hashes),
        })
    }

    pub fn get_body(&self, session_id: &str) -> Result<SessionBody> {
        let record = self.read_session(session_id)?;
        Ok(SessionBody { tx_hex: hex::encode(&record.unsigned_tx_bytes), tx_body_hex: hex::encode(&record.body_bytes) })
    }

    pub fn list_witnesses(&self, session_id: &str) -> Result<WitnessList> {
        let record = self.read_session(session_id)?;
        Ok(WitnessList {
            witnesses: record
                .witnesses
                .iter()
                .map(|(signer, bytes)| WitnessEntry { signer: signer.to_string(), witness_hex: hex::encode(bytes) })
                .collect(),
            m_required: record.m_required,
            required_key_hashes: hex_list(&record.required_key_hashes),
        })
    }

    pub fn submit_witness(&self, session_id: &str, witness_hex: &str, declared_signer: Option<&str>) -> Result<WitnessAccepted> {
        let record = self.read_session(session_id)?;
        let blob = decode_hex_prefixed(witness_hex).map_err(|err| CoordinatorError::InvalidWitnessCbor(err.to_string()))?;
        let ingest = witness::ingest(&blob, &record.required_key_hashes)?;

        if let Some(declared) = declared_signer {
            let matches = ingest.accepted.iter().any(|kh| kh.to_string() == declared.trim().to_ascii_lowercase());
            if !matches {
                warn!("declared signer {} not among accepted witnesses session_id={}", declared, record.session_id);
            }
        }

        let mut collected = record.collected();
        for (key_hash, witness_bytes) in ingest.entries {
            collected = self.store.append_witness(&record.session_id, key_hash, witness_bytes)?;
            self.observer.on_witness_added(&record.session_id, &key_hash, collected);
        }
        info!(
            "witnesses ingested session_id={} accepted={} ignored={} collected={}/{}",
            record.session_id,
            ingest.accepted.len(),
            ingest.ignored.len(),
            collected,
            record.m_required
        );
        if collected >= record.m_required as usize {
            self.observer.on_threshold_met(&record.session_id, collected, record.m_required);
        }

        Ok(WitnessAccepted {
            accepted: ingest.accepted.iter().map(|kh| kh.to_string()).collect(),
            ignored: ingest.ignored.iter().map(|kh| kh.to_string()).collect(),
            collected,
            required: record.m_required,
        })
    }

    pub fn status(&self, session_id: &str) -> Result<SessionStatusView> {
        let record = self.read_session(session_id)?;
        Ok(SessionStatusView {
            session_id: record.session_id.to_string(),
            phase: record.phase().as_str().to_string(),
            m_required: record.m_required,
            required_key_hashes: hex_list(&record.required_key_hashes),
            collected: record.witnesses.keys().map(|kh| kh.to_string()).collect(),
            preview: record.preview.clone(),
        })
    }

    /// Assemble body + native script + collected key witnesses and hand the
    /// final transaction to the gateway. Success clears the session;
    /// rejection leaves it intact for another attempt.
    pub async fn submit(&self, session_id: &str) -> Result<SubmitOutcome> {
        let record = self.read_session(session_id)?;
        if !record.is_ready() {
            return Err(CoordinatorError::NotEnoughWitnesses { collected: record.collected(), required: record.m_required as usize });
        }
        ensure_valid_transition(record.phase(), SessionPhase::Submitted)?;

        let tx_bytes = match self.assemble(&record) {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.poison_session(&record.session_id, &err.to_string())),
        };
        debug!(
            "submitting session_id={} size={} expected_tx_hash={}",
            record.session_id,
            tx_bytes.len(),
            tx_id_of_body(&record.body_bytes)
        );

        let tx_id = self.gateway.submit(&tx_bytes).await?;
        self.store.clear(&record.session_id)?;
        self.observer.on_submitted(&record.session_id, &tx_id);
        info!("submitted session_id={} tx_hash={} witnesses={}", record.session_id, tx_id, record.collected());
        Ok(SubmitOutcome { tx_hash: tx_id.to_string() })
    }

    /// Summarize the configured payment script and the address it controls.
    pub fn describe_script(&self) -> Result<ScriptInfo> {
        let script_bytes = self.config.script_bytes()?;
        let summary = summarize(&script_bytes)?;
        Ok(ScriptInfo {
            script_hash: summary.script_hash.to_string(),
            m_required: summary.m_required,
            required_key_hashes: summary.required_key_hashes.iter().map(|kh| kh.to_string()).collect(),
            invalid_before: summary.invalid_before,
            invalid_hereafter: summary.invalid_hereafter,
            trace: summary.trace,
            enterprise_address: enterprise_address(&summary.script_hash, self.config.network.network_id())?,
        })
    }

    pub fn reset(&self, session_id: Option<&str>) -> Result<ResetOutcome> {
        let cleared = match session_id {
            Some(raw) => {
                let id = SessionId::from_str(raw).map_err(|_| CoordinatorError::SessionNotFound(raw.to_string()))?;
                let existed = self.store.clear(&id)?;
                if existed {
                    self.observer.on_session_cleared(&id);
                }
                usize::from(existed)
            }
            None => self.store.clear_all()?,
        };
        info!("reset cleared={} scope={}", cleared, session_id.unwrap_or("all"));
        Ok(ResetOutcome { cleared })
    }

    fn resolve_target(&self, request: &CreateSessionRequest) -> Result<SpendTarget> {
        let script_hex = request.payment_script_cbor_hex.as_deref().unwrap_or(&self.config.payment_script_cbor_hex);
        let script_bytes =
            decode_hex_prefixed(script_hex).map_err(|err| CoordinatorError::InvalidScript(format!("script hex: {err}")))?;
        let required_key_hashes =
            request.required_key_hashes.clone().unwrap_or_else(|| self.config.required_key_hashes.clone());
        let m_required = request.m_required.unwrap_or(self.config.m_required);
        Ok(SpendTarget {
            multisig_address: request.multisig_address.clone().unwrap_or_else(|| self.config.multisig_address.clone()),
            script_bytes,
            required_key_hashes,
            m_required,
            dest_address: request.dest_address.clone().or_else(|| self.config.dest_address.clone()),
        })
    }

    fn read_session(&self, session_id: &str) -> Result<SessionRecord> {
        let id = SessionId::from_str(session_id).map_err(|_| CoordinatorError::SessionNotFound(session_id.to_string()))?;
        self.store.read(&id)?.ok_or_else(|| CoordinatorError::SessionNotFound(session_id.to_string()))
    }

    /// Re-parse stored artifacts and flatten the per-key witness sets into a
    /// final transaction. Witness order is normalized by sorted key hash
    /// (the store map is ordered).
    fn assemble(&self, record: &SessionRecord) -> Result<Vec<u8>> {
        let body: TransactionBody = decode_cbor(&record.body_bytes)
            .map_err(|err| CoordinatorError::Message(format!("stored body does not parse: {err}")))?;
        let native_script = parse_script(&record.script_bytes)
            .map_err(|err| CoordinatorError::Message(format!("stored script does not parse: {err}")))?;

        let mut vkeys: Vec<VKeyWitness> = Vec::with_capacity(record.witnesses.len());
        for (signer, witness_bytes) in &record.witnesses {
            let stored: WitnessSet = decode_cbor(witness_bytes)
                .map_err(|err| CoordinatorError::Message(format!("stored witness for {signer} does not parse: {err}")))?;
            let mut entries = stored
                .vkeywitness
                .ok_or_else(|| CoordinatorError::Message(format!("stored witness for {signer} holds no key witness")))?;
            vkeys.append(&mut entries);
        }

        let tx = Tx {
            transaction_body: body,
            transaction_witness_set: witness_set(Some(vkeys), Some(vec![native_script])),
            success: true,
            auxiliary_data: Nullable::Null,
        };
        encode_cbor(&tx)
    }

    /// A stored artifact that no longer parses is fatal for the session only:
    /// drop it and surface the diagnostic to the submitter.
    fn poison_session(&self, session_id: &SessionId, detail: &str) -> CoordinatorError {
        error!("session invariant violation, clearing session_id={} detail={}", session_id, detail);
        let _ = self.store.clear(session_id);
        self.observer.on_session_cleared(session_id);
        CoordinatorError::SubmitRejected { diagnostic: format!("session invariant violation: {detail}") }
    }
}

fn output_spec(request: &OutputRequest) -> Result<OutputSpec> {
    let mut value = Value::default();
    if let Some(coin) = &request.coin {
        value.add_wire_amount(LOVELACE_UNIT, coin)?;
    }
    for entry in &request.assets {
        value.add_wire_amount(&entry.unit, &entry.quantity)?;
    }
    Ok(OutputSpec { address: request.address.clone(), value })
}

fn hex_list(hashes: &[KeyHash]) -> Vec<String> {
    hashes.iter().map(|kh| kh.to_string()).collect()
}
