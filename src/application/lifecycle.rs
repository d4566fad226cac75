//! Session lifecycle hooks. The (external) event fan-out layer attaches here;
//! the coordinator itself only ever talks to the trait.

use crate::foundation::{KeyHash, SessionId, TxId};
use log::{debug, info};
use std::sync::Arc;

pub trait LifecycleObserver: Send + Sync {
    fn on_session_created(&self, _session_id: &SessionId, _m_required: u32) {}
    fn on_witness_added(&self, _session_id: &SessionId, _signer: &KeyHash, _collected: usize) {}
    fn on_threshold_met(&self, _session_id: &SessionId, _collected: usize, _required: u32) {}
    fn on_submitted(&self, _session_id: &SessionId, _tx_id: &TxId) {}
    fn on_session_cleared(&self, _session_id: &SessionId) {}
}

pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

pub struct CompositeObserver {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleObserver for CompositeObserver {
    fn on_session_created(&self, session_id: &SessionId, m_required: u32) {
        debug!("on_session_created dispatch observer_count={} session_id={}", self.observers.len(), session_id);
        for observer in &self.observers {
            observer.on_session_created(session_id, m_required);
        }
    }

    fn on_witness_added(&self, session_id: &SessionId, signer: &KeyHash, collected: usize) {
        debug!("witness added session_id={} signer={} collected={}", session_id, signer, collected);
        for observer in &self.observers {
            observer.on_witness_added(session_id, signer, collected);
        }
    }

    fn on_threshold_met(&self, session_id: &SessionId, collected: usize, required: u32) {
        info!("witness threshold met session_id={} collected={} required={}", session_id, collected, required);
        for observer in &self.observers {
            observer.on_threshold_met(session_id, collected, required);
        }
    }

    fn on_submitted(&self, session_id: &SessionId, tx_id: &TxId) {
        info!("session submitted session_id={} tx_hash={}", session_id, tx_id);
        for observer in &self.observers {
            observer.on_submitted(session_id, tx_id);
        }
    }

    fn on_session_cleared(&self, session_id: &SessionId) {
        debug!("session cleared session_id={}", session_id);
        for observer in &self.observers {
            observer.on_session_cleared(session_id);
        }
    }
}
