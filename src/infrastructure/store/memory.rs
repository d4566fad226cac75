use crate::domain::session::{ensure_valid_transition, phase_for, SessionPhase, SessionRecord};
use crate::foundation::{CoordinatorError, KeyHash, Result, SessionId};
use crate::infrastructure::store::SessionStore;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory session store. A process restart loses all sessions; durability
/// is an explicit non-goal of this coordinator.
pub struct MemorySessionStore {
    inner: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(HashMap::new()) }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionRecord>>> {
        self.inner.lock().map_err(|_| CoordinatorError::storage("session store lock", "poisoned"))
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, record: SessionRecord) -> Result<()> {
        let mut inner = self.lock_inner()?;
        let session_id = record.session_id;
        if inner.contains_key(&session_id) {
            debug!("session already exists, keeping collected witnesses session_id={}", session_id);
            return Ok(());
        }
        inner.insert(session_id, record);
        Ok(())
    }

    fn read(&self, session_id: &SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.lock_inner()?.get(session_id).cloned())
    }

    fn append_witness(&self, session_id: &SessionId, key_hash: KeyHash, witness_bytes: Vec<u8>) -> Result<usize> {
        let mut inner = self.lock_inner()?;
        let record = inner.get_mut(session_id).ok_or_else(|| CoordinatorError::SessionNotFound(session_id.to_string()))?;
        if !record.required_key_hashes.contains(&key_hash) {
            return Err(CoordinatorError::SignerNotAllowed {
                observed: vec![key_hash.to_string()],
                required: record.required_key_hashes.iter().map(|kh| kh.to_string()).collect(),
            });
        }
        let collected_after = if record.witnesses.contains_key(&key_hash) {
            record.witnesses.len()
        } else {
            record.witnesses.len() + 1
        };
        ensure_valid_transition(record.phase(), phase_for(collected_after, record.m_required))?;
        record.witnesses.insert(key_hash, witness_bytes);
        Ok(record.witnesses.len())
    }

    fn clear(&self, session_id: &SessionId) -> Result<bool> {
        let mut inner = self.lock_inner()?;
        match inner.get(session_id) {
            Some(record) => {
                ensure_valid_transition(record.phase(), SessionPhase::Cleared)?;
                inner.remove(session_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear_all(&self) -> Result<usize> {
        let mut inner = self.lock_inner()?;
        let count = inner.len();
        inner.clear();
        Ok(count)
    }

    fn list_ids(&self) -> Result<Vec<SessionId>> {
        Ok(self.lock_inner()?.keys().copied().collect())
    }
}
