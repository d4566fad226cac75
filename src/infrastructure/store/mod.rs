//! Session storage. The contract is deliberately small so a transactional
//! key-value backend can replace the in-memory store without touching the
//! application layer.

use crate::domain::session::SessionRecord;
use crate::foundation::{KeyHash, Result, SessionId};

pub trait SessionStore: Send + Sync {
    /// Insert a freshly built session. A record with the same id already in
    /// the store is kept as-is: identical bodies collide by design, and the
    /// witnesses gathered so far must survive a rebuild.
    fn create(&self, record: SessionRecord) -> Result<()>;

    fn read(&self, session_id: &SessionId) -> Result<Option<SessionRecord>>;

    /// Insert or replace the witness for `key_hash`; returns the collected
    /// count afterwards. The signer must be on the session's allow-list.
    fn append_witness(&self, session_id: &SessionId, key_hash: KeyHash, witness_bytes: Vec<u8>) -> Result<usize>;

    /// Remove one session; returns whether it existed.
    fn clear(&self, session_id: &SessionId) -> Result<bool>;

    /// Remove every session; returns how many were dropped.
    fn clear_all(&self) -> Result<usize>;

    fn list_ids(&self) -> Result<Vec<SessionId>>;
}

pub mod memory;

pub use memory::MemorySessionStore;
