//! Session records and the per-session phase machine.
//!
//! A session is one build → collect → submit cycle, identified by the body
//! hash. `Ready` is computed from the witness count, never stored.

use crate::domain::tx::TxPreview;
use crate::foundation::{CoordinatorError, KeyHash, Result, SessionId};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub body_bytes: Vec<u8>,
    pub unsigned_tx_bytes: Vec<u8>,
    pub script_bytes: Vec<u8>,
    pub m_required: u32,
    pub required_key_hashes: Vec<KeyHash>,
    pub preview: TxPreview,
    /// Keyed by signer; insertion is last-writer-wins, so re-submits never
    /// duplicate a witness in the final set.
    pub witnesses: BTreeMap<KeyHash, Vec<u8>>,
}

impl SessionRecord {
    pub fn collected(&self) -> usize {
        self.witnesses.len()
    }

    pub fn is_ready(&self) -> bool {
        self.collected() >= self.m_required as usize
    }

    pub fn phase(&self) -> SessionPhase {
        phase_for(self.collected(), self.m_required)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    Building,
    Collecting,
    Ready,
    Submitted,
    Cleared,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Building => "building",
            SessionPhase::Collecting => "collecting",
            SessionPhase::Ready => "ready",
            SessionPhase::Submitted => "submitted",
            SessionPhase::Cleared => "cleared",
        }
    }
}

pub fn phase_for(collected: usize, required: u32) -> SessionPhase {
    if collected >= required as usize {
        SessionPhase::Ready
    } else {
        SessionPhase::Collecting
    }
}

const VALID_TRANSITIONS: &[(SessionPhase, SessionPhase)] = &[
    (SessionPhase::Building, SessionPhase::Collecting),
    (SessionPhase::Building, SessionPhase::Cleared),
    (SessionPhase::Collecting, SessionPhase::Ready),
    (SessionPhase::Collecting, SessionPhase::Cleared),
    (SessionPhase::Ready, SessionPhase::Submitted),
    (SessionPhase::Ready, SessionPhase::Cleared),
];

/// Same-phase re-entry (another witness while collecting, a re-submit while
/// ready) is a no-op; terminal phases admit nothing, not even a no-op.
pub fn ensure_valid_transition(from: SessionPhase, to: SessionPhase) -> Result<()> {
    if from == to && !is_terminal(from) {
        return Ok(());
    }
    if VALID_TRANSITIONS.contains(&(from, to)) {
        Ok(())
    } else {
        Err(CoordinatorError::InvalidStateTransition { from: from.as_str().to_string(), to: to.as_str().to_string() })
    }
}

pub fn is_terminal(phase: SessionPhase) -> bool {
    matches!(phase, SessionPhase::Submitted | SessionPhase::Cleared)
}
