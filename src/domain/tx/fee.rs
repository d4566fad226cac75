//! Size-linear minimum fee plus the post-signing buffer.

use crate::domain::tx::ProtocolParams;

/// Conservative serialized size of one key witness (vkey + signature + CBOR
/// framing). The declared fee must stay valid after `m` witnesses are
/// appended to the finalized body, so the buffer prices them in up front.
pub const WITNESS_SIZE_ESTIMATE: u64 = 300;

/// `a * size + b` over the serialized transaction.
pub fn min_fee(tx_size: usize, params: &ProtocolParams) -> u64 {
    params.min_fee_a.saturating_mul(tx_size as u64).saturating_add(params.min_fee_b)
}

/// Fee headroom for the witnesses that will be attached after body finalization.
pub fn witness_buffer(params: &ProtocolParams, m_required: u32) -> u64 {
    params.min_fee_a.saturating_mul(WITNESS_SIZE_ESTIMATE).saturating_mul(m_required as u64)
}
