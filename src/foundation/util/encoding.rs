use crate::foundation::CoordinatorError;

pub fn decode_hex(s: &str) -> Result<Vec<u8>, CoordinatorError> {
    hex::decode(s).map_err(|e| e.into())
}

pub fn decode_hex_prefixed(value: &str) -> Result<Vec<u8>, CoordinatorError> {
    let stripped = value.trim().trim_start_matches("0x").trim_start_matches("0X");
    hex::decode(stripped).map_err(|err| CoordinatorError::EncodingError(format!("invalid hex: {err}")))
}

pub fn parse_hex_fixed<const N: usize>(value: &str) -> Result<[u8; N], CoordinatorError> {
    let bytes = decode_hex_prefixed(value)?;
    if bytes.len() != N {
        return Err(CoordinatorError::EncodingError(format!("expected {N} bytes, got {}", bytes.len())));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse a decimal quantity from the wire. Quantities travel as strings to
/// avoid 53-bit truncation in JSON consumers.
pub fn parse_decimal_u64(value: &str) -> Result<u64, CoordinatorError> {
    value.trim().parse::<u64>().map_err(|err| CoordinatorError::EncodingError(format!("invalid decimal quantity {value:?}: {err}")))
}
