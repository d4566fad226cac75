use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MissingParams,
    InvalidMode,
    InvalidAddress,
    InvalidScript,
    InvalidUnit,
    InvalidWitnessCbor,
    SignerNotAllowed,
    SessionNotFound,
    NotEnoughWitnesses,
    InsufficientAda,
    InsufficientTokens,
    ChangeBelowMinAda,
    ConservationViolated,
    TxTooLarge,
    ChainTimeout,
    ChainNetwork,
    IndexerStatus,
    SubmitRejected,
    ConfigError,
    StorageError,
    EncodingError,
    SerializationError,
    InvalidStateTransition,
    Message,
}

impl ErrorCode {
    /// Stable kind string surfaced to clients; transports must not invent their own.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingParams => "missing_params",
            ErrorCode::InvalidMode => "invalid_mode",
            ErrorCode::InvalidAddress => "invalid_address",
            ErrorCode::InvalidScript => "invalid_script",
            ErrorCode::InvalidUnit => "invalid_unit",
            ErrorCode::InvalidWitnessCbor => "invalid_witness_cbor",
            ErrorCode::SignerNotAllowed => "signer_not_allowed",
            ErrorCode::SessionNotFound => "not_found",
            ErrorCode::NotEnoughWitnesses => "not_enough_witnesses",
            ErrorCode::InsufficientAda => "insufficient_ada",
            ErrorCode::InsufficientTokens => "insufficient_tokens",
            ErrorCode::ChangeBelowMinAda => "change_below_min_ada",
            ErrorCode::ConservationViolated => "conservation_violated",
            ErrorCode::TxTooLarge => "tx_too_large",
            ErrorCode::ChainTimeout => "chain_error",
            ErrorCode::ChainNetwork => "chain_error",
            ErrorCode::IndexerStatus => "chain_error",
            ErrorCode::SubmitRejected => "submit_rejected",
            ErrorCode::ConfigError => "config_error",
            ErrorCode::StorageError => "storage_error",
            ErrorCode::EncodingError => "encoding_error",
            ErrorCode::SerializationError => "serialization_error",
            ErrorCode::InvalidStateTransition => "invalid_state_transition",
            ErrorCode::Message => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

/// Failure of a single chain-gateway request (spec'd as `ChainError`).
#[derive(Debug, Error)]
pub enum ChainFault {
    #[error("gateway request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("indexer returned status {status}: {body}")]
    IndexerStatus { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("missing required parameters: {0}")]
    MissingParams(String),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid native script: {0}")]
    InvalidScript(String),

    #[error("invalid asset unit: {0}")]
    InvalidUnit(String),

    #[error("witness blob is not a CBOR witness set or transaction: {0}")]
    InvalidWitnessCbor(String),

    #[error("no submitted witness matches the allow-list: observed={observed:?} required={required:?}")]
    SignerNotAllowed { observed: Vec<String>, required: Vec<String> },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("not enough witnesses: collected {collected} of {required}")]
    NotEnoughWitnesses { collected: usize, required: usize },

    #[error("insufficient ada: available {available}, needed {needed}")]
    InsufficientAda { available: u64, needed: u64 },

    #[error("insufficient tokens for unit {unit}: available {available}, needed {needed}")]
    InsufficientTokens { unit: String, available: u64, needed: u64 },

    #[error("change carries tokens but its coin {coin} is below the min-ada floor {floor}")]
    ChangeBelowMinAda { coin: u64, floor: u64 },

    #[error("value conservation violated: {0}")]
    ConservationViolated(String),

    #[error("transaction too large: {size} bytes exceeds max {max}")]
    TxTooLarge { size: usize, max: usize },

    #[error("chain gateway error: {0}")]
    Chain(#[from] ChainFault),

    #[error("submit rejected by node: {diagnostic}")]
    SubmitRejected { diagnostic: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error during {operation}: {details}")]
    StorageError { operation: String, details: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("invalid session state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

impl CoordinatorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoordinatorError::MissingParams(_) => ErrorCode::MissingParams,
            CoordinatorError::InvalidMode(_) => ErrorCode::InvalidMode,
            CoordinatorError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            CoordinatorError::InvalidScript(_) => ErrorCode::InvalidScript,
            CoordinatorError::InvalidUnit(_) => ErrorCode::InvalidUnit,
            CoordinatorError::InvalidWitnessCbor(_) => ErrorCode::InvalidWitnessCbor,
            CoordinatorError::SignerNotAllowed { .. } => ErrorCode::SignerNotAllowed,
            CoordinatorError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            CoordinatorError::NotEnoughWitnesses { .. } => ErrorCode::NotEnoughWitnesses,
            CoordinatorError::InsufficientAda { .. } => ErrorCode::InsufficientAda,
            CoordinatorError::InsufficientTokens { .. } => ErrorCode::InsufficientTokens,
            CoordinatorError::ChangeBelowMinAda { .. } => ErrorCode::ChangeBelowMinAda,
            CoordinatorError::ConservationViolated(_) => ErrorCode::ConservationViolated,
            CoordinatorError::TxTooLarge { .. } => ErrorCode::TxTooLarge,
            CoordinatorError::Chain(ChainFault::Timeout { .. }) => ErrorCode::ChainTimeout,
            CoordinatorError::Chain(ChainFault::Network(_)) => ErrorCode::ChainNetwork,
            CoordinatorError::Chain(ChainFault::IndexerStatus { .. }) => ErrorCode::IndexerStatus,
            CoordinatorError::SubmitRejected { .. } => ErrorCode::SubmitRejected,
            CoordinatorError::ConfigError(_) => ErrorCode::ConfigError,
            CoordinatorError::StorageError { .. } => ErrorCode::StorageError,
            CoordinatorError::EncodingError(_) => ErrorCode::EncodingError,
            CoordinatorError::SerializationError { .. } => ErrorCode::SerializationError,
            CoordinatorError::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            CoordinatorError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    pub fn storage(operation: impl Into<String>, details: impl Into<String>) -> Self {
        CoordinatorError::StorageError { operation: operation.into(), details: details.into() }
    }
}

impl From<hex::FromHexError> for CoordinatorError {
    fn from(err: hex::FromHexError) -> Self {
        CoordinatorError::EncodingError(format!("hex decode error: {}", err))
    }
}

impl From<toml::de::Error> for CoordinatorError {
    fn from(err: toml::de::Error) -> Self {
        CoordinatorError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_json::Error> for CoordinatorError {
    fn from(err: serde_json::Error) -> Self {
        CoordinatorError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<pallas_addresses::Error> for CoordinatorError {
    fn from(err: pallas_addresses::Error) -> Self {
        CoordinatorError::InvalidAddress(err.to_string())
    }
}

impl From<pallas_codec::minicbor::decode::Error> for CoordinatorError {
    fn from(err: pallas_codec::minicbor::decode::Error) -> Self {
        CoordinatorError::EncodingError(format!("cbor decode error: {}", err))
    }
}

impl From<reqwest::Error> for CoordinatorError {
    fn from(err: reqwest::Error) -> Self {
        CoordinatorError::Chain(ChainFault::Network(err.to_string()))
    }
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `CoordinatorError` variants at the call site to preserve context.
