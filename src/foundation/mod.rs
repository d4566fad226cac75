pub mod error;
pub mod types;
pub mod util;

pub use error::{ChainFault, CoordinatorError, ErrorCode, ErrorContext, Result};
pub use types::{KeyHash, PolicyId, ScriptHash, SessionId, TxId};
