pub mod codec;
pub mod hashes;
pub mod script;
pub mod session;
pub mod tx;
pub mod value;
pub mod witness;

pub use script::{ScriptSummary, ScriptTraceNode};
pub use session::{SessionPhase, SessionRecord};
pub use tx::{BuildArtifact, BuildRequest, OutputSpec, ProtocolParams, TxMode, TxPreview, Utxo};
pub use value::{AmountEntry, AssetName, Value};
pub use witness::WitnessIngest;
