pub mod coordinator;
pub mod lifecycle;

pub use coordinator::{Coordinator, CreateSessionRequest, OutputRequest, ResetOutcome, ScriptInfo, SessionBody,
    SessionCreated, SessionStatusView, SubmitOutcome, WitnessAccepted, WitnessList};
pub use lifecycle::{CompositeObserver, LifecycleObserver, NoopObserver};
