pub mod loader;
pub mod types;

pub use loader::{apply_env_overrides, load, load_from_path, resolve_config_path};
pub use types::{CoordinatorConfig, NetworkKind, DEFAULT_GATEWAY_DEADLINE_SECS, DEFAULT_MIN_ADA_LOVELACE};
