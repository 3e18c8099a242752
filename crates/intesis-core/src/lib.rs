// intesis-core: domain layer between intesis-api and consumers (CLI).

pub mod config;
pub mod controller;
pub mod error;
pub mod mappings;
pub mod model;
pub mod watcher;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::HvacConfig;
pub use controller::HvacController;
pub use error::CoreError;
pub use mappings::{StateValue, decode_state, decode_uid, map_command};
pub use model::{Device, StatusSnapshot};
pub use watcher::Watcher;
