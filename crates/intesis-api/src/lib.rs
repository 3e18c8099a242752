// intesis-api: cloud bootstrap + TCP control channel for Intesis HVAC gateways

pub mod cloud;
pub mod error;
pub mod frame;
pub mod session;
pub mod wire;

pub use cloud::{CloudClient, ControlResponse};
pub use error::Error;
pub use session::{CloseHandle, ControlSession, SessionConfig, SessionState};
