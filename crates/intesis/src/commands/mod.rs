//! Command handlers for the `intesis` CLI.

pub mod devices;
pub mod get;
pub mod set;
pub mod status;
pub mod watch;

use intesis_core::HvacConfig;

use crate::cli::Command;
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Command, config: HvacConfig) -> Result<(), CliError> {
    match command {
        Command::Devices => devices::handle(config).await,
        Command::Status { device } => status::handle(config, device).await,
        Command::Get { device, param } => get::handle(config, device, &param).await,
        Command::Set {
            device,
            param,
            value,
            tcp_server,
        } => set::handle(config, device, &param, &value, tcp_server).await,
        Command::Watch { device, interval } => watch::handle(config, device, interval).await,
    }
}

/// Commands that address one device verify it exists first, so typos
/// fail with a listing hint instead of an empty result.
pub(crate) async fn ensure_device(
    controller: &intesis_core::HvacController,
    device: i64,
) -> Result<(), CliError> {
    if controller.has_device(device).await? {
        Ok(())
    } else {
        Err(CliError::DeviceNotFound {
            identifier: device.to_string(),
        })
    }
}
