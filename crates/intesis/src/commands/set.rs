//! `intesis set` — write one parameter of a device.

use intesis_core::{HvacConfig, HvacController};

use crate::commands::ensure_device;
use crate::error::CliError;

pub async fn handle(
    mut config: HvacConfig,
    device: i64,
    param: &str,
    value: &str,
    tcp_server: Option<String>,
) -> Result<(), CliError> {
    if tcp_server.is_some() {
        config.tcp_server = tcp_server;
    }
    let controller = HvacController::new(config)?;
    ensure_device(&controller, device).await?;

    controller.set_named(device, param, value).await?;
    println!("set {param} = {value} on {device}");
    Ok(())
}
