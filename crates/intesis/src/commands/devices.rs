//! `intesis devices` — list the account's device inventory.

use intesis_core::{HvacConfig, HvacController};

use crate::error::CliError;

pub async fn handle(config: HvacConfig) -> Result<(), CliError> {
    let controller = HvacController::new(config)?;
    let devices = controller.devices().await?;

    if devices.is_empty() {
        println!("no devices found");
        return Ok(());
    }
    for device in devices {
        println!("{device}");
    }
    Ok(())
}
