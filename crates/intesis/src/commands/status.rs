//! `intesis status` — dump a device's current state.

use intesis_core::{HvacConfig, HvacController};

use crate::commands::ensure_device;
use crate::error::CliError;

pub async fn handle(config: HvacConfig, device: i64) -> Result<(), CliError> {
    let controller = HvacController::new(config)?;
    ensure_device(&controller, device).await?;

    let snapshot = controller.status(device).await?;
    for (name, value) in snapshot.pretty() {
        println!("{name}: {value}");
    }
    Ok(())
}
