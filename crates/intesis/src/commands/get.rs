//! `intesis get` — read one parameter of a device.

use intesis_core::{HvacConfig, HvacController, decode_state};

use crate::commands::ensure_device;
use crate::error::CliError;

pub async fn handle(config: HvacConfig, device: i64, param: &str) -> Result<(), CliError> {
    let controller = HvacController::new(config)?;
    ensure_device(&controller, device).await?;

    let raw = controller.get(device, param).await?;
    match decode_state(param, raw) {
        Some(value) => println!("{value}"),
        // The reading is outside the catalogue's words for this param.
        None => println!("{raw}"),
    }
    Ok(())
}
