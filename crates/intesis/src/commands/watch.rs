//! `intesis watch` — poll a device's state until interrupted.

use std::sync::Arc;
use std::time::Duration;

use intesis_core::{HvacConfig, HvacController, Watcher};

use crate::error::CliError;

pub async fn handle(config: HvacConfig, device: i64, interval: Duration) -> Result<(), CliError> {
    let controller = Arc::new(HvacController::new(config)?);
    let watcher = Watcher::new(controller, device, interval);
    let cancel = watcher.cancel_token();
    let mut snapshots = watcher.snapshots();

    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let line = {
                let snapshot = snapshots.borrow();
                snapshot.as_ref().map(|s| {
                    let pretty = s.pretty();
                    format!(
                        "({device}) power: {} mode: {} temperature: {} setpoint: {}",
                        pretty.get("power").map_or("-", String::as_str),
                        pretty.get("mode").map_or("-", String::as_str),
                        s.celsius("temperature")
                            .map_or_else(|| "-".into(), |c| format!("{c:.1}")),
                        s.celsius("setpoint")
                            .map_or_else(|| "-".into(), |c| format!("{c:.1}")),
                    )
                })
            };
            if let Some(line) = line {
                println!("{line}");
            }
        }
    });

    let result = tokio::select! {
        result = watcher.run() => result.map_err(CliError::from),
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            Ok(())
        }
    };
    printer.abort();
    result
}
