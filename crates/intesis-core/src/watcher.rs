// ── Status watcher ──
//
// Polls the cloud for one device's state on a fixed interval, logs the
// headline readings, and publishes the latest snapshot on a watch
// channel. Poll failures are logged and the loop carries on; only the
// initial bootstrap poll is allowed to fail the watcher.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::controller::HvacController;
use crate::error::CoreError;
use crate::model::StatusSnapshot;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic status observer for a single device.
pub struct Watcher {
    controller: Arc<HvacController>,
    device: i64,
    interval: Duration,
    snapshot_tx: watch::Sender<Option<StatusSnapshot>>,
    cancel: CancellationToken,
}

impl Watcher {
    pub fn new(controller: Arc<HvacController>, device: i64, interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            controller,
            device,
            interval,
            snapshot_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to the latest snapshot. `None` until the first
    /// successful poll.
    pub fn snapshots(&self) -> watch::Receiver<Option<StatusSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// A token that stops [`run`](Self::run) when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the poll loop until cancelled.
    ///
    /// The device must exist and the first poll must succeed; after
    /// that, individual poll failures only log a warning.
    pub async fn run(&self) -> Result<(), CoreError> {
        if !self.controller.has_device(self.device).await? {
            return Err(CoreError::DeviceNotFound {
                identifier: self.device.to_string(),
            });
        }

        info!(
            device = self.device,
            interval_secs = self.interval.as_secs(),
            "watcher starting"
        );
        self.refresh().await?;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "status refresh failed");
                    }
                }
            }
        }
        info!("watcher stopped");
        Ok(())
    }

    async fn refresh(&self) -> Result<(), CoreError> {
        let snapshot = self.controller.status(self.device).await?;
        let pretty = snapshot.pretty();
        info!(
            device = self.device,
            power = pretty.get("power").map_or("-", String::as_str),
            mode = pretty.get("mode").map_or("-", String::as_str),
            temperature = snapshot.celsius("temperature").unwrap_or(f64::NAN),
            setpoint = snapshot.celsius("setpoint").unwrap_or(f64::NAN),
            "status"
        );
        self.snapshot_tx.send_replace(Some(snapshot));
        Ok(())
    }
}
