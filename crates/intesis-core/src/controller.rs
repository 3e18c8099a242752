// ── Controller abstraction ──
//
// Glues the cloud bootstrap and the TCP control channel into whole
// transactions: list devices, read status, write a parameter. Every
// write is a full lifecycle — fresh token, fresh socket, authenticate,
// set, close — because tokens are single-use and the server drops idle
// unauthenticated sockets.

use tracing::{debug, info};

use intesis_api::{CloudClient, ControlSession};

use crate::config::HvacConfig;
use crate::error::CoreError;
use crate::mappings;
use crate::model::{Device, StatusSnapshot};

/// The main entry point for consumers.
pub struct HvacController {
    cloud: CloudClient,
    config: HvacConfig,
}

impl HvacController {
    /// Build a controller from configuration. Performs no I/O.
    pub fn new(config: HvacConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let cloud = CloudClient::new(
            &config.hostname,
            config.username.clone(),
            config.password.clone(),
            config.http_timeout,
        )?;
        Ok(Self { cloud, config })
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All devices across every installation on the account.
    pub async fn devices(&self) -> Result<Vec<Device>, CoreError> {
        let control = self.cloud.control().await?;
        let devices: Vec<Device> = control
            .config
            .inst
            .into_iter()
            .flat_map(|inst| inst.devices)
            .map(Device::from)
            .collect();
        debug!(count = devices.len(), "device inventory fetched");
        Ok(devices)
    }

    /// Whether the account has a device with this numeric id.
    pub async fn has_device(&self, device: i64) -> Result<bool, CoreError> {
        let devices = self.devices().await?;
        Ok(devices
            .iter()
            .any(|d| d.numeric_id().is_ok_and(|id| id == device)))
    }

    /// The latest reported state of one device, keyed by parameter name.
    /// Uids without a catalogue entry are skipped.
    pub async fn status(&self, device: i64) -> Result<StatusSnapshot, CoreError> {
        let control = self.cloud.control().await?;
        let mut snapshot = StatusSnapshot::default();
        for entry in &control.status.status {
            if entry.device_id != device {
                continue;
            }
            let name = mappings::decode_uid(entry.uid);
            if name == entry.uid.to_string() {
                // No catalogue entry for this uid.
                continue;
            }
            snapshot.raw.insert(name, i64::from(entry.value));
        }
        debug!(device, params = snapshot.raw.len(), "status snapshot built");
        Ok(snapshot)
    }

    /// One parameter of one device, decoded through the catalogue.
    pub async fn get(&self, device: i64, param: &str) -> Result<i64, CoreError> {
        let snapshot = self.status(device).await?;
        snapshot
            .get(param)
            .ok_or_else(|| CoreError::UnknownParameter {
                name: param.to_string(),
            })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Write a parameter using its catalogue name and value word.
    pub async fn set_named(&self, device: i64, param: &str, value: &str) -> Result<(), CoreError> {
        let (uid, mapped) = mappings::map_command(param, value)?;
        self.set(device, uid, mapped).await
    }

    /// Write a raw `(uid, value)` pair to a device.
    ///
    /// Runs the full control transaction: a cloud poll mints a fresh
    /// single-use token and names the TCP endpoint, then the session
    /// authenticates, sends the set, and closes. The session is torn
    /// down even when the set fails.
    pub async fn set(&self, device: i64, uid: i32, value: i32) -> Result<(), CoreError> {
        let control = self.cloud.control().await?;
        let endpoint = self
            .config
            .tcp_server
            .clone()
            .unwrap_or_else(|| control.tcp_endpoint());

        let mut session_config = self.config.session.clone();
        session_config.keepalive_device = device;

        let mut session = ControlSession::connect(&endpoint, session_config).await?;
        let result = async {
            session.authenticate(control.config.token).await?;
            session.send_command(device, uid, value).await
        }
        .await;
        session.close().await;

        result?;
        info!(device, uid, value, "set complete");
        Ok(())
    }
}
