//! Cloud bootstrap client.
//!
//! One POST against the vendor cloud yields everything a control
//! transaction needs: a single-use session token, the `host:port` of the
//! per-session TCP control endpoint, the device inventory, and the last
//! reported status triples. The call is stateless — every `set`
//! transaction performs a fresh one because tokens are not reusable
//! across sockets.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Production cloud host.
pub const DEFAULT_HOSTNAME: &str = "https://user.intesishome.com";

/// The control/status polling endpoint.
pub const CONTROL_ENDPOINT: &str = "/api.php/get/control";

// Protocol constants observed from the vendor app.
const STATUS_VERSION: &str = "1.8.5";
const STATUS_COMMAND: &str = r#"{"status":{"hash":"x"},"config":{"hash":"x"}}"#;

// Bodies shorter than this are never a valid control payload.
const MIN_BODY_LEN: usize = 10;

// ── Response payload ─────────────────────────────────────────────────

/// The full control response from the cloud API.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub config: ControlConfig,
    #[serde(default)]
    pub status: StatusBlock,
    #[serde(default, rename = "errorCode")]
    pub error_code: i64,
    #[serde(default, rename = "errorMessage")]
    pub error_message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlConfig {
    /// Single-use TCP auth token.
    #[serde(default)]
    pub token: i64,
    /// Control endpoint host.
    #[serde(default, rename = "serverIP")]
    pub server_ip: String,
    /// Control endpoint port.
    #[serde(default)]
    pub server_port: u16,
    #[serde(default)]
    pub hash: String,
    /// Installations, each holding its devices.
    #[serde(default)]
    pub inst: Vec<Installation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub devices: Vec<CloudDevice>,
}

/// A device as the cloud reports it. The id is a decimal string on the
/// wire even though the control channel wants it numeric.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDevice {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub family_id: i64,
    #[serde(default)]
    pub model_id: i64,
    #[serde(default)]
    pub installation_id: i64,
    #[serde(default)]
    pub zone_id: i64,
    #[serde(default)]
    pub widgets: Vec<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusBlock {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub status: Vec<StatusEntry>,
}

/// One `(device, uid, value)` triple from the status listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub device_id: i64,
    pub uid: i32,
    pub value: i32,
}

impl ControlResponse {
    /// The `host:port` of the TCP control endpoint for this token.
    pub fn tcp_endpoint(&self) -> String {
        format!("{}:{}", self.config.server_ip, self.config.server_port)
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// HTTP client for the cloud bootstrap call.
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl CloudClient {
    /// Create a client against `base_url` (use [`DEFAULT_HOSTNAME`] for
    /// the production cloud).
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: SecretString,
        timeout: std::time::Duration,
    ) -> Result<Self, Error> {
        let base_url: Url = base_url.parse()?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("intesis-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
        })
    }

    /// The configured cloud base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform the control poll: mints a fresh token and returns the
    /// control endpoint, device inventory, and status snapshot.
    pub async fn control(&self) -> Result<ControlResponse, Error> {
        let url = self.base_url.join(CONTROL_ENDPOINT)?;
        debug!(%url, "POST control");

        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.expose_secret()),
            ("version", STATUS_VERSION),
            ("cmd", STATUS_COMMAND),
        ];

        let resp = self.http.post(url).form(&form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        if body.len() < MIN_BODY_LEN {
            return Err(Error::Deserialization {
                message: "response body too short".into(),
                body,
            });
        }

        let control: ControlResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        if control.error_code != 0 {
            return Err(Error::Cloud {
                code: control.error_code,
                message: control.error_message,
            });
        }

        debug!(
            endpoint = %control.tcp_endpoint(),
            devices = control
                .config
                .inst
                .iter()
                .map(|i| i.devices.len())
                .sum::<usize>(),
            "control poll complete"
        );
        Ok(control)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tcp_endpoint_formats_host_port() {
        let control = ControlResponse {
            config: ControlConfig {
                server_ip: "212.36.84.207".into(),
                server_port: 5210,
                ..ControlConfig::default()
            },
            status: StatusBlock::default(),
            error_code: 0,
            error_message: String::new(),
        };
        assert_eq!(control.tcp_endpoint(), "212.36.84.207:5210");
    }

    #[test]
    fn deserialize_control_response() {
        let body = r#"{
            "config": {
                "token": 575497412,
                "serverIP": "212.36.84.207",
                "serverPort": 5210,
                "hash": "abc",
                "inst": [{
                    "id": 1,
                    "name": "Home",
                    "devices": [{
                        "id": "127934703953",
                        "name": "Lounge",
                        "familyId": 4864,
                        "widgets": [1, 2, 9]
                    }]
                }]
            },
            "status": {
                "hash": "x",
                "status": [
                    {"deviceId": 127934703953, "uid": 1, "value": 0},
                    {"deviceId": 127934703953, "uid": 9, "value": 230}
                ]
            },
            "errorCode": 0,
            "errorMessage": ""
        }"#;

        let control: ControlResponse = serde_json::from_str(body).unwrap();
        assert_eq!(control.config.token, 575_497_412);
        assert_eq!(control.tcp_endpoint(), "212.36.84.207:5210");
        assert_eq!(control.config.inst[0].devices[0].id, "127934703953");
        assert_eq!(control.config.inst[0].devices[0].widgets, vec![1, 2, 9]);
        assert_eq!(control.status.status.len(), 2);
        assert_eq!(control.status.status[1].value, 230);
    }
}
