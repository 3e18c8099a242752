// ── Runtime controller configuration ──
//
// Describes *how* to reach the cloud API and the control channel.
// Carries credential data and tuning, but never touches disk — the CLI
// builds an `HvacConfig` from files/env and hands it in.

use std::time::Duration;

use intesis_api::SessionConfig;
use intesis_api::cloud::DEFAULT_HOSTNAME;
use secrecy::SecretString;

/// Configuration for one [`HvacController`](crate::HvacController).
#[derive(Debug, Clone)]
pub struct HvacConfig {
    /// Cloud API base URL. Overridable for testing against a mock.
    pub hostname: String,
    /// Cloud account username.
    pub username: String,
    /// Cloud account password.
    pub password: SecretString,
    /// HTTP timeout for the cloud bootstrap call.
    pub http_timeout: Duration,
    /// Tuning for the TCP control session.
    pub session: SessionConfig,
    /// Debug override: skip the cloud-supplied control endpoint and dial
    /// this `host:port` instead. Tokens still come from the cloud.
    pub tcp_server: Option<String>,
}

impl Default for HvacConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            username: String::new(),
            password: SecretString::from(String::new()),
            http_timeout: Duration::from_secs(30),
            session: SessionConfig::default(),
            tcp_server: None,
        }
    }
}

impl HvacConfig {
    /// Credentials are mandatory; everything else has a default.
    pub(crate) fn validate(&self) -> Result<(), crate::error::CoreError> {
        use secrecy::ExposeSecret;
        if self.username.is_empty() || self.password.expose_secret().is_empty() {
            return Err(crate::error::CoreError::Config {
                message: "username and password must both be set".into(),
            });
        }
        Ok(())
    }
}
