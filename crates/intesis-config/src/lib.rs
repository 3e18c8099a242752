//! Shared configuration for the Intesis CLI.
//!
//! Two sources: a YAML credentials file (cloud username + password) and
//! an optional TOML settings file (device, intervals, hostname override),
//! both overridable through `INTESIS_`-prefixed environment variables.
//! Translation to `intesis_core::HvacConfig` lives here so the CLI only
//! deals in flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use intesis_api::SessionConfig;
use intesis_core::HvacConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured (flags, INTESIS_USERNAME/INTESIS_PASSWORD, or {path})")]
    NoCredentials { path: String },

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed credentials file {path}: {reason}")]
    Yaml { path: String, reason: String },

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Credentials (YAML secrets file) ─────────────────────────────────

/// Cloud account credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// Read and validate a YAML credentials file.
///
/// Both fields are mandatory; an empty value is as bad as a missing one.
pub fn read_credentials(path: &Path) -> Result<Credentials, ConfigError> {
    let display = path.display().to_string();
    let body = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let creds: Credentials = serde_yaml::from_str(&body).map_err(|e| ConfigError::Yaml {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    if creds.username.is_empty() || creds.password.expose_secret().is_empty() {
        return Err(ConfigError::Validation {
            field: "credentials".into(),
            reason: format!("username and password in {display} must both be non-empty"),
        });
    }
    Ok(creds)
}

/// Resolve credentials through the chain: explicit flags, then
/// environment, then the credentials file.
pub fn resolve_credentials(
    flag_username: Option<&str>,
    flag_password: Option<&str>,
    secrets_path: &Path,
) -> Result<Credentials, ConfigError> {
    if let (Some(username), Some(password)) = (flag_username, flag_password) {
        return Ok(Credentials {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        });
    }

    let env_username = std::env::var("INTESIS_USERNAME").ok();
    let env_password = std::env::var("INTESIS_PASSWORD").ok();
    if let (Some(username), Some(password)) = (env_username, env_password) {
        return Ok(Credentials {
            username,
            password: SecretString::from(password),
        });
    }

    if secrets_path.exists() {
        return read_credentials(secrets_path);
    }
    Err(ConfigError::NoCredentials {
        path: secrets_path.display().to_string(),
    })
}

// ── Settings (TOML) ─────────────────────────────────────────────────

/// Tunables from the settings file. Everything has a default; the file
/// is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Cloud API base URL override (testing / debugging).
    pub hostname: Option<String>,

    /// Default device id, so commands can omit it.
    pub device: Option<i64>,

    /// Watch poll interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Cloud HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Auth handshake timeout in seconds.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout: u64,

    /// Set acknowledgement timeout in seconds.
    #[serde(default = "default_set_timeout")]
    pub set_timeout: u64,

    /// Keepalive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: None,
            device: None,
            interval: default_interval(),
            http_timeout: default_http_timeout(),
            auth_timeout: default_auth_timeout(),
            set_timeout: default_set_timeout(),
            keepalive: default_keepalive(),
        }
    }
}

fn default_interval() -> u64 {
    30
}
fn default_http_timeout() -> u64 {
    30
}
fn default_auth_timeout() -> u64 {
    6
}
fn default_set_timeout() -> u64 {
    15
}
fn default_keepalive() -> u64 {
    30
}

impl Settings {
    /// The session tuning these settings describe.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            auth_timeout: Duration::from_secs(self.auth_timeout),
            set_timeout: Duration::from_secs(self.set_timeout),
            keepalive_interval: Duration::from_secs(self.keepalive),
            keepalive_device: 0,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Platform config directory for the tools.
fn config_dir() -> PathBuf {
    ProjectDirs::from("com", "intesis", "intesis").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("intesis");
            p
        },
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// Default location of the YAML credentials file.
pub fn default_secrets_path() -> PathBuf {
    config_dir().join("credentials.yaml")
}

/// Default location of the TOML settings file.
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from file + environment (`INTESIS_` prefix).
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_path())
}

/// Like [`load_settings`] but from an explicit path, for tests.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("INTESIS_"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Assemble an `HvacConfig` from resolved credentials and settings.
pub fn to_hvac_config(creds: &Credentials, settings: &Settings) -> HvacConfig {
    let mut config = HvacConfig {
        username: creds.username.clone(),
        password: creds.password.clone(),
        http_timeout: Duration::from_secs(settings.http_timeout),
        session: settings.session_config(),
        ..HvacConfig::default()
    };
    if let Some(ref hostname) = settings.hostname {
        config.hostname.clone_from(hostname);
    }
    config
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn read_credentials_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "creds.yaml",
            "username: user@example.com\npassword: hunter2\n",
        );
        let creds = read_credentials(&path).unwrap();
        assert_eq!(creds.username, "user@example.com");
        assert_eq!(creds.password.expose_secret(), "hunter2");
    }

    #[test]
    fn read_credentials_rejects_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "creds.yaml", "username: user@example.com\npassword: \"\"\n");
        assert!(matches!(
            read_credentials(&path),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn read_credentials_missing_file() {
        let err = read_credentials(Path::new("/nonexistent/creds.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn read_credentials_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "creds.yaml", "username: [not, a, string\n");
        assert!(matches!(
            read_credentials(&path),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn flags_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "creds.yaml", "username: file-user\npassword: file-pass\n");
        let creds = resolve_credentials(Some("flag-user"), Some("flag-pass"), &path).unwrap();
        assert_eq!(creds.username, "flag-user");
    }

    #[test]
    fn missing_everything_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let err = resolve_credentials(None, None, &missing).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.interval, 30);
        assert_eq!(settings.auth_timeout, 6);
        assert_eq!(settings.set_timeout, 15);
        assert_eq!(settings.keepalive, 30);
        assert_eq!(settings.device, None);
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "settings.toml",
            "device = 127934703953\ninterval = 10\nset_timeout = 5\n",
        );
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.device, Some(127_934_703_953));
        assert_eq!(settings.interval, 10);
        assert_eq!(settings.set_timeout, 5);
        assert_eq!(settings.auth_timeout, 6);
    }

    #[test]
    fn session_config_carries_timeouts() {
        let settings = Settings {
            auth_timeout: 2,
            set_timeout: 3,
            keepalive: 4,
            ..Settings::default()
        };
        let session = settings.session_config();
        assert_eq!(session.auth_timeout, Duration::from_secs(2));
        assert_eq!(session.set_timeout, Duration::from_secs(3));
        assert_eq!(session.keepalive_interval, Duration::from_secs(4));
    }

    #[test]
    fn hvac_config_assembly() {
        let creds = Credentials {
            username: "user@example.com".into(),
            password: SecretString::from("hunter2"),
        };
        let settings = Settings {
            hostname: Some("http://127.0.0.1:8080".into()),
            ..Settings::default()
        };
        let config = to_hvac_config(&creds, &settings);
        assert_eq!(config.hostname, "http://127.0.0.1:8080");
        assert_eq!(config.username, "user@example.com");
    }
}
