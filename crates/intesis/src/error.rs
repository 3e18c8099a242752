//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use intesis_config::ConfigError;
use intesis_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {endpoint}")]
    #[diagnostic(
        code(intesis::connection_failed),
        help(
            "Check your network connection and that the endpoint is reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { endpoint: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(intesis::auth_failed),
        help(
            "Verify your Intesis cloud username and password.\n\
             Note that control tokens are single-use; a stale or reused\n\
             token is rejected the same way as bad credentials."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured")]
    #[diagnostic(
        code(intesis::no_credentials),
        help(
            "Pass --username/--password, set INTESIS_USERNAME and\n\
             INTESIS_PASSWORD, or create a credentials file at: {path}"
        )
    )]
    NoCredentials { path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(intesis::not_found),
        help("Run: intesis devices to see the account's devices")
    )]
    DeviceNotFound { identifier: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {operation}")]
    #[diagnostic(
        code(intesis::timeout),
        help("The unit may be offline or the cloud slow; try again.")
    )]
    Timeout { operation: String, seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(intesis::validation))]
    Validation { field: String, reason: String },

    // ── Cloud API ────────────────────────────────────────────────────
    #[error("Cloud API error {code}: {message}")]
    #[diagnostic(
        code(intesis::cloud),
        help("Error code 5 usually means invalid username or password.")
    )]
    Cloud { code: i64, message: String },

    // ── Catch-all ────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(intesis::general))]
    General(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::Cloud { code: 5, .. } => {
                exit_code::AUTH
            }
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Cloud { .. } | Self::General(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { endpoint, reason } => {
                CliError::ConnectionFailed { endpoint, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout {
                operation,
                timeout_secs,
            } => CliError::Timeout {
                operation,
                seconds: timeout_secs,
            },
            CoreError::DeviceNotFound { identifier } => CliError::DeviceNotFound { identifier },
            CoreError::InvalidDeviceId { identifier } => CliError::Validation {
                field: "device".into(),
                reason: format!("id is not numeric: {identifier}"),
            },
            CoreError::UnknownParameter { name } => CliError::Validation {
                field: "param".into(),
                reason: format!("unknown parameter: {name}"),
            },
            err @ CoreError::UnknownValue { .. } => CliError::Validation {
                field: "value".into(),
                reason: err.to_string(),
            },
            CoreError::Cloud { code, message } => CliError::Cloud { code, message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            other => CliError::General(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { path } => CliError::NoCredentials { path },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::General(other.to_string()),
        }
    }
}
