// ── Core error types ──
//
// User-facing errors from intesis-core. Consumers never see raw HTTP or
// socket failures directly; the `From<intesis_api::Error>` impl
// translates wire-level errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Timed out after {timeout_secs}s waiting for {operation}")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Device id is not numeric: {identifier}")]
    InvalidDeviceId { identifier: String },

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("No such value \"{value}\" for parameter \"{parameter}\" (wanted one of: {})", .wanted.join(", "))]
    UnknownValue {
        value: String,
        parameter: String,
        wanted: Vec<String>,
    },

    // ── Cloud / wire errors (wrapped, not exposed raw) ───────────────
    #[error("Cloud API error {code}: {message}")]
    Cloud { code: i64, message: String },

    #[error("API error: {message}")]
    Api { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<intesis_api::Error> for CoreError {
    fn from(err: intesis_api::Error) -> Self {
        use intesis_api::Error as Api;
        match err {
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        operation: "cloud response".into(),
                        timeout_secs: 0,
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        endpoint: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Cloud { code, message } => CoreError::Cloud { code, message },
            Api::UnexpectedStatus { status, body } => CoreError::Api {
                message: format!("unexpected HTTP status {status}: {body}"),
            },
            Api::Connection(reason) => CoreError::ConnectionFailed {
                endpoint: "control endpoint".into(),
                reason,
            },
            Api::AuthRejected { status } => CoreError::AuthenticationFailed {
                message: format!("server answered with status \"{status}\""),
            },
            Api::AuthUnexpected { command } => CoreError::AuthenticationFailed {
                message: format!("server answered with command \"{command}\""),
            },
            Api::Timeout {
                operation,
                timeout_secs,
            } => CoreError::Timeout {
                operation: operation.into(),
                timeout_secs,
            },
            Api::Config { message } => CoreError::Config { message },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            other => CoreError::Api {
                message: other.to_string(),
            },
        }
    }
}

impl CoreError {
    /// Returns `true` when the failure is an authentication problem.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}
