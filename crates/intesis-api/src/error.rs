use thiserror::Error;

/// Top-level error type for the `intesis-api` crate.
///
/// Covers both API surfaces: the cloud bootstrap HTTP call and the TCP
/// control channel. `intesis-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Cloud bootstrap ─────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The cloud API answered with a non-200 status.
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Structured error from the cloud API (`errorCode != 0`).
    #[error("Cloud API error {code}: {message}")]
    Cloud { code: i64, message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Control channel ─────────────────────────────────────────────
    /// TCP dial to the control endpoint failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Read or write failure mid-session, including EOF.
    #[error("Socket I/O error: {0}")]
    Io(String),

    /// A write reported fewer bytes than the payload length.
    #[error("Write length mismatch: wrote {written} of {expected} bytes")]
    WriteLength { written: usize, expected: usize },

    /// Outgoing request could not be serialized.
    #[error("Encode error: {message}")]
    Encode { message: String },

    /// An inbound frame was not valid JSON.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The server rejected authentication (non-"ok" status).
    #[error("Authentication rejected: status \"{status}\"")]
    AuthRejected { status: String },

    /// The auth reply carried an unexpected command.
    #[error("Authentication failed: unexpected command \"{command}\"")]
    AuthUnexpected { command: String },

    /// An acknowledgement arrived with the wrong command.
    #[error("Protocol mismatch: expected \"{expected}\", got \"{got}\"")]
    ProtocolMismatch { expected: &'static str, got: String },

    /// No matching response within the configured window.
    #[error("Timed out after {timeout_secs}s waiting for {operation}")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    /// The session was closed while the call was in flight.
    #[error("Session closed")]
    Closed,

    /// Operation attempted from the wrong session state.
    #[error("Session is {state}, expected {expected}")]
    InvalidState {
        state: &'static str,
        expected: &'static str,
    },

    /// Session configuration failed validation.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl Error {
    /// Returns `true` if this error means the TCP session is dead and a
    /// fresh bootstrap + connect is required.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Io(_)
                | Self::WriteLength { .. }
                | Self::Decode { .. }
                | Self::AuthRejected { .. }
                | Self::AuthUnexpected { .. }
                | Self::Closed
        )
    }

    /// Returns `true` for authentication failures of either flavor.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRejected { .. } | Self::AuthUnexpected { .. })
    }

    /// Returns `true` if the operation may be retried on the same session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ProtocolMismatch { .. })
    }
}
