// ── Core error types ──
//
// Errors surfaced by rductl-core. Gateway transport details are folded
// into domain variants by the `From<rductl_api::Error>` impl; batch
// interpretation adds the batch-level variants below.

use thiserror::Error;

use crate::model::FailedCommand;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to provisioning server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Connection to provisioning server at {url} dropped before a reply: {reason}")]
    ConnectionLost { url: String, reason: String },

    #[error("TLS setup failed: {message}")]
    Tls { message: String },

    #[error("Provisioning server timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Session already released")]
    SessionReleased,

    // ── Gateway errors ───────────────────────────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Unexpected reply from provisioning server: {message}")]
    Protocol { message: String },

    // ── Batch errors ─────────────────────────────────────────────────
    #[error("Batch {batch_id} rejected: {message}")]
    BatchRejected { batch_id: String, message: String },

    #[error("Batch {batch_id} failed: {} command(s) rejected", .failures.len())]
    BatchFailed {
        batch_id: String,
        failures: Vec<FailedCommand>,
    },

    #[error("Batch {batch_id} completed with a warning: {message}")]
    BatchWarning { batch_id: String, message: String },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid input on line {line}: {reason}")]
    InputFormat { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The server could not be reached at all. Always safe to retry.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Failures where repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionLost { .. } | Self::Timeout { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rductl_api::Error> for CoreError {
    fn from(err: rductl_api::Error) -> Self {
        if err.is_timeout() {
            return CoreError::Timeout { timeout_secs: 0 };
        }
        let (connect, transient) = (err.is_connect(), err.is_transient());

        match err {
            rductl_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            rductl_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- re-authentication required".into(),
            },
            rductl_api::Error::SessionReleased => CoreError::SessionReleased,
            rductl_api::Error::Transport(e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                let reason = e.to_string();
                if connect {
                    CoreError::ConnectionFailed { url, reason }
                } else if transient {
                    // Sent, but the connection closed before a full reply.
                    CoreError::ConnectionLost { url, reason }
                } else {
                    CoreError::Api {
                        message: reason,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            rductl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            rductl_api::Error::Tls(message) => CoreError::Tls { message },
            rductl_api::Error::Gateway { message, status } => CoreError::Api {
                message,
                status: Some(status),
            },
            rductl_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
        }
    }
}
