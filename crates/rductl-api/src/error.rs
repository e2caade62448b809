use thiserror::Error;

/// Top-level error type for the `rductl-api` crate.
///
/// Covers every failure mode of the batch gateway: authentication,
/// transport, gateway-reported errors and undecodable replies.
/// `rductl-core` maps these into workflow-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (bad credentials, locked account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The gateway no longer recognizes the session token.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// A call was attempted after the session was released.
    #[error("Session already released")]
    SessionReleased,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Gateway ─────────────────────────────────────────────────────
    /// Non-success HTTP status with an optional structured message.
    #[error("Gateway error (HTTP {status}): {message}")]
    Gateway { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request never reached the gateway.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }

    /// Returns `true` if the request was sent but no reply arrived in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if the connection failed before any HTTP status
    /// came back: refused, timed out, or dropped mid-exchange.
    ///
    /// Request-building failures are local and never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(e) if e.status().is_none() && !e.is_builder())
    }
}
