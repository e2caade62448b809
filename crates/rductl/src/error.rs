//! CLI error types with miette diagnostics.
//!
//! Lifts `CoreError` and `ConfigError` into user-facing errors with help
//! text, and maps each one to a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use rductl_config::ConfigError;
use rductl_core::{CoreError, FailedCommand};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const INPUT: i32 = 9;
    pub const BATCH: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to provisioning server at {url}")]
    #[diagnostic(
        code(rductl::connection_failed),
        help(
            "Check that the batch gateway is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Connection to provisioning server at {url} dropped before a reply")]
    #[diagnostic(
        code(rductl::connection_lost),
        help(
            "The batch may or may not have been applied. Check the device\n\
             with `rductl show` before retrying. Reason: {reason}"
        )
    )]
    ConnectionLost { url: String, reason: String },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(rductl::tls_error),
        help(
            "Use --insecure (-k) to accept a self-signed certificate,\n\
             or point ca_cert in your profile at the gateway's CA."
        )
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(rductl::auth_failed),
        help("Check the user name and password.\nRun: rductl config set-password")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(rductl::no_credentials),
        help(
            "Configure a profile with: rductl config init\n\
             Or pass --username and --password (RDUCTL_PASSWORD)."
        )
    )]
    NoCredentials { profile: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No provisioning server configured")]
    #[diagnostic(
        code(rductl::no_config),
        help(
            "Create a profile with: rductl config init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(rductl::profile_not_found),
        help("Available profiles: {available}\nCreate one with: rductl config init")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rductl::validation))]
    Validation { field: String, reason: String },

    #[error("{0}")]
    #[diagnostic(code(rductl::config))]
    Config(String),

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(rductl::keyring),
        help("Set the password with --password, RDUCTL_PASSWORD or password_env instead.")
    )]
    Keyring(String),

    // ── Input ────────────────────────────────────────────────────────
    #[error("Malformed input on line {line}: {reason}")]
    #[diagnostic(
        code(rductl::input_format),
        help("Each line must be ownerID|macAddress|classOfService. Nothing was submitted.")
    )]
    InputFormat { line: usize, reason: String },

    // ── Batch ────────────────────────────────────────────────────────
    #[error("Batch {batch_id} failed: {} command(s) rejected", .failures.len())]
    #[diagnostic(code(rductl::batch_failed))]
    BatchFailed {
        batch_id: String,
        failures: Vec<FailedCommand>,
        #[help]
        details: String,
    },

    #[error("Batch {batch_id} rejected: {message}")]
    #[diagnostic(code(rductl::batch_rejected))]
    BatchRejected { batch_id: String, message: String },

    #[error("Batch {batch_id} completed with a warning: {message}")]
    #[diagnostic(
        code(rductl::batch_warning),
        help("Export stops on warnings so a partial file is never taken as complete.")
    )]
    BatchWarning { batch_id: String, message: String },

    // ── Gateway ──────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(rductl::api_error))]
    ApiError { message: String, status: Option<u16> },

    #[error("Unexpected reply from provisioning server: {message}")]
    #[diagnostic(
        code(rductl::protocol),
        help("The batch gateway may be a different version. Re-run with -vv for details.")
    )]
    Protocol { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(rductl::timeout),
        help("Increase the timeout with --timeout or check server load.")
    )]
    Timeout { seconds: u64 },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(rductl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(rductl::internal))]
    Internal(String),

    #[error(transparent)]
    #[diagnostic(code(rductl::io))]
    Io(#[from] std::io::Error),

    #[error("JSON rendering failed: {0}")]
    #[diagnostic(code(rductl::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(rductl::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. }
            | Self::ConnectionLost { .. }
            | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::InputFormat { .. } => exit_code::INPUT,
            Self::BatchFailed { .. } | Self::BatchRejected { .. } | Self::BatchWarning { .. } => {
                exit_code::BATCH
            }
            Self::Validation { .. }
            | Self::NoConfig { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

fn failure_details(failures: &[FailedCommand]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::ConnectionLost { url, reason } => Self::ConnectionLost { url, reason },
            CoreError::Tls { message } => Self::TlsError { message },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::SessionReleased => {
                Self::Internal("provisioning session used after release".into())
            }
            CoreError::Api { message, status } => Self::ApiError { message, status },
            CoreError::Protocol { message } => Self::Protocol { message },
            CoreError::BatchRejected { batch_id, message } => {
                Self::BatchRejected { batch_id, message }
            }
            CoreError::BatchFailed { batch_id, failures } => Self::BatchFailed {
                details: failure_details(&failures),
                batch_id,
                failures,
            },
            CoreError::BatchWarning { batch_id, message } => {
                Self::BatchWarning { batch_id, message }
            }
            CoreError::InputFormat { line, reason } => Self::InputFormat { line, reason },
            CoreError::Io(e) => Self::Io(e),
            CoreError::Config { message } => Self::Config(message),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: "(see: rductl config profiles)".into(),
            },
            ConfigError::Keyring(message) => Self::Keyring(message),
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}
