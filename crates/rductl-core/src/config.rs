// ── Runtime connection configuration ──
//
// Describes how to reach one provisioning server. Carries credentials
// and connection tuning but never touches disk; the CLI builds a
// `ConnectionConfig` from its profile and flags and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::retry::RetryPolicy;

/// Default batch gateway port.
pub const DEFAULT_PORT: u16 = 49187;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab servers).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for rductl_api::TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for connecting to a single provisioning server.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Gateway URL (e.g., `https://rdu.example.net:49187`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient transport failures.
    pub retry: RetryPolicy,
}

impl ConnectionConfig {
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub(crate) fn transport(&self) -> rductl_api::TransportConfig {
        rductl_api::TransportConfig {
            tls: (&self.tls).into(),
            timeout: self.timeout,
        }
    }

    pub(crate) fn credentials(&self) -> rductl_api::Credentials {
        rductl_api::Credentials::new(self.username.clone(), self.password.clone())
    }
}
