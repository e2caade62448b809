//! Configuration for the rductl CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `rductl_core::ConnectionConfig`. Command-line
//! flags arrive as [`ConnectionOverrides`] and win over the profile.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use rductl_core::config::DEFAULT_PORT;
use rductl_core::workflow::{DEFAULT_DHCP_CRITERIA, DEFAULT_PAGE_SIZE};
use rductl_core::{ConnectionConfig, RetryPolicy, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "rductl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named provisioning server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Devices per search page during export.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Records per import batch. Unset sends one batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_chunk_size: Option<usize>,

    #[serde(default = "default_dhcp_criteria")]
    pub dhcp_criteria: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            import_chunk_size: None,
            dhcp_criteria: default_dhcp_criteria(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_dhcp_criteria() -> String {
    DEFAULT_DHCP_CRITERIA.into()
}

impl Defaults {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn import_chunk_size(&self) -> Option<NonZeroUsize> {
        self.import_chunk_size.and_then(NonZeroUsize::new)
    }
}

/// A named provisioning server profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// RDU host name or address.
    pub host: String,

    /// Batch gateway port (default 49187).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// "https" (default) or "http".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "rductl", "rductl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rductl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under
/// `RDUCTL_*` environment variables (`RDUCTL_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("RDUCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve a profile's password without command-line input.
///
/// Order: the profile's `password_env` variable, the system keyring,
/// then plaintext in the config file.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(pw) = keyring_entry(profile_name).and_then(|entry| {
        entry
            .get_password()
            .map_err(|e| ConfigError::Keyring(e.to_string()))
    }) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(password)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to core ─────────────────────────────────────────────

/// Connection settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub scheme: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub insecure: bool,
    pub timeout: Option<u64>,
}

/// Build the gateway base URL.
pub fn gateway_url(scheme: &str, host: &str, port: u16) -> Result<Url, ConfigError> {
    if !matches!(scheme, "http" | "https") {
        return Err(ConfigError::Validation {
            field: "scheme".into(),
            reason: format!("expected 'http' or 'https', got '{scheme}'"),
        });
    }
    if host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "host is empty".into(),
        });
    }
    let raw = format!("{scheme}://{}:{port}", host.trim());
    raw.parse().map_err(|e| ConfigError::Validation {
        field: "host".into(),
        reason: format!("invalid gateway URL {raw}: {e}"),
    })
}

/// Translate a profile (if any) plus overrides into a `ConnectionConfig`.
///
/// This is the single boundary where config types cross into core types.
/// Without a profile, the overrides alone must name the host and the
/// credentials.
pub fn connection_config(
    defaults: &Defaults,
    profile: Option<(&str, &Profile)>,
    overrides: &ConnectionOverrides,
) -> Result<ConnectionConfig, ConfigError> {
    let profile_name = profile.map_or("<command line>", |(name, _)| name);
    let base = profile.map(|(_, p)| p);

    // 1. Gateway URL (flag > profile)
    let host = overrides
        .host
        .as_deref()
        .or(base.map(|p| p.host.as_str()))
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConfigError::Validation {
            field: "host".into(),
            reason: "no host given (use --host or configure a profile)".into(),
        })?;
    let port = overrides
        .port
        .or(base.and_then(|p| p.port))
        .unwrap_or(DEFAULT_PORT);
    let scheme = overrides
        .scheme
        .as_deref()
        .or(base.and_then(|p| p.scheme.as_deref()))
        .unwrap_or("https");
    let url = gateway_url(scheme, host, port)?;

    // 2. Credentials (flag > profile chain)
    let username = overrides
        .username
        .clone()
        .or_else(|| base.and_then(|p| p.username.clone()))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = match (&overrides.password, base) {
        (Some(pw), _) => pw.clone(),
        (None, Some(p)) => resolve_password(p, profile_name)?,
        (None, None) => {
            return Err(ConfigError::NoCredentials {
                profile: profile_name.into(),
            });
        }
    };

    // 3. TLS verification
    let tls = if overrides.insecure
        || base.and_then(|p| p.insecure).unwrap_or(defaults.insecure)
    {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca_path) = base.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca_path)
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Timeout (flag > profile > defaults)
    let timeout_secs = overrides
        .timeout
        .or(base.and_then(|p| p.timeout))
        .unwrap_or(defaults.timeout);

    Ok(ConnectionConfig {
        url,
        username,
        password,
        tls,
        timeout: Duration::from_secs(timeout_secs),
        retry: defaults.retry_policy(),
    })
}
