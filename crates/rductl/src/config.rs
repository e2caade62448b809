//! Global flags to `rductl_config` types.

use secrecy::SecretString;

pub use rductl_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};
use rductl_core::ConnectionConfig;

use crate::cli::{GlobalOpts, Scheme};
use crate::error::CliError;

/// Profile selected by `--profile`, else the configured default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

pub fn overrides(global: &GlobalOpts) -> rductl_config::ConnectionOverrides {
    rductl_config::ConnectionOverrides {
        host: global.host.clone(),
        port: global.port,
        scheme: global.scheme.map(|s| {
            match s {
                Scheme::Http => "http",
                Scheme::Https => "https",
            }
            .to_owned()
        }),
        username: global.username.clone(),
        password: global.password.clone().map(SecretString::from),
        insecure: global.insecure,
        timeout: global.timeout,
    }
}

/// Resolve the connection for a server command.
///
/// An explicitly named profile must exist. Without one, the default
/// profile is used when present, otherwise the flags alone.
pub fn connection_config(global: &GlobalOpts, cfg: &Config) -> Result<ConnectionConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profiles.get(&profile_name);

    if profile.is_none() {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(cfg),
                name: profile_name,
            });
        }
        if global.host.is_none() {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    }

    let resolved = rductl_config::connection_config(
        &cfg.defaults,
        profile.map(|p| (profile_name.as_str(), p)),
        &overrides(global),
    )?;
    Ok(resolved)
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
