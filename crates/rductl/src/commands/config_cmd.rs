//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Confirm, Input, Select};
use serde::Serialize;

use rductl_core::config::DEFAULT_PORT;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output::{self, Ui};

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    cfg
}

fn format_config_redacted(cfg: &Config) -> String {
    toml::to_string_pretty(&redacted(cfg)).unwrap_or_else(|e| format!("# unrenderable: {e}"))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Ask for a password and store it in the keyring, or return it for the
/// config file when the user prefers plaintext.
fn prompt_password_storage(profile_name: &str) -> Result<Option<String>, CliError> {
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_password(profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password))
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "host" => profile.host = value,
        "port" => profile.port = Some(parse_value("port", &value, "a port number")?),
        "scheme" => {
            if !matches!(value.as_str(), "http" | "https") {
                return Err(CliError::Validation {
                    field: "scheme".into(),
                    reason: "must be 'http' or 'https'".into(),
                });
            }
            profile.scheme = Some(value);
        }
        "username" => profile.username = Some(value),
        "password_env" | "password-env" => profile.password_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(parse_value("insecure", &value, "'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_value("timeout", &value, "a number (seconds)")?);
        }
        "password" => {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "use `rductl config set-password` to store passwords".into(),
            });
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, port, scheme, \
                     username, password_env, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ProfileEntry<'a> {
    name: &'a str,
    host: &'a str,
    default: bool,
}

fn profile_list(cfg: &Config) -> String {
    let default = cfg.default_profile.as_deref().unwrap_or("default");
    let mut names: Vec<&String> = cfg.profiles.keys().collect();
    names.sort();
    let mut out = String::new();
    for name in names {
        let marker = if name == default { " *" } else { "" };
        let _ = writeln!(out, "{name}{marker}");
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("rductl configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            if cfg.profiles.contains_key(&profile_name)
                && !Confirm::new()
                    .with_prompt(format!("Profile '{profile_name}' exists. Overwrite?"))
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?
            {
                eprintln!("Nothing changed.");
                return Ok(());
            }

            let host: String = Input::new()
                .with_prompt("RDU host")
                .interact_text()
                .map_err(prompt_err)?;
            let port: u16 = Input::new()
                .with_prompt("Batch gateway port")
                .default(DEFAULT_PORT)
                .interact_text()
                .map_err(prompt_err)?;
            let username: String = Input::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(prompt_err)?;
            let password = prompt_password_storage(&profile_name)?;

            let profile = Profile {
                host,
                port: (port != DEFAULT_PORT).then_some(port),
                username: Some(username),
                password,
                ..Profile::default()
            };
            // Validate before writing anything.
            rductl_config::gateway_url("https", &profile.host, port)?;

            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: rductl show <mac>");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let ui = Ui::new(global, &cfg.defaults);
            let out = match ui.format {
                OutputFormat::Table | OutputFormat::Plain => format_config_redacted(&cfg),
                OutputFormat::Json => serde_json::to_string_pretty(&redacted(&cfg))?,
                OutputFormat::JsonCompact => serde_json::to_string(&redacted(&cfg))?,
                OutputFormat::Yaml => serde_yaml::to_string(&redacted(&cfg))?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: rductl config init");
                return Ok(());
            }
            let ui = Ui::new(global, &cfg.defaults);
            let out = match ui.format {
                OutputFormat::Table | OutputFormat::Plain => profile_list(&cfg),
                format => {
                    let default = cfg.default_profile.as_deref().unwrap_or("default");
                    let mut entries: Vec<ProfileEntry<'_>> = cfg
                        .profiles
                        .iter()
                        .map(|(name, p)| ProfileEntry {
                            name,
                            host: &p.host,
                            default: name == default,
                        })
                        .collect();
                    entries.sort_by(|a, b| a.name.cmp(b.name));
                    match format {
                        OutputFormat::Yaml => serde_yaml::to_string(&entries)?,
                        OutputFormat::JsonCompact => serde_json::to_string(&entries)?,
                        _ => serde_json::to_string_pretty(&entries)?,
                    }
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&profile_name, &password)?;
            eprintln!("✓ Password for '{profile_name}' stored in system keyring");
            Ok(())
        }
    }
}
