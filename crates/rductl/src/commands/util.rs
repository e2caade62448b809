//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};

use tracing::info;

use rductl_core::{DeviceType, MacAddress, RduProvisioner, Session};

use crate::cli::{DeviceKind, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Resolve the connection settings and log in.
pub async fn connect(global: &GlobalOpts, cfg: &Config) -> Result<Session<RduProvisioner>, CliError> {
    let conn = config::connection_config(global, cfg)?;
    info!(url = %conn.url, user = %conn.username, "connecting to provisioning server");
    let session = Session::connect(&conn).await?;
    if let Some(version) = session.provisioner().server_version() {
        info!(server_version = version, "session opened");
    }
    Ok(session)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, `--yes` is required.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))?;
    Ok(confirmed)
}

pub fn device_type(kind: DeviceKind) -> DeviceType {
    match kind {
        DeviceKind::Docsis => DeviceType::Docsis,
        DeviceKind::Mta => DeviceType::PacketCableMta,
    }
}

/// Normalize a MAC given on the command line.
pub fn parse_mac(raw: &str) -> Result<MacAddress, CliError> {
    let mac = MacAddress::new(raw);
    if mac.is_empty() {
        return Err(CliError::Validation {
            field: "mac".into(),
            reason: "MAC address is empty".into(),
        });
    }
    Ok(mac)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mta_maps_to_packet_cable() {
        assert_eq!(device_type(DeviceKind::Mta), DeviceType::PacketCableMta);
        assert_eq!(device_type(DeviceKind::Docsis), DeviceType::Docsis);
    }

    #[test]
    fn mac_is_normalized() {
        assert_eq!(parse_mac(" AA-BB-CC-00-11-22 ").unwrap().as_str(), "aa:bb:cc:00:11:22");
        assert!(matches!(parse_mac("  "), Err(CliError::Validation { .. })));
    }

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("reset", "Reset?", true).unwrap());
    }
}
