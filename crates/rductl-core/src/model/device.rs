// ── Device records ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Device categories the export and import workflows handle.
///
/// `Display` renders the server's type name; parsing also accepts the
/// short forms used on the command line (`docsis`, `mta`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum DeviceType {
    #[strum(to_string = "DOCSIS")]
    Docsis,
    #[strum(to_string = "PACKET_CABLE_MTA", serialize = "MTA", serialize = "PKTCBL")]
    PacketCableMta,
}

impl DeviceType {
    /// Human-readable name for progress and summary output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Docsis => "DOCSIS modem",
            Self::PacketCableMta => "PacketCable MTA",
        }
    }

    /// Export file written when none is given.
    pub fn default_export_file(self) -> &'static str {
        match self {
            Self::Docsis => "docsis_export.txt",
            Self::PacketCableMta => "pktcbl_export.txt",
        }
    }
}

/// One device as read back from the provisioning server.
///
/// Every field except the MAC may be absent on the server; absent fields
/// are written as empty strings in export lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    pub owner_id: Option<String>,
    pub mac_address: String,
    pub class_of_service: Option<String>,
    pub dhcp_criteria: Option<String>,
    pub device_type: Option<DeviceType>,
    pub protocol_version: Option<String>,
}

impl DeviceRecord {
    /// Render as `ownerId|macAddress|classOfService|dhcpCriteria`.
    pub fn export_line(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.owner_id.as_deref().unwrap_or_default(),
            self.mac_address,
            self.class_of_service.as_deref().unwrap_or_default(),
            self.dhcp_criteria.as_deref().unwrap_or_default(),
        )
    }
}
