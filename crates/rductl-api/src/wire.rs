// Batch gateway wire types
//
// JSON shapes exchanged with the gateway. Everything is camelCase on the
// wire; commands are tagged by `op`. Command payloads in replies stay as
// raw `serde_json::Value` because their shape depends on which command
// produced them -- `rductl-core` decodes them against the queued command.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ── Batch modes ─────────────────────────────────────────────────────

/// When the RDU applies configuration changes produced by a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationMode {
    /// Persist changes only; devices pick them up on their next contact.
    #[default]
    NoActivation,
    /// Push changes to the affected devices as part of the batch.
    Automatic,
}

/// Whether the RDU waits for device confirmation before reporting success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationMode {
    #[default]
    NoConfirmation,
    CustomConfirmation,
}

/// Whether batch results are published to external listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishingMode {
    #[default]
    NoPublishing,
    Publish,
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginReply {
    pub token: String,
    #[serde(default)]
    pub server_version: Option<String>,
}

/// One batch as posted to `POST /api/v1/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub batch_id: Uuid,
    pub activation: ActivationMode,
    pub confirmation: ConfirmationMode,
    pub publishing: PublishingMode,
    pub commands: Vec<WireCommand>,
}

/// A single queued command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WireCommand {
    Search {
        device_type: String,
        mac_pattern: String,
        cursor: Option<String>,
        page_size: u32,
    },
    GetDetails {
        device_id: String,
        include_lease_info: bool,
    },
    AddDevice {
        device_type: String,
        mac_address: String,
        owner_id: String,
        class_of_service: String,
        dhcp_criteria: String,
    },
    PerformOperation {
        operation: String,
        device_id: String,
    },
}

// ── Replies ─────────────────────────────────────────────────────────

/// Reply to a posted batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReply {
    pub batch_id: String,
    pub status: WireBatchStatus,
    /// Per-command statuses, in the order the commands were queued.
    #[serde(default)]
    pub commands: Vec<WireCommandStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBatchStatus {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCommandStatus {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Payload of a `search` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    #[serde(default)]
    pub device_ids: Vec<String>,
    /// Continuation token. `None` marks the last page.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Payload of a `getDetails` command: property path → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceProperties(pub BTreeMap<String, Value>);

impl DeviceProperties {
    /// Read a property as text. Numbers and booleans are rendered,
    /// `null` and missing keys are `None`.
    pub fn get_str(&self, path: &str) -> Option<String> {
        match self.0.get(path)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Error body some gateway deployments return on non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct GatewayErrorBody {
    pub error: Option<GatewayErrorInner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GatewayErrorInner {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
