// ── Batches and commands ──
//
// A batch is the server's unit of atomic work: a list of commands plus
// three mode settings, submitted once under a fresh identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use uuid::Uuid;

use super::device::DeviceType;
use super::identifiers::{DeviceId, MacAddress};

pub use rductl_api::{ActivationMode, ConfirmationMode, PublishingMode};

/// MAC pattern that matches every device of a type.
pub const MATCH_ALL_PATTERN: &str = "*";

// ── Options ─────────────────────────────────────────────────────────

/// Mode settings applied to a whole batch.
///
/// The default is no activation, no confirmation and no publishing,
/// which is right for reads and for bulk adds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BatchOptions {
    pub activation: ActivationMode,
    pub confirmation: ConfirmationMode,
    pub publishing: PublishingMode,
}

impl BatchOptions {
    pub fn with_activation(mut self, activation: ActivationMode) -> Self {
        self.activation = activation;
        self
    }
}

// ── Search cursor ───────────────────────────────────────────────────

/// Continuation token for paginated searches.
///
/// Only ever obtained from a search result and handed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCursor(String);

impl SearchCursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Operations ──────────────────────────────────────────────────────

/// Device operations that can be invoked through a batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DeviceOperation {
    /// Reboot the device so it picks up its current configuration.
    Reset,
}

impl DeviceOperation {
    /// Activation mode the server requires for this operation to run.
    pub fn required_activation(self) -> ActivationMode {
        match self {
            Self::Reset => ActivationMode::Automatic,
        }
    }

    /// Name of the operation on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Reset => "resetDevice",
        }
    }
}

// ── Commands ────────────────────────────────────────────────────────

/// One command queued on a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCommand {
    /// One page of devices of a type, continuing from `cursor`.
    Search {
        device_type: DeviceType,
        cursor: Option<SearchCursor>,
        page_size: u32,
    },
    /// The property map of one device.
    GetDetails { device_id: DeviceId },
    /// Register a new device.
    AddDevice {
        device_type: DeviceType,
        mac: MacAddress,
        owner_id: String,
        class_of_service: String,
        dhcp_criteria: String,
    },
    /// Run an operation against an existing device.
    PerformOperation {
        operation: DeviceOperation,
        device_id: DeviceId,
    },
}

impl BatchCommand {
    /// Read-only commands may be resubmitted without side effects.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::Search { .. } | Self::GetDetails { .. })
    }

    /// The device this command acts on, for failure reports.
    pub fn target(&self) -> Option<String> {
        match self {
            Self::Search { .. } => None,
            Self::GetDetails { device_id } | Self::PerformOperation { device_id, .. } => {
                Some(device_id.to_string())
            }
            Self::AddDevice { mac, .. } => Some(mac.to_string()),
        }
    }
}

impl fmt::Display for BatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search { device_type, .. } => write!(f, "search {device_type}"),
            Self::GetDetails { device_id } => write!(f, "get details of {device_id}"),
            Self::AddDevice { mac, .. } => write!(f, "add {mac}"),
            Self::PerformOperation {
                operation,
                device_id,
            } => write!(f, "{operation} {device_id}"),
        }
    }
}

// ── Batch ───────────────────────────────────────────────────────────

/// An ordered list of commands with its mode settings and identifier.
///
/// Built through [`crate::Session::open_batch`]; a batch is posted at
/// most once and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: Uuid,
    options: BatchOptions,
    commands: Vec<BatchCommand>,
}

impl Batch {
    pub(crate) fn new(options: BatchOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            options,
            commands: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, command: BatchCommand) {
        self.commands.push(command);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    pub fn commands(&self) -> &[BatchCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// True when every queued command is read-only.
    pub fn is_idempotent(&self) -> bool {
        self.commands.iter().all(BatchCommand::is_idempotent)
    }
}
