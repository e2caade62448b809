// ── Wire ↔ domain conversion ──
//
// Maps domain batches onto gateway requests and decodes gateway replies
// against the commands that produced them. Command payloads are only
// decoded for commands that succeeded.

use rductl_api::{BatchReply, BatchRequest, DeviceProperties, SearchData, WireCommand};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{
    Batch, BatchCommand, BatchStatus, CommandData, CommandStatus, DeviceId, DeviceRecord,
    DeviceType, MATCH_ALL_PATTERN, SearchCursor, SearchPage,
};

// ── Property paths ──────────────────────────────────────────────────

pub const PROP_OWNER_ID: &str = "/ownerID";
pub const PROP_MAC_ADDRESS: &str = "/network/macAddress";
pub const PROP_CLASS_OF_SERVICE: &str = "/provisioning/classOfService";
pub const PROP_DHCP_CRITERIA: &str = "/provisioning/dhcpCriteria";
pub const PROP_DOCSIS_VERSION: &str = "/network/docsisVersion";
pub const PROP_DEVICE_TYPE: &str = "/deviceType";

// ── Requests ────────────────────────────────────────────────────────

pub fn batch_request(batch: &Batch) -> BatchRequest {
    let options = batch.options();
    BatchRequest {
        batch_id: batch.id(),
        activation: options.activation,
        confirmation: options.confirmation,
        publishing: options.publishing,
        commands: batch.commands().iter().map(wire_command).collect(),
    }
}

pub fn wire_command(command: &BatchCommand) -> WireCommand {
    match command {
        BatchCommand::Search {
            device_type,
            cursor,
            page_size,
        } => WireCommand::Search {
            device_type: device_type.to_string(),
            mac_pattern: MATCH_ALL_PATTERN.into(),
            cursor: cursor.as_ref().map(|c| c.as_str().to_owned()),
            page_size: *page_size,
        },
        BatchCommand::GetDetails { device_id } => WireCommand::GetDetails {
            device_id: device_id.to_string(),
            include_lease_info: false,
        },
        BatchCommand::AddDevice {
            device_type,
            mac,
            owner_id,
            class_of_service,
            dhcp_criteria,
        } => WireCommand::AddDevice {
            device_type: device_type.to_string(),
            mac_address: mac.to_string(),
            owner_id: owner_id.clone(),
            class_of_service: class_of_service.clone(),
            dhcp_criteria: dhcp_criteria.clone(),
        },
        BatchCommand::PerformOperation {
            operation,
            device_id,
        } => WireCommand::PerformOperation {
            operation: operation.wire_name().into(),
            device_id: device_id.to_string(),
        },
    }
}

// ── Replies ─────────────────────────────────────────────────────────

/// Decode a reply into a [`BatchStatus`].
///
/// A batch the server accepted must report one status per queued
/// command; a rejected batch may report fewer.
pub fn batch_status(reply: BatchReply, commands: &[BatchCommand]) -> Result<BatchStatus, CoreError> {
    if !reply.status.error && reply.commands.len() != commands.len() {
        return Err(CoreError::Protocol {
            message: format!(
                "batch {} returned {} command statuses for {} commands",
                reply.batch_id,
                reply.commands.len(),
                commands.len()
            ),
        });
    }

    let statuses = reply
        .commands
        .into_iter()
        .zip(commands)
        .map(|(wire, command)| {
            let data = if wire.error {
                CommandData::None
            } else {
                command_data(command, wire.data)?
            };
            Ok(CommandStatus {
                error: wire.error,
                error_message: wire.error_message,
                data,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(BatchStatus {
        batch_id: reply.batch_id,
        error: reply.status.error,
        warning: reply.status.warning,
        error_message: reply.status.error_message,
        commands: statuses,
    })
}

fn command_data(command: &BatchCommand, data: Value) -> Result<CommandData, CoreError> {
    match command {
        BatchCommand::Search { .. } => {
            let page: SearchData = decode(data, "search")?;
            Ok(CommandData::Page(SearchPage {
                device_ids: page.device_ids.into_iter().map(DeviceId::from).collect(),
                cursor: page.cursor.map(SearchCursor::new),
            }))
        }
        BatchCommand::GetDetails { device_id } => {
            let props: DeviceProperties = decode(data, "device details")?;
            Ok(CommandData::Details(device_record(&props, device_id)))
        }
        BatchCommand::AddDevice { .. } | BatchCommand::PerformOperation { .. } => {
            Ok(CommandData::None)
        }
    }
}

fn decode<T: DeserializeOwned>(data: Value, what: &str) -> Result<T, CoreError> {
    serde_json::from_value(data).map_err(|e| CoreError::Protocol {
        message: format!("malformed {what} payload: {e}"),
    })
}

/// Build a [`DeviceRecord`] from a detail property map.
///
/// `requested` stands in for the MAC when the map lacks one.
pub fn device_record(props: &DeviceProperties, requested: &DeviceId) -> DeviceRecord {
    DeviceRecord {
        owner_id: props.get_str(PROP_OWNER_ID),
        mac_address: props
            .get_str(PROP_MAC_ADDRESS)
            .unwrap_or_else(|| requested.to_string()),
        class_of_service: props.get_str(PROP_CLASS_OF_SERVICE),
        dhcp_criteria: props.get_str(PROP_DHCP_CRITERIA),
        device_type: props
            .get_str(PROP_DEVICE_TYPE)
            .and_then(|t| t.parse::<DeviceType>().ok()),
        protocol_version: props.get_str(PROP_DOCSIS_VERSION),
    }
}
