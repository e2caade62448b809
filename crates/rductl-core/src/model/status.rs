// ── Batch statuses ──
//
// What the server reports after processing a batch, and the three-way
// interpretation every workflow applies to it.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::batch::{BatchCommand, SearchCursor};
use super::device::DeviceRecord;
use super::identifiers::DeviceId;

/// Batch-level status plus one entry per queued command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatus {
    pub batch_id: String,
    pub error: bool,
    pub warning: bool,
    pub error_message: Option<String>,
    /// Per-command statuses, in queue order.
    pub commands: Vec<CommandStatus>,
}

impl BatchStatus {
    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn is_warning(&self) -> bool {
        self.warning
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStatus {
    pub error: bool,
    pub error_message: Option<String>,
    pub data: CommandData,
}

/// Decoded payload of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommandData {
    /// Failed commands and commands without results.
    #[default]
    None,
    Page(SearchPage),
    Details(DeviceRecord),
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub device_ids: Vec<DeviceId>,
    /// `None` on the last page.
    pub cursor: Option<SearchCursor>,
}

// ── Interpretation ──────────────────────────────────────────────────

/// A command the server refused, or the batch itself when no command is
/// to blame (`index` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCommand {
    pub index: Option<usize>,
    pub target: Option<String>,
    pub message: String,
}

impl fmt::Display for FailedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target, self.index) {
            (Some(target), _) => write!(f, "{target}: {}", self.message),
            (None, Some(index)) => write!(f, "command #{}: {}", index + 1, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Success,
    SuccessWithWarning(String),
    PartialFailure(Vec<FailedCommand>),
}

impl BatchOutcome {
    /// Classify a status against the commands that produced it.
    ///
    /// Any failed command makes the outcome a failure, even when the
    /// batch-level flag claims success.
    pub fn from_status(status: &BatchStatus, commands: &[BatchCommand]) -> Self {
        let failures: Vec<FailedCommand> = status
            .commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| cmd.error)
            .map(|(index, cmd)| FailedCommand {
                index: Some(index),
                target: commands.get(index).and_then(BatchCommand::target),
                message: cmd
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "command failed".into()),
            })
            .collect();

        if status.error {
            if failures.is_empty() {
                return Self::PartialFailure(vec![FailedCommand {
                    index: None,
                    target: None,
                    message: status
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "batch failed".into()),
                }]);
            }
            return Self::PartialFailure(failures);
        }

        if !failures.is_empty() {
            warn!(
                batch_id = %status.batch_id,
                failed = failures.len(),
                "batch reported success but commands failed"
            );
            return Self::PartialFailure(failures);
        }

        if status.warning {
            return Self::SuccessWithWarning(
                status
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "batch completed with warnings".into()),
            );
        }

        Self::Success
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{DeviceType, MacAddress};

    fn status(error: bool, warning: bool, message: Option<&str>) -> BatchStatus {
        BatchStatus {
            batch_id: "b-1".into(),
            error,
            warning,
            error_message: message.map(String::from),
            commands: Vec::new(),
        }
    }

    fn failed(message: &str) -> CommandStatus {
        CommandStatus {
            error: true,
            error_message: Some(message.into()),
            data: CommandData::None,
        }
    }

    fn add(mac: &str) -> BatchCommand {
        BatchCommand::AddDevice {
            device_type: DeviceType::Docsis,
            mac: MacAddress::new(mac),
            owner_id: "1001".into(),
            class_of_service: "gold".into(),
            dhcp_criteria: "provisioned-docsis".into(),
        }
    }

    #[test]
    fn clean_status_is_success() {
        let mut st = status(false, false, None);
        st.commands.push(CommandStatus::default());
        assert_eq!(BatchOutcome::from_status(&st, &[]), BatchOutcome::Success);
    }

    #[test]
    fn warning_flag_is_reported() {
        let st = status(false, true, Some("device offline, change deferred"));
        assert_eq!(
            BatchOutcome::from_status(&st, &[]),
            BatchOutcome::SuccessWithWarning("device offline, change deferred".into())
        );
    }

    #[test]
    fn batch_error_without_command_detail() {
        let st = status(true, false, Some("BATCH_NOT_AUTHORIZED"));
        assert_eq!(
            BatchOutcome::from_status(&st, &[]),
            BatchOutcome::PartialFailure(vec![FailedCommand {
                index: None,
                target: None,
                message: "BATCH_NOT_AUTHORIZED".into(),
            }])
        );
    }

    #[test]
    fn failed_commands_name_their_device() {
        let commands = [add("00:11:22:33:44:55"), add("00:11:22:33:44:66")];
        let mut st = status(true, false, Some("BATCH_FAILED"));
        st.commands = vec![CommandStatus::default(), failed("duplicate MAC")];

        let BatchOutcome::PartialFailure(failures) = BatchOutcome::from_status(&st, &commands)
        else {
            panic!("expected PartialFailure");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, Some(1));
        assert_eq!(failures[0].to_string(), "00:11:22:33:44:66: duplicate MAC");
    }

    #[test]
    fn command_error_under_clean_batch_flag_is_still_a_failure() {
        let commands = [add("00:11:22:33:44:55")];
        let mut st = status(false, false, None);
        st.commands = vec![failed("invalid class of service")];

        assert!(matches!(
            BatchOutcome::from_status(&st, &commands),
            BatchOutcome::PartialFailure(_)
        ));
    }
}
