// In-memory provisioning server for workflow tests.
//
// Holds a device inventory and answers batches the way the RDU does:
// searches page through devices of one type with opaque cursors, a batch
// with any failed command reports an error and commits nothing, and
// operations need automatic activation. Faults can be queued to make the
// next submit attempts fail at the transport level.

#![allow(clippy::unwrap_used)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rductl_api::DeviceProperties;
use serde_json::Value;

use crate::convert;
use crate::error::CoreError;
use crate::model::{
    ActivationMode, Batch, BatchCommand, BatchOptions, BatchStatus, CommandData, CommandStatus,
    DeviceId, DeviceRecord, DeviceType, SearchCursor, SearchPage,
};
use crate::provisioner::Provisioner;

/// Transport failure for the next submit attempt.
pub(crate) enum Fault {
    ConnectRefused,
    ConnectionLost,
    Timeout,
}

impl Fault {
    fn into_error(self) -> CoreError {
        match self {
            Self::ConnectRefused => CoreError::ConnectionFailed {
                url: "sim://rdu".into(),
                reason: "connection refused".into(),
            },
            Self::ConnectionLost => CoreError::ConnectionLost {
                url: "sim://rdu/api/v1/batch".into(),
                reason: "connection closed before message completed".into(),
            },
            Self::Timeout => CoreError::Timeout { timeout_secs: 30 },
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct ReleaseCounter(Arc<AtomicU32>);

impl ReleaseCounter {
    pub(crate) fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct SimDevice {
    device_type: DeviceType,
    owner_id: String,
    mac: String,
    class_of_service: String,
    dhcp_criteria: String,
}

impl SimDevice {
    fn properties(&self) -> DeviceProperties {
        let mut props = DeviceProperties::default();
        for (path, value) in [
            (convert::PROP_OWNER_ID, &self.owner_id),
            (convert::PROP_MAC_ADDRESS, &self.mac),
            (convert::PROP_CLASS_OF_SERVICE, &self.class_of_service),
            (convert::PROP_DHCP_CRITERIA, &self.dhcp_criteria),
        ] {
            props.0.insert(path.into(), Value::String(value.clone()));
        }
        props.0.insert(
            convert::PROP_DEVICE_TYPE.into(),
            Value::String(self.device_type.to_string()),
        );
        props
    }
}

#[derive(Default)]
struct State {
    devices: Vec<SimDevice>,
    submitted: Vec<Batch>,
    faults: VecDeque<Fault>,
    warning: Option<String>,
    reject_next: Option<String>,
    failing_details: HashSet<String>,
    fail_release: bool,
    attempts: u32,
}

pub(crate) struct ScriptedProvisioner {
    state: Mutex<State>,
    released: ReleaseCounter,
}

impl ScriptedProvisioner {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            released: ReleaseCounter::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Inventory ────────────────────────────────────────────────────

    pub(crate) fn add_device(&self, device_type: DeviceType, owner: &str, mac: &str, cos: &str) {
        self.lock().devices.push(SimDevice {
            device_type,
            owner_id: owner.into(),
            mac: mac.into(),
            class_of_service: cos.into(),
            dhcp_criteria: "provisioned-docsis".into(),
        });
    }

    /// Add `count` devices with generated owners and MACs.
    pub(crate) fn add_devices(&self, device_type: DeviceType, count: usize) {
        let prefix = match device_type {
            DeviceType::Docsis => "00",
            DeviceType::PacketCableMta => "02",
        };
        for i in 0..count {
            let mac = format!("{prefix}:00:00:00:{:02x}:{:02x}", i / 256, i % 256);
            self.add_device(device_type, &format!("{}", 1000 + i), &mac, "gold");
        }
    }

    pub(crate) fn device(&self, mac: &str) -> Option<DeviceRecord> {
        self.lock()
            .devices
            .iter()
            .find(|d| d.mac == mac)
            .map(|d| convert::device_record(&d.properties(), &DeviceId::new(mac)))
    }

    pub(crate) fn device_count(&self) -> usize {
        self.lock().devices.len()
    }

    // ── Scripted behavior ────────────────────────────────────────────

    pub(crate) fn set_warning(&self, message: &str) {
        self.lock().warning = Some(message.into());
    }

    pub(crate) fn reject_next_batch(&self, message: &str) {
        self.lock().reject_next = Some(message.into());
    }

    pub(crate) fn inject_fault(&self, fault: Fault) {
        self.lock().faults.push_back(fault);
    }

    pub(crate) fn fail_details_for(&self, mac: &str) {
        self.lock().failing_details.insert(mac.into());
    }

    pub(crate) fn fail_release(&self) {
        self.lock().fail_release = true;
    }

    // ── Recorded traffic ─────────────────────────────────────────────

    /// Submit attempts, including those failed by a fault.
    pub(crate) fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    /// Batches the server processed, in order.
    pub(crate) fn submitted(&self) -> Vec<Batch> {
        self.lock().submitted.clone()
    }

    /// Cursor sent with each search, in order.
    pub(crate) fn search_cursors(&self) -> Vec<Option<SearchCursor>> {
        self.commands()
            .into_iter()
            .filter_map(|(_, cmd)| match cmd {
                BatchCommand::Search { cursor, .. } => Some(cursor),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn detail_fetches(&self) -> usize {
        self.commands()
            .iter()
            .filter(|(_, cmd)| matches!(cmd, BatchCommand::GetDetails { .. }))
            .count()
    }

    /// Every processed command with the options of its batch.
    pub(crate) fn commands(&self) -> Vec<(BatchOptions, BatchCommand)> {
        self.lock()
            .submitted
            .iter()
            .flat_map(|b| b.commands().iter().map(move |c| (b.options(), c.clone())))
            .collect()
    }

    pub(crate) fn release_counter(&self) -> ReleaseCounter {
        self.released.clone()
    }
}

impl State {
    fn process(&mut self, batch: &Batch) -> BatchStatus {
        let batch_id = format!("sim-{}", self.submitted.len());

        if let Some(message) = self.reject_next.take() {
            return BatchStatus {
                batch_id,
                error: true,
                warning: false,
                error_message: Some(message),
                commands: Vec::new(),
            };
        }

        let mut added = Vec::new();
        let commands: Vec<CommandStatus> = batch
            .commands()
            .iter()
            .map(|cmd| self.run(cmd, batch.options(), &mut added))
            .collect();

        let error = commands.iter().any(|c| c.error);
        if !error {
            self.devices.extend(added);
        }

        BatchStatus {
            batch_id,
            error,
            warning: !error && self.warning.is_some(),
            error_message: if error {
                Some("BATCH_FAILED".into())
            } else {
                self.warning.clone()
            },
            commands,
        }
    }

    fn run(
        &self,
        command: &BatchCommand,
        options: BatchOptions,
        added: &mut Vec<SimDevice>,
    ) -> CommandStatus {
        match command {
            BatchCommand::Search {
                device_type,
                cursor,
                page_size,
            } => {
                let offset = match cursor {
                    None => 0,
                    Some(c) => match parse_cursor(c, *device_type) {
                        Some(offset) => offset,
                        None => return failed("invalid search bookmark"),
                    },
                };
                let size = usize::try_from(*page_size).unwrap();
                let device_ids: Vec<DeviceId> = self
                    .devices
                    .iter()
                    .filter(|d| d.device_type == *device_type)
                    .skip(offset)
                    .take(size)
                    .map(|d| DeviceId::new(d.mac.clone()))
                    .collect();
                // A full page always carries a cursor; the next page may be empty.
                let cursor = (size > 0 && device_ids.len() == size)
                    .then(|| SearchCursor::new(format!("bm/{device_type}/{}", offset + size)));
                ok(CommandData::Page(SearchPage { device_ids, cursor }))
            }
            BatchCommand::GetDetails { device_id } => {
                if self.failing_details.contains(device_id.as_str()) {
                    return failed("lookup failed");
                }
                match self.devices.iter().find(|d| d.mac == device_id.as_str()) {
                    Some(device) => ok(CommandData::Details(convert::device_record(
                        &device.properties(),
                        device_id,
                    ))),
                    None => failed("device not found"),
                }
            }
            BatchCommand::AddDevice {
                device_type,
                mac,
                owner_id,
                class_of_service,
                dhcp_criteria,
            } => {
                let exists = self
                    .devices
                    .iter()
                    .chain(added.iter())
                    .any(|d| d.mac == mac.as_str());
                if exists {
                    return failed(&format!("device {mac} already exists"));
                }
                added.push(SimDevice {
                    device_type: *device_type,
                    owner_id: owner_id.clone(),
                    mac: mac.to_string(),
                    class_of_service: class_of_service.clone(),
                    dhcp_criteria: dhcp_criteria.clone(),
                });
                ok(CommandData::None)
            }
            BatchCommand::PerformOperation { device_id, .. } => {
                if options.activation != ActivationMode::Automatic {
                    return failed("operation requires automatic activation");
                }
                if self.devices.iter().any(|d| d.mac == device_id.as_str()) {
                    ok(CommandData::None)
                } else {
                    failed("device not found")
                }
            }
        }
    }
}

fn parse_cursor(cursor: &SearchCursor, device_type: DeviceType) -> Option<usize> {
    let rest = cursor.as_str().strip_prefix("bm/")?;
    let (kind, offset) = rest.split_once('/')?;
    if kind != device_type.to_string() {
        return None;
    }
    offset.parse().ok()
}

fn ok(data: CommandData) -> CommandStatus {
    CommandStatus {
        error: false,
        error_message: None,
        data,
    }
}

fn failed(message: &str) -> CommandStatus {
    CommandStatus {
        error: true,
        error_message: Some(message.into()),
        data: CommandData::None,
    }
}

impl Provisioner for ScriptedProvisioner {
    async fn submit(&self, batch: &Batch) -> Result<BatchStatus, CoreError> {
        let mut state = self.lock();
        state.attempts += 1;
        if let Some(fault) = state.faults.pop_front() {
            return Err(fault.into_error());
        }
        state.submitted.push(batch.clone());
        Ok(state.process(batch))
    }

    async fn release(&self) -> Result<(), CoreError> {
        self.released.0.fetch_add(1, Ordering::SeqCst);
        if self.lock().fail_release {
            return Err(CoreError::Api {
                message: "session unknown".into(),
                status: Some(404),
            });
        }
        Ok(())
    }
}
