// Single-device operations.

use serde::Serialize;
use tracing::info;

use crate::error::CoreError;
use crate::model::{BatchCommand, BatchOptions, DeviceId, DeviceOperation, MacAddress};
use crate::provisioner::Provisioner;
use crate::session::{Session, WarningPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub operation: DeviceOperation,
    pub device: String,
    pub batch_id: String,
    pub warning: Option<String>,
}

/// Run `operation` against the device with MAC `mac`.
///
/// One batch, one command, submitted once. The batch uses the activation
/// mode the operation requires.
pub async fn perform_operation<P: Provisioner>(
    session: &mut Session<P>,
    operation: DeviceOperation,
    mac: &MacAddress,
) -> Result<OperationReport, CoreError> {
    let options = BatchOptions::default().with_activation(operation.required_activation());
    let mut batch = session.open_batch(options);
    batch.queue(BatchCommand::PerformOperation {
        operation,
        device_id: DeviceId::from(mac),
    });
    let completed = batch.submit().await?.check(WarningPolicy::Report)?;

    info!(%operation, device = %mac, batch_id = %completed.batch_id, "operation submitted");
    Ok(OperationReport {
        operation,
        device: mac.to_string(),
        batch_id: completed.batch_id,
        warning: completed.warning,
    })
}
