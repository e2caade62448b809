// Single-device detail lookups.

use tracing::debug;

use crate::error::CoreError;
use crate::model::{BatchCommand, BatchOptions, CommandData, DeviceId, DeviceRecord, MacAddress};
use crate::provisioner::Provisioner;
use crate::session::{Session, WarningPolicy};

/// Fetch the detail record of one device in its own batch.
///
/// Uses the default (no-activation) modes. Warnings abort the lookup.
pub async fn device_details<P: Provisioner>(
    session: &mut Session<P>,
    device_id: &DeviceId,
) -> Result<DeviceRecord, CoreError> {
    let mut batch = session.open_batch(BatchOptions::default());
    batch.queue(BatchCommand::GetDetails {
        device_id: device_id.clone(),
    });
    let mut completed = batch.submit().await?.check(WarningPolicy::Abort)?;

    match completed.take(0) {
        CommandData::Details(record) => {
            debug!(device = %device_id, "fetched device details");
            Ok(record)
        }
        other => Err(CoreError::Protocol {
            message: format!("expected device details for {device_id}, got {other:?}"),
        }),
    }
}

/// Look up one device by MAC address.
pub async fn show_device<P: Provisioner>(
    session: &mut Session<P>,
    mac: &MacAddress,
) -> Result<DeviceRecord, CoreError> {
    device_details(session, &DeviceId::from(mac)).await
}
