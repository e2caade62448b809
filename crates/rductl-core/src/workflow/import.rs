// ── Bulk import ──
//
// Reads `ownerID|macAddress|classOfService` records and adds them as
// DOCSIS devices. The whole input is parsed before anything is sent, so
// a malformed line never leaves a half-imported file behind. Records go
// out in one batch unless a chunk size is set.

use std::io::BufRead;
use std::num::NonZeroUsize;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{BatchCommand, BatchOptions, DeviceType, MacAddress};
use crate::provisioner::Provisioner;
use crate::session::{Session, WarningPolicy};

/// Provisioning label applied to imported devices.
pub const DEFAULT_DHCP_CRITERIA: &str = "provisioned-docsis";

const FIELD_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// 1-based line number in the input.
    pub line: usize,
    pub owner_id: String,
    pub mac: MacAddress,
    pub class_of_service: String,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_import_line(line_no: usize, line: &str) -> Result<Option<ImportRecord>, CoreError> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('|').collect();
    let [owner_id, mac, class_of_service] = fields.as_slice() else {
        return Err(CoreError::InputFormat {
            line: line_no,
            reason: format!(
                "expected {FIELD_COUNT} '|'-separated fields (ownerID|macAddress|classOfService), found {}",
                fields.len()
            ),
        });
    };

    // Added devices carry the MAC as written.
    let mac = MacAddress::verbatim(mac);
    if mac.is_empty() {
        return Err(CoreError::InputFormat {
            line: line_no,
            reason: "MAC address is empty".into(),
        });
    }

    Ok(Some(ImportRecord {
        line: line_no,
        owner_id: owner_id.trim().to_owned(),
        mac,
        class_of_service: class_of_service.trim().to_owned(),
    }))
}

/// Parse a whole input. Stops at the first malformed line.
pub fn parse_import<R: BufRead>(reader: R) -> Result<Vec<ImportRecord>, CoreError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        if let Some(record) = parse_import_line(index + 1, &line?)? {
            records.push(record);
        }
    }
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub dhcp_criteria: String,
    /// Maximum records per batch. `None` sends everything in one batch.
    pub chunk_size: Option<NonZeroUsize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dhcp_criteria: DEFAULT_DHCP_CRITERIA.into(),
            chunk_size: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub submitted: usize,
    pub batches: usize,
    pub warnings: Vec<String>,
}

/// Add every record as a DOCSIS device.
///
/// A failed batch aborts the import with [`CoreError::BatchFailed`],
/// listing each rejected device. With chunking, batches accepted before
/// the failure stay applied.
pub async fn import_devices<P: Provisioner>(
    session: &mut Session<P>,
    records: &[ImportRecord],
    options: &ImportOptions,
) -> Result<ImportSummary, CoreError> {
    let mut summary = ImportSummary::default();
    if records.is_empty() {
        info!("no records to import");
        return Ok(summary);
    }

    let chunk_size = options.chunk_size.map_or(records.len(), NonZeroUsize::get);
    info!(
        records = records.len(),
        chunk_size,
        dhcp_criteria = %options.dhcp_criteria,
        "starting import"
    );

    for chunk in records.chunks(chunk_size) {
        let mut batch = session.open_batch(BatchOptions::default());
        for record in chunk {
            batch.queue(BatchCommand::AddDevice {
                device_type: DeviceType::Docsis,
                mac: record.mac.clone(),
                owner_id: record.owner_id.clone(),
                class_of_service: record.class_of_service.clone(),
                dhcp_criteria: options.dhcp_criteria.clone(),
            });
        }

        let completed = batch
            .submit()
            .await?
            .check(WarningPolicy::Report)
            .inspect_err(|_| {
                if summary.submitted > 0 {
                    warn!(
                        applied = summary.submitted,
                        "import aborted after earlier batches were applied"
                    );
                }
            })?;

        summary.batches += 1;
        summary.submitted += chunk.len();
        summary.warnings.extend(completed.warning);
    }

    info!(
        submitted = summary.submitted,
        batches = summary.batches,
        "import complete"
    );
    Ok(summary)
}
