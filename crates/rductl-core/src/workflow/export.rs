// ── Bulk export ──
//
// Pages through every device of one type and writes one line per device
// to a sink. Each search page and each detail lookup is its own batch.
// The loop ends only when the server stops returning a cursor; a short
// page says nothing about whether more devices follow.

use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{
    BatchCommand, BatchOptions, CommandData, DeviceRecord, DeviceType, SearchCursor, SearchPage,
};
use crate::provisioner::Provisioner;
use crate::session::{Session, WarningPolicy};

use super::lookup::device_details;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub device_type: DeviceType,
    pub page_size: u32,
}

impl ExportRequest {
    pub fn new(device_type: DeviceType) -> Self {
        Self {
            device_type,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub device_type: DeviceType,
    pub exported: usize,
    pub pages: usize,
}

/// Export every device of `request.device_type` to `sink`.
///
/// Lines are `ownerID|macAddress|classOfService|dhcpCriteria`. `on_record`
/// is called after each line is written. Any failed batch, and any batch
/// warning, aborts the export; lines already written stay in the sink.
pub async fn export_devices<P, W, F>(
    session: &mut Session<P>,
    request: ExportRequest,
    sink: &mut W,
    mut on_record: F,
) -> Result<ExportSummary, CoreError>
where
    P: Provisioner,
    W: Write,
    F: FnMut(&DeviceRecord),
{
    if request.page_size == 0 {
        return Err(CoreError::Config {
            message: "page size must be greater than zero".into(),
        });
    }

    info!(
        device_type = %request.device_type,
        page_size = request.page_size,
        "starting export"
    );

    let mut summary = ExportSummary {
        device_type: request.device_type,
        exported: 0,
        pages: 0,
    };
    let mut cursor: Option<SearchCursor> = None;

    loop {
        let page = search_page(session, request, cursor.take()).await?;
        summary.pages += 1;
        debug!(
            page = summary.pages,
            devices = page.device_ids.len(),
            more = page.cursor.is_some(),
            "search page"
        );

        for device_id in &page.device_ids {
            let mut record = device_details(session, device_id).await?;
            record.device_type.get_or_insert(request.device_type);
            writeln!(sink, "{}", record.export_line())?;
            summary.exported += 1;
            on_record(&record);
        }

        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    sink.flush()?;
    info!(
        device_type = %request.device_type,
        exported = summary.exported,
        pages = summary.pages,
        "export complete"
    );
    Ok(summary)
}

async fn search_page<P: Provisioner>(
    session: &mut Session<P>,
    request: ExportRequest,
    cursor: Option<SearchCursor>,
) -> Result<SearchPage, CoreError> {
    let mut batch = session.open_batch(BatchOptions::default());
    batch.queue(BatchCommand::Search {
        device_type: request.device_type,
        cursor,
        page_size: request.page_size,
    });
    let mut completed = batch.submit().await?.check(WarningPolicy::Abort)?;

    match completed.take(0) {
        CommandData::Page(page) => Ok(page),
        other => Err(CoreError::Protocol {
            message: format!("expected a search page, got {other:?}"),
        }),
    }
}
