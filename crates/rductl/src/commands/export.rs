//! `rductl export`

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use serde::Serialize;

use rductl_core::workflow::{ExportRequest, export_devices};
use rductl_core::{DeviceType, RduProvisioner, Session, scoped};

use crate::cli::{ExportArgs, GlobalOpts};
use crate::commands::util;
use crate::config::Config;
use crate::error::CliError;
use crate::output::{self, Field, Spinner, Ui};

#[derive(Debug, Serialize)]
struct ExportReport {
    device_type: DeviceType,
    file: String,
    exported: usize,
    pages: usize,
}

pub async fn handle(
    args: ExportArgs,
    global: &GlobalOpts,
    cfg: &Config,
    ui: Ui,
) -> Result<(), CliError> {
    let device_type = util::device_type(args.device_type);
    let page_size = args.page_size.unwrap_or(cfg.defaults.page_size);
    if page_size == 0 {
        return Err(CliError::Validation {
            field: "page-size".into(),
            reason: "must be greater than zero".into(),
        });
    }
    let path = args
        .file
        .unwrap_or_else(|| PathBuf::from(device_type.default_export_file()));

    let session = util::connect(global, cfg).await?;

    let spinner = Spinner::start(&format!("Exporting {}s", device_type.label()), ui.quiet);
    let result = scoped(session, async |session: &mut Session<RduProvisioner>| {
        // Truncated only once the server has accepted the login.
        let mut sink = BufWriter::new(File::create(&path)?);
        let mut written = 0usize;
        let summary = export_devices(
            session,
            ExportRequest {
                device_type,
                page_size,
            },
            &mut sink,
            |record| {
                written += 1;
                spinner.set_message(format!("Exported {written} ({})", record.mac_address));
            },
        )
        .await?;
        Ok::<_, CliError>(summary)
    })
    .await;
    spinner.finish();
    let summary = result?;

    let report = ExportReport {
        device_type: summary.device_type,
        file: path.display().to_string(),
        exported: summary.exported,
        pages: summary.pages,
    };
    ui.success(&format!(
        "Exported {} {}(s) to {}",
        report.exported,
        device_type.label(),
        report.file
    ));

    let out = output::render_single(
        ui.format,
        &report,
        |r| {
            vec![
                Field::new("Device type", r.device_type.label()),
                Field::new("File", &r.file),
                Field::new("Devices", r.exported),
                Field::new("Search pages", r.pages),
            ]
        },
        |r| r.exported.to_string(),
    )?;
    output::print_output(&out, ui.quiet);
    Ok(())
}
