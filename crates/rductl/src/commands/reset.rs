//! `rductl reset`

use rductl_core::workflow::{OperationReport, perform_operation};
use rductl_core::{DeviceOperation, RduProvisioner, Session, scoped};

use crate::cli::{DeviceArgs, GlobalOpts};
use crate::commands::util;
use crate::config::Config;
use crate::error::CliError;
use crate::output::{self, Field, Ui};

pub async fn handle(
    args: &DeviceArgs,
    global: &GlobalOpts,
    cfg: &Config,
    ui: Ui,
) -> Result<(), CliError> {
    let mac = util::parse_mac(&args.mac)?;

    if !util::confirm("reset", &format!("Reset device {mac}?"), global.yes)? {
        ui.warn("Reset cancelled");
        return Ok(());
    }

    let session = util::connect(global, cfg).await?;
    let report = scoped(session, async |session: &mut Session<RduProvisioner>| {
        perform_operation(session, DeviceOperation::Reset, &mac).await
    })
    .await?;

    if let Some(warning) = &report.warning {
        ui.warn(&format!("server warning: {warning}"));
    }
    ui.success(&format!("Reset submitted for {mac}"));

    let out = output::render_single(
        ui.format,
        &report,
        |r: &OperationReport| {
            vec![
                Field::new("Operation", r.operation),
                Field::new("Device", &r.device),
                Field::new("Batch", &r.batch_id),
                Field::new("Warning", r.warning.as_deref().unwrap_or("-")),
            ]
        },
        |r| r.batch_id.clone(),
    )?;
    output::print_output(&out, ui.quiet);
    Ok(())
}
