//! `rductl show`

use rductl_core::workflow::show_device;
use rductl_core::{DeviceRecord, RduProvisioner, Session, scoped};

use crate::cli::{DeviceArgs, GlobalOpts};
use crate::commands::util;
use crate::config::Config;
use crate::error::CliError;
use crate::output::{self, Field, Ui};

fn detail_fields(record: &DeviceRecord) -> Vec<Field> {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    vec![
        Field::new("MAC address", &record.mac_address),
        Field::new("Owner", or_dash(&record.owner_id)),
        Field::new("Class of service", or_dash(&record.class_of_service)),
        Field::new("DHCP criteria", or_dash(&record.dhcp_criteria)),
        Field::new(
            "Device type",
            record.device_type.map_or("-", |t| t.label()),
        ),
        Field::new("Protocol version", or_dash(&record.protocol_version)),
    ]
}

pub async fn handle(
    args: &DeviceArgs,
    global: &GlobalOpts,
    cfg: &Config,
    ui: Ui,
) -> Result<(), CliError> {
    let mac = util::parse_mac(&args.mac)?;

    let session = util::connect(global, cfg).await?;
    let record = scoped(session, async |session: &mut Session<RduProvisioner>| {
        show_device(session, &mac).await
    })
    .await?;

    let out = output::render_single(ui.format, &record, detail_fields, DeviceRecord::export_line)?;
    output::print_output(&out, ui.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rductl_core::DeviceType;

    use super::*;

    #[test]
    fn missing_properties_render_as_dashes() {
        let record = DeviceRecord {
            owner_id: Some("1001".into()),
            mac_address: "00:11:22:33:44:55".into(),
            class_of_service: None,
            dhcp_criteria: None,
            device_type: Some(DeviceType::Docsis),
            protocol_version: None,
        };

        let fields = detail_fields(&record);
        let values: Vec<&str> = fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["00:11:22:33:44:55", "1001", "-", "-", "DOCSIS modem", "-"]
        );
    }
}
