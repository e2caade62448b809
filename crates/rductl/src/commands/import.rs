//! `rductl import`

use std::fs::File;
use std::io::{self, BufReader};
use std::num::NonZeroUsize;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use rductl_core::workflow::{ImportOptions, ImportRecord, ImportSummary, import_devices, parse_import};
use rductl_core::{RduProvisioner, Session, scoped};

use crate::cli::{GlobalOpts, ImportArgs};
use crate::commands::util;
use crate::config::Config;
use crate::error::CliError;
use crate::output::{self, Field, Spinner, Ui};

#[derive(Debug, Serialize)]
struct ImportReport {
    source: String,
    records: usize,
    #[serde(flatten)]
    summary: ImportSummary,
}

/// Parse every record from `path` (`-` is stdin).
fn read_records(path: &Path) -> Result<Vec<ImportRecord>, CliError> {
    let records = if path == Path::new("-") {
        parse_import(io::stdin().lock())?
    } else {
        parse_import(BufReader::new(File::open(path)?))?
    };
    Ok(records)
}

fn import_options(args: &ImportArgs, cfg: &Config) -> Result<ImportOptions, CliError> {
    let chunk_size = match args.chunk_size {
        Some(n) => Some(NonZeroUsize::new(n).ok_or_else(|| CliError::Validation {
            field: "chunk-size".into(),
            reason: "must be greater than zero".into(),
        })?),
        None => cfg.defaults.import_chunk_size(),
    };
    Ok(ImportOptions {
        dhcp_criteria: args
            .dhcp_criteria
            .clone()
            .unwrap_or_else(|| cfg.defaults.dhcp_criteria.clone()),
        chunk_size,
    })
}

pub async fn handle(
    args: ImportArgs,
    global: &GlobalOpts,
    cfg: &Config,
    ui: Ui,
) -> Result<(), CliError> {
    let options = import_options(&args, cfg)?;
    // Malformed input fails here, before any connection is made.
    let records = read_records(&args.file)?;
    let source = args.file.display().to_string();

    let summary = if records.is_empty() {
        info!(source = %source, "input holds no records");
        ImportSummary::default()
    } else {
        let session = util::connect(global, cfg).await?;
        let spinner = Spinner::start(&format!("Importing {} devices", records.len()), ui.quiet);
        let result = scoped(session, async |session: &mut Session<RduProvisioner>| {
            import_devices(session, &records, &options).await
        })
        .await;
        spinner.finish();
        result?
    };

    for warning in &summary.warnings {
        ui.warn(&format!("server warning: {warning}"));
    }
    ui.success(&format!(
        "Imported {} device(s) in {} batch(es)",
        summary.submitted, summary.batches
    ));

    let report = ImportReport {
        source,
        records: records.len(),
        summary,
    };
    let out = output::render_single(
        ui.format,
        &report,
        |r| {
            vec![
                Field::new("Source", &r.source),
                Field::new("Records", r.records),
                Field::new("Submitted", r.summary.submitted),
                Field::new("Batches", r.summary.batches),
                Field::new("Warnings", r.summary.warnings.join("; ")),
            ]
        },
        |r| r.summary.submitted.to_string(),
    )?;
    output::print_output(&out, ui.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(chunk_size: Option<usize>, dhcp_criteria: Option<&str>) -> ImportArgs {
        ImportArgs {
            file: PathBuf::from("-"),
            chunk_size,
            dhcp_criteria: dhcp_criteria.map(str::to_owned),
        }
    }

    #[test]
    fn options_fall_back_to_config_defaults() {
        let mut cfg = Config::default();
        cfg.defaults.import_chunk_size = Some(50);

        let options = import_options(&args(None, None), &cfg).unwrap();
        assert_eq!(options.chunk_size, NonZeroUsize::new(50));
        assert_eq!(options.dhcp_criteria, "provisioned-docsis");
    }

    #[test]
    fn flags_win_over_config() {
        let options =
            import_options(&args(Some(10), Some("lab-docsis")), &Config::default()).unwrap();
        assert_eq!(options.chunk_size, NonZeroUsize::new(10));
        assert_eq!(options.dhcp_criteria, "lab-docsis");
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = import_options(&args(Some(0), None), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn short_line_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.txt");
        std::fs::write(&path, "1001|00:11:22:33:44:55|gold\n1002|00:11:22:33:44:66\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, CliError::InputFormat { line: 2, .. }));
    }
}
