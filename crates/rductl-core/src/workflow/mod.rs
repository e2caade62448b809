// ── Workflows ──
//
// Each workflow drives a session through one or more batches and turns
// the results into a summary. Workflows never release the session; the
// caller owns it (usually through `crate::scoped`).

pub mod export;
pub mod import;
pub mod lookup;
pub mod operation;

pub use export::{DEFAULT_PAGE_SIZE, ExportRequest, ExportSummary, export_devices};
pub use import::{
    DEFAULT_DHCP_CRITERIA, ImportOptions, ImportRecord, ImportSummary, import_devices,
    parse_import, parse_import_line,
};
pub use lookup::{device_details, show_device};
pub use operation::{OperationReport, perform_operation};
