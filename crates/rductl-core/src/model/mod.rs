// ── Domain model ──
//
// Types shared by every workflow: identifiers, device records, batches
// and the statuses the provisioning server reports for them.

pub mod batch;
pub mod device;
pub mod identifiers;
pub mod status;

pub use batch::{
    ActivationMode, Batch, BatchCommand, BatchOptions, ConfirmationMode, DeviceOperation,
    MATCH_ALL_PATTERN, PublishingMode, SearchCursor,
};
pub use device::{DeviceRecord, DeviceType};
pub use identifiers::{DeviceId, MacAddress};
pub use status::{BatchOutcome, BatchStatus, CommandData, CommandStatus, FailedCommand, SearchPage};
