// rductl-core: Batch workflows between rductl-api and the CLI.
//
// A `Session` wraps a connected `Provisioner`; workflows open batches on
// it one at a time, submit them once, and check the reported status.
// `scoped` releases the session when the work is done.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod provisioner;
pub mod retry;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use error::CoreError;
pub use provisioner::{Provisioner, RduProvisioner};
pub use retry::RetryPolicy;
pub use session::{CompletedBatch, OpenBatch, Session, SubmittedBatch, WarningPolicy, scoped};

pub use model::{
    ActivationMode, Batch, BatchCommand, BatchOptions, BatchOutcome, BatchStatus, CommandData,
    CommandStatus, ConfirmationMode, DeviceId, DeviceOperation, DeviceRecord, DeviceType,
    FailedCommand, MacAddress, PublishingMode, SearchCursor, SearchPage,
};
