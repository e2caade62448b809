// rductl-api: Async Rust client for the BAC RDU batch gateway

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod wire;

pub use auth::{Credentials, SessionInfo};
pub use client::RduClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use wire::{
    ActivationMode, BatchReply, BatchRequest, ConfirmationMode, DeviceProperties, PublishingMode,
    SearchData, WireBatchStatus, WireCommand, WireCommandStatus,
};
