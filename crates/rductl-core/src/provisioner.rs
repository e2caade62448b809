// ── Provisioning service seam ──
//
// `Provisioner` is everything a session needs from the server: submit a
// batch and get its status back, and release the connection at the end.
// `RduProvisioner` implements it over the batch gateway.

use std::future::Future;
use std::time::Duration;

use rductl_api::RduClient;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{Batch, BatchStatus};

/// A connected provisioning service.
pub trait Provisioner {
    /// Post one batch and return the status the server reports for it.
    ///
    /// A status is returned whenever the server processed the batch,
    /// including batches it rejected; `Err` means no usable reply.
    fn submit(&self, batch: &Batch) -> impl Future<Output = Result<BatchStatus, CoreError>> + Send;

    /// End the server-side session.
    fn release(&self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// [`Provisioner`] backed by the RDU batch gateway.
pub struct RduProvisioner {
    client: RduClient,
    timeout: Duration,
    server_version: Option<String>,
}

impl RduProvisioner {
    /// Log in to the gateway named by `config`.
    ///
    /// Connection failures are retried according to `config.retry`;
    /// authentication failures are not.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let client = RduClient::new(config.url.clone(), &config.transport())?;
        let credentials = config.credentials();

        debug!(url = %config.url, username = %config.username, "connecting");
        let info = config
            .retry
            .run("login", CoreError::is_transient, || async {
                client
                    .login(&credentials)
                    .await
                    .map_err(|e| lift_error(e, config.timeout))
            })
            .await?;

        info!(
            url = %config.url,
            server_version = info.server_version.as_deref().unwrap_or("unknown"),
            "connected to provisioning server"
        );

        Ok(Self {
            client,
            timeout: config.timeout,
            server_version: info.server_version,
        })
    }

    /// RDU software version reported at login.
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }
}

impl Provisioner for RduProvisioner {
    async fn submit(&self, batch: &Batch) -> Result<BatchStatus, CoreError> {
        let request = convert::batch_request(batch);
        let reply = self
            .client
            .post_batch(&request)
            .await
            .map_err(|e| lift_error(e, self.timeout))?;
        convert::batch_status(reply, batch.commands())
    }

    async fn release(&self) -> Result<(), CoreError> {
        self.client
            .release()
            .await
            .map_err(|e| lift_error(e, self.timeout))
    }
}

/// Convert a gateway error, filling in the configured timeout.
fn lift_error(err: rductl_api::Error, timeout: Duration) -> CoreError {
    match CoreError::from(err) {
        CoreError::Timeout { .. } => CoreError::Timeout {
            timeout_secs: timeout.as_secs(),
        },
        other => other,
    }
}
