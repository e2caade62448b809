// ── Session lifecycle ──
//
// A `Session` is a connected provisioning service. Batches are opened
// from it one at a time: `open_batch` borrows the session mutably, so a
// second batch cannot be opened until the first has been submitted.
//
//   Session ──open_batch──▶ OpenBatch ──submit──▶ SubmittedBatch ──check──▶ CompletedBatch
//
// `release` consumes the session. `scoped` runs work against a session
// and releases it on every path.

use std::mem;

use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::model::{
    Batch, BatchCommand, BatchOptions, BatchOutcome, BatchStatus, CommandData, FailedCommand,
};
use crate::provisioner::{Provisioner, RduProvisioner};
use crate::retry::RetryPolicy;

// ── Session ─────────────────────────────────────────────────────────

pub struct Session<P: Provisioner> {
    provisioner: P,
    retry: RetryPolicy,
    batches_submitted: u64,
    released: bool,
}

impl Session<RduProvisioner> {
    /// Log in to the provisioning server described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let provisioner = RduProvisioner::connect(config).await?;
        Ok(Self::new(provisioner, config.retry))
    }
}

impl<P: Provisioner> Session<P> {
    /// Wrap an already connected provisioner.
    pub fn new(provisioner: P, retry: RetryPolicy) -> Self {
        Self {
            provisioner,
            retry,
            batches_submitted: 0,
            released: false,
        }
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Number of batches the server has answered on this session.
    pub fn batches_submitted(&self) -> u64 {
        self.batches_submitted
    }

    /// Start a new batch with a fresh identifier.
    pub fn open_batch(&mut self, options: BatchOptions) -> OpenBatch<'_, P> {
        OpenBatch {
            session: self,
            batch: Batch::new(options),
        }
    }

    /// End the session.
    pub async fn release(mut self) -> Result<(), CoreError> {
        self.released = true;
        debug!(batches = self.batches_submitted, "releasing session");
        self.provisioner.release().await
    }

    async fn submit(&mut self, batch: &Batch) -> Result<BatchStatus, CoreError> {
        // Connect failures never reached the server and can always be
        // resent. A timeout or dropped reply may follow an applied batch,
        // so only reads are resent after those.
        let idempotent = batch.is_idempotent();
        let retryable =
            |err: &CoreError| err.is_connect_failure() || (idempotent && err.is_transient());

        let provisioner = &self.provisioner;
        let status = self
            .retry
            .run("batch submit", retryable, || provisioner.submit(batch))
            .await?;

        self.batches_submitted += 1;
        Ok(status)
    }
}

impl<P: Provisioner> Drop for Session<P> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                batches = self.batches_submitted,
                "provisioning session dropped without release"
            );
        }
    }
}

/// Run `work` against `session`, then release it.
///
/// The session is released whether `work` succeeds or fails. A release
/// failure after successful work is logged and the work's result kept;
/// after failed work, the work's error wins.
pub async fn scoped<P, T, E, F>(mut session: Session<P>, work: F) -> Result<T, E>
where
    P: Provisioner,
    E: From<CoreError>,
    F: AsyncFnOnce(&mut Session<P>) -> Result<T, E>,
{
    let result = work(&mut session).await;
    match (result, session.release().await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(release_err)) => {
            warn!(error = %release_err, "failed to release session");
            Ok(value)
        }
        (Err(err), release) => {
            if let Err(release_err) = release {
                warn!(error = %release_err, "failed to release session after error");
            }
            Err(err)
        }
    }
}

// ── Open batch ──────────────────────────────────────────────────────

/// A batch being filled with commands.
pub struct OpenBatch<'s, P: Provisioner> {
    session: &'s mut Session<P>,
    batch: Batch,
}

impl<P: Provisioner> OpenBatch<'_, P> {
    pub fn queue(&mut self, command: BatchCommand) -> &mut Self {
        self.batch.push(command);
        self
    }

    /// Post the batch and wait for the server's status.
    pub async fn submit(self) -> Result<SubmittedBatch, CoreError> {
        if self.batch.is_empty() {
            return Err(CoreError::Internal("refusing to submit an empty batch".into()));
        }

        debug!(
            batch_id = %self.batch.id(),
            commands = self.batch.len(),
            activation = ?self.batch.options().activation,
            "submitting batch"
        );
        let status = self.session.submit(&self.batch).await?;
        Ok(SubmittedBatch {
            batch: self.batch,
            status,
        })
    }
}

// ── Submitted batch ─────────────────────────────────────────────────

/// How warnings on an otherwise successful batch are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningPolicy {
    /// Treat the warning as a failure.
    Abort,
    /// Log the warning and keep the results.
    Report,
}

/// A batch the server has answered.
pub struct SubmittedBatch {
    batch: Batch,
    status: BatchStatus,
}

impl SubmittedBatch {
    pub fn outcome(&self) -> BatchOutcome {
        BatchOutcome::from_status(&self.status, self.batch.commands())
    }

    /// Turn the status into results, or into an error when the batch or
    /// any of its commands failed.
    pub fn check(self, warnings: WarningPolicy) -> Result<CompletedBatch, CoreError> {
        let outcome = self.outcome();
        let batch_id = self.status.batch_id;

        match outcome {
            BatchOutcome::PartialFailure(failures) => {
                for failure in &failures {
                    warn!(%batch_id, "{failure}");
                }
                if let [FailedCommand { index: None, message, .. }] = failures.as_slice() {
                    return Err(CoreError::BatchRejected {
                        batch_id,
                        message: message.clone(),
                    });
                }
                Err(CoreError::BatchFailed { batch_id, failures })
            }
            BatchOutcome::SuccessWithWarning(message) => match warnings {
                WarningPolicy::Abort => Err(CoreError::BatchWarning { batch_id, message }),
                WarningPolicy::Report => {
                    warn!(%batch_id, "batch completed with a warning: {message}");
                    Ok(CompletedBatch {
                        batch_id,
                        warning: Some(message),
                        data: self.status.commands.into_iter().map(|c| c.data).collect(),
                    })
                }
            },
            BatchOutcome::Success => Ok(CompletedBatch {
                batch_id,
                warning: None,
                data: self.status.commands.into_iter().map(|c| c.data).collect(),
            }),
        }
    }
}

/// Results of a batch whose commands all succeeded.
#[derive(Debug)]
pub struct CompletedBatch {
    pub batch_id: String,
    pub warning: Option<String>,
    data: Vec<CommandData>,
}

impl CompletedBatch {
    /// Take the payload of command `index`, leaving `CommandData::None`.
    pub fn take(&mut self, index: usize) -> CommandData {
        self.data.get_mut(index).map(mem::take).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{DeviceId, DeviceType, MacAddress};
    use crate::testing::{Fault, ScriptedProvisioner};

    fn add(mac: &str) -> BatchCommand {
        BatchCommand::AddDevice {
            device_type: DeviceType::Docsis,
            mac: MacAddress::new(mac),
            owner_id: "1001".into(),
            class_of_service: "gold".into(),
            dhcp_criteria: "provisioned-docsis".into(),
        }
    }

    fn details(id: &str) -> BatchCommand {
        BatchCommand::GetDetails {
            device_id: DeviceId::new(id),
        }
    }

    #[tokio::test]
    async fn empty_batch_is_not_submitted() {
        let mut session = Session::new(ScriptedProvisioner::new(), RetryPolicy::none());
        let result = session.open_batch(BatchOptions::default()).submit().await;

        assert!(matches!(result, Err(CoreError::Internal(_))));
        assert!(session.provisioner().submitted().is_empty());
        session.release().await.unwrap();
    }

    #[tokio::test]
    async fn check_yields_payloads_in_queue_order() {
        let sim = ScriptedProvisioner::new();
        sim.add_device(DeviceType::Docsis, "1001", "00:11:22:33:44:55", "gold");
        sim.add_device(DeviceType::Docsis, "1002", "00:11:22:33:44:66", "silver");
        let mut session = Session::new(sim, RetryPolicy::none());

        let mut batch = session.open_batch(BatchOptions::default());
        batch
            .queue(details("00:11:22:33:44:66"))
            .queue(details("00:11:22:33:44:55"));
        let mut completed = batch
            .submit()
            .await
            .unwrap()
            .check(WarningPolicy::Abort)
            .unwrap();

        let CommandData::Details(first) = completed.take(0) else {
            panic!("expected details");
        };
        assert_eq!(first.owner_id.as_deref(), Some("1002"));
        assert_eq!(completed.take(0), CommandData::None);
        assert_eq!(completed.take(7), CommandData::None);
        assert_eq!(session.batches_submitted(), 1);
        session.release().await.unwrap();
    }

    #[tokio::test]
    async fn failed_command_becomes_batch_failed() {
        let sim = ScriptedProvisioner::new();
        sim.add_device(DeviceType::Docsis, "1001", "00:11:22:33:44:55", "gold");
        let mut session = Session::new(sim, RetryPolicy::none());

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(add("00:11:22:33:44:55")).queue(add("00:11:22:33:44:77"));
        let err = batch
            .submit()
            .await
            .unwrap()
            .check(WarningPolicy::Report)
            .unwrap_err();

        match err {
            CoreError::BatchFailed { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].target.as_deref(), Some("00:11:22:33:44:55"));
            }
            other => panic!("expected BatchFailed, got {other:?}"),
        }
        session.release().await.unwrap();
    }

    #[tokio::test]
    async fn warning_policy_decides_between_abort_and_report() {
        let sim = ScriptedProvisioner::new();
        sim.add_device(DeviceType::Docsis, "1001", "00:11:22:33:44:55", "gold");
        sim.set_warning("device offline");
        let mut session = Session::new(sim, RetryPolicy::none());

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(details("00:11:22:33:44:55"));
        let err = batch.submit().await.unwrap().check(WarningPolicy::Abort);
        assert!(matches!(err, Err(CoreError::BatchWarning { .. })));

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(details("00:11:22:33:44:55"));
        let completed = batch
            .submit()
            .await
            .unwrap()
            .check(WarningPolicy::Report)
            .unwrap();
        assert_eq!(completed.warning.as_deref(), Some("device offline"));
        session.release().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_batch_without_command_detail() {
        let sim = ScriptedProvisioner::new();
        sim.reject_next_batch("BATCH_NOT_AUTHORIZED");
        let mut session = Session::new(sim, RetryPolicy::none());

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(details("00:11:22:33:44:55"));
        let err = batch.submit().await.unwrap().check(WarningPolicy::Abort);

        assert!(matches!(
            err,
            Err(CoreError::BatchRejected { message, .. }) if message == "BATCH_NOT_AUTHORIZED"
        ));
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_is_retried_with_backoff() {
        let sim = ScriptedProvisioner::new();
        sim.add_device(DeviceType::Docsis, "1001", "00:11:22:33:44:55", "gold");
        sim.inject_fault(Fault::ConnectRefused);
        let mut session = Session::new(sim, RetryPolicy::default());
        let started = tokio::time::Instant::now();

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(add("00:11:22:33:44:66"));
        batch
            .submit()
            .await
            .unwrap()
            .check(WarningPolicy::Report)
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(session.provisioner().attempts(), 2);
        assert_eq!(session.provisioner().submitted().len(), 1);
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_on_add_is_not_retried() {
        let sim = ScriptedProvisioner::new();
        sim.inject_fault(Fault::Timeout);
        let mut session = Session::new(sim, RetryPolicy::default());

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(add("00:11:22:33:44:66"));
        let result = batch.submit().await;

        assert!(matches!(result, Err(CoreError::Timeout { .. })));
        assert_eq!(session.provisioner().attempts(), 1);
        assert_eq!(session.batches_submitted(), 0);
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_on_read_is_retried() {
        let sim = ScriptedProvisioner::new();
        sim.add_device(DeviceType::Docsis, "1001", "00:11:22:33:44:55", "gold");
        sim.inject_fault(Fault::Timeout);
        let mut session = Session::new(sim, RetryPolicy::default());

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(details("00:11:22:33:44:55"));
        batch.submit().await.unwrap();

        assert_eq!(session.provisioner().attempts(), 2);
        session.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_reply_is_retried_for_reads_only() {
        let sim = ScriptedProvisioner::new();
        sim.add_device(DeviceType::Docsis, "1001", "00:11:22:33:44:55", "gold");
        sim.inject_fault(Fault::ConnectionLost);
        let mut session = Session::new(sim, RetryPolicy::default());

        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(details("00:11:22:33:44:55"));
        batch.submit().await.unwrap();
        assert_eq!(session.provisioner().attempts(), 2);

        session.provisioner().inject_fault(Fault::ConnectionLost);
        let mut batch = session.open_batch(BatchOptions::default());
        batch.queue(add("00:11:22:33:44:66"));
        let result = batch.submit().await;

        assert!(matches!(result, Err(CoreError::ConnectionLost { .. })));
        assert_eq!(session.provisioner().attempts(), 3);
        assert_eq!(session.batches_submitted(), 1);
        session.release().await.unwrap();
    }

    #[tokio::test]
    async fn scoped_releases_after_success() {
        let sim = ScriptedProvisioner::new();
        let released = sim.release_counter();
        let session = Session::new(sim, RetryPolicy::none());

        let value = scoped(session, async |_session: &mut Session<ScriptedProvisioner>| {
            Ok::<_, CoreError>(42)
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(released.get(), 1);
    }

    #[tokio::test]
    async fn scoped_releases_after_failure() {
        let sim = ScriptedProvisioner::new();
        let released = sim.release_counter();
        let session = Session::new(sim, RetryPolicy::none());

        let result: Result<(), CoreError> =
            scoped(session, async |_session: &mut Session<ScriptedProvisioner>| {
                Err(CoreError::InputFormat {
                    line: 3,
                    reason: "expected 3 fields, found 2".into(),
                })
            })
            .await;

        assert!(matches!(result, Err(CoreError::InputFormat { line: 3, .. })));
        assert_eq!(released.get(), 1);
    }

    #[tokio::test]
    async fn scoped_keeps_result_when_release_fails() {
        let sim = ScriptedProvisioner::new();
        sim.fail_release();
        let session = Session::new(sim, RetryPolicy::none());

        let value = scoped(session, async |_session: &mut Session<ScriptedProvisioner>| {
            Ok::<_, CoreError>("exported")
        })
        .await
        .unwrap();

        assert_eq!(value, "exported");
    }
}
