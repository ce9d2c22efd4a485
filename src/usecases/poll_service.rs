//! Result poller: wait for the backend to finish extraction.
//!
//! An explicit loop with an awaited delay, not timer-callback rescheduling.
//! Each attempt is an independent, idempotent status request. The caller can
//! stop the loop at any await point through a `PollCancel` handle, so
//! leaving the view schedules no further attempts.

use crate::domain::{ExtractionResult, IntakeError, PollOutcome};
use crate::ports::BackendGateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Cancellation handle for one polling run. `cancel()` stops the loop at the
/// next await point; dropping the handle without cancelling lets the run
/// finish normally.
pub struct PollCancel {
    tx: watch::Sender<bool>,
}

impl PollCancel {
    /// Create a handle and the receiver half to pass into `poll_for_result`.
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Poller. Bounded by a primary deadline (extraction payload) and a larger
/// total deadline (certificate-comparison payload).
pub struct ResultPoller {
    gateway: Arc<dyn BackendGateway>,
    interval: Duration,
    poll_attempts: u32,
    comparison_poll_attempts: u32,
}

impl ResultPoller {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        interval: Duration,
        poll_attempts: u32,
        comparison_poll_attempts: u32,
    ) -> Self {
        Self {
            gateway,
            interval,
            poll_attempts,
            // The comparison window can never be shorter than the primary one.
            comparison_poll_attempts: comparison_poll_attempts.max(poll_attempts),
        }
    }

    /// Poll until the extraction result is available, the deadline lapses, or
    /// the caller cancels. Resolves exactly once:
    ///
    /// - `Pending` (404 / primary payload absent) keeps polling up to
    ///   `poll_attempts`; exhaustion yields `Timeout`.
    /// - Once the primary payload arrives, polling continues for the
    ///   slower comparison payload up to `comparison_poll_attempts` total;
    ///   exhaustion returns the primary payload alone.
    /// - Network failures are retried within the same deadline; exhausting it
    ///   on a failure yields `Poll` instead of `Timeout`.
    pub async fn poll_for_result(
        &self,
        upload_id: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<ExtractionResult, IntakeError> {
        let mut attempts: u32 = 0;
        let mut partial: Option<ExtractionResult> = None;
        let mut last_failure: Option<String> = None;

        loop {
            if *cancel.borrow() {
                info!(upload_id, attempts, "polling cancelled");
                return Err(IntakeError::Cancelled);
            }

            match self.gateway.fetch_status(upload_id).await {
                Ok(PollOutcome::Complete(result)) => {
                    info!(upload_id, attempts, "extraction complete with comparison");
                    return Ok(result);
                }
                Ok(PollOutcome::Partial(result)) => {
                    if partial.is_none() {
                        info!(
                            upload_id,
                            attempts, "primary payload arrived; waiting for comparison"
                        );
                    }
                    partial = Some(result);
                    last_failure = None;
                }
                Ok(PollOutcome::Pending) => {
                    debug!(upload_id, attempts, "not ready yet");
                    last_failure = None;
                }
                Err(e) if e.is_transient() => {
                    warn!(upload_id, attempts, error = %e, "poll attempt failed; retrying");
                    last_failure = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }

            attempts += 1;

            if partial.is_some() {
                if attempts >= self.comparison_poll_attempts {
                    info!(
                        upload_id,
                        attempts, "comparison deadline lapsed; returning primary payload alone"
                    );
                    if let Some(result) = partial.take() {
                        return Ok(result);
                    }
                }
            } else if attempts >= self.poll_attempts {
                return Err(match last_failure {
                    Some(msg) => {
                        IntakeError::Poll(format!("retries exhausted after {} polls: {}", attempts, msg))
                    }
                    None => IntakeError::Timeout { attempts },
                });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = cancel.changed() => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            info!(upload_id, attempts, "polling cancelled");
                            return Err(IntakeError::Cancelled);
                        }
                        Ok(()) => {}
                        // Handle dropped without cancelling: plain wait.
                        Err(_) => tokio::time::sleep(self.interval).await,
                    }
                }
            }
        }
    }
}
