use tokio::time::{sleep_until, Instant};

use super::cancel::PollCancel;
use super::policy::PollPolicy;
use crate::client::{AnalysisClient, ClientError};
use crate::models::{AnalysisReport, DocumentId};

/// How a poll loop ended. Exactly one outcome per loop.
#[derive(Debug)]
pub enum PollOutcome {
    Completed(AnalysisReport),
    Failed(ClientError),
    /// `max_wait` elapsed while the analysis kept answering "not ready".
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Poll the analysis collaborator for `id` until a terminal answer, the
/// maximum wait, or cancellation.
pub async fn poll_analysis(
    client: &dyn AnalysisClient,
    id: &DocumentId,
    policy: &PollPolicy,
    cancel: &mut PollCancel,
) -> PollOutcome {
    let deadline = Instant::now() + policy.max_wait;
    let mut delay = policy.initial_interval;
    let mut attempts = 0u32;

    loop {
        let wake = Instant::now() + delay;
        if wake >= deadline {
            // No call fits before the deadline; report the timeout at the
            // deadline itself.
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = sleep_until(deadline) => {}
            }
            tracing::warn!(doc_id = %id, attempts, "Analysis polling gave up after max wait");
            return PollOutcome::TimedOut { attempts };
        }

        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = sleep_until(wake) => {}
        }

        attempts += 1;
        let response = tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            response = client.analysis(id) => response,
        };

        match response {
            Ok(report) => {
                tracing::debug!(doc_id = %id, attempts, score = report.sensitivity_score, "Analysis completed");
                return PollOutcome::Completed(report);
            }
            Err(e) if e.is_not_ready() => {
                delay = policy.next_delay(delay);
                tracing::debug!(doc_id = %id, attempts, next_ms = delay.as_millis() as u64, "Analysis not ready");
            }
            Err(e) => {
                tracing::warn!(doc_id = %id, attempts, error = %e, "Analysis polling failed");
                return PollOutcome::Failed(e);
            }
        }
    }
}
