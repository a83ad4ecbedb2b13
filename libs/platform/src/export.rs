//! Bounded export-status polling.
//!
//! The loop fetches the job until it reaches a terminal state or the attempt
//! budget runs out, sleeping only between non-terminal attempts. Transport
//! and non-2xx failures are logged and consume an attempt rather than ending
//! the poll.

use std::time::Duration;

use async_trait::async_trait;
use instadesign_core::{AccessToken, ExportJob, ExportStatus};

use crate::client::{DesignClient, PlatformError};

/// Terminal result of a poll. `Failed` (platform reported failure) and
/// `TimedOut` (budget exhausted while still in progress) stay distinguishable
/// here even where callers collapse them into one user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Success(Vec<String>),
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(10),
        }
    }
}

/// Seam over `GET /exports/{job_id}` so the loop can be tested against a
/// scripted sequence of responses.
#[async_trait]
pub trait ExportStatusSource: Send + Sync {
    async fn export_status(
        &self,
        job_id: &str,
        token: &AccessToken,
    ) -> Result<ExportJob, PlatformError>;
}

#[async_trait]
impl ExportStatusSource for DesignClient {
    async fn export_status(
        &self,
        job_id: &str,
        token: &AccessToken,
    ) -> Result<ExportJob, PlatformError> {
        DesignClient::export_status(self, job_id, token).await
    }
}

/// Polls until terminal state or budget exhaustion. There is no cancellation:
/// once started, the poll runs to one of the three outcomes.
pub async fn poll_export(
    source: &dyn ExportStatusSource,
    job_id: &str,
    token: &AccessToken,
    policy: PollPolicy,
) -> ExportOutcome {
    for attempt in 1..=policy.max_attempts {
        match source.export_status(job_id, token).await {
            Ok(job) => match job.status {
                ExportStatus::Success => return ExportOutcome::Success(job.urls),
                ExportStatus::Failed => {
                    tracing::warn!(job_id, "export job failed");
                    return ExportOutcome::Failed;
                }
                ExportStatus::InProgress => {
                    tracing::debug!(job_id, attempt, "export still in progress");
                }
            },
            Err(err) => {
                tracing::warn!(job_id, attempt, error = %err, "failed to fetch export status");
            }
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    tracing::warn!(
        job_id,
        max_attempts = policy.max_attempts,
        "export polling budget exhausted"
    );
    ExportOutcome::TimedOut
}
