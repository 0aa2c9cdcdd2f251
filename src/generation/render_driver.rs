//! Render job driver: submit, poll to a terminal status, download.
//!
//! ```text
//! SUBMITTED → POLLING → COMPLETED → download → RenderedAsset
//!                     → FAILED     → RenderFailure
//!                     → (budget)   → RenderTimeout
//! ```
//!
//! - Submission is never retried: a rejected job is a configuration or
//!   validation problem, surfaced as `RenderSubmissionFailure`.
//! - A poll that errors counts as "not terminal yet" and is retried on the
//!   next tick. The elapsed-time budget keeps running through errors.
//! - Each status request races the remaining budget, so a provider that
//!   stops answering cannot hold the request past the timeout.
//! - On timeout the remote job is left alone; the driver just stops waiting.
//! - A failed download after `COMPLETED` fails the attempt. The next attempt
//!   submits a new job.

use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;
use super::error::GenerationError;
use super::traits::RenderProvider;
use crate::models::{ArtifactMetadata, RenderJob, RenderParams, RenderStatus, RenderedAsset};

/// Content type assumed when the download does not declare one.
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Poll cadence and total budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::config::DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(crate::config::DEFAULT_POLL_TIMEOUT_SECS),
        }
    }
}

pub struct RenderJobDriver {
    provider: Arc<dyn RenderProvider>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl RenderJobDriver {
    pub fn new(provider: Arc<dyn RenderProvider>, clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        Self {
            provider,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Render `script` and return the downloaded video.
    pub async fn generate(
        &self,
        script: &str,
        params: &RenderParams,
        metadata: &ArtifactMetadata,
    ) -> Result<RenderedAsset, GenerationError> {
        let job_id = self
            .provider
            .submit(script, params, metadata)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Render submission rejected");
                GenerationError::RenderSubmissionFailure(e.to_string())
            })?;

        tracing::info!(job_id = %job_id, "Render job submitted");
        let mut job = RenderJob::submitted(job_id, script, params);
        let asset_url = self.poll_to_completion(&mut job).await?;
        self.download(&job, &asset_url).await
    }

    async fn poll_to_completion(&self, job: &mut RenderJob) -> Result<String, GenerationError> {
        let started = self.clock.now();

        loop {
            let remaining = self
                .policy
                .timeout
                .saturating_sub(self.clock.now().saturating_duration_since(started));
            let polled = tokio::select! {
                biased;
                polled = self.provider.poll(&job.job_id) => Some(polled),
                _ = self.clock.sleep(remaining) => None,
            };

            match polled {
                None => {
                    let elapsed = self.clock.now().saturating_duration_since(started);
                    tracing::error!(
                        job_id = %job.job_id,
                        polls = job.polls,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Render status request outlived the budget, abandoning"
                    );
                    return Err(GenerationError::RenderTimeout {
                        job_id: job.job_id.clone(),
                        elapsed_secs: elapsed.as_secs(),
                    });
                }
                Some(Ok(report)) => job.apply(report),
                Some(Err(e)) => {
                    job.record_missed_poll();
                    tracing::warn!(
                        job_id = %job.job_id,
                        poll = job.polls,
                        error = %e,
                        "Render status poll failed, retrying on next tick"
                    );
                }
            }

            match job.status {
                RenderStatus::Completed => {
                    return job.asset_url.clone().ok_or_else(|| {
                        GenerationError::RenderFailure(format!(
                            "job {} completed without a video URL",
                            job.job_id
                        ))
                    });
                }
                RenderStatus::Failed => {
                    let detail = job
                        .error
                        .clone()
                        .unwrap_or_else(|| "provider gave no failure detail".into());
                    tracing::error!(job_id = %job.job_id, detail = %detail, "Render job failed");
                    return Err(GenerationError::RenderFailure(detail));
                }
                RenderStatus::Submitted | RenderStatus::Processing => {}
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= self.policy.timeout {
                tracing::error!(
                    job_id = %job.job_id,
                    polls = job.polls,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Render job timed out, abandoning"
                );
                return Err(GenerationError::RenderTimeout {
                    job_id: job.job_id.clone(),
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            let remaining = self.policy.timeout - elapsed;
            self.clock.sleep(self.policy.interval.min(remaining)).await;
        }
    }

    async fn download(&self, job: &RenderJob, asset_url: &str) -> Result<RenderedAsset, GenerationError> {
        let file = self.provider.download(asset_url).await.map_err(|e| {
            tracing::error!(job_id = %job.job_id, error = %e, "Rendered video download failed");
            GenerationError::RenderFailure(format!("download of {asset_url} failed: {e}"))
        })?;

        if file.bytes.is_empty() {
            return Err(GenerationError::RenderFailure(format!(
                "download of {asset_url} returned no data"
            )));
        }

        tracing::info!(
            job_id = %job.job_id,
            polls = job.polls,
            bytes = file.bytes.len(),
            "Rendered video downloaded"
        );

        Ok(RenderedAsset {
            bytes: file.bytes,
            content_type: file
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            source_url: asset_url.to_string(),
            job_id: job.job_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::clock::ManualClock;
    use crate::generation::test_support::{sample_metadata, PollStep, ScriptedRenderProvider};
    use crate::models::StatusReport;

    fn driver(provider: Arc<ScriptedRenderProvider>, clock: Arc<ManualClock>) -> RenderJobDriver {
        RenderJobDriver::new(
            provider,
            clock,
            PollPolicy::new(Duration::from_secs(3), Duration::from_secs(9)),
        )
    }

    #[tokio::test]
    async fn completes_after_processing() {
        let provider = Arc::new(ScriptedRenderProvider::new(vec![
            PollStep::Report(StatusReport {
                status: RenderStatus::Submitted,
                asset_url: None,
                error: None,
            }),
            PollStep::Report(StatusReport::processing()),
            PollStep::Report(StatusReport::completed("https://cdn.test/out.mp4")),
        ]));
        let clock = Arc::new(ManualClock::new());
        let asset = driver(provider.clone(), clock.clone())
            .generate("Hello there", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap();

        assert_eq!(asset.source_url, "https://cdn.test/out.mp4");
        assert_eq!(asset.content_type, "video/mp4");
        assert!(!asset.bytes.is_empty());
        assert_eq!(provider.submissions(), 1);
        assert_eq!(provider.polls(), 3);
        assert_eq!(provider.downloads(), 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3); 2]);
    }

    #[tokio::test]
    async fn submission_rejection_is_not_retried() {
        let provider = Arc::new(ScriptedRenderProvider::new(vec![]).rejecting_submissions());
        let clock = Arc::new(ManualClock::new());
        let err = driver(provider.clone(), clock)
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "RENDER_SUBMISSION_FAILURE");
        assert!(err.to_string().contains("401"));
        assert_eq!(provider.submissions(), 1);
        assert_eq!(provider.polls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_carries_detail() {
        let provider = Arc::new(ScriptedRenderProvider::new(vec![
            PollStep::Report(StatusReport::processing()),
            PollStep::Report(StatusReport::failed("avatar_id not found")),
        ]));
        let clock = Arc::new(ManualClock::new());
        let err = driver(provider.clone(), clock)
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::RenderFailure("avatar_id not found".into()));
        assert_eq!(provider.downloads(), 0);
    }

    #[tokio::test]
    async fn times_out_at_budget() {
        let provider = Arc::new(ScriptedRenderProvider::always(PollStep::Report(
            StatusReport::processing(),
        )));
        let clock = Arc::new(ManualClock::new());
        let err = driver(provider.clone(), clock.clone())
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::RenderTimeout { elapsed_secs: 9, .. }));
        // Polls at t = 0, 3, 6, 9.
        assert_eq!(provider.polls(), 4);
        assert_eq!(clock.elapsed(), Duration::from_secs(9));
        assert_eq!(provider.downloads(), 0);
    }

    #[tokio::test]
    async fn final_sleep_is_clamped_to_budget() {
        let provider = Arc::new(ScriptedRenderProvider::always(PollStep::Report(
            StatusReport::processing(),
        )));
        let clock = Arc::new(ManualClock::new());
        let driver = RenderJobDriver::new(
            provider,
            clock.clone(),
            PollPolicy::new(Duration::from_secs(4), Duration::from_secs(10)),
        );
        let err = driver
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "RENDER_TIMEOUT");
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(4),
                Duration::from_secs(4),
                Duration::from_secs(2)
            ]
        );
    }

    struct SilentStatusProvider {
        polls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RenderProvider for SilentStatusProvider {
        async fn submit(
            &self,
            _script: &str,
            _params: &RenderParams,
            _metadata: &ArtifactMetadata,
        ) -> Result<String, crate::generation::RenderProviderError> {
            Ok("job-silent".into())
        }

        async fn poll(
            &self,
            _job_id: &str,
        ) -> Result<StatusReport, crate::generation::RenderProviderError> {
            self.polls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            std::future::pending().await
        }

        async fn download(
            &self,
            _asset_url: &str,
        ) -> Result<crate::models::DownloadedFile, crate::generation::RenderProviderError> {
            unreachable!("nothing completes")
        }
    }

    #[tokio::test]
    async fn unanswered_status_request_times_out() {
        let provider = Arc::new(SilentStatusProvider {
            polls: std::sync::atomic::AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new());
        let driver = RenderJobDriver::new(
            provider.clone(),
            clock.clone(),
            PollPolicy::new(Duration::from_secs(3), Duration::from_secs(9)),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            driver.generate("Hello", &RenderParams::default(), &sample_metadata()),
        )
        .await
        .expect("driver must not wait on a silent provider");

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::RenderTimeout { ref job_id, elapsed_secs: 9 } if job_id == "job-silent"
        ));
        assert_eq!(provider.polls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(clock.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test]
    async fn transient_poll_errors_are_retried() {
        let provider = Arc::new(ScriptedRenderProvider::new(vec![
            PollStep::TransientError,
            PollStep::TransientError,
            PollStep::Report(StatusReport::completed("https://cdn.test/late.mp4")),
        ]));
        let clock = Arc::new(ManualClock::new());
        let asset = driver(provider.clone(), clock)
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap();

        assert_eq!(asset.source_url, "https://cdn.test/late.mp4");
        assert_eq!(provider.polls(), 3);
    }

    #[tokio::test]
    async fn poll_errors_do_not_reset_the_budget() {
        let provider = Arc::new(ScriptedRenderProvider::always(PollStep::TransientError));
        let clock = Arc::new(ManualClock::new());
        let err = driver(provider.clone(), clock.clone())
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "RENDER_TIMEOUT");
        assert_eq!(provider.polls(), 4);
        assert_eq!(clock.elapsed(), Duration::from_secs(9));
    }

    #[tokio::test]
    async fn completed_without_url_is_failure() {
        let provider = Arc::new(ScriptedRenderProvider::new(vec![PollStep::Report(
            StatusReport {
                status: RenderStatus::Completed,
                asset_url: None,
                error: None,
            },
        )]));
        let clock = Arc::new(ManualClock::new());
        let err = driver(provider, clock)
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RENDER_FAILURE");
        assert!(err.to_string().contains("without a video URL"));
    }

    #[tokio::test]
    async fn download_failure_is_fatal() {
        let provider = Arc::new(
            ScriptedRenderProvider::new(vec![PollStep::Report(StatusReport::completed(
                "https://cdn.test/gone.mp4",
            ))])
            .failing_downloads(),
        );
        let clock = Arc::new(ManualClock::new());
        let err = driver(provider.clone(), clock)
            .generate("Hello", &RenderParams::default(), &sample_metadata())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "RENDER_FAILURE");
        assert!(err.to_string().contains("gone.mp4"));
        assert_eq!(provider.downloads(), 1);
        assert_eq!(provider.submissions(), 1, "no resubmission within an attempt");
    }
}
