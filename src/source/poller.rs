//! Single-flight polling of a [`Sampler`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use homewatch_types::Sample;

use super::{SampleError, Sampler};

/// Default bound on a single sampling request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one poll.
#[derive(Debug)]
pub enum PollOutcome {
    /// The sampler answered in time.
    Sampled(Sample),
    /// The sampler failed or timed out. The caller keeps its last good state.
    Failed(SampleError),
    /// A previous request was still in flight, or the sampler had nothing
    /// new to report.
    Skipped,
}

impl PollOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, PollOutcome::Sampled(_))
    }

    pub fn sample(&self) -> Option<&Sample> {
        match self {
            PollOutcome::Sampled(sample) => Some(sample),
            _ => None,
        }
    }
}

/// Requests samples with at most one request in flight.
///
/// Clones share the in-flight flag, so a manual refresh racing the
/// scheduled poll is skipped rather than queued.
#[derive(Debug, Clone)]
pub struct Poller {
    sampler: Arc<dyn Sampler>,
    in_flight: Arc<AtomicBool>,
    timeout: Duration,
}

/// Clears the in-flight flag when the poll finishes or is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Poller {
    pub fn new(sampler: Arc<dyn Sampler>) -> Self {
        Self {
            sampler,
            in_flight: Arc::new(AtomicBool::new(false)),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn description(&self) -> &str {
        self.sampler.description()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn poll(&self) -> PollOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Previous sample still in flight, skipping cycle");
            return PollOutcome::Skipped;
        }
        let _guard = InFlight(&self.in_flight);

        match tokio::time::timeout(self.timeout, self.sampler.sample()).await {
            Ok(Ok(sample)) => PollOutcome::Sampled(sample),
            Ok(Err(SampleError::Pending)) => {
                debug!("No new sample from {}", self.sampler.description());
                PollOutcome::Skipped
            }
            Ok(Err(e)) => {
                warn!("Sampling {} failed: {}", self.sampler.description(), e);
                PollOutcome::Failed(e)
            }
            Err(_) => {
                warn!(
                    "Sampling {} timed out after {:?}",
                    self.sampler.description(),
                    self.timeout
                );
                PollOutcome::Failed(SampleError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use homewatch_types::{ServiceSnapshot, SystemMetrics};

    #[derive(Debug)]
    struct SlowSampler {
        delay: Duration,
    }

    #[async_trait]
    impl Sampler for SlowSampler {
        async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![ServiceSnapshot::builder("web").running().build()])
        }

        async fn system(&self) -> Result<SystemMetrics, SampleError> {
            Ok(SystemMetrics::default())
        }

        fn description(&self) -> &str {
            "slow"
        }
    }

    #[derive(Debug)]
    struct FailingSampler;

    #[async_trait]
    impl Sampler for FailingSampler {
        async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError> {
            Err(SampleError::Read("boom".into()))
        }

        async fn system(&self) -> Result<SystemMetrics, SampleError> {
            Ok(SystemMetrics::default())
        }

        fn description(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_success() {
        let poller = Poller::new(Arc::new(SlowSampler {
            delay: Duration::from_millis(10),
        }));
        let outcome = poller.poll().await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.sample().unwrap().len(), 1);
        assert!(!poller.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_poll_is_skipped() {
        let poller = Poller::new(Arc::new(SlowSampler {
            delay: Duration::from_secs(1),
        }));
        let other = poller.clone();

        let (first, second) = tokio::join!(poller.poll(), other.poll());
        assert!(first.is_ok());
        assert!(matches!(second, PollOutcome::Skipped));

        // The flag is released afterwards
        assert!(poller.poll().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_failure() {
        let poller = Poller::new(Arc::new(SlowSampler {
            delay: Duration::from_secs(60),
        }))
        .with_timeout(Duration::from_secs(5));

        let outcome = poller.poll().await;
        assert!(matches!(
            outcome,
            PollOutcome::Failed(SampleError::Timeout(d)) if d == Duration::from_secs(5)
        ));
        assert!(!poller.is_in_flight());
    }

    #[derive(Debug)]
    struct IdleSampler;

    #[async_trait]
    impl Sampler for IdleSampler {
        async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError> {
            Err(SampleError::Pending)
        }

        async fn system(&self) -> Result<SystemMetrics, SampleError> {
            Err(SampleError::Pending)
        }

        fn description(&self) -> &str {
            "idle"
        }
    }

    #[tokio::test]
    async fn test_pending_sampler_is_skipped() {
        let poller = Poller::new(Arc::new(IdleSampler));
        assert!(matches!(poller.poll().await, PollOutcome::Skipped));
        assert!(!poller.is_in_flight());
    }

    #[tokio::test]
    async fn test_sampler_error_is_failure() {
        let poller = Poller::new(Arc::new(FailingSampler));
        assert_eq!(poller.description(), "failing");
        assert!(matches!(poller.poll().await, PollOutcome::Failed(SampleError::Read(_))));
    }
}
