//! Sampler abstraction for reading service state and host metrics.
//!
//! A [`Sampler`] produces the service list and host metrics on demand, from
//! a JSON file, an in-process channel, or the live machine (docker, /proc,
//! website probes). The [`Poller`] drives a sampler with a timeout and makes
//! sure only one request is in flight at a time.

mod channel;
mod file;
mod poller;
mod system;

pub use channel::ChannelSampler;
pub use file::FileSampler;
pub use poller::{PollOutcome, Poller};
pub use system::{SystemSampler, SystemSamplerBuilder};

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use homewatch_adapters::AdapterError;
use homewatch_types::{Sample, ServiceSnapshot, SystemMetrics};

/// Why a sampling request produced no data.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Sampling timed out after {0:?}")]
    Timeout(Duration),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The producing side of a channel went away.
    #[error("Sample source closed")]
    Closed,

    /// Nothing new since the last sample was taken.
    #[error("No new sample available")]
    Pending,
}

/// Trait for reading monitored state from various backends.
///
/// Implementations must be best-effort and bounded in time; the
/// [`Poller`] additionally wraps every call in a timeout.
///
/// # Example
///
/// ```
/// use homewatch::{FileSampler, Sampler};
///
/// # tokio_test::block_on(async {
/// let sampler = FileSampler::new("services.json");
/// if let Ok(sample) = sampler.sample().await {
///     println!("Got {} services", sample.len());
/// }
/// # });
/// ```
#[async_trait]
pub trait Sampler: Send + Sync + Debug {
    /// Current state of every monitored service.
    async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError>;

    /// Current host memory, disk and CPU usage.
    async fn system(&self) -> Result<SystemMetrics, SampleError>;

    /// Both halves together, stamped with the time of sampling.
    async fn sample(&self) -> Result<Sample, SampleError> {
        let (services, system) = tokio::try_join!(self.services(), self.system())?;
        Ok(Sample::new(services, system))
    }

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
