//! Channel-based sampler.
//!
//! Receives samples via a tokio watch channel. This is useful when another
//! task in the same process collects state and pushes it rather than
//! having it pulled.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use homewatch_types::{Sample, ServiceSnapshot, SystemMetrics};

use super::{SampleError, Sampler};

/// A sampler that returns samples pushed through a channel.
///
/// Each pushed sample is handed out by [`Sampler::sample`] once, with the
/// timestamp its producer gave it. Until the producer sends something new,
/// sampling fails with [`SampleError::Pending`], so a stalled producer is
/// never mistaken for fresh data. Once the sender is dropped every request
/// fails with [`SampleError::Closed`].
///
/// # Example
///
/// ```
/// use homewatch::ChannelSampler;
/// use homewatch_types::Sample;
///
/// let (tx, sampler) = ChannelSampler::create("collector task");
/// tx.send(Some(Sample::builder().service("web", |s| s.running()).build())).unwrap();
/// ```
#[derive(Debug)]
pub struct ChannelSampler {
    receiver: Mutex<watch::Receiver<Option<Sample>>>,
    description: String,
}

impl ChannelSampler {
    /// Create a new channel sampler.
    ///
    /// A sample already in the channel is served by the first request.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of a watch channel
    /// * `source_description` - Where samples come from (e.g. "collector task")
    pub fn new(mut receiver: watch::Receiver<Option<Sample>>, source_description: &str) -> Self {
        receiver.mark_changed();
        let description = format!("channel: {}", source_description);
        Self {
            receiver: Mutex::new(receiver),
            description,
        }
    }

    /// Create a channel pair. Nothing can be sampled until the first send.
    pub fn create(source_description: &str) -> (watch::Sender<Option<Sample>>, Self) {
        let (tx, rx) = watch::channel(None);
        let sampler = Self::new(rx, source_description);
        (tx, sampler)
    }

    /// The most recent sample, whether or not it was handed out before.
    fn peek(&self) -> Result<Sample, SampleError> {
        let receiver = self.receiver.lock();
        // has_changed only errors once the sender is gone
        receiver.has_changed().map_err(|_| SampleError::Closed)?;
        let latest = receiver.borrow().clone();
        latest.ok_or(SampleError::Pending)
    }

    /// The sample sent since the last call, if any.
    fn take_new(&self) -> Result<Sample, SampleError> {
        let mut receiver = self.receiver.lock();
        if !receiver.has_changed().map_err(|_| SampleError::Closed)? {
            return Err(SampleError::Pending);
        }
        let latest = receiver.borrow_and_update().clone();
        latest.ok_or(SampleError::Pending)
    }
}

#[async_trait]
impl Sampler for ChannelSampler {
    async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError> {
        Ok(self.peek()?.services)
    }

    async fn system(&self) -> Result<SystemMetrics, SampleError> {
        Ok(self.peek()?.system)
    }

    async fn sample(&self) -> Result<Sample, SampleError> {
        self.take_new()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sampler_latest_value() {
        let (tx, sampler) = ChannelSampler::create("test");
        assert_eq!(sampler.description(), "channel: test");

        tx.send(Some(
            Sample::builder()
                .timestamp_ms(42)
                .service("web", |s| s.running())
                .system(|m| m.cpu(7.0))
                .build(),
        ))
        .unwrap();

        let sample = sampler.sample().await.unwrap();
        assert_eq!(sample.timestamp_ms, 42);
        assert_eq!(sample.len(), 1);

        // Peeking does not depend on what was already handed out
        assert_eq!(sampler.system().await.unwrap().cpu_percent, 7.0);
        assert_eq!(sampler.services().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_sampler_empty_until_first_send() {
        let (tx, sampler) = ChannelSampler::create("test");
        assert!(matches!(sampler.sample().await, Err(SampleError::Pending)));
        assert!(matches!(sampler.services().await, Err(SampleError::Pending)));

        tx.send(Some(Sample::builder().timestamp_ms(1).build())).unwrap();
        assert!(sampler.sample().await.is_ok());
    }

    #[tokio::test]
    async fn test_channel_sampler_serves_each_sample_once() {
        let (tx, sampler) = ChannelSampler::create("test");
        tx.send(Some(Sample::builder().timestamp_ms(1).build())).unwrap();

        assert_eq!(sampler.sample().await.unwrap().timestamp_ms, 1);
        assert!(matches!(sampler.sample().await, Err(SampleError::Pending)));

        tx.send(Some(Sample::builder().timestamp_ms(2).build())).unwrap();
        assert_eq!(sampler.sample().await.unwrap().timestamp_ms, 2);
    }

    #[tokio::test]
    async fn test_channel_sampler_serves_preloaded_value() {
        let (_tx, rx) = watch::channel(Some(Sample::builder().timestamp_ms(7).build()));
        let sampler = ChannelSampler::new(rx, "preloaded");
        assert_eq!(sampler.sample().await.unwrap().timestamp_ms, 7);
    }

    #[tokio::test]
    async fn test_channel_sampler_closed() {
        let (tx, sampler) = ChannelSampler::create("test");
        drop(tx);
        assert!(matches!(sampler.sample().await, Err(SampleError::Closed)));
    }
}
