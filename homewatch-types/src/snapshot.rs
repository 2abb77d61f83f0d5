//! Sample - a point-in-time read of services and host metrics.

use crate::{
    current_timestamp_ms, SchemaVersion, ServiceBuilder, ServiceSnapshot, SystemMetrics,
    SystemMetricsBuilder, TimestampMs,
};

/// One complete read from a sampler: every service plus host metrics.
///
/// Services keep the order the sampler reported them in.
///
/// # Example
///
/// ```rust
/// use homewatch_types::Sample;
///
/// let sample = Sample::builder()
///     .service("web", |s| s.running().cpu(40.0))
///     .system(|m| m.memory(55.0))
///     .build();
///
/// assert_eq!(sample.running().count(), 1);
/// assert_eq!(sample.system.memory_percent, 55.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Sample {
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: SchemaVersion,

    /// When the sample was taken, in milliseconds since the Unix epoch.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp_ms: TimestampMs,

    #[cfg_attr(feature = "serde", serde(default))]
    pub services: Vec<ServiceSnapshot>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub system: SystemMetrics,
}

impl Sample {
    /// Create a sample stamped with the current time.
    pub fn new(services: Vec<ServiceSnapshot>, system: SystemMetrics) -> Self {
        Self {
            version: SchemaVersion::current(),
            timestamp_ms: current_timestamp_ms(),
            services,
            system,
        }
    }

    pub fn builder() -> SampleBuilder {
        SampleBuilder::new()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Look up a service by id.
    pub fn get(&self, id: &str) -> Option<&ServiceSnapshot> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceSnapshot> {
        self.services.iter()
    }

    /// Services currently running.
    pub fn running(&self) -> impl Iterator<Item = &ServiceSnapshot> {
        self.services.iter().filter(|s| s.is_running())
    }

    /// Services not running.
    pub fn stopped(&self) -> impl Iterator<Item = &ServiceSnapshot> {
        self.services.iter().filter(|s| !s.is_running())
    }
}

/// Builder for constructing [`Sample`] instances.
#[derive(Debug, Default)]
pub struct SampleBuilder {
    timestamp_ms: Option<TimestampMs>,
    services: Vec<ServiceSnapshot>,
    system: SystemMetrics,
}

impl SampleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: TimestampMs) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Add a service built using a closure.
    ///
    /// A service with the same id replaces the earlier one in place.
    pub fn service<F>(mut self, id: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ServiceBuilder) -> ServiceBuilder,
    {
        let service = f(ServiceBuilder::new(id)).build();
        self.push(service);
        self
    }

    /// Add a pre-built service.
    pub fn service_snapshot(mut self, service: ServiceSnapshot) -> Self {
        self.push(service);
        self
    }

    /// Set host metrics using a closure.
    pub fn system<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SystemMetricsBuilder) -> SystemMetricsBuilder,
    {
        self.system = f(SystemMetrics::builder()).build();
        self
    }

    pub fn system_metrics(mut self, system: SystemMetrics) -> Self {
        self.system = system;
        self
    }

    pub fn build(self) -> Sample {
        Sample {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            services: self.services,
            system: self.system,
        }
    }

    fn push(&mut self, service: ServiceSnapshot) {
        match self.services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service,
            None => self.services.push(service),
        }
    }
}
