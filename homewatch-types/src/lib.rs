//! # homewatch-types
//!
//! Core types shared by the homewatch engine and its sampler adapters.
//!
//! A [`Sample`] is one point-in-time read of everything homewatch watches:
//! the run state and resource usage of each service (a container, a process,
//! or a probed website) plus host-wide memory, disk and CPU usage. The engine
//! turns consecutive samples into [`StatusEvent`]s for the uptime ledger and
//! into per-[`MetricKind`] chart series.
//!
//! ## Features
//!
//! - `serde`: JSON serialization of samples and events via serde. Persisted
//!   and wire names are camelCase (`entityId`, `cpuPercent`, ...).
//!
//! ## Example
//!
//! ```rust
//! use homewatch_types::{RunStatus, Sample};
//!
//! let sample = Sample::builder()
//!     .timestamp_ms(1_700_000_000_000)
//!     .service("web", |s| s.name("nginx").running().cpu(12.5).mem(4.0).port("80/tcp"))
//!     .service("db", |s| s.name("postgres").stopped())
//!     .system(|m| m.memory(41.0).disk(63.0).cpu(9.5))
//!     .build();
//!
//! assert_eq!(sample.len(), 2);
//! assert_eq!(sample.get("db").map(|s| s.status), Some(RunStatus::Stopped));
//! ```

mod event;
mod metrics;
mod service;
mod snapshot;
mod version;

pub use event::*;
pub use metrics::*;
pub use service::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version of serialized samples.
pub const SCHEMA_VERSION: u32 = 1;

/// Milliseconds since the Unix epoch.
pub type TimestampMs = u64;

/// Get the current wall-clock time in milliseconds since the Unix epoch.
pub fn current_timestamp_ms() -> TimestampMs {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
