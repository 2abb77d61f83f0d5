//! # homewatch
//!
//! A health-monitoring and uptime engine for self-hosted dashboards.
//!
//! homewatch samples the state of containers, websites and the host it runs
//! on, detects services starting and stopping, keeps a rolling 24 hour
//! uptime ledger per service, records bounded metric history for trend
//! charts, and turns state changes into short-lived notifications.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Monitor                             │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐                 │
//! │  │ Poller  │───▶│   diff   │───▶│ EventLog │──▶ UptimeSummary│
//! │  └────┬────┘    └────┬─────┘    └──────────┘                 │
//! │       │              └─────────▶ Dispatcher ──▶ notifications│
//! │       └────────────────────────▶ History ─────▶ chart points │
//! │       ▲                                                      │
//! │  ┌────┴────┐                                                 │
//! │  │ Sampler │◀── FileSampler | ChannelSampler | SystemSampler │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: The [`Sampler`] trait with file, channel and live-system
//!   implementations, plus the single-flight [`Poller`]
//! - **[`data`]**: Snapshot diffing, the uptime ledger and aggregator, metric
//!   ring buffers, thresholds and duration helpers
//! - **[`notify`]**: Auto-expiring notifications and alert cooldowns
//! - **[`monitor`]**: The engine instance tying it all together, and its
//!   background polling task
//! - **[`store`]**: Preference persistence for the uptime ledger
//! - **[`config`]**: File and environment configuration
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Monitor docker containers and the host
//! homewatch --config homewatch.toml
//!
//! # Read state from a JSON file written by another process
//! homewatch --file services.json
//!
//! # Sample once and export the result
//! homewatch --export status.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use homewatch::{Monitor, Sample};
//!
//! let mut monitor = Monitor::default();
//! monitor.apply(
//!     Sample::builder()
//!         .timestamp_ms(0)
//!         .service("web", |s| s.name("nginx").running())
//!         .build(),
//! );
//! monitor.apply(
//!     Sample::builder()
//!         .timestamp_ms(60_000)
//!         .service("web", |s| s.name("nginx").stopped())
//!         .build(),
//! );
//!
//! assert_eq!(monitor.notifications()[0].message, "nginx stopped");
//! assert_eq!(monitor.uptime("web", 60_000).percent, 100.0);
//! ```
//!
//! ### Polling in the background
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use homewatch::{ChannelSampler, Monitor, Poller};
//!
//! # tokio_test::block_on(async {
//! let (tx, sampler) = ChannelSampler::create("collector");
//! let handle = Monitor::default().spawn(Poller::new(Arc::new(sampler)), Duration::from_secs(10));
//!
//! let shared = handle.shared();
//! println!("{} services", shared.read().services().len());
//!
//! handle.shutdown().await;
//! # });
//! ```

pub mod config;
pub mod data;
pub mod monitor;
pub mod notify;
pub mod source;
pub mod store;

// Re-export main types for convenience
pub use config::Settings;
pub use data::{EventLog, HealthStatus, History, SnapshotDiff, Thresholds, UptimeSummary};
pub use monitor::{Monitor, MonitorHandle, Overview, SharedMonitor};
pub use notify::{Dispatcher, NotificationRecord, Severity};
pub use source::{ChannelSampler, FileSampler, PollOutcome, Poller, SampleError, Sampler, SystemSampler};
pub use store::{JsonFileStore, MemoryStore, PreferenceStore};

pub use homewatch_types::{MetricKind, RunStatus, Sample, ServiceSnapshot, StatusEvent, SystemMetrics};
