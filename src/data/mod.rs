//! Derived monitoring state.
//!
//! Everything in this module is synchronous and clock-free: callers pass the
//! current time in, which keeps the engine deterministic under test.
//!
//! ## Submodules
//!
//! - [`diff`]: Classifies transitions and threshold breaches between samples
//! - [`ledger`]: Per-entity status event log with a trailing retention window
//! - [`uptime`]: Uptime percentage and last-up/last-down derived from the log
//! - [`history`]: Fixed-capacity metric series and chart coordinates
//! - [`health`]: Resource thresholds and uptime grading
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "10s", "24h")
//!
//! ## Data Flow
//!
//! ```text
//! Sample (from a Sampler)
//!        │
//!        ├──▶ diff() ──▶ ticks ──▶ EventLog::append() ──▶ UptimeSummary
//!        │          └──▶ transitions / breaches ──▶ notifications
//!        │
//!        └──▶ History::record() (for trend charts)
//! ```

pub mod diff;
pub mod duration;
pub mod health;
pub mod history;
pub mod ledger;
pub mod uptime;

pub use diff::{
    diff, BreachKind, SnapshotDiff, StatusTick, ThresholdBreach, Transition, TransitionKind,
};
pub use health::{HealthStatus, Thresholds};
pub use history::{ChartExtent, History, Points, RingBuffer};
pub use ledger::EventLog;
pub use uptime::{format_percent, UptimeSummary};
