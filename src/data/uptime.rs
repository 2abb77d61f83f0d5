//! Uptime aggregation over a retention window.
//!
//! The percentage is the share of time, from the earliest retained event
//! until now, that an entity spent `up`. Each `up` event counts as up until
//! the next event (or until now for the most recent one).

use serde::Serialize;

use homewatch_types::{Availability, StatusEvent, TimestampMs};

use super::health::HealthStatus;

/// Placeholder rendered when a value is unknown.
pub const UNKNOWN: &str = "—";

/// Derived uptime figures for one entity. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeSummary {
    pub entity_id: String,
    /// Always within `[0, 100]`.
    pub percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_up: Option<TimestampMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_down: Option<TimestampMs>,
}

impl UptimeSummary {
    /// Summarize a time-ordered event slice as of `now`.
    ///
    /// An empty slice is 100% with no last-up/last-down. When no time has
    /// elapsed since the first event, the result is 100 if the latest event
    /// is `up` and 0 otherwise.
    pub fn summarize(entity_id: &str, events: &[StatusEvent], now: TimestampMs) -> Self {
        let mut summary = Self {
            entity_id: entity_id.to_string(),
            percent: 100.0,
            last_up: None,
            last_down: None,
        };

        let (Some(first), Some(last)) = (events.first(), events.last()) else {
            return summary;
        };

        let mut up_ms: u64 = 0;
        for (i, event) in events.iter().enumerate() {
            match event.status {
                Availability::Up => {
                    let end = events.get(i + 1).map_or(now, |next| next.timestamp);
                    up_ms += end.saturating_sub(event.timestamp);
                    summary.last_up = Some(event.timestamp);
                }
                Availability::Down => summary.last_down = Some(event.timestamp),
            }
        }

        let total = now.saturating_sub(first.timestamp);
        let percent = if total == 0 {
            if last.status.is_up() {
                100.0
            } else {
                0.0
            }
        } else {
            up_ms as f64 / total as f64 * 100.0
        };

        summary.percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        summary
    }

    pub fn grade(&self) -> HealthStatus {
        HealthStatus::from_uptime(self.percent)
    }

    /// Two-decimal percentage label, e.g. `99.50%`.
    pub fn percent_label(&self) -> String {
        format!("{:.2}%", self.percent)
    }
}

/// Percentage label for an optional summary, dash when unknown.
pub fn format_percent(summary: Option<&UptimeSummary>) -> String {
    summary.map_or_else(|| UNKNOWN.to_string(), UptimeSummary::percent_label)
}
