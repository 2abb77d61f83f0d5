//! Per-entity event log windowed to a trailing retention period.

use std::collections::BTreeMap;
use std::time::Duration;

use homewatch_types::{StatusEvent, TimestampMs};

use super::uptime::UptimeSummary;

/// Default retention window: 24 hours.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Append-only status log, ordered ascending by timestamp per entity.
///
/// Events older than `now - window` are dropped lazily whenever the log is
/// written or read through a mutating accessor.
#[derive(Debug, Clone)]
pub struct EventLog {
    window: Duration,
    entries: BTreeMap<String, Vec<StatusEvent>>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl EventLog {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: BTreeMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn cutoff(&self, now: TimestampMs) -> TimestampMs {
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        now.saturating_sub(window_ms)
    }

    /// Record an event. Returns `false` if it was already outside the window.
    ///
    /// Out-of-order events are inserted at their sorted position, after any
    /// events with the same timestamp.
    pub fn append(&mut self, event: StatusEvent, now: TimestampMs) -> bool {
        let cutoff = self.cutoff(now);
        if event.timestamp < cutoff {
            return false;
        }

        let log = self.entries.entry(event.entity_id.clone()).or_default();
        let at = log.partition_point(|e| e.timestamp <= event.timestamp);
        log.insert(at, event);
        prune_log(log, cutoff);
        true
    }

    /// Pruned, ordered events for one entity.
    pub fn events(&mut self, entity_id: &str, now: TimestampMs) -> &[StatusEvent] {
        let cutoff = self.cutoff(now);
        match self.entries.get_mut(entity_id) {
            Some(log) => {
                prune_log(log, cutoff);
                log.as_slice()
            }
            None => &[],
        }
    }

    /// Events within the window for one entity, without pruning.
    pub fn retained(&self, entity_id: &str, now: TimestampMs) -> &[StatusEvent] {
        let cutoff = self.cutoff(now);
        match self.entries.get(entity_id) {
            Some(log) => {
                let start = log.partition_point(|e| e.timestamp < cutoff);
                &log[start..]
            }
            None => &[],
        }
    }

    /// Uptime summary for one entity as of `now`. Does not mutate the log.
    pub fn summary(&self, entity_id: &str, now: TimestampMs) -> UptimeSummary {
        UptimeSummary::summarize(entity_id, self.retained(entity_id, now), now)
    }

    /// Entities with at least one stored event, in id order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Drop every event outside the window and forget empty entities.
    pub fn prune(&mut self, now: TimestampMs) {
        let cutoff = self.cutoff(now);
        self.entries.retain(|_, log| {
            prune_log(log, cutoff);
            !log.is_empty()
        });
    }

    /// Total number of stored events.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Flatten to a list ordered by timestamp, then entity id.
    pub fn to_records(&self, now: TimestampMs) -> Vec<StatusEvent> {
        let mut records: Vec<StatusEvent> = self
            .entries
            .keys()
            .flat_map(|id| self.retained(id, now).iter().cloned())
            .collect();
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        records
    }

    /// Rebuild a log from persisted records.
    ///
    /// Records outside the window, or stamped in the future, are discarded.
    pub fn from_records(records: Vec<StatusEvent>, window: Duration, now: TimestampMs) -> Self {
        let mut log = Self::new(window);
        for record in records.into_iter().filter(|r| r.timestamp <= now) {
            log.append(record, now);
        }
        log
    }
}

fn prune_log(log: &mut Vec<StatusEvent>, cutoff: TimestampMs) {
    let stale = log.partition_point(|e| e.timestamp < cutoff);
    if stale > 0 {
        log.drain(..stale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3_600_000;

    #[test]
    fn test_append_keeps_order() {
        let mut log = EventLog::default();
        let now = 10 * HOUR;
        assert!(log.append(StatusEvent::up("web", 3 * HOUR), now));
        assert!(log.append(StatusEvent::down("web", HOUR), now));
        assert!(log.append(StatusEvent::up("web", 2 * HOUR), now));

        let ts: Vec<_> = log.events("web", now).iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![HOUR, 2 * HOUR, 3 * HOUR]);
    }

    #[test]
    fn test_append_rejects_stale() {
        let mut log = EventLog::default();
        let now = 30 * HOUR;
        assert!(!log.append(StatusEvent::up("web", HOUR), now));
        assert!(log.is_empty());
    }

    #[test]
    fn test_events_prunes_lazily() {
        let mut log = EventLog::default();
        log.append(StatusEvent::up("web", 0), 0);
        log.append(StatusEvent::up("web", 12 * HOUR), 12 * HOUR);
        assert_eq!(log.len(), 2);

        // Non-mutating view hides the stale event but keeps it stored.
        assert_eq!(log.retained("web", 25 * HOUR).len(), 1);
        assert_eq!(log.len(), 2);

        assert_eq!(log.events("web", 25 * HOUR).len(), 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut log = EventLog::new(Duration::from_secs(60));
        log.append(StatusEvent::up("web", 1_000), 1_000);
        assert_eq!(log.events("web", 61_000).len(), 1);
        assert_eq!(log.events("web", 61_001).len(), 0);
    }

    #[test]
    fn test_prune_forgets_empty_entities() {
        let mut log = EventLog::default();
        log.append(StatusEvent::up("old", 0), 0);
        log.append(StatusEvent::up("web", 20 * HOUR), 20 * HOUR);
        log.prune(25 * HOUR);
        assert_eq!(log.entities().collect::<Vec<_>>(), vec!["web"]);
    }

    #[test]
    fn test_unknown_entity() {
        let mut log = EventLog::default();
        assert!(log.events("nope", 0).is_empty());
        assert_eq!(log.summary("nope", 0).percent, 100.0);
    }

    #[test]
    fn test_summary_web_started_ten_minutes_ago() {
        let mut log = EventLog::default();
        let minute = 60_000;
        for i in 0..=10 {
            log.append(StatusEvent::up("web", i * minute), i * minute);
        }
        let s = log.summary("web", 10 * minute);
        assert_eq!(s.last_up, Some(10 * minute));
        assert_eq!(s.last_down, None);
        assert_eq!(s.percent, 100.0);
    }

    #[test]
    fn test_records_round_trip_drops_out_of_window() {
        let records = vec![
            StatusEvent::up("web", 20 * HOUR),
            StatusEvent::down("db", HOUR),
            StatusEvent::down("web", 21 * HOUR),
            StatusEvent::up("web", 40 * HOUR),
        ];
        let log = EventLog::from_records(records, DEFAULT_RETENTION, 26 * HOUR);

        assert_eq!(log.len(), 2);
        let restored = log.to_records(26 * HOUR);
        assert_eq!(
            restored,
            vec![
                StatusEvent::up("web", 20 * HOUR),
                StatusEvent::down("web", 21 * HOUR)
            ]
        );
    }

    #[test]
    fn test_to_records_interleaves_entities() {
        let mut log = EventLog::default();
        log.append(StatusEvent::up("b", 2), 10);
        log.append(StatusEvent::up("a", 2), 10);
        log.append(StatusEvent::down("b", 1), 10);

        let ids: Vec<_> = log
            .to_records(10)
            .into_iter()
            .map(|e| (e.entity_id, e.timestamp))
            .collect();
        assert_eq!(
            ids,
            vec![("b".to_string(), 1), ("a".to_string(), 2), ("b".to_string(), 2)]
        );
    }
}
