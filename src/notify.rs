//! Ephemeral, auto-expiring user notifications.
//!
//! A [`Dispatcher`] keeps notification records in insertion order. Each
//! record has a time-to-live; when a tokio runtime is available a timer task
//! removes it once the ttl elapses. [`Dispatcher::dismiss`] removes a record
//! immediately and cancels its timer. Reads also drop anything past its
//! deadline, so a record is never visible after `created_at + ttl` even if
//! its timer has not run yet.
//!
//! [`Cooldown`] rate-limits repeated alerts for the same key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use homewatch_types::{current_timestamp_ms, TimestampMs};

/// Default notification lifetime: 5 seconds.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

/// A live notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    /// Milliseconds since the Unix epoch.
    pub created_at: TimestampMs,
    #[serde(serialize_with = "serialize_ttl_ms")]
    pub ttl: Duration,
}

fn serialize_ttl_ms<S: serde::Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
}

/// Aborts the expiry task when dropped.
#[derive(Debug)]
struct ExpiryTimer(JoinHandle<()>);

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug)]
struct Entry {
    record: NotificationRecord,
    deadline: Instant,
    _timer: Option<ExpiryTimer>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Inner {
    fn remove(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|e| e.record.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn purge_expired(&mut self, now: Instant) {
        self.entries.retain(|e| e.deadline > now);
    }
}

/// Owns live notifications until they expire or are dismissed.
///
/// Cloning shares the same record list. Pending expiry timers are aborted
/// once the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    inner: Arc<Mutex<Inner>>,
    default_ttl: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Dispatcher {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 1,
                entries: Vec::new(),
            })),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Publish a notification with the default ttl. Returns its id.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> u64 {
        self.notify_with_ttl(message, severity, self.default_ttl)
    }

    pub fn notify_with_ttl(
        &self,
        message: impl Into<String>,
        severity: Severity,
        ttl: Duration,
    ) -> u64 {
        let deadline = Instant::now() + ttl;
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let record = NotificationRecord {
            id,
            message: message.into(),
            severity,
            created_at: current_timestamp_ms(),
            ttl,
        };
        debug!("Notification {} ({:?}): {}", id, severity, record.message);

        let timer = spawn_expiry(Arc::downgrade(&self.inner), id, deadline);
        inner.entries.push(Entry {
            record,
            deadline,
            _timer: timer,
        });
        id
    }

    /// Remove a notification now. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let removed = self.inner.lock().remove(id);
        if removed {
            debug!("Notification {} dismissed", id);
        }
        removed
    }

    /// Live notifications in insertion order.
    pub fn active(&self) -> Vec<NotificationRecord> {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.entries.iter().map(|e| e.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn spawn_expiry(inner: Weak<Mutex<Inner>>, id: u64, deadline: Instant) -> Option<ExpiryTimer> {
    let handle = Handle::try_current().ok()?;
    let task = handle.spawn(async move {
        tokio::time::sleep_until(deadline).await;
        if let Some(inner) = inner.upgrade() {
            if inner.lock().remove(id) {
                debug!("Notification {} expired", id);
            }
        }
    });
    Some(ExpiryTimer(task))
}

/// Rate limiter allowing one firing per key per period.
#[derive(Debug, Clone)]
pub struct Cooldown<K> {
    period: Duration,
    last_fired: HashMap<K, TimestampMs>,
}

impl<K: Eq + Hash> Cooldown<K> {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_fired: HashMap::new(),
        }
    }

    /// Returns `true` and records the firing when `key` is not cooling down.
    pub fn check(&mut self, key: K, now: TimestampMs) -> bool {
        let period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX);
        match self.last_fired.get(&key) {
            Some(&last) if now.saturating_sub(last) < period_ms => false,
            _ => {
                self.last_fired.insert(key, now);
                true
            }
        }
    }

    /// Forget keys for which `keep` returns false, so they fire immediately
    /// next time.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.last_fired.retain(|k, _| keep(k));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_runtime() {
        let dispatcher = Dispatcher::default();
        let a = dispatcher.notify("web started", Severity::Success);
        let b = dispatcher.notify("db stopped", Severity::Error);
        assert_ne!(a, b);

        let active = dispatcher.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].message, "web started");
        assert_eq!(active[0].ttl, DEFAULT_TTL);
        assert_eq!(active[1].severity, Severity::Error);
    }

    #[test]
    fn test_dismiss() {
        let dispatcher = Dispatcher::default();
        let id = dispatcher.notify("hello", Severity::Info);
        assert!(dispatcher.dismiss(id));
        assert!(dispatcher.is_empty());
        assert!(!dispatcher.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let dispatcher = Dispatcher::default();
        dispatcher.notify("short", Severity::Info);
        dispatcher.notify_with_ttl("long", Severity::Warning, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(dispatcher.len(), 2);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let active = dispatcher.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "long");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_removes_entry() {
        let dispatcher = Dispatcher::default();
        dispatcher.notify("gone soon", Severity::Info);

        tokio::time::sleep(DEFAULT_TTL + Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert!(dispatcher.inner.lock().entries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer() {
        let dispatcher = Dispatcher::default();
        let id = dispatcher.notify("bye", Severity::Info);
        let second = dispatcher.notify("stay", Severity::Info);
        assert!(dispatcher.dismiss(id));

        let remaining = dispatcher.active();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
    }

    #[test]
    fn test_record_serializes_ttl_in_ms() {
        let record = NotificationRecord {
            id: 7,
            message: "cpu high".into(),
            severity: Severity::Warning,
            created_at: 1_000,
            ttl: DEFAULT_TTL,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ttl"], 5000);
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["createdAt"], 1_000);
    }

    #[test]
    fn test_cooldown() {
        let mut cooldown = Cooldown::new(Duration::from_secs(60));
        assert!(cooldown.check("web", 0));
        assert!(!cooldown.check("web", 30_000));
        assert!(cooldown.check("db", 30_000));
        assert!(cooldown.check("web", 60_000));
    }

    #[test]
    fn test_cooldown_retain_resets() {
        let mut cooldown = Cooldown::new(Duration::from_secs(60));
        assert!(cooldown.check("web", 0));
        cooldown.retain(|k| *k != "web");
        assert!(cooldown.check("web", 1));
    }
}
