//! The monitoring engine.
//!
//! A [`Monitor`] owns all derived state: the last accepted sample, the
//! uptime ledger, metric history and live notifications. Feed it samples
//! with [`Monitor::apply`], or hand it to [`Monitor::spawn`] to poll on a
//! fixed cadence in the background.
//!
//! ## Notification policy
//!
//! - The first accepted sample is a baseline: it seeds state but raises no
//!   start/stop notifications.
//! - Every later transition raises exactly one notification.
//! - A threshold breach notifies when it begins, then at most once per
//!   cooldown period while it lasts. Once it clears, the next breach
//!   notifies immediately.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use homewatch_types::{
    MetricKind, Sample, ServiceSnapshot, StatusEvent, SystemMetrics, TimestampMs,
};

use crate::config::Settings;
use crate::data::duration::format_duration;
use crate::data::uptime::UNKNOWN;
use crate::data::{
    diff, BreachKind, ChartExtent, EventLog, History, Points, SnapshotDiff, ThresholdBreach,
    Thresholds, TransitionKind, UptimeSummary,
};
use crate::notify::{Cooldown, Dispatcher, NotificationRecord, Severity};
use crate::source::{PollOutcome, Poller, SampleError};

/// Monitor shared between the polling task (single writer) and readers.
pub type SharedMonitor = Arc<RwLock<Monitor>>;

/// Aggregate counts over the current services.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub running: usize,
    pub stopped: usize,
    pub total: usize,
    /// Mean CPU of running services; `None` when nothing runs.
    pub avg_cpu_percent: Option<f64>,
    /// Summed memory of running services; `None` when nothing runs.
    pub total_memory_percent: Option<f64>,
}

impl Overview {
    fn from_services(services: &[ServiceSnapshot]) -> Self {
        let running: Vec<&ServiceSnapshot> = services.iter().filter(|s| s.is_running()).collect();
        let (avg_cpu_percent, total_memory_percent) = if running.is_empty() {
            (None, None)
        } else {
            let cpu: f64 = running.iter().map(|s| s.cpu_percent).sum();
            let mem: f64 = running.iter().map(|s| s.mem_percent).sum();
            (Some(cpu / running.len() as f64), Some(mem))
        };

        Self {
            running: running.len(),
            stopped: services.len() - running.len(),
            total: services.len(),
            avg_cpu_percent,
            total_memory_percent,
        }
    }

    pub fn avg_cpu_label(&self) -> String {
        percent_or_dash(self.avg_cpu_percent)
    }

    pub fn total_memory_label(&self) -> String {
        percent_or_dash(self.total_memory_percent)
    }
}

fn percent_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| format!("{:.1}%", v))
}

/// Engine state for one set of monitored services.
#[derive(Debug)]
pub struct Monitor {
    thresholds: Thresholds,
    chart: ChartExtent,
    previous: Option<Sample>,
    ledger: EventLog,
    history: History,
    notifications: Dispatcher,
    cooldown: Cooldown<(String, BreachKind)>,
    last_error: Option<String>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Monitor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            thresholds: settings.thresholds,
            chart: settings.chart,
            previous: None,
            ledger: EventLog::new(settings.retention),
            history: History::new(settings.history_capacity),
            notifications: Dispatcher::new(settings.notification_ttl),
            cooldown: Cooldown::new(settings.alert_cooldown),
            last_error: None,
        }
    }

    /// Start from a previously persisted ledger.
    pub fn with_ledger(mut self, ledger: EventLog) -> Self {
        self.ledger = ledger;
        self
    }

    /// Accept a sample, using its timestamp as the current time.
    ///
    /// Returns `None` without touching any state when the sample is not
    /// newer than the last accepted one.
    pub fn apply(&mut self, sample: Sample) -> Option<SnapshotDiff> {
        let now = sample.timestamp_ms;
        if let Some(previous) = &self.previous {
            if now <= previous.timestamp_ms {
                warn!(
                    "Ignoring stale sample from {} (last accepted {})",
                    now, previous.timestamp_ms
                );
                return None;
            }
        }

        let baseline = self.previous.is_none();
        let previous = self
            .previous
            .as_ref()
            .map_or(&[][..], |p| p.services.as_slice());
        let changes = diff(previous, &sample.services, &self.thresholds);

        for tick in &changes.ticks {
            self.ledger
                .append(StatusEvent::new(tick.entity_id.clone(), now, tick.status), now);
        }
        self.ledger.prune(now);
        self.history.record(&sample.system);

        if baseline {
            debug!("Baseline sample with {} services", sample.len());
        } else {
            for transition in &changes.transitions {
                let (verb, severity) = match transition.kind {
                    TransitionKind::Started => ("started", Severity::Success),
                    TransitionKind::Stopped => ("stopped", Severity::Error),
                };
                info!("{} ({}) {}", transition.name, transition.entity_id, verb);
                self.notifications
                    .notify(format!("{} {}", transition.name, verb), severity);
            }
        }
        self.notify_breaches(&changes.breaches, now);

        self.previous = Some(sample);
        self.last_error = None;
        Some(changes)
    }

    fn notify_breaches(&mut self, breaches: &[ThresholdBreach], now: TimestampMs) {
        let active: HashSet<(String, BreachKind)> = breaches
            .iter()
            .map(|b| (b.entity_id.clone(), b.kind))
            .collect();
        self.cooldown.retain(|key| active.contains(key));

        for breach in breaches {
            if !self.cooldown.check((breach.entity_id.clone(), breach.kind), now) {
                debug!("{} {} breach still cooling down", breach.name, breach.kind.label());
                continue;
            }
            warn!(
                "{} ({}) {} at {:.1}% exceeds {:.0}%",
                breach.name,
                breach.entity_id,
                breach.kind.label(),
                breach.value,
                breach.limit
            );
            self.notifications.notify(
                format!(
                    "{} {} usage at {:.1}% (limit {:.0}%)",
                    breach.name,
                    breach.kind.label(),
                    breach.value,
                    breach.limit
                ),
                Severity::Warning,
            );
        }
    }

    /// Note a failed poll. The last accepted sample stays current.
    pub fn record_failure(&mut self, error: &SampleError) {
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Timestamp of the last accepted sample.
    pub fn last_updated(&self) -> Option<TimestampMs> {
        self.previous.as_ref().map(|s| s.timestamp_ms)
    }

    /// Services from the last accepted sample.
    pub fn services(&self) -> &[ServiceSnapshot] {
        self.previous
            .as_ref()
            .map_or(&[][..], |s| s.services.as_slice())
    }

    /// Host metrics from the last accepted sample.
    pub fn system(&self) -> Option<SystemMetrics> {
        self.previous.as_ref().map(|s| s.system)
    }

    pub fn uptime(&self, entity_id: &str, now: TimestampMs) -> UptimeSummary {
        self.ledger.summary(entity_id, now)
    }

    /// Summaries for current services in sample order, then for entities
    /// only present in the ledger.
    pub fn uptime_all(&self, now: TimestampMs) -> Vec<UptimeSummary> {
        let current: Vec<&str> = self.services().iter().map(|s| s.id.as_str()).collect();
        let mut summaries: Vec<UptimeSummary> =
            current.iter().map(|id| self.uptime(id, now)).collect();
        summaries.extend(
            self.ledger
                .entities()
                .filter(|id| !current.contains(id))
                .map(|id| self.uptime(id, now)),
        );
        summaries
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Chart points for one metric using the configured chart extent.
    pub fn points(&self, kind: MetricKind) -> Points<'_> {
        self.history.points(kind, self.chart)
    }

    pub fn ledger(&self) -> &EventLog {
        &self.ledger
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.notifications
    }

    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.notifications.active()
    }

    pub fn dismiss(&self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn overview(&self) -> Overview {
        Overview::from_services(self.services())
    }

    /// Move the monitor into a background task polling every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, poller: Poller, interval: Duration) -> MonitorHandle {
        let shared: SharedMonitor = Arc::new(RwLock::new(self));
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run(shared.clone(), poller.clone(), interval, stop_rx));

        MonitorHandle {
            shared,
            poller,
            stop: stop_tx,
            task: Some(task),
        }
    }
}

async fn run(
    shared: SharedMonitor,
    poller: Poller,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        "Polling {} every {}",
        poller.description(),
        format_duration(interval)
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    _ = cycle(&shared, &poller) => {}
                    _ = stop.changed() => break,
                }
            }
            _ = stop.changed() => break,
        }
    }
    debug!("Polling stopped");
}

/// One poll followed, on success, by exactly one apply.
async fn cycle(shared: &SharedMonitor, poller: &Poller) -> PollOutcome {
    let outcome = poller.poll().await;
    match &outcome {
        PollOutcome::Sampled(sample) => {
            shared.write().apply(sample.clone());
        }
        PollOutcome::Failed(e) => shared.write().record_failure(e),
        PollOutcome::Skipped => {}
    }
    outcome
}

/// Owner of a running monitor task. Dropping it stops polling.
#[derive(Debug)]
pub struct MonitorHandle {
    shared: SharedMonitor,
    poller: Poller,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Read access to the engine state.
    pub fn shared(&self) -> SharedMonitor {
        self.shared.clone()
    }

    /// Poll immediately, outside the regular cadence. Skipped if a poll is
    /// already running.
    pub async fn refresh_now(&self) -> PollOutcome {
        cycle(&self.shared, &self.poller).await
    }

    /// Stop polling and wait for the task to finish.
    pub async fn shutdown(mut self) -> SharedMonitor {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Monitor task ended abnormally: {}", e);
            }
        }
        self.shared.clone()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
