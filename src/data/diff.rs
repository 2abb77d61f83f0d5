//! Snapshot comparison.
//!
//! [`diff`] compares the services of a freshly accepted sample against the
//! previously accepted one and classifies what changed:
//!
//! - **Transitions**: a service started (it is running and was absent or not
//!   running before) or stopped (it was running and now is not, or vanished).
//! - **Threshold breaches**: a running service uses more CPU or memory than
//!   the configured [`Thresholds`]. Breaches are independent of transitions.
//! - **Ticks**: one availability observation per service for the uptime
//!   ledger (`up` when running, `down` otherwise).
//!
//! The differ is pure: it never looks at the clock and never mutates its
//! inputs.

use std::collections::{HashMap, HashSet};

use homewatch_types::{Availability, ServiceSnapshot};

use super::health::Thresholds;

/// Direction of a run-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Started,
    Stopped,
}

/// A classified change in a service's run status between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub entity_id: String,
    pub name: String,
    pub kind: TransitionKind,
}

/// Resource a breach was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreachKind {
    Cpu,
    Memory,
}

impl BreachKind {
    pub fn label(&self) -> &'static str {
        match self {
            BreachKind::Cpu => "CPU",
            BreachKind::Memory => "memory",
        }
    }
}

/// A running service above a resource threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBreach {
    pub entity_id: String,
    pub name: String,
    pub kind: BreachKind,
    pub value: f64,
    pub limit: f64,
}

/// An availability observation destined for the uptime ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTick {
    pub entity_id: String,
    pub status: Availability,
}

/// Everything [`diff`] found between two snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    pub transitions: Vec<Transition>,
    pub breaches: Vec<ThresholdBreach>,
    pub ticks: Vec<StatusTick>,
}

impl SnapshotDiff {
    /// True when nothing changed and nothing is over a threshold.
    pub fn is_quiet(&self) -> bool {
        self.transitions.is_empty() && self.breaches.is_empty()
    }
}

/// Compare `current` against `previous`.
///
/// Results follow the order of `current`; services that disappeared come
/// last, in the order they had in `previous`.
pub fn diff(
    previous: &[ServiceSnapshot],
    current: &[ServiceSnapshot],
    thresholds: &Thresholds,
) -> SnapshotDiff {
    let before: HashMap<&str, &ServiceSnapshot> =
        previous.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut out = SnapshotDiff::default();

    for service in current {
        let was_running = before.get(service.id.as_str()).map(|s| s.is_running());

        match (was_running, service.is_running()) {
            (None | Some(false), true) => out.transitions.push(Transition {
                entity_id: service.id.clone(),
                name: service.name.clone(),
                kind: TransitionKind::Started,
            }),
            (Some(true), false) => out.transitions.push(Transition {
                entity_id: service.id.clone(),
                name: service.name.clone(),
                kind: TransitionKind::Stopped,
            }),
            _ => {}
        }

        if service.is_running() {
            check_thresholds(service, thresholds, &mut out.breaches);
        }

        out.ticks.push(StatusTick {
            entity_id: service.id.clone(),
            status: service.status.into(),
        });
    }

    let still_present: HashSet<&str> = current.iter().map(|s| s.id.as_str()).collect();
    for gone in previous
        .iter()
        .filter(|s| s.is_running() && !still_present.contains(s.id.as_str()))
    {
        out.transitions.push(Transition {
            entity_id: gone.id.clone(),
            name: gone.name.clone(),
            kind: TransitionKind::Stopped,
        });
        out.ticks.push(StatusTick {
            entity_id: gone.id.clone(),
            status: Availability::Down,
        });
    }

    out
}

fn check_thresholds(
    service: &ServiceSnapshot,
    thresholds: &Thresholds,
    breaches: &mut Vec<ThresholdBreach>,
) {
    if thresholds.cpu_breached(service.cpu_percent) {
        breaches.push(ThresholdBreach {
            entity_id: service.id.clone(),
            name: service.name.clone(),
            kind: BreachKind::Cpu,
            value: service.cpu_percent,
            limit: thresholds.cpu_percent,
        });
    }
    if thresholds.memory_breached(service.mem_percent) {
        breaches.push(ThresholdBreach {
            entity_id: service.id.clone(),
            name: service.name.clone(),
            kind: BreachKind::Memory,
            value: service.mem_percent,
            limit: thresholds.memory_percent,
        });
    }
}
