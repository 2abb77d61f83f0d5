//! Status events recorded in the uptime ledger.

use crate::TimestampMs;

/// Availability of an entity at the moment an event was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Availability {
    Up,
    Down,
}

impl Availability {
    pub fn is_up(&self) -> bool {
        matches!(self, Availability::Up)
    }
}

impl From<crate::RunStatus> for Availability {
    fn from(status: crate::RunStatus) -> Self {
        if status.is_running() {
            Availability::Up
        } else {
            Availability::Down
        }
    }
}

/// One observation of an entity's availability.
///
/// The persisted form is `{"entityId": "...", "timestamp": 1700000000000, "status": "up"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StatusEvent {
    pub entity_id: String,
    pub timestamp: TimestampMs,
    pub status: Availability,
}

impl StatusEvent {
    pub fn new(entity_id: impl Into<String>, timestamp: TimestampMs, status: Availability) -> Self {
        Self {
            entity_id: entity_id.into(),
            timestamp,
            status,
        }
    }

    pub fn up(entity_id: impl Into<String>, timestamp: TimestampMs) -> Self {
        Self::new(entity_id, timestamp, Availability::Up)
    }

    pub fn down(entity_id: impl Into<String>, timestamp: TimestampMs) -> Self {
        Self::new(entity_id, timestamp, Availability::Down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunStatus;

    #[test]
    fn test_availability_from_run_status() {
        assert_eq!(Availability::from(RunStatus::Running), Availability::Up);
        assert_eq!(Availability::from(RunStatus::Stopped), Availability::Down);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_persisted_shape() {
        let event = StatusEvent::up("web", 1_700_000_000_000);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"entityId":"web","timestamp":1700000000000,"status":"up"}"#
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_rejects_unknown_status() {
        let json = r#"{"entityId":"web","timestamp":1,"status":"sideways"}"#;
        assert!(serde_json::from_str::<StatusEvent>(json).is_err());
    }
}
