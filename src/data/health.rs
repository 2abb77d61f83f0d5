//! Health grading and resource thresholds.

use serde::Deserialize;

/// Thresholds for resource alerts on running services.
///
/// A service breaches a threshold when its usage is strictly greater than
/// the limit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// CPU percentage above which a running service raises an alert.
    pub cpu_percent: f64,
    /// Memory percentage above which a running service raises an alert.
    pub memory_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 80.0,
        }
    }
}

impl Thresholds {
    pub fn cpu_breached(&self, cpu_percent: f64) -> bool {
        cpu_percent > self.cpu_percent
    }

    pub fn memory_breached(&self, mem_percent: f64) -> bool {
        mem_percent > self.memory_percent
    }
}

/// Health grade for an uptime percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Uptime of 99.5% or better is healthy, 95% or better a warning.
    pub fn from_uptime(percent: f64) -> Self {
        if percent >= 99.5 {
            HealthStatus::Healthy
        } else if percent >= 95.0 {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_strict() {
        let t = Thresholds::default();
        assert!(!t.cpu_breached(80.0));
        assert!(t.cpu_breached(80.1));
        assert!(!t.memory_breached(79.9));
        assert!(t.memory_breached(95.0));
    }

    #[test]
    fn test_health_from_uptime() {
        assert_eq!(HealthStatus::from_uptime(100.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_uptime(99.5), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_uptime(99.4), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_uptime(95.0), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_uptime(94.99), HealthStatus::Critical);
        assert_eq!(HealthStatus::from_uptime(0.0), HealthStatus::Critical);
    }

    #[test]
    fn test_health_symbol() {
        assert_eq!(HealthStatus::from_uptime(99.9).symbol(), "OK");
        assert_eq!(HealthStatus::from_uptime(97.0).symbol(), "WARN");
        assert_eq!(HealthStatus::from_uptime(50.0).symbol(), "CRIT");
    }

    #[test]
    fn test_health_ordering() {
        assert!(HealthStatus::Critical > HealthStatus::Warning);
        assert!(HealthStatus::Warning > HealthStatus::Healthy);
    }

    #[test]
    fn test_thresholds_deserialize_partial() {
        let t: Thresholds = serde_json::from_str(r#"{"cpu_percent": 90}"#).unwrap();
        assert_eq!(t.cpu_percent, 90.0);
        assert_eq!(t.memory_percent, 80.0);
    }
}
