//! Per-service state as reported by a sampler.

/// Run state of a monitored service.
///
/// Anything other than `running` (exited, created, paused, dead, ...) is
/// reported as [`RunStatus::Stopped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RunStatus {
    Running,
    #[default]
    #[cfg_attr(feature = "serde", serde(other))]
    Stopped,
}

impl RunStatus {
    /// Map a raw state string (e.g. docker's `State` column) to a run status.
    pub fn from_state(state: &str) -> Self {
        if state.trim().eq_ignore_ascii_case("running") {
            RunStatus::Running
        } else {
            RunStatus::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RunStatus::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Stopped => "stopped",
        }
    }
}

/// A point-in-time read of one service.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ServiceSnapshot {
    /// Stable identifier (short container id, process name, site key).
    pub id: String,

    /// Human-readable name.
    pub name: String,

    pub status: RunStatus,

    /// CPU usage in percent. Zero for stopped services.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cpu_percent: f64,

    /// Memory usage in percent of the host or the container limit.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mem_percent: f64,

    /// Published ports, in the adapter's own notation (e.g. `0.0.0.0:80->80/tcp`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub ports: Vec<String>,
}

impl ServiceSnapshot {
    /// Create a stopped service with no resource usage.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn builder(id: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder::new(id)
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

/// Builder for [`ServiceSnapshot`].
///
/// The name defaults to the id when not set.
#[derive(Debug)]
pub struct ServiceBuilder {
    id: String,
    name: Option<String>,
    status: RunStatus,
    cpu_percent: f64,
    mem_percent: f64,
    ports: Vec<String>,
}

impl ServiceBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            status: RunStatus::Stopped,
            cpu_percent: 0.0,
            mem_percent: 0.0,
            ports: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn status(mut self, status: RunStatus) -> Self {
        self.status = status;
        self
    }

    pub fn running(self) -> Self {
        self.status(RunStatus::Running)
    }

    pub fn stopped(self) -> Self {
        self.status(RunStatus::Stopped)
    }

    pub fn cpu(mut self, percent: f64) -> Self {
        self.cpu_percent = percent;
        self
    }

    pub fn mem(mut self, percent: f64) -> Self {
        self.mem_percent = percent;
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.ports.push(port.into());
        self
    }

    pub fn build(self) -> ServiceSnapshot {
        let name = self.name.unwrap_or_else(|| self.id.clone());
        ServiceSnapshot {
            id: self.id,
            name,
            status: self.status,
            cpu_percent: self.cpu_percent,
            mem_percent: self.mem_percent,
            ports: self.ports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_from_state() {
        assert_eq!(RunStatus::from_state("running"), RunStatus::Running);
        assert_eq!(RunStatus::from_state(" Running\n"), RunStatus::Running);
        assert_eq!(RunStatus::from_state("exited"), RunStatus::Stopped);
        assert_eq!(RunStatus::from_state("paused"), RunStatus::Stopped);
        assert_eq!(RunStatus::from_state(""), RunStatus::Stopped);
    }

    #[test]
    fn test_builder_defaults_name_to_id() {
        let svc = ServiceSnapshot::builder("abc123").running().cpu(3.0).build();
        assert_eq!(svc.name, "abc123");
        assert!(svc.is_running());
        assert_eq!(svc.cpu_percent, 3.0);
        assert!(svc.ports.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_unknown_state_deserializes_as_stopped() {
        let json = r#"{"id":"a","name":"a","status":"exited"}"#;
        let svc: ServiceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(svc.status, RunStatus::Stopped);
        assert_eq!(svc.mem_percent, 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_camel_case_field_names() {
        let svc = ServiceSnapshot::builder("web").running().cpu(1.5).build();
        let value = serde_json::to_value(&svc).unwrap();
        assert_eq!(value["cpuPercent"], 1.5);
        assert_eq!(value["status"], "running");
    }
}
