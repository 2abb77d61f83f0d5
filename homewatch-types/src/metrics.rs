//! Host-wide resource metrics.

/// The kinds of host metric that are tracked over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MetricKind {
    Memory,
    Disk,
    Cpu,
}

impl MetricKind {
    /// Every metric kind, in display order.
    pub const ALL: [MetricKind; 3] = [MetricKind::Memory, MetricKind::Disk, MetricKind::Cpu];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
            MetricKind::Cpu => "cpu",
        }
    }
}

/// Host memory, disk and CPU usage, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SystemMetrics {
    #[cfg_attr(feature = "serde", serde(default))]
    pub memory_percent: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub disk_percent: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cpu_percent: f64,
}

impl SystemMetrics {
    pub fn new(memory_percent: f64, disk_percent: f64, cpu_percent: f64) -> Self {
        Self {
            memory_percent,
            disk_percent,
            cpu_percent,
        }
    }

    pub fn builder() -> SystemMetricsBuilder {
        SystemMetricsBuilder::default()
    }

    /// Value of a single metric kind.
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Memory => self.memory_percent,
            MetricKind::Disk => self.disk_percent,
            MetricKind::Cpu => self.cpu_percent,
        }
    }
}

/// Builder for [`SystemMetrics`].
#[derive(Debug, Default)]
pub struct SystemMetricsBuilder {
    metrics: SystemMetrics,
}

impl SystemMetricsBuilder {
    pub fn memory(mut self, percent: f64) -> Self {
        self.metrics.memory_percent = percent;
        self
    }

    pub fn disk(mut self, percent: f64) -> Self {
        self.metrics.disk_percent = percent;
        self
    }

    pub fn cpu(mut self, percent: f64) -> Self {
        self.metrics.cpu_percent = percent;
        self
    }

    pub fn build(self) -> SystemMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_kind() {
        let m = SystemMetrics::builder().memory(40.0).disk(70.0).cpu(5.0).build();
        assert_eq!(m.get(MetricKind::Memory), 40.0);
        assert_eq!(m.get(MetricKind::Disk), 70.0);
        assert_eq!(m.get(MetricKind::Cpu), 5.0);
    }

    #[test]
    fn test_all_kinds_are_distinct() {
        let labels: Vec<_> = MetricKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, vec!["memory", "disk", "cpu"]);
    }
}
