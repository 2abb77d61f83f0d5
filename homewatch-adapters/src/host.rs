//! Host adapter reading `/proc` and `df`.
//!
//! - **CPU**: `(user + system) * 100 / (user + system + idle)` from the
//!   aggregate `cpu` line of `/proc/stat`. An unreadable `/proc/stat` reads
//!   as 0% instead of failing the collection.
//! - **Memory**: `(MemTotal - MemAvailable) / MemTotal` from `/proc/meminfo`
//! - **Disk**: the `Use%` column of `df -P <mount>`

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use homewatch_types::SystemMetrics;

use crate::{command, parse_percent, AdapterError};

/// Collects host-wide memory, disk and CPU usage.
#[derive(Debug, Clone)]
pub struct HostCollector {
    proc_root: PathBuf,
    mount: String,
    timeout: Duration,
}

impl HostCollector {
    /// Collector for `/proc` and the root filesystem.
    pub fn new() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            mount: "/".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Read procfs files from another root (containers mounting the host's /proc elsewhere).
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    /// Report disk usage for a different mount point.
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub async fn collect(&self) -> Result<SystemMetrics, AdapterError> {
        let cpu_percent = match self.read_proc("stat").await {
            Ok(stat) => parse_cpu_percent(&stat).unwrap_or(0.0),
            Err(e) => {
                debug!("CPU usage unavailable: {}", e);
                0.0
            }
        };

        let meminfo = self.read_proc("meminfo").await?;
        let memory_percent = parse_meminfo_percent(&meminfo)
            .ok_or_else(|| AdapterError::Parse("meminfo lacks MemTotal/MemAvailable".into()))?;

        let df = command::run("df", &["-P", self.mount.as_str()], self.timeout).await?;
        let disk_percent = parse_df_percent(&df)
            .ok_or_else(|| AdapterError::Parse(format!("unexpected df output: {}", df.trim())))?;

        Ok(SystemMetrics {
            memory_percent,
            disk_percent,
            cpu_percent,
        })
    }

    async fn read_proc(&self, name: &str) -> Result<String, AdapterError> {
        let path = self.proc_root.join(name);
        match tokio::time::timeout(self.timeout, tokio::fs::read_to_string(&path)).await {
            Err(_) => Err(AdapterError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(AdapterError::Unavailable(format!("{}: {}", path.display(), e))),
            Ok(Ok(content)) => Ok(content),
        }
    }
}

impl Default for HostCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// CPU busy percentage from the aggregate `cpu` line of `/proc/stat`.
pub fn parse_cpu_percent(stat: &str) -> Option<f64> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<f64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().ok())
        .collect::<Option<Vec<_>>>()?;

    let user = *fields.first()?;
    let system = *fields.get(2)?;
    let idle = *fields.get(3)?;

    let total = user + system + idle;
    if total <= 0.0 {
        return Some(0.0);
    }
    Some((user + system) * 100.0 / total)
}

/// Used memory percentage from `/proc/meminfo`.
pub fn parse_meminfo_percent(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<f64> {
        meminfo
            .lines()
            .find_map(|l| l.strip_prefix(name)?.strip_prefix(':'))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|v| v.parse().ok())
    };

    let total = field("MemTotal")?;
    let available = field("MemAvailable")?;
    if total <= 0.0 {
        return None;
    }
    Some(((total - available) / total * 100.0).clamp(0.0, 100.0))
}

/// The `Use%` column of the first data row of `df -P`.
pub fn parse_df_percent(df: &str) -> Option<f64> {
    let row = df.lines().skip(1).find(|l| !l.trim().is_empty())?;
    parse_percent(row.split_whitespace().nth(4)?)
}
