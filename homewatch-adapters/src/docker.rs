//! Docker adapter using the `docker` CLI.
//!
//! Containers are listed with `docker ps -a`, then running containers are
//! enriched from a single one-shot `docker stats` read covering all of them.
//!
//! ## Collected Fields
//!
//! - **Id**: first 12 characters of the container id
//! - **Name / State / Ports**: straight from `docker ps`
//! - **CPU / memory**: `CPUPerc` and `MemPerc` from `docker stats`, matched
//!   by container id; a failed stats call leaves both at zero rather than
//!   failing the whole collection
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use homewatch_adapters::docker::DockerCollector;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let docker = DockerCollector::builder()
//!         .binary("/usr/bin/docker")
//!         .timeout(Duration::from_secs(3))
//!         .build();
//!
//!     let running = docker.collect().await?.into_iter().filter(|s| s.is_running()).count();
//!     println!("{} containers running", running);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use homewatch_types::{RunStatus, ServiceSnapshot};

use crate::{command, parse_percent, AdapterError};

/// Length docker uses for short container ids.
const SHORT_ID_LEN: usize = 12;

/// Collects container state through the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerCollector {
    binary: String,
    timeout: Duration,
}

impl DockerCollector {
    /// Create a collector using `docker` from `PATH` and a 5 second timeout.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DockerCollectorBuilder {
        DockerCollectorBuilder::default()
    }

    /// List all containers with their current resource usage.
    pub async fn collect(&self) -> Result<Vec<ServiceSnapshot>, AdapterError> {
        let listing = command::run(
            &self.binary,
            &["ps", "-a", "--format", "{{json .}}"],
            self.timeout,
        )
        .await?;

        let mut services = parse_ps_output(&listing);

        let running: Vec<&str> = services
            .iter()
            .filter(|s| s.is_running())
            .map(|s| s.id.as_str())
            .collect();
        if running.is_empty() {
            return Ok(services);
        }

        let mut args = vec!["stats", "--no-stream", "--format", "{{json .}}"];
        args.extend(running);
        let usage = match command::run(&self.binary, &args, self.timeout).await {
            Ok(output) => parse_stats_output(&output),
            Err(e) => {
                debug!("docker stats failed: {}", e);
                HashMap::new()
            }
        };

        for service in services.iter_mut().filter(|s| s.is_running()) {
            match usage.get(&service.id) {
                Some(&(cpu, mem)) => {
                    service.cpu_percent = cpu;
                    service.mem_percent = mem;
                }
                None => debug!("No docker stats for {}", service.id),
            }
        }

        Ok(services)
    }
}

impl Default for DockerCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for DockerCollector.
#[derive(Debug, Default)]
pub struct DockerCollectorBuilder {
    binary: Option<String>,
    timeout: Option<Duration>,
}

impl DockerCollectorBuilder {
    /// Set the docker executable (defaults to `docker`).
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Set the per-command timeout (defaults to 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> DockerCollector {
        DockerCollector {
            binary: self.binary.unwrap_or_else(|| "docker".to_string()),
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        }
    }
}

// ============================================================================
// Output parsing
// ============================================================================

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsLine {
    #[serde(rename = "ID")]
    id: String,
    names: String,
    state: String,
    #[serde(default)]
    ports: String,
}

/// One line of `docker stats --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct StatsLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "CPUPerc")]
    cpu_perc: Option<String>,
    #[serde(rename = "MemPerc")]
    mem_perc: Option<String>,
}

/// Parse newline-delimited `docker ps` JSON. Malformed lines are skipped.
pub fn parse_ps_output(output: &str) -> Vec<ServiceSnapshot> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<PsLine>(line) {
            Ok(ps) => Some(ps),
            Err(e) => {
                debug!("Skipping malformed docker ps line: {}", e);
                None
            }
        })
        .map(|ps| ServiceSnapshot {
            id: ps.id.chars().take(SHORT_ID_LEN).collect(),
            name: ps.names,
            status: RunStatus::from_state(&ps.state),
            cpu_percent: 0.0,
            mem_percent: 0.0,
            ports: ps
                .ports
                .split(", ")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        })
        .collect()
}

/// Parse newline-delimited `docker stats` JSON into
/// `short id -> (cpu_percent, mem_percent)`.
///
/// A missing or unparseable percentage reads as zero; lines that are not
/// JSON are skipped.
pub fn parse_stats_output(output: &str) -> HashMap<String, (f64, f64)> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<StatsLine>(line) {
            Ok(stats) => Some(stats),
            Err(e) => {
                debug!("Skipping malformed docker stats line: {}", e);
                None
            }
        })
        .map(|stats| {
            let cpu = stats.cpu_perc.as_deref().and_then(parse_percent).unwrap_or(0.0);
            let mem = stats.mem_perc.as_deref().and_then(parse_percent).unwrap_or(0.0);
            (stats.id.chars().take(SHORT_ID_LEN).collect(), (cpu, mem))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS_OUTPUT: &str = r#"{"Command":"\"nginx\"","ID":"3f4e5d6c7b8a9f0e1d2c","Image":"nginx:latest","Names":"web","Ports":"0.0.0.0:80->80/tcp, :::80->80/tcp","State":"running","Status":"Up 2 hours"}
{"Command":"\"postgres\"","ID":"0a1b2c3d4e5f","Image":"postgres:16","Names":"db","Ports":"","State":"exited","Status":"Exited (0) 3 minutes ago"}
not json at all
"#;

    #[test]
    fn test_parse_ps_output() {
        let services = parse_ps_output(PS_OUTPUT);
        assert_eq!(services.len(), 2);

        let web = &services[0];
        assert_eq!(web.id, "3f4e5d6c7b8a");
        assert_eq!(web.name, "web");
        assert_eq!(web.status, RunStatus::Running);
        assert_eq!(web.ports, vec!["0.0.0.0:80->80/tcp", ":::80->80/tcp"]);

        let db = &services[1];
        assert_eq!(db.status, RunStatus::Stopped);
        assert!(db.ports.is_empty());
    }

    #[test]
    fn test_parse_ps_output_empty() {
        assert!(parse_ps_output("").is_empty());
        assert!(parse_ps_output("\n\n").is_empty());
    }

    #[test]
    fn test_parse_stats_output_keys_by_short_id() {
        let output = r#"{"BlockIO":"0B / 0B","CPUPerc":"12.34%","ID":"3f4e5d6c7b8a","MemPerc":"5.67%","Name":"web"}
{"CPUPerc":"0.50%","ID":"9a8b7c6d5e4f3a2b1c0d","MemPerc":"1.00%","Name":"cache"}
"#;
        let usage = parse_stats_output(output);
        assert_eq!(usage.len(), 2);
        assert_eq!(usage["3f4e5d6c7b8a"], (12.34, 5.67));
        assert_eq!(usage["9a8b7c6d5e4f"], (0.5, 1.0));
    }

    #[test]
    fn test_parse_stats_output_missing_columns() {
        let usage = parse_stats_output("{\"ID\":\"0a1b2c3d4e5f\",\"CPUPerc\":\"--\"}\ngarbage\n");
        assert_eq!(usage.len(), 1);
        assert_eq!(usage["0a1b2c3d4e5f"], (0.0, 0.0));
        assert!(parse_stats_output("").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collect_reads_stats_once_for_all_containers() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls");
        let script = dir.path().join("docker");
        std::fs::write(
            &script,
            format!(
                r#"#!/bin/sh
echo "$1" >> {calls}
case "$1" in
  ps)
    echo '{{"ID":"aaaaaaaaaaaa1111","Names":"web","State":"running","Ports":""}}'
    echo '{{"ID":"bbbbbbbbbbbb2222","Names":"api","State":"running","Ports":""}}'
    echo '{{"ID":"cccccccccccc3333","Names":"db","State":"exited","Ports":""}}'
    ;;
  stats)
    echo '{{"ID":"aaaaaaaaaaaa","CPUPerc":"10.00%","MemPerc":"2.00%"}}'
    echo '{{"ID":"bbbbbbbbbbbb","CPUPerc":"20.00%","MemPerc":"4.00%"}}'
    ;;
esac
"#,
                calls = calls.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let collector = DockerCollector::builder()
            .binary(script.to_string_lossy())
            .build();
        let services = collector.collect().await.unwrap();

        assert_eq!(services.len(), 3);
        assert_eq!((services[0].cpu_percent, services[0].mem_percent), (10.0, 2.0));
        assert_eq!((services[1].cpu_percent, services[1].mem_percent), (20.0, 4.0));
        assert_eq!(services[2].cpu_percent, 0.0);

        let calls = std::fs::read_to_string(&calls).unwrap();
        assert_eq!(calls.lines().collect::<Vec<_>>(), vec!["ps", "stats"]);
    }

    #[test]
    fn test_builder_defaults() {
        let collector = DockerCollector::new();
        assert_eq!(collector.binary, "docker");
        assert_eq!(collector.timeout, Duration::from_secs(5));
    }
}
