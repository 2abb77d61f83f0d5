//! Live sampler for the local machine.
//!
//! Combines the docker collector, the host collector and any number of
//! website probes into one [`Sampler`]. Websites appear as services with a
//! `site:` id prefix.

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::debug;

use homewatch_adapters::docker::DockerCollector;
use homewatch_adapters::host::HostCollector;
use homewatch_adapters::website::WebsiteProbe;
use homewatch_types::{ServiceSnapshot, SystemMetrics};

use super::{SampleError, Sampler};

/// Samples containers, host metrics and websites.
///
/// A docker failure fails the whole service read: reporting every container
/// as gone would record false downtime. Website probes never fail.
#[derive(Debug)]
pub struct SystemSampler {
    docker: Option<DockerCollector>,
    host: HostCollector,
    websites: Vec<WebsiteProbe>,
    description: String,
}

impl SystemSampler {
    pub fn builder() -> SystemSamplerBuilder {
        SystemSamplerBuilder::default()
    }

    async fn probe_websites(&self) -> Vec<ServiceSnapshot> {
        let mut set = JoinSet::new();
        for (index, probe) in self.websites.iter().cloned().enumerate() {
            set.spawn(async move {
                let result = probe.check().await;
                debug!(
                    "Probe {} up={} status={:?} in {:?}",
                    probe.url(),
                    result.up,
                    result.status,
                    result.response_time
                );
                (index, probe.to_snapshot(&result))
            });
        }

        let mut results = Vec::with_capacity(self.websites.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => debug!("Website probe task failed: {}", e),
            }
        }
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, snapshot)| snapshot).collect()
    }
}

#[async_trait]
impl Sampler for SystemSampler {
    async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError> {
        let mut services = match &self.docker {
            Some(docker) => docker.collect().await?,
            None => Vec::new(),
        };
        services.extend(self.probe_websites().await);
        Ok(services)
    }

    async fn system(&self) -> Result<SystemMetrics, SampleError> {
        Ok(self.host.collect().await?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`SystemSampler`].
#[derive(Debug, Default)]
pub struct SystemSamplerBuilder {
    docker: Option<DockerCollector>,
    host: Option<HostCollector>,
    websites: Vec<WebsiteProbe>,
}

impl SystemSamplerBuilder {
    /// Include docker containers.
    pub fn docker(mut self, docker: DockerCollector) -> Self {
        self.docker = Some(docker);
        self
    }

    /// Override the host collector (default reads `/proc` and `/`).
    pub fn host(mut self, host: HostCollector) -> Self {
        self.host = Some(host);
        self
    }

    /// Add a website to probe on every sample.
    pub fn website(mut self, probe: WebsiteProbe) -> Self {
        self.websites.push(probe);
        self
    }

    pub fn build(self) -> SystemSampler {
        let mut parts = vec!["host".to_string()];
        if self.docker.is_some() {
            parts.push("docker".to_string());
        }
        if !self.websites.is_empty() {
            parts.push(format!("{} sites", self.websites.len()));
        }

        SystemSampler {
            docker: self.docker,
            host: self.host.unwrap_or_default(),
            websites: self.websites,
            description: format!("system: {}", parts.join(" + ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_description() {
        let sampler = SystemSampler::builder().build();
        assert_eq!(sampler.description(), "system: host");

        let probe = WebsiteProbe::builder()
            .name("blog")
            .url("https://example.com")
            .build()
            .unwrap();
        let sampler = SystemSampler::builder()
            .docker(DockerCollector::new())
            .website(probe)
            .build();
        assert_eq!(sampler.description(), "system: host + docker + 1 sites");
    }

    #[tokio::test]
    async fn test_websites_only_keep_order() {
        let probe = |name: &str, port: u16| {
            WebsiteProbe::builder()
                .name(name)
                .url(format!("http://127.0.0.1:{}", port))
                .timeout(Duration::from_millis(300))
                .build()
                .unwrap()
        };
        let sampler = SystemSampler::builder()
            .website(probe("a", 9))
            .website(probe("b", 9))
            .build();

        let services = sampler.services().await.unwrap();
        let ids: Vec<_> = services.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["site:a", "site:b"]);
        assert!(services.iter().all(|s| !s.is_running()));
    }

    #[tokio::test]
    async fn test_missing_docker_binary_fails() {
        let docker = DockerCollector::builder()
            .binary("/nonexistent/docker")
            .build();
        let sampler = SystemSampler::builder().docker(docker).build();
        assert!(matches!(
            sampler.services().await,
            Err(SampleError::Adapter(_))
        ));
    }

    #[tokio::test]
    async fn test_host_failure_fails_system() {
        let dir = tempfile::tempdir().unwrap();
        let sampler = SystemSampler::builder()
            .host(HostCollector::new().with_proc_root(dir.path()))
            .build();
        assert!(sampler.system().await.is_err());
    }
}
