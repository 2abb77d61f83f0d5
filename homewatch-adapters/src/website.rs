//! Website availability probes over HTTP.
//!
//! A probe issues a `HEAD` request and falls back to `GET` when `HEAD` itself
//! fails (some servers reject it). A site counts as **up** when a response
//! arrives with a status below 500; redirects are followed. Connection
//! errors, timeouts and 5xx responses count as **down**.
//!
//! Probed sites become ordinary [`ServiceSnapshot`]s (`running` when up) so
//! they share the uptime ledger with containers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use homewatch_adapters::website::WebsiteProbe;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let probe = WebsiteProbe::builder()
//!         .name("blog")
//!         .url("https://example.com")
//!         .build()?;
//!
//!     let result = probe.check().await;
//!     println!("{} up={} in {:?}", probe.name(), result.up, result.response_time);
//!     Ok(())
//! }
//! ```

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::debug;

use homewatch_types::{RunStatus, ServiceSnapshot};

use crate::AdapterError;

/// Prefix applied to website ids so they never collide with container ids.
pub const SITE_ID_PREFIX: &str = "site:";

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub up: bool,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    pub response_time: Duration,
}

/// Probes one website.
#[derive(Debug, Clone)]
pub struct WebsiteProbe {
    client: Client,
    name: String,
    url: String,
}

impl WebsiteProbe {
    pub fn builder() -> WebsiteProbeBuilder {
        WebsiteProbeBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Entity id used in the uptime ledger.
    pub fn id(&self) -> String {
        format!("{}{}", SITE_ID_PREFIX, self.name)
    }

    /// Probe the site. Never fails: any error is reported as down.
    pub async fn check(&self) -> ProbeResult {
        let start = Instant::now();

        let response = match self.client.head(&self.url).send().await {
            Ok(response) => Ok(response),
            Err(e) => {
                debug!("HEAD {} failed ({}), retrying with GET", self.url, e);
                self.client.get(&self.url).send().await
            }
        };

        let response_time = start.elapsed();
        match response {
            Ok(response) => {
                let status = response.status();
                ProbeResult {
                    up: is_up(status),
                    status: Some(status.as_u16()),
                    response_time,
                }
            }
            Err(e) => {
                debug!("Probe of {} failed: {}", self.url, AdapterError::from(e));
                ProbeResult {
                    up: false,
                    status: None,
                    response_time,
                }
            }
        }
    }

    /// Convert a probe result into a service snapshot.
    pub fn to_snapshot(&self, result: &ProbeResult) -> ServiceSnapshot {
        ServiceSnapshot {
            id: self.id(),
            name: self.name.clone(),
            status: if result.up {
                RunStatus::Running
            } else {
                RunStatus::Stopped
            },
            cpu_percent: 0.0,
            mem_percent: 0.0,
            ports: Vec::new(),
        }
    }
}

fn is_up(status: StatusCode) -> bool {
    !status.is_server_error()
}

/// Builder for WebsiteProbe.
#[derive(Debug, Default)]
pub struct WebsiteProbeBuilder {
    name: Option<String>,
    url: Option<String>,
    timeout: Option<Duration>,
}

impl WebsiteProbeBuilder {
    /// Display name; also forms the entity id (`site:<name>`).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the request timeout (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the probe. The name defaults to the URL.
    pub fn build(self) -> Result<WebsiteProbe, AdapterError> {
        let url = self
            .url
            .ok_or_else(|| AdapterError::Parse("website probe needs a url".to_string()))?;
        reqwest::Url::parse(&url).map_err(|e| AdapterError::Parse(format!("{}: {}", url, e)))?;

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(5)))
            .build()?;

        Ok(WebsiteProbe {
            client,
            name: self.name.unwrap_or_else(|| url.clone()),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_valid_url() {
        assert!(WebsiteProbe::builder().name("x").build().is_err());
        assert!(WebsiteProbe::builder().url("not a url").build().is_err());
    }

    #[test]
    fn test_name_defaults_to_url() {
        let probe = WebsiteProbe::builder()
            .url("http://localhost:8080/health")
            .build()
            .unwrap();
        assert_eq!(probe.name(), "http://localhost:8080/health");
    }

    #[test]
    fn test_status_classification() {
        assert!(is_up(StatusCode::OK));
        assert!(is_up(StatusCode::NOT_FOUND));
        assert!(is_up(StatusCode::UNAUTHORIZED));
        assert!(!is_up(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_up(StatusCode::BAD_GATEWAY));
    }

    #[test]
    fn test_to_snapshot() {
        let probe = WebsiteProbe::builder()
            .name("blog")
            .url("https://example.com")
            .build()
            .unwrap();

        let up = ProbeResult {
            up: true,
            status: Some(200),
            response_time: Duration::from_millis(40),
        };
        let snapshot = probe.to_snapshot(&up);
        assert_eq!(snapshot.id, "site:blog");
        assert_eq!(snapshot.status, RunStatus::Running);

        let down = ProbeResult {
            up: false,
            status: None,
            response_time: Duration::from_secs(5),
        };
        assert_eq!(probe.to_snapshot(&down).status, RunStatus::Stopped);
    }

    #[tokio::test]
    async fn test_unreachable_site_is_down() {
        let probe = WebsiteProbe::builder()
            .name("nothing")
            .url("http://127.0.0.1:9")
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();

        let result = probe.check().await;
        assert!(!result.up);
        assert_eq!(result.status, None);
    }
}
