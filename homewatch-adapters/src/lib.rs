//! # homewatch-adapters
//!
//! Collectors that read live state from the machine homewatch runs on and
//! convert it to homewatch types.
//!
//! ## Supported Sources
//!
//! - **Docker** (`docker` feature) - container run state, published ports, and
//!   CPU/memory usage via the `docker` CLI
//! - **Host** (`host` feature) - memory and CPU usage from `/proc`, disk usage
//!   from `df`
//! - **Websites** (`http` feature) - availability and response time of HTTP
//!   endpoints
//!
//! Collectors never block indefinitely: every external call is bounded by a
//! timeout and reports [`AdapterError::Timeout`] when it expires.
//!
//! ## Quick Start (Docker)
//!
//! ```rust,no_run
//! use homewatch_adapters::docker::DockerCollector;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let docker = DockerCollector::new();
//!     let services = docker.collect().await?;
//!
//!     for service in &services {
//!         println!("{} {}", service.name, service.status.label());
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(any(feature = "docker", feature = "host"))]
mod command;
pub mod error;

#[cfg(feature = "docker")]
pub mod docker;

#[cfg(feature = "host")]
pub mod host;

#[cfg(feature = "http")]
pub mod website;

pub use error::AdapterError;

// Re-export types for convenience
pub use homewatch_types::{RunStatus, ServiceSnapshot, SystemMetrics};

/// Parse a percentage such as `"12.34%"` or `" 7 "`.
#[cfg(any(feature = "docker", feature = "host"))]
pub(crate) fn parse_percent(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().trim_end_matches('%').trim().parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(all(test, any(feature = "docker", feature = "host")))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("12.5%"), Some(12.5));
        assert_eq!(parse_percent(" 7 "), Some(7.0));
        assert_eq!(parse_percent("--"), None);
        assert_eq!(parse_percent("NaN%"), None);
    }
}
