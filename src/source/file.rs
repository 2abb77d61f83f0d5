//! File-based sampler.
//!
//! Reads a JSON [`Sample`] from disk. Useful when another process (a cron
//! job, a sidecar) collects state and drops it in a file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::Mutex;

use homewatch_types::{current_timestamp_ms, Sample, ServiceSnapshot, SystemMetrics};

use super::{SampleError, Sampler};

/// A sampler that reads the current state from a JSON file.
///
/// The file describes the state *now*: every read is stamped with the time
/// of the read, whatever timestamp the file carries. The parsed content is
/// cached and only re-read when the file's modification time changes.
#[derive(Debug)]
pub struct FileSampler {
    path: PathBuf,
    description: String,
    cache: Mutex<Option<(SystemTime, Sample)>>,
}

impl FileSampler {
    /// Create a new file sampler for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            cache: Mutex::new(None),
        }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Sample, SampleError> {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .map_err(|e| SampleError::Read(format!("{}: {}", self.path.display(), e)))?;

        let cached = self
            .cache
            .lock()
            .as_ref()
            .filter(|(cached_at, _)| *cached_at == modified)
            .map(|(_, sample)| sample.clone());
        if let Some(sample) = cached {
            return Ok(sample);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SampleError::Read(format!("{}: {}", self.path.display(), e)))?;
        let sample: Sample = serde_json::from_str(&content)
            .map_err(|e| SampleError::Parse(format!("{}: {}", self.path.display(), e)))?;
        if !sample.version.is_compatible() {
            return Err(SampleError::Parse(format!(
                "{}: unsupported sample version {}",
                self.path.display(),
                sample.version
            )));
        }

        *self.cache.lock() = Some((modified, sample.clone()));
        Ok(sample)
    }
}

#[async_trait]
impl Sampler for FileSampler {
    async fn services(&self) -> Result<Vec<ServiceSnapshot>, SampleError> {
        Ok(self.read().await?.services)
    }

    async fn system(&self) -> Result<SystemMetrics, SampleError> {
        Ok(self.read().await?.system)
    }

    async fn sample(&self) -> Result<Sample, SampleError> {
        let mut sample = self.read().await?;
        sample.timestamp_ms = current_timestamp_ms();
        Ok(sample)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
