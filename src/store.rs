//! Persisted key/value preferences and uptime ledger persistence.
//!
//! The ledger is stored under [`UPTIME_KEY`] as a JSON list of
//! `{"entityId", "timestamp", "status"}` records. Anything that fails to
//! parse is discarded and the ledger starts empty.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

use homewatch_types::{StatusEvent, TimestampMs};

use crate::data::EventLog;

/// Preference key holding the persisted uptime ledger.
pub const UPTIME_KEY: &str = "service_uptime";

/// Text key/value store the engine persists through.
pub trait PreferenceStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Preferences kept in a single JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store backed by `path`. A missing file is an empty store; a
    /// malformed one is logged and replaced on the next write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring malformed preferences in {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) => {
                debug!("No preferences at {} ({}), starting empty", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&*values)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, content)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory preferences, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persist the ledger's in-window events.
pub fn save_ledger(store: &dyn PreferenceStore, log: &EventLog, now: TimestampMs) -> Result<()> {
    let records = log.to_records(now);
    let json = serde_json::to_string(&records)?;
    store.set(UPTIME_KEY, &json)?;
    debug!("Saved {} uptime records", records.len());
    Ok(())
}

/// Restore the ledger, keeping only events inside `window`.
///
/// Missing or malformed state yields an empty log.
pub fn load_ledger(store: &dyn PreferenceStore, window: Duration, now: TimestampMs) -> EventLog {
    let Some(json) = store.get(UPTIME_KEY) else {
        return EventLog::new(window);
    };

    match serde_json::from_str::<Vec<StatusEvent>>(&json) {
        Ok(records) => {
            let total = records.len();
            let log = EventLog::from_records(records, window, now);
            debug!("Loaded {} of {} uptime records", log.len(), total);
            log
        }
        Err(e) => {
            warn!("Discarding malformed uptime ledger: {}", e);
            EventLog::new(window)
        }
    }
}
