use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;

/// Typed failures of the on-disk stats store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stats file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot of everything the store persists for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredState {
    pub tracking_enabled: bool,
    pub ignored_activities: Vec<String>,
    /// (activity name, HH:MM:SS) pairs in display order.
    pub activities: Vec<(String, String)>,
}

impl Default for StoredState {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            ignored_activities: Vec::new(),
            activities: Vec::new(),
        }
    }
}

/// Persistence collaborator. Every write is best-effort from the
/// tracker's point of view: errors are logged and tracking continues.
pub trait StatsStore {
    /// Read the whole persisted state. A missing backing file yields
    /// the default state.
    fn load(&self) -> Result<StoredState>;

    /// Write the formatted accumulated time for one activity.
    fn write_activity_time(&mut self, name: &str, time: &str) -> Result<()>;

    /// Delete the section for one activity (ignore/reset paths).
    fn delete_activity(&mut self, name: &str) -> Result<()>;

    /// Persist the tracking-enabled flag in the general section.
    fn write_tracking_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Persist the ignored-activities list in the general section.
    fn write_ignored(&mut self, ignored: &[String]) -> Result<()>;
}
