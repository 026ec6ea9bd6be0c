use super::files::{atomic_write, read_file, stats_file};
use super::store::{StatsStore, StoreError, StoredState};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stats file layout: a general section plus one section per activity,
/// kept as an array so display order survives a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StatsFile {
    #[serde(default)]
    general: GeneralSection,
    #[serde(default)]
    activities: Vec<ActivitySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeneralSection {
    #[serde(default = "default_tracking_enabled")]
    tracking_enabled: bool,
    #[serde(default)]
    ignored_activities: Vec<String>,
}

fn default_tracking_enabled() -> bool {
    true
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            ignored_activities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivitySection {
    name: String,
    time: String,
}

/// JSON-file stats store (stats.json in the data directory).
pub struct JsonStatsStore {
    path: PathBuf,
}

impl JsonStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at the default stats.json location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(stats_file()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> Result<StatsFile> {
        let content = read_file(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StatsFile::default());
        }
        let file = serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        Ok(file)
    }

    fn write(&self, file: &StatsFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)?;
        atomic_write(&self.path, &json)
    }
}

impl StatsStore for JsonStatsStore {
    fn load(&self) -> Result<StoredState> {
        let file = self.read()?;
        Ok(StoredState {
            tracking_enabled: file.general.tracking_enabled,
            ignored_activities: file.general.ignored_activities,
            activities: file
                .activities
                .into_iter()
                .map(|a| (a.name, a.time))
                .collect(),
        })
    }

    fn write_activity_time(&mut self, name: &str, time: &str) -> Result<()> {
        let mut file = self.read()?;
        match file.activities.iter_mut().find(|a| a.name == name) {
            Some(section) => section.time = time.to_string(),
            None => file.activities.push(ActivitySection {
                name: name.to_string(),
                time: time.to_string(),
            }),
        }
        self.write(&file)
    }

    fn delete_activity(&mut self, name: &str) -> Result<()> {
        let mut file = self.read()?;
        file.activities.retain(|a| a.name != name);
        self.write(&file)
    }

    fn write_tracking_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut file = self.read()?;
        file.general.tracking_enabled = enabled;
        self.write(&file)
    }

    fn write_ignored(&mut self, ignored: &[String]) -> Result<()> {
        let mut file = self.read()?;
        file.general.ignored_activities = ignored.to_vec();
        self.write(&file)
    }
}
