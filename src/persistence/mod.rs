pub mod files;
pub mod json_store;
pub mod store;

pub use files::{atomic_write, data_dir, ensure_data_dir, read_file, stats_file};
pub use json_store::JsonStatsStore;
pub use store::{StatsStore, StoreError, StoredState};
