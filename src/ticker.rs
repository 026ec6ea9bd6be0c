use chrono::Duration;

/// Periodic flush interval in seconds
pub const FLUSH_INTERVAL_SECS: i64 = 60;

/// Icon edge length requested from the window system
pub const ICON_SIZE: u32 = 64;

/// Get the periodic flush interval
pub fn flush_interval() -> Duration {
    Duration::seconds(FLUSH_INTERVAL_SECS)
}
