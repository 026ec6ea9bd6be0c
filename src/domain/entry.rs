use crate::platform::Icon;

/// One tracked activity: a window class name plus the seconds spent
/// with a window of that class focused.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    name: String,
    seconds: i64,
    icon: Option<Icon>,
}

impl ActivityEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seconds: 0,
            icon: None,
        }
    }

    /// Restore an entry from its persisted HH:MM:SS string. Unparsable
    /// stored values restore as zero.
    pub fn with_stored_time(name: impl Into<String>, time: &str) -> Self {
        Self {
            name: name.into(),
            seconds: parse_hms(time).unwrap_or(0),
            icon: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }

    pub fn set_icon(&mut self, icon: Icon) {
        self.icon = Some(icon);
    }

    /// Add elapsed seconds. Negative input is clamped to zero so a
    /// clock anomaly can never shrink the total.
    pub fn add_seconds(&mut self, secs: i64) {
        self.seconds += secs.max(0);
    }

    /// Accumulated time formatted as HH:MM:SS.
    pub fn time_formatted(&self) -> String {
        format_hms(self.seconds)
    }
}

/// Format whole seconds as HH:MM:SS. Hours are not capped at two digits.
pub fn format_hms(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse an HH:MM:SS string back into whole seconds.
pub fn parse_hms(value: &str) -> Option<i64> {
    let mut parts = value.split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    let seconds: i64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}
