use chrono::{DateTime, Local};

/// Opaque handle for a toplevel window, as reported by the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

/// Opaque icon pixmap handle. The tracker never inspects the contents;
/// consumers fall back to their own default icon when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon(Vec<u8>);

impl Icon {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Window-system collaborator: supplies the focused window, its class
/// name and its icon. Implementations wrap X11/Wayland/compositor APIs.
pub trait WindowSystem {
    /// Currently focused toplevel window, if any.
    fn active_window(&self) -> Option<WindowId>;

    /// Class name of the given window. None or an empty string means
    /// the window carries no usable identity and must be ignored.
    fn window_class_name(&self, window: WindowId) -> Option<String>;

    /// Window icon scaled to the requested size.
    fn icon(&self, window: WindowId, width: u32, height: u32, crop: bool) -> Option<Icon>;
}

/// Session-state signals delivered by the screensaver / login manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ScreenLockChanged(bool),
    SleepPrepare(bool),
    ShutdownPrepare(bool),
}

/// Delay-type inhibition lease. Dropping the lease releases it.
pub trait InhibitLease {}

/// Power-management collaborator. `inhibit` is best-effort: None means
/// the lease could not be acquired and tracking continues without it.
pub trait PowerManager {
    fn inhibit(&mut self, what: &str, who: &str, why: &str) -> Option<Box<dyn InhibitLease>>;
}

/// Power manager that never grants a lease (headless / test setups).
pub struct NoopPowerManager;

impl PowerManager for NoopPowerManager {
    fn inhibit(&mut self, _what: &str, _who: &str, _why: &str) -> Option<Box<dyn InhibitLease>> {
        None
    }
}

/// Wall-clock source, injected so tests can control time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
