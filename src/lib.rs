pub mod domain;
pub mod persistence;
pub mod platform;
pub mod ticker;
pub mod tracker;
pub mod view;

pub use domain::{ActivityEntry, Ledger};
pub use platform::{
    Clock, Icon, InhibitLease, NoopPowerManager, PowerManager, SessionEvent, SystemClock, WindowId,
    WindowSystem,
};
pub use tracker::{Tracker, TrackerConfig};
pub use view::{ActivityRow, CurrentActivity, ModelObserver, SharedObserver};
