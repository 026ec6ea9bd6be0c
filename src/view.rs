use crate::platform::Icon;
use std::cell::RefCell;
use std::rc::Rc;

/// A single display row mirrored from the ledger: icon, name and the
/// accumulated time formatted as HH:MM:SS.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub icon: Option<Icon>,
    pub name: String,
    pub time: String,
}

/// Computed properties of the currently active activity. `name` is None
/// when no window is active or the active one is ignored; `time` is
/// empty in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentActivity {
    pub icon: Option<Icon>,
    pub name: Option<String>,
    pub time: String,
}

/// Listener interface for consumers that mirror the ledger as a display
/// list. All callbacks default to no-ops so observers implement only
/// what they need.
pub trait ModelObserver {
    /// A row was appended or inserted at `index`.
    fn row_inserted(&mut self, index: usize, row: &ActivityRow) {
        let _ = (index, row);
    }

    /// The row at `index` was removed.
    fn row_removed(&mut self, index: usize) {
        let _ = index;
    }

    /// The row at `index` changed in place (time or icon).
    fn row_updated(&mut self, index: usize, row: &ActivityRow) {
        let _ = (index, row);
    }

    /// The current activity (name, icon or time) may have changed.
    fn current_changed(&mut self, current: &CurrentActivity) {
        let _ = current;
    }
}

/// Shared observer handle registered on the tracker.
pub type SharedObserver = Rc<RefCell<dyn ModelObserver>>;
