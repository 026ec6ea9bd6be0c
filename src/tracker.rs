use crate::domain::{ActivityEntry, Ledger};
use crate::persistence::StatsStore;
use crate::platform::{Clock, InhibitLease, PowerManager, SessionEvent, SystemClock, WindowId, WindowSystem};
use crate::ticker::{flush_interval, ICON_SIZE};
use crate::view::{ActivityRow, CurrentActivity, SharedObserver};
use chrono::{DateTime, Local};
use tracing::{debug, warn};

const INHIBIT_WHAT: &str = "shutdown:sleep";
const INHIBIT_WHO: &str = "timekeep";
const INHIBIT_WHY: &str = "Flushing activity statistics before suspend or shutdown";

/// Startup options for the tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerConfig {
    pub reset_on_suspend: bool,
    pub reset_on_shutdown: bool,
}

/// The activity-time accounting state machine. Owns the ledger and the
/// notion of the currently active activity; reacts to focus changes,
/// session events, periodic ticks and user commands. Single-threaded:
/// the host loop serializes all deliveries.
pub struct Tracker {
    ledger: Ledger,
    current: Option<String>,
    last_flush: DateTime<Local>,

    tracking_enabled: bool,
    screen_locked: bool,
    preparing_for_sleep: bool,
    preparing_for_shutdown: bool,
    reset_on_suspend: bool,
    reset_on_shutdown: bool,
    ignored: Vec<String>,

    /// Deadline of the next periodic flush; None while suspended.
    next_tick: Option<DateTime<Local>>,

    observers: Vec<SharedObserver>,
    lease: Option<Box<dyn InhibitLease>>,

    windows: Box<dyn WindowSystem>,
    store: Box<dyn StatsStore>,
    power: Box<dyn PowerManager>,
    clock: Box<dyn Clock>,
}

impl Tracker {
    pub fn new(
        windows: Box<dyn WindowSystem>,
        store: Box<dyn StatsStore>,
        power: Box<dyn PowerManager>,
        config: TrackerConfig,
    ) -> Self {
        Self::with_clock(windows, store, power, config, Box::new(SystemClock))
    }

    pub fn with_clock(
        windows: Box<dyn WindowSystem>,
        store: Box<dyn StatsStore>,
        power: Box<dyn PowerManager>,
        config: TrackerConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        let mut tracker = Self {
            ledger: Ledger::new(),
            current: None,
            last_flush: now,
            tracking_enabled: true,
            screen_locked: false,
            preparing_for_sleep: false,
            preparing_for_shutdown: false,
            reset_on_suspend: config.reset_on_suspend,
            reset_on_shutdown: config.reset_on_shutdown,
            ignored: Vec::new(),
            next_tick: None,
            observers: Vec::new(),
            lease: None,
            windows,
            store,
            power,
            clock,
        };

        tracker.load_persisted();
        tracker.acquire_lease();

        // Process the currently focused window
        tracker.refresh_active_window();
        tracker
    }

    /// Register a display observer. Existing rows are not replayed;
    /// consumers read `rows()` once after subscribing.
    pub fn add_observer(&mut self, observer: SharedObserver) {
        self.observers.push(observer);
    }

    // -------------------------------------------------------------- //
    //                         external signals                        //
    // -------------------------------------------------------------- //

    /// Focus-change signal from the window system.
    pub fn handle_focus_changed(&mut self, window: WindowId) {
        let class = match self.windows.window_class_name(window) {
            Some(name) if !name.is_empty() => name,
            // No usable window identity: treat as "no signal"
            _ => return,
        };

        debug!(activity = %class, "focus changed");

        // Credit the previous activity before rebasing
        self.flush();

        if !self.tracking_enabled || self.is_ignored(&class) {
            debug!(activity = %class, "activity is ignored");
            self.clear_current();
            return;
        }

        let (index, created) = self.ledger.find_or_create(&class);
        if created {
            if let Some(icon) = self.windows.icon(window, ICON_SIZE, ICON_SIZE, true) {
                if let Some(entry) = self.ledger.find_mut(&class) {
                    entry.set_icon(icon);
                }
            }
            self.notify_row_inserted(index);
        } else if self.ledger.get(index).map(|e| e.icon().is_none()) == Some(true) {
            // Refresh a missing icon so the consumer can drop its fallback
            if let Some(icon) = self.windows.icon(window, ICON_SIZE, ICON_SIZE, true) {
                if let Some(entry) = self.ledger.find_mut(&class) {
                    entry.set_icon(icon);
                }
                self.notify_row_updated(index);
            }
        }

        self.current = Some(class);
        self.last_flush = self.clock.now();
        self.update_timer();
        self.notify_current_changed();
    }

    /// Periodic flush. Accounts the true wall-clock delta since the
    /// previous flush, then re-arms the timer if tracking is active.
    pub fn handle_timer_tick(&mut self) {
        self.flush();
        self.notify_current_changed();
        self.update_timer();
    }

    /// Session-state signal: screen lock, sleep-prepare or
    /// shutdown-prepare.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ScreenLockChanged(locked) => {
                debug!(locked, "screen lock changed");
                self.screen_locked = locked;
                self.apply_tracking_state();
            }
            SessionEvent::SleepPrepare(entering) => {
                debug!(entering, "prepare for sleep");
                self.preparing_for_sleep = entering;
                self.apply_tracking_state();

                if entering && self.reset_on_suspend {
                    self.reset_statistics();
                }

                if entering {
                    self.lease = None;
                } else {
                    // Re-acquire so the next suspend is observed too
                    self.acquire_lease();
                }
            }
            SessionEvent::ShutdownPrepare(entering) => {
                debug!(entering, "prepare for shutdown");
                self.preparing_for_shutdown = entering;
                self.apply_tracking_state();

                if entering && self.reset_on_shutdown {
                    self.reset_statistics();
                    self.lease = None;
                }
                // No re-acquire on the way out; the process restarts
                // with a fresh lease after shutdown
            }
        }
    }

    // -------------------------------------------------------------- //
    //                          user commands                          //
    // -------------------------------------------------------------- //

    pub fn set_tracking_enabled(&mut self, enabled: bool) {
        self.tracking_enabled = enabled;
        self.apply_tracking_state();

        if let Err(e) = self.store.write_tracking_enabled(enabled) {
            warn!(error = %e, "failed to persist tracking-enabled flag");
        }
    }

    pub fn set_reset_on_suspend(&mut self, reset: bool) {
        self.reset_on_suspend = reset;
    }

    pub fn set_reset_on_shutdown(&mut self, reset: bool) {
        self.reset_on_shutdown = reset;
    }

    /// Exclude an activity from tracking: structural and permanent. The
    /// entry is removed from ledger and store, and no further time is
    /// credited to it.
    pub fn ignore_activity(&mut self, name: &str) {
        if self.is_ignored(name) {
            return;
        }
        self.ignored.push(name.to_string());

        if let Err(e) = self.store.write_ignored(&self.ignored) {
            warn!(error = %e, "failed to persist ignored activities");
        }

        if let Some(index) = self.ledger.remove(name) {
            self.notify_row_removed(index);
            if let Err(e) = self.store.delete_activity(name) {
                warn!(error = %e, activity = name, "failed to delete activity section");
            }
        }

        if self.current.as_deref() == Some(name) {
            // Drop the interval since the last flush on purpose
            self.clear_current();
        }
    }

    /// Put an ignored activity back under tracking.
    pub fn unignore_activity(&mut self, name: &str) {
        let before = self.ignored.len();
        self.ignored.retain(|n| n != name);
        if self.ignored.len() == before {
            return;
        }

        if let Err(e) = self.store.write_ignored(&self.ignored) {
            warn!(error = %e, "failed to persist ignored activities");
        }

        if self.should_track() {
            self.refresh_active_window();
        }
    }

    /// Remove every entry (rows and store sections) and, when tracking
    /// is enabled, start over from the current foreground window.
    pub fn reset_statistics(&mut self) {
        let names: Vec<String> = self.ledger.iter().map(|e| e.name().to_string()).collect();
        for name in names {
            if let Some(index) = self.ledger.remove(&name) {
                self.notify_row_removed(index);
            }
            if let Err(e) = self.store.delete_activity(&name) {
                warn!(error = %e, activity = %name, "failed to delete activity section");
            }
        }

        self.clear_current();

        // If tracking is disabled or suspended there is nothing to
        // start again
        if self.should_track() {
            self.refresh_active_window();
        }
    }

    /// Final flush for orderly teardown.
    pub fn finalize(&mut self) {
        self.flush();
        self.notify_current_changed();
    }

    // -------------------------------------------------------------- //
    //                            accessors                            //
    // -------------------------------------------------------------- //

    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }

    pub fn ignored_activities(&self) -> &[String] {
        &self.ignored
    }

    /// Deadline of the next periodic flush the host should deliver, or
    /// None while the timer is disarmed.
    pub fn timer_deadline(&self) -> Option<DateTime<Local>> {
        self.next_tick
    }

    /// Snapshot of the display rows in ledger order.
    pub fn rows(&self) -> Vec<ActivityRow> {
        (0..self.ledger.len())
            .filter_map(|index| self.row_at(index))
            .collect()
    }

    /// Computed current-activity properties for the panel header.
    pub fn current_activity(&self) -> CurrentActivity {
        match self.current.as_deref().and_then(|name| self.ledger.find(name)) {
            Some(entry) => CurrentActivity {
                icon: entry.icon().cloned(),
                name: Some(entry.name().to_string()),
                time: entry.time_formatted(),
            },
            None => CurrentActivity {
                icon: None,
                name: None,
                time: String::new(),
            },
        }
    }

    // -------------------------------------------------------------- //
    //                            internals                            //
    // -------------------------------------------------------------- //

    fn load_persisted(&mut self) {
        let state = match self.store.load() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to load persisted statistics, starting empty");
                return;
            }
        };

        self.tracking_enabled = state.tracking_enabled;
        self.ignored = state.ignored_activities;

        for (name, time) in state.activities {
            let index = self.ledger.restore(ActivityEntry::with_stored_time(name, &time));
            self.notify_row_inserted(index);
        }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|n| n == name)
    }

    /// Timer invariant: armed iff tracking is enabled, the screen is
    /// unlocked and no sleep or shutdown is pending.
    fn should_track(&self) -> bool {
        self.tracking_enabled
            && !self.screen_locked
            && !self.preparing_for_sleep
            && !self.preparing_for_shutdown
    }

    fn update_timer(&mut self) {
        if self.should_track() {
            self.next_tick = Some(self.clock.now() + flush_interval());
        } else {
            self.next_tick = None;
        }
    }

    /// Credit `now - last_flush` whole seconds to the current entry and
    /// rebase the reference timestamp. Clock retreat clamps to zero.
    fn flush(&mut self) {
        let now = self.clock.now();
        if let Some(name) = self.current.clone() {
            let elapsed = (now - self.last_flush).num_seconds().max(0);
            if let Some(index) = self.ledger.add_seconds(&name, elapsed) {
                self.notify_row_updated(index);

                let time = self.ledger.get(index).map(|e| e.time_formatted());
                if let Some(time) = time {
                    if let Err(e) = self.store.write_activity_time(&name, &time) {
                        warn!(error = %e, activity = %name, "failed to persist activity time");
                    }
                }
            }
        }
        self.last_flush = now;
    }

    /// Re-evaluate the suspension invariant after a flag change: resume
    /// from the foreground window, or flush, clear and stop the timer.
    fn apply_tracking_state(&mut self) {
        if self.should_track() {
            self.refresh_active_window();
        } else {
            // Add remaining seconds, then stop
            self.flush();
            self.clear_current();
        }
    }

    /// Start over from whatever window is focused right now.
    fn refresh_active_window(&mut self) {
        match self.windows.active_window() {
            Some(window) => self.handle_focus_changed(window),
            None => self.update_timer(),
        }
    }

    fn clear_current(&mut self) {
        self.current = None;
        self.last_flush = self.clock.now();
        self.update_timer();
        self.notify_current_changed();
    }

    fn acquire_lease(&mut self) {
        if self.lease.is_some() {
            return;
        }
        self.lease = self.power.inhibit(INHIBIT_WHAT, INHIBIT_WHO, INHIBIT_WHY);
        if self.lease.is_none() {
            debug!("inhibition lease unavailable");
        }
    }

    fn row_at(&self, index: usize) -> Option<ActivityRow> {
        let entry = self.ledger.get(index)?;
        Some(ActivityRow {
            icon: entry.icon().cloned(),
            name: entry.name().to_string(),
            time: entry.time_formatted(),
        })
    }

    fn notify_row_inserted(&self, index: usize) {
        if let Some(row) = self.row_at(index) {
            for observer in &self.observers {
                observer.borrow_mut().row_inserted(index, &row);
            }
        }
    }

    fn notify_row_removed(&self, index: usize) {
        for observer in &self.observers {
            observer.borrow_mut().row_removed(index);
        }
    }

    fn notify_row_updated(&self, index: usize) {
        if let Some(row) = self.row_at(index) {
            for observer in &self.observers {
                observer.borrow_mut().row_updated(index, &row);
            }
        }
    }

    fn notify_current_changed(&self) {
        let current = self.current_activity();
        for observer in &self.observers {
            observer.borrow_mut().current_changed(&current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::StoredState;
    use crate::platform::Icon;
    use crate::view::ModelObserver;
    use anyhow::Result;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    struct FakeClock {
        now: Rc<RefCell<DateTime<Local>>>,
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Local> {
            *self.now.borrow()
        }
    }

    #[derive(Default)]
    struct WindowScript {
        active: Option<WindowId>,
        classes: HashMap<u64, String>,
        icons: HashSet<u64>,
    }

    struct ScriptedWindows {
        script: Rc<RefCell<WindowScript>>,
    }

    impl WindowSystem for ScriptedWindows {
        fn active_window(&self) -> Option<WindowId> {
            self.script.borrow().active
        }

        fn window_class_name(&self, window: WindowId) -> Option<String> {
            self.script.borrow().classes.get(&window.0).cloned()
        }

        fn icon(&self, window: WindowId, _w: u32, _h: u32, _crop: bool) -> Option<Icon> {
            if self.script.borrow().icons.contains(&window.0) {
                Some(Icon::from_bytes(vec![window.0 as u8]))
            } else {
                None
            }
        }
    }

    struct MemoryStore {
        state: Rc<RefCell<StoredState>>,
    }

    impl StatsStore for MemoryStore {
        fn load(&self) -> Result<StoredState> {
            Ok(self.state.borrow().clone())
        }

        fn write_activity_time(&mut self, name: &str, time: &str) -> Result<()> {
            let mut state = self.state.borrow_mut();
            match state.activities.iter_mut().find(|(n, _)| n == name) {
                Some((_, t)) => *t = time.to_string(),
                None => state.activities.push((name.to_string(), time.to_string())),
            }
            Ok(())
        }

        fn delete_activity(&mut self, name: &str) -> Result<()> {
            self.state.borrow_mut().activities.retain(|(n, _)| n != name);
            Ok(())
        }

        fn write_tracking_enabled(&mut self, enabled: bool) -> Result<()> {
            self.state.borrow_mut().tracking_enabled = enabled;
            Ok(())
        }

        fn write_ignored(&mut self, ignored: &[String]) -> Result<()> {
            self.state.borrow_mut().ignored_activities = ignored.to_vec();
            Ok(())
        }
    }

    struct Lease;
    impl InhibitLease for Lease {}

    struct CountingPower {
        grants: Rc<Cell<usize>>,
    }

    impl PowerManager for CountingPower {
        fn inhibit(&mut self, _what: &str, _who: &str, _why: &str) -> Option<Box<dyn InhibitLease>> {
            self.grants.set(self.grants.get() + 1);
            Some(Box::new(Lease))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ModelObserver for Recorder {
        fn row_inserted(&mut self, index: usize, row: &ActivityRow) {
            self.events.push(format!("insert {} {}", index, row.name));
        }

        fn row_removed(&mut self, index: usize) {
            self.events.push(format!("remove {}", index));
        }

        fn row_updated(&mut self, index: usize, row: &ActivityRow) {
            self.events.push(format!("update {} {}={}", index, row.name, row.time));
        }

        fn current_changed(&mut self, current: &CurrentActivity) {
            self.events
                .push(format!("current {}", current.name.as_deref().unwrap_or("-")));
        }
    }

    struct Harness {
        now: Rc<RefCell<DateTime<Local>>>,
        script: Rc<RefCell<WindowScript>>,
        stored: Rc<RefCell<StoredState>>,
        grants: Rc<Cell<usize>>,
        tracker: Tracker,
    }

    impl Harness {
        fn advance(&self, secs: i64) {
            let mut now = self.now.borrow_mut();
            *now = *now + Duration::seconds(secs);
        }

        /// Point the fake window system at `id`/`class` and deliver the
        /// focus-change signal.
        fn focus(&mut self, id: u64, class: &str) {
            {
                let mut script = self.script.borrow_mut();
                script.classes.insert(id, class.to_string());
                script.active = Some(WindowId(id));
            }
            self.tracker.handle_focus_changed(WindowId(id));
        }

        fn times(&self) -> Vec<(String, String)> {
            self.tracker
                .rows()
                .into_iter()
                .map(|r| (r.name, r.time))
                .collect()
        }
    }

    fn harness() -> Harness {
        harness_with(TrackerConfig::default(), StoredState::default())
    }

    fn harness_with(config: TrackerConfig, stored: StoredState) -> Harness {
        let now = Rc::new(RefCell::new(Local::now()));
        let script = Rc::new(RefCell::new(WindowScript::default()));
        let stored = Rc::new(RefCell::new(stored));
        let grants = Rc::new(Cell::new(0));

        let tracker = Tracker::with_clock(
            Box::new(ScriptedWindows {
                script: Rc::clone(&script),
            }),
            Box::new(MemoryStore {
                state: Rc::clone(&stored),
            }),
            Box::new(CountingPower {
                grants: Rc::clone(&grants),
            }),
            config,
            Box::new(FakeClock {
                now: Rc::clone(&now),
            }),
        );

        Harness {
            now,
            script,
            stored,
            grants,
            tracker,
        }
    }

    #[test]
    fn test_accumulates_time_per_activity() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(125);
        h.focus(2, "konsole");
        h.advance(10);
        h.tracker.handle_timer_tick();

        assert_eq!(
            h.times(),
            vec![
                ("firefox".to_string(), "00:02:05".to_string()),
                ("konsole".to_string(), "00:00:10".to_string()),
            ]
        );
    }

    #[test]
    fn test_switching_back_within_one_tick_loses_nothing() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(10);
        h.focus(2, "konsole");
        h.advance(5);
        h.focus(1, "firefox");
        h.advance(7);
        h.tracker.handle_timer_tick();

        assert_eq!(
            h.times(),
            vec![
                ("firefox".to_string(), "00:00:17".to_string()),
                ("konsole".to_string(), "00:00:05".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_class_name_is_no_signal() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(10);

        // A window without a class name must not disturb accounting
        h.script.borrow_mut().active = Some(WindowId(99));
        h.tracker.handle_focus_changed(WindowId(99));

        h.advance(5);
        h.tracker.handle_timer_tick();

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:15".to_string())]);
        assert_eq!(h.tracker.current_activity().name.as_deref(), Some("firefox"));
    }

    #[test]
    fn test_ignored_activity_gets_no_entry() {
        let stored = StoredState {
            ignored_activities: vec!["krunner".to_string()],
            ..StoredState::default()
        };
        let mut h = harness_with(TrackerConfig::default(), stored);

        h.focus(1, "krunner");
        h.advance(30);
        h.tracker.handle_timer_tick();

        assert!(h.times().is_empty());
        assert_eq!(h.tracker.current_activity().name, None);
    }

    #[test]
    fn test_ignore_current_activity_removes_row_and_stops_crediting() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.ignore_activity("firefox");

        // The unflushed interval is dropped, not credited
        h.advance(20);
        h.tracker.handle_timer_tick();

        assert!(h.times().is_empty());
        assert_eq!(h.tracker.current_activity().name, None);
        assert!(h.stored.borrow().activities.is_empty());
        assert_eq!(
            h.stored.borrow().ignored_activities,
            vec!["firefox".to_string()]
        );
    }

    #[test]
    fn test_unignore_resumes_tracking() {
        let stored = StoredState {
            ignored_activities: vec!["firefox".to_string()],
            ..StoredState::default()
        };
        let mut h = harness_with(TrackerConfig::default(), stored);

        h.focus(1, "firefox");
        assert!(h.times().is_empty());

        h.tracker.unignore_activity("firefox");
        h.advance(10);
        h.tracker.handle_timer_tick();

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:10".to_string())]);
        assert!(h.stored.borrow().ignored_activities.is_empty());
    }

    #[test]
    fn test_disable_freezes_enable_resumes_without_backlog() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.set_tracking_enabled(false);

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:10".to_string())]);
        assert_eq!(h.tracker.timer_deadline(), None);
        assert!(!h.stored.borrow().tracking_enabled);

        // Time passing while disabled is never credited
        h.advance(500);
        h.tracker.set_tracking_enabled(true);
        h.advance(5);
        h.tracker.handle_timer_tick();

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:15".to_string())]);
    }

    #[test]
    fn test_reset_restarts_from_current_foreground_window() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.handle_timer_tick();

        h.tracker.reset_statistics();

        // Fresh zero-duration entry for the still-focused window; the
        // old section is gone from the store
        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:00".to_string())]);
        assert!(h.stored.borrow().activities.is_empty());

        h.tracker.handle_timer_tick();
        assert_eq!(
            h.stored.borrow().activities,
            vec![("firefox".to_string(), "00:00:00".to_string())]
        );
    }

    #[test]
    fn test_clock_retreat_is_clamped_to_zero() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(-30);
        h.tracker.handle_timer_tick();

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:00".to_string())]);

        // Accounting recovers once the clock moves forward again
        h.advance(10);
        h.tracker.handle_timer_tick();
        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:10".to_string())]);
    }

    #[test]
    fn test_screen_lock_suspends_and_unlock_resumes() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.handle_session_event(SessionEvent::ScreenLockChanged(true));

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:10".to_string())]);
        assert_eq!(h.tracker.timer_deadline(), None);
        assert_eq!(h.tracker.current_activity().name, None);

        h.advance(300);
        h.tracker.handle_session_event(SessionEvent::ScreenLockChanged(false));

        assert_eq!(h.tracker.current_activity().name.as_deref(), Some("firefox"));
        assert!(h.tracker.timer_deadline().is_some());

        h.advance(5);
        h.tracker.handle_timer_tick();
        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:15".to_string())]);
    }

    #[test]
    fn test_sleep_releases_lease_and_wake_reacquires() {
        let mut h = harness();
        assert_eq!(h.grants.get(), 1);

        h.tracker.handle_session_event(SessionEvent::SleepPrepare(true));
        h.tracker.handle_session_event(SessionEvent::SleepPrepare(false));

        assert_eq!(h.grants.get(), 2);
    }

    #[test]
    fn test_reset_on_suspend_clears_statistics() {
        let config = TrackerConfig {
            reset_on_suspend: true,
            ..TrackerConfig::default()
        };
        let mut h = harness_with(config, StoredState::default());

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.handle_session_event(SessionEvent::SleepPrepare(true));

        assert!(h.times().is_empty());
        assert!(h.stored.borrow().activities.is_empty());
        assert_eq!(h.tracker.timer_deadline(), None);
    }

    #[test]
    fn test_reset_on_shutdown_clears_statistics() {
        let config = TrackerConfig {
            reset_on_shutdown: true,
            ..TrackerConfig::default()
        };
        let mut h = harness_with(config, StoredState::default());

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.handle_session_event(SessionEvent::ShutdownPrepare(true));

        assert!(h.times().is_empty());
        assert!(h.stored.borrow().activities.is_empty());
    }

    #[test]
    fn test_restores_persisted_state() {
        let stored = StoredState {
            tracking_enabled: false,
            ignored_activities: vec!["krunner".to_string()],
            activities: vec![
                ("firefox".to_string(), "00:02:05".to_string()),
                ("konsole".to_string(), "00:00:10".to_string()),
            ],
        };
        let h = harness_with(TrackerConfig::default(), stored);

        assert!(!h.tracker.tracking_enabled());
        assert_eq!(h.tracker.ignored_activities(), ["krunner".to_string()]);
        assert_eq!(h.tracker.timer_deadline(), None);
        assert_eq!(
            h.times(),
            vec![
                ("firefox".to_string(), "00:02:05".to_string()),
                ("konsole".to_string(), "00:00:10".to_string()),
            ]
        );
    }

    #[test]
    fn test_timer_follows_suspension_invariant() {
        let mut h = harness();
        assert!(h.tracker.timer_deadline().is_some());

        h.tracker.handle_session_event(SessionEvent::ScreenLockChanged(true));
        assert_eq!(h.tracker.timer_deadline(), None);

        h.tracker.handle_session_event(SessionEvent::ScreenLockChanged(false));
        assert!(h.tracker.timer_deadline().is_some());
    }

    #[test]
    fn test_periodic_tick_uses_wall_clock_delta() {
        let mut h = harness();

        h.focus(1, "firefox");
        // A late tick must credit the true elapsed time, not the
        // nominal interval
        h.advance(95);
        h.tracker.handle_timer_tick();

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:01:35".to_string())]);
    }

    #[test]
    fn test_flush_persists_formatted_time() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(125);
        h.tracker.handle_timer_tick();

        assert_eq!(
            h.stored.borrow().activities,
            vec![("firefox".to_string(), "00:02:05".to_string())]
        );
    }

    #[test]
    fn test_icon_acquired_on_creation_and_refresh() {
        let mut h = harness();

        // First focus: no icon available yet
        h.focus(1, "firefox");
        assert!(h.tracker.rows()[0].icon.is_none());

        // Icon becomes available on a later focus of the same class
        h.script.borrow_mut().icons.insert(1);
        h.focus(2, "konsole");
        h.focus(1, "firefox");

        assert!(h.tracker.rows()[0].icon.is_some());
    }

    #[test]
    fn test_observer_sees_insert_update_remove() {
        let mut h = harness();
        let recorder: Rc<RefCell<Recorder>> = Rc::new(RefCell::new(Recorder::default()));
        h.tracker.add_observer(recorder.clone());

        h.focus(1, "firefox");
        h.advance(10);
        h.tracker.handle_timer_tick();
        h.tracker.ignore_activity("firefox");

        let events = recorder.borrow().events.clone();
        assert!(events.contains(&"insert 0 firefox".to_string()));
        assert!(events.contains(&"update 0 firefox=00:00:10".to_string()));
        assert!(events.contains(&"remove 0".to_string()));
        assert_eq!(events.last().unwrap(), "current -");
    }

    #[test]
    fn test_finalize_flushes_remaining_time() {
        let mut h = harness();

        h.focus(1, "firefox");
        h.advance(42);
        h.tracker.finalize();

        assert_eq!(h.times(), vec![("firefox".to_string(), "00:00:42".to_string())]);
        assert_eq!(
            h.stored.borrow().activities,
            vec![("firefox".to_string(), "00:00:42".to_string())]
        );
    }

    #[test]
    fn test_current_activity_properties() {
        let mut h = harness();
        assert_eq!(h.tracker.current_activity().name, None);
        assert_eq!(h.tracker.current_activity().time, "");

        h.focus(1, "firefox");
        h.advance(61);
        h.tracker.handle_timer_tick();

        let current = h.tracker.current_activity();
        assert_eq!(current.name.as_deref(), Some("firefox"));
        assert_eq!(current.time, "00:01:01");
    }
}
