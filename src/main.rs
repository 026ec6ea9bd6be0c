use anyhow::Result;
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::io::BufRead;
use std::rc::Rc;
use timekeep::persistence::{JsonStatsStore, StatsStore};
use timekeep::platform::{Icon, NoopPowerManager, SessionEvent, WindowId, WindowSystem};
use timekeep::tracker::{Tracker, TrackerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timekeep")]
#[command(about = "Tracks wall-clock time spent per foreground application window", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the recorded activity table
    Show,
    /// Run the tracker, reading focus/session events from stdin
    ///
    /// Each line is a window class name. Directives: :lock :unlock
    /// :sleep :wake :shutdown :tick :quit
    Track {
        /// Reset statistics when the system prepares for sleep
        #[arg(long)]
        reset_on_suspend: bool,
        /// Reset statistics when the system prepares for shutdown
        #[arg(long)]
        reset_on_shutdown: bool,
    },
    /// Remove all recorded statistics
    Reset,
    /// Stop tracking an activity and delete its statistics
    Ignore { name: String },
    /// Start tracking a previously ignored activity again
    Unignore { name: String },
    /// Enable time tracking
    Enable,
    /// Disable time tracking
    Disable,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Show) => show(),
        Some(Commands::Track {
            reset_on_suspend,
            reset_on_shutdown,
        }) => track(TrackerConfig {
            reset_on_suspend,
            reset_on_shutdown,
        }),
        Some(Commands::Reset) => reset(),
        Some(Commands::Ignore { name }) => ignore(&name),
        Some(Commands::Unignore { name }) => unignore(&name),
        Some(Commands::Enable) => set_enabled(true),
        Some(Commands::Disable) => set_enabled(false),
    }
}

fn show() -> Result<()> {
    let store = JsonStatsStore::open_default()?;
    let state = store.load()?;

    if state.activities.is_empty() {
        println!("No activity recorded yet.");
    } else {
        for (name, time) in &state.activities {
            println!("{:>9}  {}", time, name);
        }
    }

    println!();
    println!(
        "Tracking: {}",
        if state.tracking_enabled { "enabled" } else { "disabled" }
    );
    if !state.ignored_activities.is_empty() {
        println!("Ignored: {}", state.ignored_activities.join(", "));
    }
    Ok(())
}

fn reset() -> Result<()> {
    let mut store = JsonStatsStore::open_default()?;
    let state = store.load()?;
    for (name, _) in &state.activities {
        store.delete_activity(name)?;
    }
    println!("Statistics reset.");
    Ok(())
}

fn ignore(name: &str) -> Result<()> {
    let mut store = JsonStatsStore::open_default()?;
    let mut ignored = store.load()?.ignored_activities;
    if ignored.iter().any(|n| n == name) {
        println!("Already ignored: {}", name);
        return Ok(());
    }
    ignored.push(name.to_string());
    store.write_ignored(&ignored)?;
    store.delete_activity(name)?;
    println!("Ignoring: {}", name);
    Ok(())
}

fn unignore(name: &str) -> Result<()> {
    let mut store = JsonStatsStore::open_default()?;
    let mut ignored = store.load()?.ignored_activities;
    let before = ignored.len();
    ignored.retain(|n| n != name);
    if ignored.len() == before {
        println!("Not ignored: {}", name);
        return Ok(());
    }
    store.write_ignored(&ignored)?;
    println!("Tracking again: {}", name);
    Ok(())
}

fn set_enabled(enabled: bool) -> Result<()> {
    let mut store = JsonStatsStore::open_default()?;
    store.write_tracking_enabled(enabled)?;
    println!("Tracking {}.", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

/// Window system fed by stdin lines: each distinct class name gets a
/// window id, and the most recent line is the focused window.
#[derive(Default)]
struct FeedState {
    active: Option<WindowId>,
    classes: Vec<String>,
}

impl FeedState {
    /// Assign (or reuse) a window id for a class name and focus it.
    fn focus(&mut self, class: &str) -> WindowId {
        let id = match self.classes.iter().position(|c| c == class) {
            Some(index) => index as u64,
            None => {
                self.classes.push(class.to_string());
                (self.classes.len() - 1) as u64
            }
        };
        self.active = Some(WindowId(id));
        WindowId(id)
    }
}

struct FeedWindows {
    state: Rc<RefCell<FeedState>>,
}

impl WindowSystem for FeedWindows {
    fn active_window(&self) -> Option<WindowId> {
        self.state.borrow().active
    }

    fn window_class_name(&self, window: WindowId) -> Option<String> {
        self.state.borrow().classes.get(window.0 as usize).cloned()
    }

    fn icon(&self, _window: WindowId, _w: u32, _h: u32, _crop: bool) -> Option<Icon> {
        None
    }
}

fn track(config: TrackerConfig) -> Result<()> {
    let store = JsonStatsStore::open_default()?;
    eprintln!("Using stats file: {}", store.path().display());

    let feed = Rc::new(RefCell::new(FeedState::default()));
    let mut tracker = Tracker::new(
        Box::new(FeedWindows { state: Rc::clone(&feed) }),
        Box::new(store),
        Box::new(NoopPowerManager),
        config,
    );

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ":quit" => break,
            ":tick" => tracker.handle_timer_tick(),
            ":lock" => tracker.handle_session_event(SessionEvent::ScreenLockChanged(true)),
            ":unlock" => tracker.handle_session_event(SessionEvent::ScreenLockChanged(false)),
            ":sleep" => tracker.handle_session_event(SessionEvent::SleepPrepare(true)),
            ":wake" => tracker.handle_session_event(SessionEvent::SleepPrepare(false)),
            ":shutdown" => tracker.handle_session_event(SessionEvent::ShutdownPrepare(true)),
            ":reset" => tracker.reset_statistics(),
            class => {
                let window = feed.borrow_mut().focus(class);
                tracker.handle_focus_changed(window);
            }
        }

        // Deliver the periodic flush when its deadline has passed; a
        // line-driven loop only observes time between lines
        if let Some(deadline) = tracker.timer_deadline() {
            if chrono::Local::now() >= deadline {
                tracker.handle_timer_tick();
            }
        }
    }

    tracker.finalize();

    for row in tracker.rows() {
        println!("{:>9}  {}", row.time, row.name);
    }
    Ok(())
}
