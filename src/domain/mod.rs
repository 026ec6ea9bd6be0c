pub mod entry;
pub mod ledger;

pub use entry::{format_hms, parse_hms, ActivityEntry};
pub use ledger::Ledger;
