//! Best-effort JSONL event log and its aggregation.

pub mod events;
pub mod logger;
pub mod reporter;

pub use events::{CycleEvent, EventKind, Outcome};
pub use logger::EventLog;
