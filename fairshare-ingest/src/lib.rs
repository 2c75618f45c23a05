//! fairshare-ingest: maps persisted household exports (history CSV, snapshot JSON) into engine types.

pub mod history_csv;
pub mod snapshot;

pub use history_csv::{parse_history_csv, parse_history_reader};
pub use snapshot::{HouseholdSnapshot, load_snapshot, parse_snapshot};
