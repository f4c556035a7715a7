pub mod grid;
pub mod indexes;
pub mod store;

pub use store::{DataSource, LoadOutcome, RefreshStats, ScheduleStore, SlotRemoval};
