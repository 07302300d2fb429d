//! Domain models for fighters, cards and odds.
//!
//! - `Fighter`: biography and win/loss counters by method
//! - `EventInfo`, `Fight`: a card and its bouts
//! - `FightHistoryEntry`, `FightRecord`: per-fighter projections of results
//! - `OddsChartPoint`: one sportsbook line over time
//! - `Dataset`: the full published state

pub mod dataset;
pub mod event;
pub mod fighter;
pub mod odds;

pub use dataset::Dataset;
pub use event::{EventInfo, Fight, FightHistoryEntry, FightRecord, Outcome};
pub use fighter::Fighter;
pub use odds::{filter_allowed, OddsChartPoint, ALLOWED_SPORTSBOOKS};
