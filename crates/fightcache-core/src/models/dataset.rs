use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::event::{EventInfo, FightHistoryEntry};
use super::fighter::Fighter;
use super::odds::OddsChartPoint;

/// Everything the sync layer publishes, replaced as one unit on refresh.
/// Also the shape persisted by the cache store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Keyed by fighter name. Last record wins on duplicate names.
    pub fighters: HashMap<String, Fighter>,
    /// Keyed by fighter name, newest bout first
    pub fight_history: HashMap<String, Vec<FightHistoryEntry>>,
    /// Historical cards keyed by event name
    pub event_details: HashMap<String, EventInfo>,
    /// Soonest first
    pub upcoming_events: Vec<EventInfo>,
    /// Newest first, at most ten
    pub past_events: Vec<EventInfo>,
    /// Keyed by fighter name, allow-listed sportsbooks only
    pub odds_charts: HashMap<String, Vec<OddsChartPoint>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.fighters.is_empty() && self.event_details.is_empty() && self.upcoming_events.is_empty()
    }

    /// True if a refresh can be skipped: updated within `window` and at
    /// least one upcoming card is loaded. A timestamp in the future is stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        let Some(last) = self.last_update else {
            return false;
        };
        let age = now - last;
        age >= chrono::Duration::zero() && age < window && !self.upcoming_events.is_empty()
    }
}
