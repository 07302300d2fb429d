use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Dataset, EventInfo, FightHistoryEntry, Fighter, OddsChartPoint};

use super::store::{FileStore, KeyValueStore, MemoryStore};

const KEY_FIGHTERS: &str = "cachedFighters";
const KEY_FIGHT_HISTORY: &str = "cachedFightHistory";
const KEY_EVENT_DETAILS: &str = "cachedEventDetails";
const KEY_UPCOMING_EVENTS: &str = "cachedUpcomingEvents";
const KEY_PAST_EVENTS: &str = "cachedPastEvents";
const KEY_ODDS_CHARTS: &str = "cachedOddsCharts";
const KEY_LAST_UPDATE: &str = "lastUpdateTime";

const ALL_KEYS: &[&str] = &[
    KEY_FIGHTERS,
    KEY_FIGHT_HISTORY,
    KEY_EVENT_DETAILS,
    KEY_UPCOMING_EVENTS,
    KEY_PAST_EVENTS,
    KEY_ODDS_CHARTS,
    KEY_LAST_UPDATE,
];

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Human-readable age of a timestamp: "just now", "5m ago", "2h ago", "3d ago".
/// Hours and days round to the nearest whole unit.
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let nearest = |minutes: i64, unit: i64| (minutes + unit / 2) / unit;
    match (now - since).num_minutes() {
        m if m < 1 => "just now".to_string(),
        m if m < MINUTES_PER_HOUR => format!("{}m ago", m),
        m if m < MINUTES_PER_DAY => format!("{}h ago", nearest(m, MINUTES_PER_HOUR)),
        m => format!("{}d ago", nearest(m, MINUTES_PER_DAY)),
    }
}

/// Persists the last-known-good dataset, one key per collection.
pub struct CacheManager {
    store: Box<dyn KeyValueStore>,
}

impl CacheManager {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// File-backed cache in `cache_dir`
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        Ok(Self::new(FileStore::new(cache_dir)?))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(contents) = self.store.get(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry: {}", key))?;
        Ok(Some(value))
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(data)?;
        self.store.set(key, &contents)
    }

    /// Optional entries never fail a load; a bad one is simply absent.
    fn load_optional<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                debug!(cache = key, error = %e, "Ignoring unreadable optional cache entry");
                T::default()
            }
        }
    }

    // ===== Snapshot =====

    /// Overwrite every cached collection and stamp the update time.
    pub fn save_snapshot(&self, data: &Dataset) -> Result<()> {
        self.save(KEY_FIGHTERS, &data.fighters)?;
        self.save(KEY_FIGHT_HISTORY, &data.fight_history)?;
        self.save(KEY_EVENT_DETAILS, &data.event_details)?;
        self.save(KEY_UPCOMING_EVENTS, &data.upcoming_events)?;
        self.save(KEY_PAST_EVENTS, &data.past_events)?;
        self.save(KEY_ODDS_CHARTS, &data.odds_charts)?;

        let stamp = data.last_update.unwrap_or_else(Utc::now);
        self.store.set(KEY_LAST_UPDATE, &encode_timestamp(stamp))?;

        info!(
            fighters = data.fighters.len(),
            events = data.event_details.len(),
            upcoming = data.upcoming_events.len(),
            "Snapshot saved to cache"
        );
        Ok(())
    }

    /// Hydrate a dataset from cache. `None` when any required collection is
    /// missing or unreadable; past events and odds are optional.
    pub fn load_snapshot(&self) -> Option<Dataset> {
        match self.try_load_snapshot() {
            Ok(Some(data)) => Some(data),
            Ok(None) => {
                debug!("No complete snapshot in cache");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cached snapshot unreadable, ignoring cache");
                None
            }
        }
    }

    fn try_load_snapshot(&self) -> Result<Option<Dataset>> {
        let Some(fighters) = self.load::<HashMap<String, Fighter>>(KEY_FIGHTERS)? else {
            return Ok(None);
        };
        let Some(fight_history) =
            self.load::<HashMap<String, Vec<FightHistoryEntry>>>(KEY_FIGHT_HISTORY)?
        else {
            return Ok(None);
        };
        let Some(event_details) = self.load::<HashMap<String, EventInfo>>(KEY_EVENT_DETAILS)? else {
            return Ok(None);
        };
        let Some(upcoming_events) = self.load::<Vec<EventInfo>>(KEY_UPCOMING_EVENTS)? else {
            return Ok(None);
        };

        Ok(Some(Dataset {
            fighters,
            fight_history,
            event_details,
            upcoming_events,
            past_events: self.load_optional(KEY_PAST_EVENTS),
            odds_charts: self.load_optional(KEY_ODDS_CHARTS),
            last_update: self.last_update(),
        }))
    }

    /// Persist only the odds charts, leaving the rest of the snapshot alone.
    pub fn save_odds_charts(&self, odds: &HashMap<String, Vec<OddsChartPoint>>) -> Result<()> {
        self.save(KEY_ODDS_CHARTS, odds)
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        match self.store.get(KEY_LAST_UPDATE) {
            Ok(Some(raw)) => decode_timestamp(&raw),
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Failed to read cache timestamp");
                None
            }
        }
    }

    /// Snapshot age for status output, `None` if nothing was ever saved.
    pub fn age_display(&self, now: DateTime<Utc>) -> Option<String> {
        self.last_update().map(|since| format_age(since, now))
    }

    pub fn clear(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.remove(key)?;
        }
        Ok(())
    }
}

/// Epoch seconds as a float, the format the timestamp key has always used
fn encode_timestamp(at: DateTime<Utc>) -> String {
    format!("{}", at.timestamp_millis() as f64 / 1000.0)
}

fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

// ============================================================================
// Tests
// ============================================================================
