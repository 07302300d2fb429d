//! Pure transformations from fetched wire records to the published dataset.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::api::{ApiEvent, ApiFighter};
use crate::models::{
    Dataset, EventInfo, Fight, FightHistoryEntry, FightRecord, Fighter, Outcome,
};
use crate::utils::{clean_name, format_event_date, parse_display_date};

/// Most past cards kept in the past-events view
pub const MAX_PAST_EVENTS: usize = 10;

const UNKNOWN_DATE: &str = "Unknown";

/// Name -> id table. Later records win on duplicate names; id 0 is not an id.
pub fn fighter_id_table(fighters: &[ApiFighter]) -> HashMap<String, i64> {
    fighters
        .iter()
        .filter(|f| f.fighter_id != 0)
        .map(|f| (f.name.clone(), f.fighter_id))
        .collect()
}

/// Fill participant ids still at 0 from the table. Returns how many were filled.
pub fn backfill_fighter_ids(events: &mut [ApiEvent], ids: &HashMap<String, i64>) -> usize {
    let mut filled = 0;
    for event in events.iter_mut() {
        if event.fighter1_id == 0 {
            if let Some(&id) = ids.get(&event.fighter1) {
                event.fighter1_id = id;
                filled += 1;
            }
        }
        if event.fighter2_id == 0 {
            if let Some(&id) = ids.get(&event.fighter2) {
                event.fighter2_id = id;
                filled += 1;
            }
        }
    }
    filled
}

pub fn build_fighters(fighters: &[ApiFighter]) -> HashMap<String, Fighter> {
    fighters
        .iter()
        .map(|f| (f.name.clone(), Fighter::from(f)))
        .collect()
}

fn display_date(event: &ApiEvent) -> String {
    format_event_date(event.date.as_deref().unwrap_or(UNKNOWN_DATE))
}

/// Sort key putting the newest parsable date first and unparsable dates last.
fn newest_first(date: &str) -> (bool, Reverse<Option<NaiveDate>>) {
    let parsed = parse_display_date(date);
    (parsed.is_none(), Reverse(parsed))
}

/// Sort key putting the soonest parsable date first and unparsable dates last.
fn soonest_first(date: &str) -> (bool, Option<NaiveDate>) {
    let parsed = parse_display_date(date);
    (parsed.is_none(), parsed)
}

fn history_entry(event: &ApiEvent, fighter: &str, opponent: &str, opponent_id: i64) -> FightHistoryEntry {
    let outcome = if event.winner.as_deref() == Some(fighter) {
        Outcome::Win
    } else {
        Outcome::Loss
    };
    FightHistoryEntry {
        opponent: opponent.to_string(),
        opponent_id,
        outcome,
        method: event.method.clone(),
        date: display_date(event),
        event: event.event_name.clone(),
    }
}

/// Two symmetric entries per bout, each fighter's list newest first.
pub fn build_fight_history(events: &[ApiEvent]) -> HashMap<String, Vec<FightHistoryEntry>> {
    let mut history: HashMap<String, Vec<FightHistoryEntry>> = HashMap::new();
    for event in events {
        history
            .entry(event.fighter1.clone())
            .or_default()
            .push(history_entry(event, &event.fighter1, &event.fighter2, event.fighter2_id));
        history
            .entry(event.fighter2.clone())
            .or_default()
            .push(history_entry(event, &event.fighter2, &event.fighter1, event.fighter1_id));
    }
    for entries in history.values_mut() {
        entries.sort_by_key(|e| newest_first(&e.date));
    }
    history
}

/// Group bouts by event name, keeping the order cards first appear in.
fn group_by_event(events: &[ApiEvent]) -> Vec<(&str, Vec<&ApiEvent>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&ApiEvent>)> = Vec::new();
    for event in events {
        let name = event.event_name.as_str();
        match index.get(name) {
            Some(&i) => groups[i].1.push(event),
            None => {
                index.insert(name, groups.len());
                groups.push((name, vec![event]));
            }
        }
    }
    groups
}

/// Card details come from the first bout seen for the event.
fn event_info(name: &str, bouts: &[&ApiEvent]) -> EventInfo {
    let first = bouts.first();
    EventInfo {
        name: name.to_string(),
        date: first
            .map(|e| display_date(e))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        location: first.and_then(|e| e.location.clone()),
        venue: first.and_then(|e| e.venue.clone()),
        fights: bouts.iter().map(|e| Fight::from(*e)).collect(),
    }
}

pub fn build_event_details(events: &[ApiEvent]) -> HashMap<String, EventInfo> {
    group_by_event(events)
        .into_iter()
        .map(|(name, bouts)| (name.to_string(), event_info(name, &bouts)))
        .collect()
}

/// Upcoming cards, soonest first.
pub fn build_upcoming_events(events: &[ApiEvent]) -> Vec<EventInfo> {
    let mut cards: Vec<EventInfo> = group_by_event(events)
        .into_iter()
        .map(|(name, bouts)| event_info(name, &bouts))
        .collect();
    cards.sort_by_key(|c| soonest_first(&c.date));
    cards
}

/// Completed cards, newest first, at most [`MAX_PAST_EVENTS`]. A card where
/// no bout has a recorded winner is treated as incomplete and left out.
pub fn build_past_events(events: &[ApiEvent]) -> Vec<EventInfo> {
    let mut cards: Vec<EventInfo> = group_by_event(events)
        .into_iter()
        .filter(|(_, bouts)| bouts.iter().any(|e| e.has_winner()))
        .map(|(name, bouts)| event_info(name, &bouts))
        .collect();
    cards.sort_by_key(|c| newest_first(&c.date));
    cards.truncate(MAX_PAST_EVENTS);
    cards
}

/// Build a complete dataset from one fetch batch. Event ids still at 0 are
/// backfilled from this batch's fighters.
pub fn build_dataset(
    fighters: Vec<ApiFighter>,
    mut events: Vec<ApiEvent>,
    mut upcoming: Vec<ApiEvent>,
    now: DateTime<Utc>,
) -> Dataset {
    let ids = fighter_id_table(&fighters);
    backfill_fighter_ids(&mut events, &ids);
    backfill_fighter_ids(&mut upcoming, &ids);

    Dataset {
        fighters: build_fighters(&fighters),
        fight_history: build_fight_history(&events),
        event_details: build_event_details(&events),
        upcoming_events: build_upcoming_events(&upcoming),
        past_events: build_past_events(&events),
        odds_charts: HashMap::new(),
        last_update: Some(now),
    }
}

// ===== Lookups =====

/// Exact key first, then a cleaned comparison ("JonJones" finds "Jon Jones").
/// Ties among cleaned matches resolve to the smallest key.
pub fn lookup_by_name<'a, V>(map: &'a HashMap<String, V>, name: &str) -> Option<(&'a str, &'a V)> {
    if let Some((key, value)) = map.get_key_value(name) {
        return Some((key.as_str(), value));
    }
    let cleaned = clean_name(name);
    if cleaned.is_empty() {
        return None;
    }
    map.iter()
        .filter(|(key, _)| clean_name(key) == cleaned)
        .min_by(|a, b| a.0.cmp(b.0))
        .map(|(key, value)| (key.as_str(), value))
}

/// Join a fighter's history with round/time from the matching bout.
pub fn fight_records(data: &Dataset, name: &str) -> Option<Vec<FightRecord>> {
    let (fighter, history) = lookup_by_name(&data.fight_history, name)?;
    let records = history
        .iter()
        .map(|entry| {
            let bout = data
                .event_details
                .get(&entry.event)
                .and_then(|card| card.fights.iter().find(|f| f.is_between(fighter, &entry.opponent)));
            FightRecord {
                opponent: entry.opponent.clone(),
                outcome: entry.outcome,
                method: entry.method.clone(),
                date: entry.date.clone(),
                event: entry.event.clone(),
                round: bout.and_then(|f| f.round),
                time: bout.and_then(|f| f.time.clone()).filter(|t| t != "N/A"),
            }
        })
        .collect();
    Some(records)
}
