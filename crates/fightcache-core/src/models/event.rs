use serde::{Deserialize, Serialize};

use crate::api::ApiEvent;

/// Keyword marking the headline bout in the free-text fight type
const MAIN_EVENT_KEYWORD: &str = "main event";

/// Keyword marking a championship bout in fight type or method text
const TITLE_KEYWORD: &str = "title";

fn contains_keyword(text: Option<&str>, keyword: &str) -> bool {
    text.is_some_and(|t| t.to_lowercase().contains(keyword))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn letter(&self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "Win"),
            Outcome::Loss => write!(f, "Loss"),
        }
    }
}

/// One bout on a card, red corner is "Fighter 1" upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fight {
    pub red_corner: String,
    pub blue_corner: String,
    #[serde(default)]
    pub red_corner_id: i64,
    #[serde(default)]
    pub blue_corner_id: i64,
    pub weight_class: Option<String>,
    #[serde(default)]
    pub is_main_event: bool,
    #[serde(default)]
    pub is_title_fight: bool,
    pub round: Option<i64>,
    pub time: Option<String>,
    pub winner: Option<String>,
    pub method: Option<String>,
}

impl Fight {
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.red_corner == a && self.blue_corner == b)
            || (self.red_corner == b && self.blue_corner == a)
    }
}

impl From<&ApiEvent> for Fight {
    fn from(event: &ApiEvent) -> Self {
        let fight_type = event.fight_type.as_deref();
        Self {
            red_corner: event.fighter1.clone(),
            blue_corner: event.fighter2.clone(),
            red_corner_id: event.fighter1_id,
            blue_corner_id: event.fighter2_id,
            weight_class: event.weight_class.clone(),
            is_main_event: contains_keyword(fight_type, MAIN_EVENT_KEYWORD),
            is_title_fight: contains_keyword(fight_type, TITLE_KEYWORD)
                || contains_keyword(event.method.as_deref(), TITLE_KEYWORD),
            round: event.round,
            time: event.time.clone(),
            winner: event.winner.clone().filter(|_| event.has_winner()),
            method: event.method.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub name: String,
    /// "MMM d, yyyy", or the raw upstream text when it did not parse
    pub date: String,
    pub location: Option<String>,
    pub venue: Option<String>,
    #[serde(default)]
    pub fights: Vec<Fight>,
}

impl EventInfo {
    pub fn display_location(&self) -> String {
        let location = self.location.as_deref().unwrap_or("Unknown");
        match self.venue.as_deref() {
            Some(venue) if !venue.is_empty() && venue != "N/A" => format!("{} • {}", venue, location),
            _ => location.to_string(),
        }
    }
}

/// A fighter's view of one bout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightHistoryEntry {
    pub opponent: String,
    #[serde(default)]
    pub opponent_id: i64,
    pub outcome: Outcome,
    pub method: Option<String>,
    pub date: String,
    pub event: String,
}

/// History entry joined with round/time from the event card.
#[derive(Debug, Clone, PartialEq)]
pub struct FightRecord {
    pub opponent: String,
    pub outcome: Outcome,
    pub method: Option<String>,
    pub date: String,
    pub event: String,
    pub round: Option<i64>,
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_event(json: &str) -> ApiEvent {
        serde_json::from_str(json).expect("event json should decode")
    }

    #[test]
    fn test_fight_flags_from_fight_type() {
        let e = api_event(
            r#"{"Event Name":"E","Fighter 1":"A","Fighter 2":"B","Fight Type":"Main Event - Title Bout"}"#,
        );
        let fight = Fight::from(&e);
        assert!(fight.is_main_event);
        assert!(fight.is_title_fight);
    }

    #[test]
    fn test_fight_title_flag_from_method() {
        let e = api_event(
            r#"{"Event Name":"E","Fighter 1":"A","Fighter 2":"B","Winning Method":"KO (Title defense)","Fight Type":"Main Card"}"#,
        );
        let fight = Fight::from(&e);
        assert!(!fight.is_main_event);
        assert!(fight.is_title_fight);
    }

    #[test]
    fn test_fight_drops_placeholder_winner() {
        let e = api_event(r#"{"Event Name":"E","Fighter 1":"A","Fighter 2":"B","Winning Fighter":"TBD"}"#);
        assert_eq!(Fight::from(&e).winner, None);
    }

    #[test]
    fn test_is_between() {
        let e = api_event(r#"{"Event Name":"E","Fighter 1":"A","Fighter 2":"B"}"#);
        let fight = Fight::from(&e);
        assert!(fight.is_between("A", "B"));
        assert!(fight.is_between("B", "A"));
        assert!(!fight.is_between("A", "C"));
    }

    #[test]
    fn test_display_location() {
        let mut info = EventInfo {
            name: "UFC 300".into(),
            date: "Apr 13, 2024".into(),
            location: Some("Las Vegas, NV".into()),
            venue: None,
            fights: vec![],
        };
        assert_eq!(info.display_location(), "Las Vegas, NV");
        info.venue = Some("T-Mobile Arena".into());
        assert_eq!(info.display_location(), "T-Mobile Arena • Las Vegas, NV");
    }

    #[test]
    fn test_outcome_serializes_as_label() {
        let json = serde_json::to_string(&Outcome::Win).expect("serialize outcome");
        assert_eq!(json, "\"Win\"");
        assert_eq!(Outcome::Loss.letter(), "L");
    }
}
