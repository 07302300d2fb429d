//! Wire types for the data service.
//!
//! Field names follow the service's CSV-derived JSON exactly. Every numeric
//! field goes through the helpers in [`super::lenient`].

use serde::Deserialize;

use super::lenient;

#[derive(Debug, Clone, Deserialize)]
pub struct DataVersion {
    #[serde(default, deserialize_with = "lenient::float_or_zero")]
    pub fighter_data_version: f64,
    #[serde(default, deserialize_with = "lenient::float_or_zero")]
    pub event_data_version: f64,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FighterResponse {
    #[serde(default)]
    pub timestamp: String,
    pub fighters: Vec<ApiFighter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventResponse {
    #[serde(default)]
    pub timestamp: String,
    pub events: Vec<ApiEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiFighter {
    #[serde(rename = "Fighter")]
    pub name: String,
    #[serde(rename = "Nickname", default, deserialize_with = "lenient::opt_string")]
    pub nickname: Option<String>,
    #[serde(rename = "Birth Date", default, deserialize_with = "lenient::opt_string")]
    pub birth_date: Option<String>,
    #[serde(rename = "Nationality", default, deserialize_with = "lenient::opt_string")]
    pub nationality: Option<String>,
    #[serde(rename = "Hometown", default, deserialize_with = "lenient::opt_string")]
    pub hometown: Option<String>,
    #[serde(rename = "Association", default, deserialize_with = "lenient::opt_string")]
    pub team: Option<String>,
    #[serde(rename = "Weight Class", default, deserialize_with = "lenient::opt_string")]
    pub weight_class: Option<String>,
    #[serde(rename = "Height", default, deserialize_with = "lenient::opt_string")]
    pub height: Option<String>,
    #[serde(rename = "Reach", default, deserialize_with = "lenient::opt_string")]
    pub reach: Option<String>,
    #[serde(rename = "Stance", default, deserialize_with = "lenient::opt_string")]
    pub stance: Option<String>,
    #[serde(rename = "Wins", default, deserialize_with = "lenient::int_or_zero")]
    pub wins: i64,
    #[serde(rename = "Losses", default, deserialize_with = "lenient::int_or_zero")]
    pub losses: i64,
    #[serde(rename = "Win_Decision", default, deserialize_with = "lenient::int_or_zero")]
    pub win_decision: i64,
    #[serde(rename = "Win_KO", default, deserialize_with = "lenient::int_or_zero")]
    pub win_ko: i64,
    #[serde(rename = "Win_Sub", default, deserialize_with = "lenient::int_or_zero")]
    pub win_sub: i64,
    #[serde(rename = "Loss_Decision", default, deserialize_with = "lenient::int_or_zero")]
    pub loss_decision: i64,
    #[serde(rename = "Loss_KO", default, deserialize_with = "lenient::int_or_zero")]
    pub loss_ko: i64,
    #[serde(rename = "Loss_Sub", default, deserialize_with = "lenient::int_or_zero")]
    pub loss_sub: i64,
    #[serde(rename = "Fighter_ID", default, deserialize_with = "lenient::int_or_zero")]
    pub fighter_id: i64,
}

/// One bout as reported by the events feed. Upcoming cards are flattened into
/// this same shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEvent {
    #[serde(rename = "Event ID", default, deserialize_with = "lenient::int_or_zero")]
    pub event_id: i64,
    #[serde(rename = "Event Name")]
    pub event_name: String,
    #[serde(rename = "Event Location", default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(rename = "Event Date", default, deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
    #[serde(rename = "Venue", default, deserialize_with = "lenient::opt_string")]
    pub venue: Option<String>,
    #[serde(rename = "Fighter 1")]
    pub fighter1: String,
    #[serde(rename = "Fighter 2")]
    pub fighter2: String,
    #[serde(rename = "Fighter 1 ID", default, deserialize_with = "lenient::int_or_zero")]
    pub fighter1_id: i64,
    #[serde(rename = "Fighter 2 ID", default, deserialize_with = "lenient::int_or_zero")]
    pub fighter2_id: i64,
    #[serde(rename = "Weight Class", default, deserialize_with = "lenient::opt_string")]
    pub weight_class: Option<String>,
    #[serde(rename = "Winning Fighter", default, deserialize_with = "lenient::opt_string")]
    pub winner: Option<String>,
    #[serde(rename = "Winning Method", default, deserialize_with = "lenient::opt_string")]
    pub method: Option<String>,
    #[serde(rename = "Winning Round", default, deserialize_with = "lenient::opt_int")]
    pub round: Option<i64>,
    #[serde(rename = "Winning Time", default, deserialize_with = "lenient::opt_string")]
    pub time: Option<String>,
    #[serde(rename = "Referee", default, deserialize_with = "lenient::opt_string")]
    pub referee: Option<String>,
    #[serde(rename = "Fight Type", default, deserialize_with = "lenient::opt_string")]
    pub fight_type: Option<String>,
}

impl ApiEvent {
    /// True when the bout has a recorded winner.
    pub fn has_winner(&self) -> bool {
        self.winner
            .as_deref()
            .is_some_and(|w| !w.eq_ignore_ascii_case("tbd"))
    }
}

/// A card from the upcoming-events feed, grouped the way the scraper emits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub event_name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
    #[serde(default)]
    pub main_card: Vec<UpcomingFight>,
    #[serde(default)]
    pub prelims: Vec<UpcomingFight>,
    #[serde(default)]
    pub all_fights: Vec<UpcomingFight>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingFight {
    pub fighter1: String,
    pub fighter2: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub weight_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub fight_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub round: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub winner: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub method: Option<String>,
}

impl UpcomingEvent {
    /// Bouts in card order. `allFights` is authoritative; older payloads only
    /// carry the main card and prelims.
    pub fn fights(&self) -> Vec<&UpcomingFight> {
        if !self.all_fights.is_empty() {
            self.all_fights.iter().collect()
        } else {
            self.main_card.iter().chain(self.prelims.iter()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fighter_with_native_numbers() {
        let json = r#"{"Fighter":"Jon Jones","Wins":27,"Losses":1,"Fighter_ID":123}"#;
        let f: ApiFighter = serde_json::from_str(json).expect("fighter should decode");
        assert_eq!(f.name, "Jon Jones");
        assert_eq!(f.wins, 27);
        assert_eq!(f.losses, 1);
        assert_eq!(f.fighter_id, 123);
        assert_eq!(f.win_ko, 0);
        assert_eq!(f.nickname, None);
    }

    #[test]
    fn test_parse_fighter_string_numbers_match_native() {
        let native: ApiFighter =
            serde_json::from_str(r#"{"Fighter":"A","Wins":12,"Win_KO":5,"Fighter_ID":9}"#)
                .expect("native should decode");
        let quoted: ApiFighter =
            serde_json::from_str(r#"{"Fighter":"A","Wins":"12","Win_KO":"5","Fighter_ID":"9"}"#)
                .expect("quoted should decode");
        assert_eq!(native, quoted);
    }

    #[test]
    fn test_parse_fighter_descriptive_fields() {
        let json = r#"{
            "Fighter": "Max Holloway",
            "Nickname": "Blessed",
            "Birth Date": "Dec 4, 1991",
            "Association": "Hawaii Elite MMA",
            "Weight Class": null,
            "Height": "5'11\"",
            "Reach": 69,
            "Stance": "Orthodox",
            "Wins": "26",
            "Losses": "not a number"
        }"#;
        let f: ApiFighter = serde_json::from_str(json).expect("fighter should decode");
        assert_eq!(f.nickname.as_deref(), Some("Blessed"));
        assert_eq!(f.team.as_deref(), Some("Hawaii Elite MMA"));
        assert_eq!(f.weight_class, None);
        assert_eq!(f.reach.as_deref(), Some("69"));
        assert_eq!(f.wins, 26);
        assert_eq!(f.losses, 0);
    }

    #[test]
    fn test_fighter_without_name_is_rejected() {
        let result = serde_json::from_str::<ApiFighter>(r#"{"Wins": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_event_missing_ids() {
        let json = r#"{"Event Name":"UFC 1","Fighter 1":"Jon Jones","Fighter 2":"Ciryl Gane","Fighter 1 ID":123,"Winning Fighter":"Jon Jones","Winning Round":"1"}"#;
        let e: ApiEvent = serde_json::from_str(json).expect("event should decode");
        assert_eq!(e.event_name, "UFC 1");
        assert_eq!(e.fighter1_id, 123);
        assert_eq!(e.fighter2_id, 0);
        assert_eq!(e.event_id, 0);
        assert_eq!(e.round, Some(1));
        assert!(e.has_winner());
    }

    #[test]
    fn test_has_winner_ignores_tbd() {
        let json = r#"{"Event Name":"E","Fighter 1":"A","Fighter 2":"B","Winning Fighter":"TBD"}"#;
        let e: ApiEvent = serde_json::from_str(json).expect("event should decode");
        assert!(!e.has_winner());
    }

    #[test]
    fn test_upcoming_fights_prefers_all_fights() {
        let json = r#"{
            "eventName": "UFC 300",
            "mainCard": [{"fighter1": "A", "fighter2": "B"}],
            "prelims": [{"fighter1": "C", "fighter2": "D"}],
            "allFights": []
        }"#;
        let e: UpcomingEvent = serde_json::from_str(json).expect("upcoming should decode");
        let names: Vec<&str> = e.fights().iter().map(|f| f.fighter1.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_data_version_accepts_strings() {
        let json = r#"{"fighter_data_version": "3", "event_data_version": 4.5, "timestamp": "t"}"#;
        let v: DataVersion = serde_json::from_str(json).expect("version should decode");
        assert_eq!(v.fighter_data_version, 3.0);
        assert_eq!(v.event_data_version, 4.5);
    }
}
