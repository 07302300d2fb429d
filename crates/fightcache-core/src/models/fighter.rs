use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::ApiFighter;
use crate::utils::age_on;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub name: String,
    pub nickname: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub hometown: Option<String>,
    pub team: Option<String>,
    pub weight_class: Option<String>,
    pub height: Option<String>,
    pub reach: Option<String>,
    pub stance: Option<String>,
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub losses: i64,
    #[serde(default)]
    pub wins_by_ko: i64,
    #[serde(default)]
    pub wins_by_submission: i64,
    #[serde(default)]
    pub wins_by_decision: i64,
    #[serde(default)]
    pub losses_by_ko: i64,
    #[serde(default)]
    pub losses_by_submission: i64,
    #[serde(default)]
    pub losses_by_decision: i64,
    #[serde(default)]
    pub fighter_id: i64,
}

impl Fighter {
    /// Record in "W-L-D" form. Draws are not tracked upstream.
    pub fn record(&self) -> String {
        format!("{}-{}-0", self.wins, self.losses)
    }

    pub fn age(&self, today: NaiveDate) -> i64 {
        self.birth_date
            .as_deref()
            .map(|d| age_on(d, today))
            .unwrap_or(0)
    }

    pub fn weight_class_display(&self) -> &str {
        self.weight_class.as_deref().unwrap_or("Unknown")
    }
}

impl From<&ApiFighter> for Fighter {
    fn from(api: &ApiFighter) -> Self {
        Self {
            name: api.name.clone(),
            nickname: api.nickname.clone(),
            birth_date: api.birth_date.clone(),
            nationality: api.nationality.clone(),
            hometown: api.hometown.clone(),
            team: api.team.clone(),
            weight_class: api.weight_class.clone(),
            height: api.height.clone(),
            reach: api.reach.clone(),
            stance: api.stance.clone(),
            wins: api.wins,
            losses: api.losses,
            wins_by_ko: api.win_ko,
            wins_by_submission: api.win_sub,
            wins_by_decision: api.win_decision,
            losses_by_ko: api.loss_ko,
            losses_by_submission: api.loss_sub,
            losses_by_decision: api.loss_decision,
            fighter_id: api.fighter_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_fighter(json: &str) -> ApiFighter {
        serde_json::from_str(json).expect("fighter json should decode")
    }

    #[test]
    fn test_from_api_maps_method_splits() {
        let api = api_fighter(
            r#"{"Fighter":"Max Holloway","Wins":"25","Losses":7,"Win_KO":12,"Win_Sub":4,"Win_Decision":9,"Loss_Decision":5,"Fighter_ID":"77"}"#,
        );
        let fighter = Fighter::from(&api);
        assert_eq!(fighter.record(), "25-7-0");
        assert_eq!(fighter.wins_by_ko, 12);
        assert_eq!(fighter.wins_by_submission, 4);
        assert_eq!(fighter.wins_by_decision, 9);
        assert_eq!(fighter.losses_by_decision, 5);
        assert_eq!(fighter.losses_by_ko, 0);
        assert_eq!(fighter.fighter_id, 77);
    }

    #[test]
    fn test_age_and_weight_class_defaults() {
        let api = api_fighter(r#"{"Fighter":"A","Birth Date":"Dec 4, 1991"}"#);
        let fighter = Fighter::from(&api);
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
        assert_eq!(fighter.age(today), 33);
        assert_eq!(fighter.weight_class_display(), "Unknown");

        let no_birth = Fighter::from(&api_fighter(r#"{"Fighter":"B"}"#));
        assert_eq!(no_birth.age(today), 0);
    }
}
