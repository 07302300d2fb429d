use serde::{Deserialize, Serialize};

use crate::api::lenient;

/// Sportsbooks whose lines are kept. Everything else is dropped at prefetch.
pub const ALLOWED_SPORTSBOOKS: &[&str] = &[
    "betmgm",
    "betonline",
    "bookmaker",
    "bovada",
    "caesars-sportsbook",
    "circa-sports",
    "draftkings",
    "espn-bet",
    "fanduel",
    "mybookie",
    "pinnacle-sports",
];

/// One recorded line for a fighter at one sportsbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsChartPoint {
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient::float_or_zero")]
    pub odds: f64,
    pub sportsbook: String,
}

impl OddsChartPoint {
    pub fn is_allowed_sportsbook(&self) -> bool {
        ALLOWED_SPORTSBOOKS.contains(&self.sportsbook.as_str())
    }
}

pub fn filter_allowed(points: Vec<OddsChartPoint>) -> Vec<OddsChartPoint> {
    points
        .into_iter()
        .filter(OddsChartPoint::is_allowed_sportsbook)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_allowed() {
        let points: Vec<OddsChartPoint> = serde_json::from_str(
            r#"[
                {"timestamp": "2025-01-01T00:00:00Z", "odds": -150, "sportsbook": "draftkings"},
                {"timestamp": "2025-01-01T00:00:00Z", "odds": "120", "sportsbook": "some-offshore-book"},
                {"timestamp": "2025-01-02T00:00:00Z", "odds": -160, "sportsbook": "fanduel"}
            ]"#,
        )
        .expect("points should decode");
        let kept = filter_allowed(points);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|p| p.sportsbook != "some-offshore-book"));
        assert_eq!(kept[0].odds, -150.0);
    }
}
