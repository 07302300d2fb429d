//! API client for the fight data service.
//!
//! This module provides the `ApiClient` struct for fetching fighters,
//! historical events, upcoming cards and odds charts, plus the liveness
//! probe every fetch consults first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::OddsChartPoint;
use crate::sync::transform::{backfill_fighter_ids, fighter_id_table};
use crate::utils::spaced_fighter_name;

use super::error::{ApiError, ApiResult};
use super::types::{ApiEvent, ApiFighter, DataVersion, EventResponse, FighterResponse, UpcomingEvent};

// ============================================================================
// Constants
// ============================================================================

/// Default data service host
pub const DEFAULT_BASE_URL: &str = "https://mma-ai.duckdns.org/api";

/// Endpoint known to answer whenever the service is up
const PROBE_PATH: &str = "examples";

const VERSION_PATH: &str = "data/version";
const FIGHTERS_PATH: &str = "data/fighters";
const EVENTS_PATH: &str = "data/events";
const UPCOMING_PATH: &str = "data/upcoming";
const ODDS_CHART_PATH: &str = "data/odds/chart";

/// Fight type labels assigned when flattening upcoming cards
const MAIN_EVENT_LABEL: &str = "Main Event";
const MAIN_CARD_LABEL: &str = "Main Card";

/// API client for the fight data service.
/// Clone is cheap - the HTTP client, availability flag and id table are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    probe_timeout: Duration,
    server_available: Arc<AtomicBool>,
    /// Name -> id table from the most recent fighter fetch
    fighter_ids: Arc<RwLock<HashMap<String, i64>>>,
}

impl ApiClient {
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::build(
            config.base_url(),
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.probe_timeout_secs),
        )
    }

    fn build(base_url: &str, request_timeout: Duration, probe_timeout: Duration) -> ApiResult<Self> {
        let base_url = Self::validate_base_url(base_url)?;
        let client = Client::builder().timeout(request_timeout).build()?;

        debug!(base_url = %base_url, "API client initialized");

        Ok(Self {
            client,
            base_url: Arc::from(base_url),
            probe_timeout,
            server_available: Arc::new(AtomicBool::new(false)),
            fighter_ids: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn validate_base_url(base_url: &str) -> ApiResult<String> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                base_url,
                parsed.scheme()
            )));
        }
        Ok(trimmed.to_string())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Liveness =====

    /// Last known probe result. False until a probe has succeeded.
    pub fn is_server_available(&self) -> bool {
        self.server_available.load(Ordering::SeqCst)
    }

    /// Probe the service and remember the result.
    /// Falls back to the version endpoint when the example list is down.
    pub async fn check_server_availability(&self) -> bool {
        let available = match self.probe(PROBE_PATH).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Primary liveness probe failed, trying version endpoint");
                self.probe(VERSION_PATH).await.is_ok()
            }
        };

        self.server_available.store(available, Ordering::SeqCst);
        if available {
            info!(base_url = %self.base_url, "Data service reachable");
        } else {
            warn!(base_url = %self.base_url, "Data service unreachable");
        }
        available
    }

    async fn probe(&self, path: &str) -> ApiResult<()> {
        let response = self
            .client
            .get(self.endpoint(path))
            .timeout(self.probe_timeout)
            .send()
            .await?;
        Self::check_response(response).await.map(|_| ())
    }

    async fn ensure_server_available(&self) -> ApiResult<()> {
        if self.is_server_available() || self.check_server_availability().await {
            Ok(())
        } else {
            Err(ApiError::ServerUnavailable)
        }
    }

    // ===== Transport =====

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<String> {
        self.ensure_server_available().await?;

        let url = self.endpoint(path);
        let response = match self.client.get(&url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                // Force a fresh probe on the next fetch
                self.server_available.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(url = %url, bytes = text.len(), "Response received");
        Ok(text)
    }

    // ===== Data Fetching Methods =====

    /// Fetch the server's dataset version numbers
    pub async fn fetch_data_version(&self) -> ApiResult<DataVersion> {
        let text = self.get_text(VERSION_PATH, &[]).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch every fighter record. Also refreshes the name -> id table used
    /// to backfill event participants.
    pub async fn fetch_fighters(&self) -> ApiResult<Vec<ApiFighter>> {
        let text = self.get_text(FIGHTERS_PATH, &[]).await?;
        let fighters = Self::decode_fighters(&text)?;
        info!(count = fighters.len(), "Fighters fetched");

        let table = fighter_id_table(&fighters);
        *self
            .fighter_ids
            .write()
            .unwrap_or_else(PoisonError::into_inner) = table;

        Ok(fighters)
    }

    /// Fetch historical bouts, with participant ids backfilled from the most
    /// recent fighter fetch where the feed left them at 0.
    pub async fn fetch_events(&self) -> ApiResult<Vec<ApiEvent>> {
        let text = self.get_text(EVENTS_PATH, &[]).await?;
        let mut events = Self::decode_events(&text)?;

        let ids = self.fighter_ids.read().unwrap_or_else(PoisonError::into_inner);
        let filled = backfill_fighter_ids(&mut events, &ids);
        info!(count = events.len(), backfilled = filled, "Events fetched");

        Ok(events)
    }

    /// Fetch upcoming cards, flattened into per-bout event records
    pub async fn fetch_upcoming_events(&self) -> ApiResult<Vec<ApiEvent>> {
        let text = self.get_text(UPCOMING_PATH, &[]).await?;
        let events = Self::decode_upcoming(&text)?;
        info!(count = events.len(), "Upcoming bouts fetched");
        Ok(events)
    }

    /// Fetch the odds movement chart for one fighter
    pub async fn fetch_odds_chart(&self, fighter: &str) -> ApiResult<Vec<OddsChartPoint>> {
        let text = self.get_text(ODDS_CHART_PATH, &[("fighter", fighter)]).await?;
        Self::decode_odds_chart(&text)
    }

    // ===== Decoding =====

    pub(crate) fn decode_fighters(text: &str) -> ApiResult<Vec<ApiFighter>> {
        let strict = serde_json::from_str::<FighterResponse>(text).map(|r| r.fighters);
        Self::decode_batch(text, Some("fighters"), strict)
    }

    pub(crate) fn decode_events(text: &str) -> ApiResult<Vec<ApiEvent>> {
        let strict = serde_json::from_str::<EventResponse>(text).map(|r| r.events);
        Self::decode_batch(text, Some("events"), strict)
    }

    pub(crate) fn decode_upcoming(text: &str) -> ApiResult<Vec<ApiEvent>> {
        let strict = serde_json::from_str::<Vec<UpcomingEvent>>(text);
        let cards = Self::decode_batch(text, None, strict)?;
        Ok(Self::flatten_upcoming(&cards))
    }

    /// Odds arrive either as a bare array or wrapped under `odds` or `data`.
    pub(crate) fn decode_odds_chart(text: &str) -> ApiResult<Vec<OddsChartPoint>> {
        let root: Value = serde_json::from_str(text)?;
        let key = match &root {
            Value::Array(_) => None,
            Value::Object(map) if Self::has_records(map.get("odds")) => Some("odds"),
            Value::Object(map) if map.contains_key("data") => Some("data"),
            Value::Object(_) => return Ok(Vec::new()),
            _ => {
                return Err(ApiError::Decoding(format!(
                    "odds chart is neither an array nor an object: {}",
                    ApiError::truncate_body(text)
                )))
            }
        };

        let strict = match key {
            Some(key) => Vec::<OddsChartPoint>::deserialize(&root[key]),
            None => Vec::<OddsChartPoint>::deserialize(&root),
        };
        Self::decode_batch(text, key, strict)
    }

    fn has_records(value: Option<&Value>) -> bool {
        value
            .and_then(Value::as_array)
            .is_some_and(|records| !records.is_empty())
    }

    /// Accept a strict decode when it worked; otherwise decode element by
    /// element, skipping bad records. Fails only if nothing survives.
    fn decode_batch<T: DeserializeOwned>(
        text: &str,
        key: Option<&str>,
        strict: serde_json::Result<Vec<T>>,
    ) -> ApiResult<Vec<T>> {
        let err = match strict {
            Ok(items) => return Ok(items),
            Err(e) => e,
        };

        warn!(key = ?key, error = %err, "Strict decode failed, retrying record by record");
        let items = Self::decode_each::<T>(text, key);
        if items.is_empty() {
            return Err(ApiError::Decoding(err.to_string()));
        }
        Ok(items)
    }

    fn decode_each<T: DeserializeOwned>(text: &str, key: Option<&str>) -> Vec<T> {
        let Ok(root) = serde_json::from_str::<Value>(text) else {
            return Vec::new();
        };
        let records = match key {
            Some(key) => root.get(key).and_then(Value::as_array),
            None => root.as_array(),
        };
        let Some(records) = records else {
            return Vec::new();
        };

        let mut items = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match T::deserialize(record) {
                Ok(item) => items.push(item),
                Err(e) => warn!(index, error = %e, "Skipping record that failed to decode"),
            }
        }
        debug!(kept = items.len(), total = records.len(), "Per-record decode finished");
        items
    }

    /// Flatten grouped cards into per-bout records, normalizing run-together
    /// names and labelling each bout main event or main card.
    pub fn flatten_upcoming(cards: &[UpcomingEvent]) -> Vec<ApiEvent> {
        cards
            .iter()
            .flat_map(|card| {
                card.fights().into_iter().map(move |fight| ApiEvent {
                    event_id: 0,
                    event_name: card.event_name.clone(),
                    location: card.location.clone(),
                    date: card.date.clone(),
                    venue: None,
                    fighter1: spaced_fighter_name(&fight.fighter1),
                    fighter2: spaced_fighter_name(&fight.fighter2),
                    fighter1_id: 0,
                    fighter2_id: 0,
                    weight_class: fight.weight_class.clone(),
                    winner: fight.winner.clone(),
                    method: fight.method.clone(),
                    round: fight.round,
                    time: fight.time.clone(),
                    referee: None,
                    fight_type: Some(Self::fight_type_label(fight.fight_type.as_deref()).to_string()),
                })
            })
            .collect()
    }

    fn fight_type_label(raw: Option<&str>) -> &'static str {
        if raw.is_some_and(|t| t.to_lowercase().contains("main event")) {
            MAIN_EVENT_LABEL
        } else {
            MAIN_CARD_LABEL
        }
    }
}
