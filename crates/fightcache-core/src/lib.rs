//! fightcache core - fighter, event and odds data with an offline cache.
//!
//! - `api`: client for the fight data service and the `FightDataSource` seam
//! - `cache`: key-value persistence of the last-known-good dataset
//! - `sync`: `SyncManager`, the refresh policy and derived views
//! - `models`, `utils`: domain types and date/name helpers

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResult, FightDataSource};
pub use cache::CacheManager;
pub use config::Config;
pub use models::Dataset;
pub use sync::{LoadingState, RefreshOutcome, Startup, SyncManager};
