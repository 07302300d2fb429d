//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for persisting the last-known-good
//! dataset through a `KeyValueStore`. Each collection lives under its own key
//! next to a shared `lastUpdateTime` stamp (epoch seconds).
//!
//! Required on load: fighters, fight history, event details, upcoming cards.
//! Optional: past cards and odds charts.

pub mod manager;
pub mod store;

pub use manager::{format_age, CacheManager};
pub use store::{FileStore, KeyValueStore, MemoryStore};
