//! Data synchronization: serve from cache, refresh when stale.
//!
//! `SyncManager` owns the published [`Dataset`](crate::models::Dataset) and
//! the loading state. `transform` turns fetched wire records into the
//! derived views (fight history, event details, upcoming and past cards).

pub mod manager;
pub mod transform;

pub use manager::{LoadingState, RefreshOutcome, Startup, SyncManager};
