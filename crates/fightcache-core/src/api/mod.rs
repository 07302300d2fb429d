//! REST client module for the fight data service.
//!
//! This module provides the `ApiClient` for fetching fighters, historical
//! bouts, upcoming cards and odds charts, and the `FightDataSource` trait the
//! sync layer depends on instead of a concrete client.
//!
//! The service serves CSV-derived JSON, so numeric fields arrive as numbers,
//! strings or empty values. Decoding goes through [`lenient`].

pub mod client;
pub mod error;
pub mod lenient;
pub mod source;
pub mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult};
pub use source::FightDataSource;
pub use types::{ApiEvent, ApiFighter, DataVersion, UpcomingEvent, UpcomingFight};
