//! Utility functions for date and name formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    age_on, clean_name, format_event_date, format_optional, parse_display_date,
    spaced_fighter_name, truncate_string,
};
