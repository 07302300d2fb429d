use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Display format used for every stored event date: "Nov 9, 2024"
const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

/// Parse format for display dates; chrono accepts unpadded days here
const DISPLAY_DATE_PARSE: &str = "%b %d, %Y";

/// Reformat an upstream ISO-8601-like date to "MMM d, yyyy".
/// Unrecognized input is returned unchanged.
pub fn format_event_date(raw: &str) -> String {
    parse_upstream_date(raw)
        .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_upstream_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // 2024-11-09T00:00:00+0000
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    parse_display_date(raw)
}

/// Parse a "MMM d, yyyy" display date
pub fn parse_display_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DISPLAY_DATE_PARSE).ok()
}

/// Whole years between a "MMM d, yyyy" birth date and `today`. 0 if unparsable.
pub fn age_on(birth_date: &str, today: NaiveDate) -> i64 {
    let Some(born) = parse_display_date(birth_date) else {
        return 0;
    };
    let mut years = i64::from(today.year() - born.year());
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    years.max(0)
}

/// Insert a space at every lowercase-to-uppercase transition: "JonJones" -> "Jon Jones"
pub fn spaced_fighter_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if prev_lower && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
        prev_lower = c.is_lowercase();
    }
    out
}

/// Normalize a fighter name for fuzzy key comparison
pub fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}
