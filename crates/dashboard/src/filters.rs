//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a `DateTime<Utc>` as a short date, e.g. `Jan 3, 2026`.
///
/// Usage in templates: `{{ sale.created_at|short_date }}`
#[askama::filter_fn]
pub fn short_date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    match text.parse::<chrono::DateTime<chrono::Utc>>() {
        Ok(dt) => Ok(dt.format("%b %-d, %Y").to_string()),
        Err(_) => Ok(text),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_short_date_formats() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 3, 12, 0, 0).unwrap();
        let formatted = dt.format("%b %-d, %Y").to_string();
        assert_eq!(formatted, "Jan 3, 2026");
    }
}
