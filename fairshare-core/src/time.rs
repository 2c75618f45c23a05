//! Time utilities: household-local calendar days and entry ages.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::EngineError;

/// Parse an IANA timezone name like "Europe/Paris".
pub fn parse_timezone(name: &str) -> Result<Tz, EngineError> {
    name.trim()
        .parse()
        .map_err(|_| EngineError::InvalidConfig(format!("invalid timezone: {name}")))
}

/// Calendar day of `at` in the household timezone.
pub fn local_day(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// Monday of the local week containing `at`.
pub fn week_start(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    let day = local_day(at, tz);
    let offset = day.weekday().num_days_from_monday();
    day - Duration::days(i64::from(offset))
}

/// Fractional age in days; future timestamps have age 0.
pub fn age_in_days(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let secs = (now - then).num_seconds();
    if secs <= 0 {
        0.0
    } else {
        secs as f64 / 86_400.0
    }
}

/// Fractional hours elapsed; negative spans clamp to 0.
pub fn hours_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - then).num_seconds().max(0) as f64) / 3600.0
}
