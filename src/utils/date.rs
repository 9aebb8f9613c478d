//! Date values for date selectors.
//!
//! Relative values are resolved against an explicit `now`:
//! `today`, `yesterday`, `7d`, `2w`, `3m` (30-day months), `1y` (365-day years).
//! Absolute values: `2024`, `2024-01`, `2024-01-15`, `2024-01-15T10:30:00`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)([dwmy])$").expect("valid relative date regex"));

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})").expect("valid timestamp regex")
});

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid date regex"));

static MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("valid month regex"));

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid year regex"));

/// Formats tried when none of the recognized shapes match.
const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y/%m/%d %H:%M:%S"];
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Parse a date selector value into an instant.
///
/// Returns `None` for anything unrecognized; never panics.
pub fn parse_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }

    parse_relative(value, now).or_else(|| parse_absolute(value))
}

fn parse_relative(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if value.eq_ignore_ascii_case("today") {
        return start_of_day(now.date_naive());
    }
    if value.eq_ignore_ascii_case("yesterday") {
        let day = now.date_naive().pred_opt()?;
        return start_of_day(day);
    }

    let caps = RELATIVE.captures(value)?;
    let n: i64 = caps[1].parse().ok()?;
    let days = match caps[2].to_ascii_lowercase().as_str() {
        "d" => n,
        "w" => n.checked_mul(7)?,
        "m" => n.checked_mul(30)?,
        "y" => n.checked_mul(365)?,
        _ => return None,
    };
    now.checked_sub_signed(Duration::try_days(days)?)
}

fn parse_absolute(value: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = TIMESTAMP.captures(value) {
        // Full strings with an offset take precedence over the bare prefix.
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        let date = ymd(&caps[1], &caps[2], &caps[3])?;
        let time = NaiveTime::from_hms_opt(
            caps[4].parse().ok()?,
            caps[5].parse().ok()?,
            caps[6].parse().ok()?,
        )?;
        return Some(Utc.from_utc_datetime(&date.and_time(time)));
    }

    if let Some(caps) = FULL_DATE.captures(value) {
        return start_of_day(ymd(&caps[1], &caps[2], &caps[3])?);
    }
    if let Some(caps) = MONTH.captures(value) {
        return start_of_day(ymd(&caps[1], &caps[2], "01")?);
    }
    if let Some(caps) = YEAR.captures(value) {
        return start_of_day(ymd(&caps[1], "01", "01")?);
    }

    parse_fallback(value)
}

fn parse_fallback(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return start_of_day(date);
        }
    }
    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn now() -> DateTime<Utc> {
        at("2024-06-15T12:00:00Z")
    }

    #[test]
    fn test_full_date() {
        assert_eq!(parse_date("2024-01-15", now()), Some(at("2024-01-15T00:00:00Z")));
    }

    #[test]
    fn test_month_and_year() {
        assert_eq!(parse_date("2024-01", now()), Some(at("2024-01-01T00:00:00Z")));
        assert_eq!(parse_date("2024", now()), Some(at("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn test_timestamp_prefix() {
        assert_eq!(
            parse_date("2024-01-15T10:30:00", now()),
            Some(at("2024-01-15T10:30:00Z"))
        );
        assert_eq!(
            parse_date("2024-01-15T10:30:00+02:00", now()),
            Some(at("2024-01-15T08:30:00Z"))
        );
    }

    #[test]
    fn test_today_and_yesterday() {
        assert_eq!(parse_date("today", now()), Some(at("2024-06-15T00:00:00Z")));
        assert_eq!(parse_date("yesterday", now()), Some(at("2024-06-14T00:00:00Z")));
        assert_eq!(parse_date("TODAY", now()), parse_date("today", now()));
    }

    #[test]
    fn test_relative_units() {
        assert_eq!(parse_date("7d", now()), Some(now() - Duration::days(7)));
        assert_eq!(parse_date("2w", now()), Some(now() - Duration::days(14)));
        assert_eq!(parse_date("3m", now()), Some(now() - Duration::days(90)));
        assert_eq!(parse_date("1y", now()), Some(now() - Duration::days(365)));
        assert_eq!(parse_date("7D", now()), parse_date("7d", now()));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(parse_date("", now()), None);
        assert_eq!(parse_date("   ", now()), None);
        assert_eq!(parse_date("notadate", now()), None);
        assert_eq!(parse_date("2024-13-01", now()), None);
        assert_eq!(parse_date("invalid", now()), None);
    }

    #[test]
    fn test_huge_relative_value_does_not_overflow() {
        assert_eq!(parse_date("99999999999999999999d", now()), None);
        assert_eq!(parse_date("9999999999999y", now()), None);
    }

    #[test]
    fn test_fallback_formats() {
        assert_eq!(
            parse_date("2024/03/05", now()),
            Some(at("2024-03-05T00:00:00Z"))
        );
        assert_eq!(
            parse_date("March 5, 2024", now()),
            Some(at("2024-03-05T00:00:00Z"))
        );
    }
}
