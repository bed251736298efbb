//! Coarse "how long ago" labels for timestamps.
//!
//! `now` is always passed in; nothing here reads the wall clock.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "count", rename_all = "lowercase")]
pub enum AgeBucket {
    /// Under one hour. Future timestamps clamp here too.
    LessThanHour,
    Hours(i64),
    Days(i64),
}

/// Bucket the whole hours elapsed between `timestamp` and `now`.
pub fn age_bucket(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> AgeBucket {
    let hours = now.signed_duration_since(timestamp).num_hours();
    if hours < 1 {
        AgeBucket::LessThanHour
    } else if hours < 24 {
        AgeBucket::Hours(hours)
    } else {
        AgeBucket::Days(hours / 24)
    }
}

pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    age_bucket(timestamp, now).to_string()
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeBucket::LessThanHour => f.write_str("less than 1 hour ago"),
            AgeBucket::Hours(1) => f.write_str("1 hour ago"),
            AgeBucket::Hours(n) => write!(f, "{} hours ago", n),
            AgeBucket::Days(1) => f.write_str("1 day ago"),
            AgeBucket::Days(n) => write!(f, "{} days ago", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn age(elapsed: Duration) -> String {
        format_age(now() - elapsed, now())
    }

    #[test]
    fn test_under_an_hour() {
        assert_eq!(age(Duration::zero()), "less than 1 hour ago");
        assert_eq!(age(Duration::minutes(30)), "less than 1 hour ago");
        assert_eq!(age(Duration::seconds(3599)), "less than 1 hour ago");
    }

    #[test]
    fn test_exactly_one_hour_is_hours_bucket() {
        assert_eq!(age_bucket(now() - Duration::seconds(3600), now()), AgeBucket::Hours(1));
        assert_eq!(age(Duration::hours(1)), "1 hour ago");
    }

    #[test]
    fn test_hours_are_floored() {
        assert_eq!(age(Duration::minutes(150)), "2 hours ago");
        assert_eq!(age(Duration::hours(23) + Duration::minutes(59)), "23 hours ago");
    }

    #[test]
    fn test_exactly_one_day_is_days_bucket() {
        assert_eq!(age_bucket(now() - Duration::hours(24), now()), AgeBucket::Days(1));
        assert_eq!(age(Duration::hours(24)), "1 day ago");
        assert_eq!(age(Duration::hours(25)), "1 day ago");
    }

    #[test]
    fn test_days_pluralized() {
        assert_eq!(age(Duration::hours(48)), "2 days ago");
        assert_eq!(age(Duration::hours(47)), "1 day ago");
        assert_eq!(age(Duration::days(10)), "10 days ago");
    }

    #[test]
    fn test_future_timestamp_clamps() {
        assert_eq!(
            age_bucket(now() + Duration::hours(5), now()),
            AgeBucket::LessThanHour
        );
        assert_eq!(format_age(now() + Duration::days(3), now()), "less than 1 hour ago");
    }
}
