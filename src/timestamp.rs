// Timestamp helpers shared by profiles and notifications.
//
// Documents written by older tooling carry naive ISO-8601 strings
// ("2024-05-01T09:30:00.123456") with no offset; those are read as UTC.
// Everything this crate writes is RFC 3339.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Next `updated_at` value: the current time, but never earlier than `previous`.
pub fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous)
}

/// Parse either an RFC 3339 timestamp or a naive ISO-8601 one (read as UTC).
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// serde `deserialize_with` adapter for [`parse`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2024-05-01T09:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 7);
    }

    #[test]
    fn test_parse_naive_iso_as_utc() {
        let dt = parse("2024-05-01T09:30:00.123456").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 9);
        assert_eq!(dt.timestamp_subsec_micros(), 123456);

        assert!(parse("2024-05-01 09:30:00").is_some());
        assert!(parse("yesterday").is_none());
    }

    #[test]
    fn test_touch_never_goes_backwards() {
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(touch(future), future);

        let past = Utc::now() - Duration::hours(1);
        assert!(touch(past) > past);
    }
}
