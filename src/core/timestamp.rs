// Weblog Tail - core/timestamp.rs
//
// Wire timestamp decoding. The backend sends epoch milliseconds as JSON
// numbers; hand-written frames and other backends may send strings.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Naive formats tried (as UTC) after RFC 3339 fails.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

/// Interpret an epoch-milliseconds value.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Parse a textual timestamp.
///
/// Accepts RFC 3339, a plain integer of epoch milliseconds, or one of the
/// naive `YYYY-MM-DD HH:MM:SS` forms interpreted as UTC.
pub fn parse_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ms) = raw.parse::<i64>() {
        return from_millis(ms);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter for timestamp fields.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => from_millis(ms)
            .ok_or_else(|| D::Error::custom(format!("timestamp {ms} ms is out of range"))),
        RawTimestamp::FractionalMillis(ms) => {
            if !ms.is_finite() {
                return Err(D::Error::custom("timestamp is not a finite number"));
            }
            from_millis(ms.round() as i64)
                .ok_or_else(|| D::Error::custom(format!("timestamp {ms} ms is out of range")))
        }
        RawTimestamp::Text(s) => {
            parse_str(&s).ok_or_else(|| D::Error::custom(format!("unparseable timestamp '{s}'")))
        }
    }
}
