use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::normalized_table::FieldValue;

/// Fields that identify a probe, program or row. Kept verbatim even when they
/// look numeric, so `"0042"` never turns into `42`.
pub const IDENTITY_FIELDS: [&str; 8] = [
    "probe",
    "probe_id",
    "probeId",
    "probes_id",
    "program",
    "test",
    "taskName",
    "id",
];

const TIME_MARKERS: [&str; 4] = ["date", "time", "timestamp", "created"];

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

pub fn is_identity_field(name: &str) -> bool {
    IDENTITY_FIELDS.contains(&name)
}

/// Case-insensitive match on date/time/timestamp/created.
pub fn is_time_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    TIME_MARKERS.iter().any(|m| lower.contains(m))
}

/// Best-effort numeric reading of a string. A single decimal comma with no
/// dot is read as a decimal point (`"4,6097"` → 4.6097).
pub fn parse_number(raw: &str) -> Option<FieldValue> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let normalized;
    let s = if s.matches(',').count() == 1 && !s.contains('.') {
        normalized = s.replace(',', ".");
        normalized.as_str()
    } else {
        s
    };

    if !s.chars().any(|c| c.is_ascii_digit())
        || !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }

    if !s.contains(['.', 'e', 'E']) {
        if let Ok(i) = s.parse::<i64>() {
            return Some(FieldValue::Integer(i));
        }
    }

    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(FieldValue::Float)
}

/// Parse a textual timestamp. Values without an offset are taken as UTC;
/// bare 10–13 digit strings are epoch seconds or milliseconds.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if (10..=13).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(instant_from_epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Epoch value in seconds or milliseconds, told apart by magnitude.
pub fn instant_from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.abs() >= 100_000_000_000 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// Integers with 10 to 13 digits, the same range accepted as epoch text.
const EPOCH_RANGE: std::ops::Range<i64> = 1_000_000_000..10_000_000_000_000;

/// Type one raw field value according to its name.
pub fn coerce_field(name: &str, value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) if EPOCH_RANGE.contains(&i) && is_time_field(name) && !is_identity_field(name) => {
                instant_from_epoch(i).map(FieldValue::Instant).unwrap_or(FieldValue::Integer(i))
            }
            Some(i) => FieldValue::Integer(i),
            None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
        },
        Value::String(s) => coerce_text(name, s),
        Value::Array(_) | Value::Object(_) => FieldValue::Nested(value.clone()),
    }
}

fn coerce_text(name: &str, s: &str) -> FieldValue {
    if is_identity_field(name) {
        return FieldValue::Text(s.to_string());
    }

    if is_time_field(name) {
        // Durations such as `responseTime: "12"` still match the name test.
        return parse_instant(s)
            .map(FieldValue::Instant)
            .or_else(|| parse_number(s))
            .unwrap_or(FieldValue::Null);
    }

    parse_number(s).unwrap_or_else(|| FieldValue::Text(s.to_string()))
}
