use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

/// Zone operators type wall-clock windows in. Named zones follow DST; a fixed
/// offset is kept for hosts that only know `-05:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for OperatorZone {
    fn default() -> Self {
        OperatorZone::Named(chrono_tz::UTC)
    }
}

impl OperatorZone {
    /// Earliest instant for a wall-clock time; `None` inside a DST gap.
    pub fn to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            OperatorZone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            OperatorZone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn format(&self, instant: DateTime<Utc>, pattern: &str) -> String {
        match self {
            OperatorZone::Named(tz) => instant.with_timezone(tz).format(pattern).to_string(),
            OperatorZone::Fixed(offset) => instant.with_timezone(offset).format(pattern).to_string(),
        }
    }
}

impl fmt::Display for OperatorZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorZone::Named(tz) => f.write_str(tz.name()),
            OperatorZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl Serialize for OperatorZone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for OperatorZone {
    type Err = anyhow::Error;

    /// IANA names (`America/Los_Angeles`), `UTC`, or an offset.
    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
            return Ok(OperatorZone::default());
        }
        if let Ok(tz) = raw.parse::<Tz>() {
            return Ok(OperatorZone::Named(tz));
        }
        parse_utc_offset(raw).map(OperatorZone::Fixed)
    }
}

/// Accepts `+05:30`, `-05:00`, `-0500` or whole hours such as `-5`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        // unsigned only for whole hours
        Some(c) if c.is_ascii_digit() && raw.len() <= 2 => (1, raw),
        _ => return Err(anyhow!("Unrecognized timezone or UTC offset: {}", raw)),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("Unrecognized timezone or UTC offset: {}", raw));
    }

    let (hours, minutes): (i32, i32) = match digits.len() {
        1 | 2 => (digits.parse()?, 0),
        4 => (digits[..2].parse()?, digits[2..].parse()?),
        _ => return Err(anyhow!("Unrecognized UTC offset: {}", raw)),
    };
    if minutes >= 60 {
        return Err(anyhow!("UTC offset minutes out of range: {}", raw));
    }

    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .and_then(|secs| FixedOffset::east_opt(sign * secs))
        .ok_or_else(|| anyhow!("UTC offset out of range: {}", raw))
}
