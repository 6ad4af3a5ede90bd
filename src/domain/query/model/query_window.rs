use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;

use super::operator_zone::OperatorZone;

use crate::errors::PipelineError;

/// Time range of one results query, in epoch milliseconds over UTC.
///
/// Operators compose windows in their local zone; the zone is applied once
/// here so everything past this point works on UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryWindow {
    start_ms: i64,
    end_ms: i64,
}

impl QueryWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, PipelineError> {
        if start_ms >= end_ms {
            return Err(PipelineError::Config(format!(
                "query window start ({start_ms}) must be before its end ({end_ms})"
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    pub fn from_instants(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PipelineError> {
        Self::new(start.timestamp_millis(), end.timestamp_millis())
    }

    /// Build a window from wall-clock times in the operator's zone.
    pub fn from_local(
        start: NaiveDateTime,
        end: NaiveDateTime,
        zone: OperatorZone,
    ) -> Result<Self, PipelineError> {
        Self::from_instants(localize(start, zone)?, localize(end, zone)?)
    }

    /// Realtime mode: the trailing `hours` ending at `now`.
    pub fn trailing_hours(now: DateTime<Utc>, hours: u32) -> Result<Self, PipelineError> {
        Self::from_instants(now - Duration::hours(i64::from(hours)), now)
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_ms)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.end_ms)
    }

    /// `start → end` rendered in the given zone, for logs and status output.
    pub fn describe(&self, zone: OperatorZone) -> String {
        let fmt = |dt: Option<DateTime<Utc>>| {
            dt.map(|d| zone.format(d, "%Y-%m-%d %H:%M:%S"))
                .unwrap_or_else(|| "?".to_string())
        };
        format!("{} → {} ({})", fmt(self.start()), fmt(self.end()), zone)
    }
}

fn localize(naive: NaiveDateTime, zone: OperatorZone) -> Result<DateTime<Utc>, PipelineError> {
    zone.to_utc(naive)
        .ok_or_else(|| PipelineError::Config(format!("local time {naive} does not exist in {zone}")))
}
