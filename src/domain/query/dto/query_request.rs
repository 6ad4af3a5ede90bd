use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::domain::query::model::operator_zone::OperatorZone;
use crate::domain::query::model::probe_ids::coerce_probe_ids;
use crate::domain::query::model::query_window::QueryWindow;
use crate::errors::PipelineError;

/// Body of `POST /query`. The window is given one of three ways: epoch
/// milliseconds, local date-times in a zone, or a trailing hour count.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct QueryRequest {
    pub ts_start: Option<i64>,
    pub ts_end: Option<i64>,

    pub start_local: Option<NaiveDateTime>,
    pub end_local: Option<NaiveDateTime>,
    /// IANA name or UTC offset; overrides the configured zone for
    /// `start_local`/`end_local`.
    #[serde(alias = "utc_offset")]
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,

    #[validate(range(min = 1, max = 168))]
    pub last_hours: Option<u32>,

    /// Defaults to the configured program set.
    #[validate(length(min = 1))]
    pub programs: Option<Vec<String>>,

    /// Probe ids as strings or numbers; defaults to the configured list.
    pub probes: Option<Vec<Value>>,
}

impl QueryRequest {
    pub fn window(&self, default_zone: OperatorZone, now: DateTime<Utc>) -> Result<QueryWindow, PipelineError> {
        match (self.ts_start, self.ts_end) {
            (Some(start), Some(end)) => return QueryWindow::new(start, end),
            (None, None) => {}
            _ => {
                return Err(PipelineError::Config(
                    "ts_start and ts_end must be given together".into(),
                ))
            }
        }

        match (self.start_local, self.end_local) {
            (Some(start), Some(end)) => {
                let zone = match &self.timezone {
                    Some(raw) => raw
                        .parse::<OperatorZone>()
                        .map_err(|e| PipelineError::Config(e.to_string()))?,
                    None => default_zone,
                };
                return QueryWindow::from_local(start, end, zone);
            }
            (None, None) => {}
            _ => {
                return Err(PipelineError::Config(
                    "start_local and end_local must be given together".into(),
                ))
            }
        }

        match self.last_hours {
            Some(hours) => QueryWindow::trailing_hours(now, hours),
            None => Err(PipelineError::Config(
                "a query window is required (ts_start/ts_end, start_local/end_local or last_hours)".into(),
            )),
        }
    }

    /// Requested probes after coercion, or `None` to use the configured list.
    pub fn probe_ids(&self) -> Option<Vec<String>> {
        self.probes.as_ref().map(|p| coerce_probe_ids(p.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc() -> OperatorZone {
        OperatorZone::default()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn epoch_window() {
        let req: QueryRequest = serde_json::from_value(json!({ "ts_start": 1, "ts_end": 2 })).unwrap();
        assert_eq!(req.window(utc(), now()).unwrap(), QueryWindow::new(1, 2).unwrap());
    }

    #[test]
    fn local_window_uses_request_offset() {
        let req: QueryRequest = serde_json::from_value(json!({
            "start_local": "2024-01-01T00:00:00",
            "end_local": "2024-01-01T06:00:00",
            "utc_offset": "-05:00"
        }))
        .unwrap();
        let window = req.window(utc(), now()).unwrap();
        assert_eq!(window.start_ms(), 1_704_085_200_000);
    }

    #[test]
    fn local_window_uses_request_zone_name() {
        let req: QueryRequest = serde_json::from_value(json!({
            "start_local": "2024-07-01T00:00:00",
            "end_local": "2024-07-01T06:00:00",
            "timezone": "America/Chicago"
        }))
        .unwrap();
        // CDT, UTC-5
        assert_eq!(req.window(utc(), now()).unwrap().start_ms(), 1_719_810_000_000);

        let bad = QueryRequest { timezone: Some("Nowhere/City".into()), ..req };
        assert!(matches!(bad.window(utc(), now()), Err(PipelineError::Config(_))));
    }

    #[test]
    fn trailing_window_and_errors() {
        let req = QueryRequest { last_hours: Some(6), ..Default::default() };
        let window = req.window(utc(), now()).unwrap();
        assert_eq!(window.end_ms() - window.start_ms(), 6 * 3_600_000);

        let half = QueryRequest { ts_start: Some(1), ..Default::default() };
        assert!(matches!(half.window(utc(), now()), Err(PipelineError::Config(_))));
        assert!(QueryRequest::default().window(utc(), now()).is_err());

        let inverted = QueryRequest { ts_start: Some(5), ts_end: Some(5), ..Default::default() };
        assert!(inverted.window(utc(), now()).is_err());
    }

    #[test]
    fn validation_limits() {
        let too_long = QueryRequest { last_hours: Some(500), ..Default::default() };
        assert!(too_long.validate().is_err());

        let empty_programs = QueryRequest { programs: Some(vec![]), ..Default::default() };
        assert!(empty_programs.validate().is_err());
    }

    #[test]
    fn probes_are_coerced() {
        let req: QueryRequest = serde_json::from_value(json!({ "probes": [101, "102", 103.0, null, " "] })).unwrap();
        assert_eq!(req.probe_ids().unwrap(), vec!["101", "102", "103"]);
    }
}
