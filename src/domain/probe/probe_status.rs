use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::normalize::normalized_table::{NormalizedRecord, NormalizedTable};

/// A probe is online when its latest report is at most this old.
pub const ONLINE_THRESHOLD_MINUTES: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeState {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeStatusRow {
    pub probe_id: String,
    pub isp: Option<String>,
    pub last_report: DateTime<Utc>,
    pub minutes_since: i64,
    pub status: ProbeState,
}

/// Display name for an operator code; unknown codes pass through.
pub fn isp_display_name(raw: &str) -> String {
    match raw.trim() {
        "att_us" => "AT&T".to_string(),
        "t-mobile_us" => "T-Mobile".to_string(),
        "verizon_wireless_us" => "Verizon".to_string(),
        other => other.to_string(),
    }
}

pub fn classify(last_report: DateTime<Utc>, now: DateTime<Utc>) -> ProbeState {
    if now - last_report <= Duration::minutes(ONLINE_THRESHOLD_MINUTES) {
        ProbeState::Online
    } else {
        ProbeState::Offline
    }
}

/// Latest record per probe, classified against `now`. Records missing a
/// probe id or a parseable report time are ignored.
pub fn derive_probe_status(table: &NormalizedTable, now: DateTime<Utc>) -> Vec<ProbeStatusRow> {
    let mut latest: HashMap<String, (DateTime<Utc>, &NormalizedRecord)> = HashMap::new();

    for record in table.records() {
        let (Some(probe), Some(at)) = (record.probe_id(), record.reported_at()) else {
            continue;
        };
        // ties go to the later record
        let newer = latest.get(&probe).map_or(true, |(seen, _)| at >= *seen);
        if newer {
            latest.insert(probe, (at, record));
        }
    }

    let mut rows: Vec<ProbeStatusRow> = latest
        .into_iter()
        .map(|(probe_id, (at, record))| ProbeStatusRow {
            probe_id,
            isp: record.isp().map(|isp| isp_display_name(&isp)),
            last_report: at,
            minutes_since: (now - at).num_minutes(),
            status: classify(at, now),
        })
        .collect();

    rows.sort_by(|a, b| {
        (a.status != ProbeState::Online)
            .cmp(&(b.status != ProbeState::Online))
            .then(b.last_report.cmp(&a.last_report))
            .then(a.probe_id.cmp(&b.probe_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::result_normalizer::flatten;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn stamp(minutes_ago: i64) -> String {
        (now() - Duration::minutes(minutes_ago)).to_rfc3339()
    }

    #[test]
    fn threshold_is_inclusive() {
        let table = flatten(
            &json!({ "results": [
                { "probeId": "a", "dateStart": stamp(19) },
                { "probeId": "b", "dateStart": stamp(20) },
                { "probeId": "c", "dateStart": stamp(21) },
            ]}),
            &[],
        );

        let rows = derive_probe_status(&table, now());
        let status: Vec<(&str, ProbeState)> = rows.iter().map(|r| (r.probe_id.as_str(), r.status)).collect();
        assert_eq!(
            status,
            vec![
                ("a", ProbeState::Online),
                ("b", ProbeState::Online),
                ("c", ProbeState::Offline),
            ]
        );
        assert_eq!(rows[2].minutes_since, 21);
    }

    #[test]
    fn keeps_latest_record_and_maps_isp() {
        let table = flatten(
            &json!({ "results": [
                { "probeId": "1", "dateStart": stamp(90), "isp": "verizon_wireless_us" },
                { "probeId": "1", "dateStart": stamp(5), "isp": "att_us" },
                { "probeId": "1", "dateStart": stamp(60), "isp": "t-mobile_us" },
                { "probeId": "2", "dateStart": stamp(300), "isp": "claro_co" },
                { "probeId": "3", "dateStart": "garbage" },
                { "dateStart": stamp(1) },
            ]}),
            &[],
        );

        let rows = derive_probe_status(&table, now());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].probe_id, "1");
        assert_eq!(rows[0].isp.as_deref(), Some("AT&T"));
        assert_eq!(rows[0].status, ProbeState::Online);
        assert_eq!(rows[1].probe_id, "2");
        assert_eq!(rows[1].isp.as_deref(), Some("claro_co"));
        assert_eq!(rows[1].status, ProbeState::Offline);
    }

    #[test]
    fn offline_probes_sort_newest_first() {
        let table = flatten(
            &json!({ "results": [
                { "probe": 10, "timestamp": stamp(500) },
                { "probe": 11, "timestamp": stamp(50) },
                { "probe": 12, "timestamp": stamp(2) },
            ]}),
            &[],
        );

        let ids: Vec<String> = derive_probe_status(&table, now()).into_iter().map(|r| r.probe_id).collect();
        assert_eq!(ids, vec!["12", "11", "10"]);
    }

    #[test]
    fn display_names() {
        assert_eq!(isp_display_name("att_us"), "AT&T");
        assert_eq!(isp_display_name("t-mobile_us"), "T-Mobile");
        assert_eq!(isp_display_name("verizon_wireless_us"), "Verizon");
        assert_eq!(isp_display_name("other"), "other");
    }
}
