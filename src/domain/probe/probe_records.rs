use std::cmp::Reverse;

use serde::Serialize;

use super::probe_status::isp_display_name;
use crate::domain::normalize::normalized_table::{NormalizedRecord, NormalizedTable};

/// All records of one probe, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeGroup {
    pub probe_id: String,
    /// ISP label of the most recent record that carries one.
    pub isp: Option<String>,
    pub records: Vec<NormalizedRecord>,
}

/// One probe's records. Those without a report time sink to the end in
/// encounter order.
pub fn records_for_probe(table: &NormalizedTable, probe_id: &str) -> Option<ProbeGroup> {
    let wanted = probe_id.trim();
    let records: Vec<&NormalizedRecord> = table
        .records()
        .iter()
        .filter(|r| r.probe_id().as_deref() == Some(wanted))
        .collect();

    if records.is_empty() {
        return None;
    }
    Some(build_group(wanted.to_string(), records))
}

fn build_group(probe_id: String, mut records: Vec<&NormalizedRecord>) -> ProbeGroup {
    // stable sort keeps encounter order among equal timestamps
    records.sort_by_key(|r| Reverse(r.reported_at()));

    let isp = records
        .iter()
        .find_map(|r| r.isp())
        .map(|isp| isp_display_name(&isp));

    ProbeGroup {
        probe_id,
        isp,
        records: records.into_iter().cloned().collect(),
    }
}
