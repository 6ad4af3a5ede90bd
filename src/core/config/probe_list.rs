use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::domain::query::model::probe_ids::coerce_probe_text;

/// Column the probe inventory export uses for ids.
pub const PROBE_ID_COLUMN: &str = "probes_id";

/// Read probe ids from a CSV with a `probes_id` header. Blank and NaN cells
/// are dropped; order is kept and duplicates are not removed.
pub fn parse_probe_csv<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers().context("Failed to read probe CSV header")?.clone();
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == PROBE_ID_COLUMN)
        .ok_or_else(|| anyhow!("Probe CSV has no '{}' column", PROBE_ID_COLUMN))?;

    let mut probes = Vec::new();
    for row in csv.records() {
        let row = row.context("Malformed probe CSV row")?;
        if let Some(id) = row.get(column).and_then(coerce_probe_text) {
            probes.push(id);
        }
    }
    Ok(probes)
}

/// Comma separated list, as given in `MEDUX_PROBES` or `MEDUX_PROGRAMS`.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Probe ids from the inline list, or else the CSV file. Both absent yields an
/// empty list; callers decide whether that is fatal.
pub fn load_probes(inline: Option<&str>, file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(raw) = inline {
        let probes: Vec<String> = parse_list(raw).iter().filter_map(|p| coerce_probe_text(p)).collect();
        if !probes.is_empty() {
            return Ok(probes);
        }
    }

    match file {
        Some(path) => {
            let f = std::fs::File::open(path)
                .with_context(|| format!("Failed to open probe file {}", path.display()))?;
            let probes = parse_probe_csv(f)?;
            info!("Loaded {} probe(s) from {}", probes.len(), path.display());
            Ok(probes)
        }
        None => Ok(Vec::new()),
    }
}
