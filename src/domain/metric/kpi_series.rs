use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::normalize::normalized_table::NormalizedTable;
use crate::domain::probe::probe_status::isp_display_name;

pub const DEFAULT_BUCKET_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Max,
    Min,
    Count,
}

impl Aggregation {
    fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Count => values.len() as f64,
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" | "" => Ok(Aggregation::Mean),
            "max" => Ok(Aggregation::Max),
            "min" => Ok(Aggregation::Min),
            "count" => Ok(Aggregation::Count),
            other => Err(format!("unknown aggregation '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KpiQuery {
    /// Numeric metric, e.g. `speedDl` or `avgLatency`.
    pub field: String,
    pub program: Option<String>,
    pub bucket_minutes: u32,
    pub aggregation: Aggregation,
}

impl KpiQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            program: None,
            bucket_minutes: DEFAULT_BUCKET_MINUTES,
            aggregation: Aggregation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiPoint {
    pub bucket_start: DateTime<Utc>,
    pub value: f64,
    pub samples: usize,
}

/// One line of a KPI chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSeries {
    pub isp: String,
    pub points: Vec<KpiPoint>,
}

/// Per-ISP time series of `query.field`, bucketed on the report time.
/// Records missing the metric, the ISP or a report time are left out, and so
/// are empty buckets.
pub fn kpi_series(table: &NormalizedTable, query: &KpiQuery) -> Vec<KpiSeries> {
    let bucket_secs = i64::from(query.bucket_minutes.max(1)) * 60;
    let mut grouped: BTreeMap<String, BTreeMap<i64, Vec<f64>>> = BTreeMap::new();

    for record in table.records() {
        if let Some(program) = &query.program {
            if record.program() != program {
                continue;
            }
        }
        let (Some(value), Some(isp), Some(at)) =
            (record.number(&query.field), record.isp(), record.reported_at())
        else {
            continue;
        };

        let bucket = at.timestamp().div_euclid(bucket_secs) * bucket_secs;
        grouped
            .entry(isp_display_name(&isp))
            .or_default()
            .entry(bucket)
            .or_default()
            .push(value);
    }

    grouped
        .into_iter()
        .map(|(isp, buckets)| KpiSeries {
            isp,
            points: buckets
                .into_iter()
                .filter_map(|(start, values)| {
                    Some(KpiPoint {
                        bucket_start: DateTime::from_timestamp(start, 0)?,
                        value: query.aggregation.apply(&values),
                        samples: values.len(),
                    })
                })
                .collect(),
        })
        .collect()
}
