use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Bucket for pages whose `results` is a bare list with no program breakdown.
pub const NETWORK_BUCKET: &str = "network";

/// Raw records gathered across pages, keyed by the program label the API used.
///
/// Order is preserved within a bucket; buckets themselves are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawAccumulated {
    buckets: BTreeMap<String, Vec<Value>>,
}

impl RawAccumulated {
    pub fn extend<I>(&mut self, program: &str, records: I) -> usize
    where
        I: IntoIterator<Item = Value>,
    {
        let bucket = self.buckets.entry(program.to_string()).or_default();
        let before = bucket.len();
        bucket.extend(records);
        bucket.len() - before
    }

    pub fn total_records(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    pub fn buckets(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.buckets
    }

    /// Dict-of-lists JSON, the shape the normalizer expects first.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .buckets
            .iter()
            .map(|(program, records)| (program.clone(), Value::Array(records.clone())))
            .collect();
        Value::Object(map)
    }
}
