use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::field_coercion::instant_from_epoch;
use super::program_resolver::{PROGRAM_FIELD, UNKNOWN_PROGRAM};
use crate::domain::query::model::probe_ids::{coerce_probe_id, coerce_probe_text};

/// Probe id columns seen across API versions, in lookup order.
pub const PROBE_FIELDS: [&str; 4] = ["probe", "probe_id", "probeId", "probes_id"];
pub const TIME_FIELDS: [&str; 4] = ["dateStart", "timestamp", "createdAt", "datetime"];
pub const ISP_FIELDS: [&str; 4] = ["isp", "ISP", "provider", "network"];

/// One typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Instant(DateTime<Utc>),
    /// Arrays and objects are carried through untouched.
    Nested(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Plain-text rendering for labels and ids; `None` for null and nested.
    pub fn as_label(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Instant(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::Null | FieldValue::Nested(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Instant(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::Nested(v) => v.clone(),
        }
    }
}

/// A flat record: source fields plus the resolved `program`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl NormalizedRecord {
    pub(crate) fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn program(&self) -> &str {
        match self.fields.get(PROGRAM_FIELD) {
            Some(FieldValue::Text(p)) => p.as_str(),
            _ => UNKNOWN_PROGRAM,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(FieldValue::as_label)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    /// Instant value of `field`; integer epochs are accepted too.
    pub fn instant(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.get(field)? {
            FieldValue::Instant(dt) => Some(*dt),
            FieldValue::Integer(epoch) => instant_from_epoch(*epoch),
            _ => None,
        }
    }

    /// First probe id candidate that holds a usable id.
    pub fn probe_id(&self) -> Option<String> {
        PROBE_FIELDS.iter().find_map(|f| match self.get(f)? {
            FieldValue::Text(s) => coerce_probe_text(s),
            other => coerce_probe_id(&other.to_json()),
        })
    }

    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        TIME_FIELDS.iter().find_map(|f| self.instant(f))
    }

    pub fn isp(&self) -> Option<String> {
        ISP_FIELDS
            .iter()
            .find_map(|f| self.text(f).filter(|s| !s.trim().is_empty()))
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

/// Output of one normalization, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedTable {
    records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Distinct program tags in first-seen order.
    pub fn programs(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for r in &self.records {
            let p = r.program();
            if !seen.iter().any(|s: &String| s == p) {
                seen.push(p.to_string());
            }
        }
        seen
    }

    /// Union of field names, sorted.
    pub fn columns(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.records.iter().flat_map(|r| r.fields.keys()).collect();
        set.into_iter().cloned().collect()
    }

    /// First of `candidates` present on any record.
    pub fn detect_column(&self, candidates: &[&'static str]) -> Option<&'static str> {
        candidates
            .iter()
            .copied()
            .find(|c| self.records.iter().any(|r| r.fields.contains_key(*c)))
    }

    pub fn filter_program<'a>(&'a self, program: &'a str) -> impl Iterator<Item = &'a NormalizedRecord> + 'a {
        self.records.iter().filter(move |r| r.program() == program)
    }
}
