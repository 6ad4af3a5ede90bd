use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;

use super::field_coercion::coerce_field;
use super::normalized_table::{FieldValue, NormalizedRecord, NormalizedTable};
use super::program_resolver::{ProgramResolver, TagSource, PROGRAM_FIELD};
use super::raw_node::records_with_hints;

/// Turns any observed results shape into one flat, typed table.
#[derive(Debug, Clone, Default)]
pub struct ResultNormalizer {
    resolver: ProgramResolver,
}

impl ResultNormalizer {
    pub fn new(requested_programs: &[String]) -> Self {
        Self {
            resolver: ProgramResolver::new(requested_programs),
        }
    }

    /// Pure: the same input always yields the same table. Zero records gives
    /// an empty table, not an error.
    pub fn flatten(&self, raw: &Value) -> NormalizedTable {
        let pairs = records_with_hints(raw);
        let mut sources: HashMap<TagSource, usize> = HashMap::new();

        let records: Vec<NormalizedRecord> = pairs
            .into_iter()
            .map(|(hint, record)| {
                let (program, source) = self.resolver.resolve(record, hint);
                *sources.entry(source).or_default() += 1;

                let mut fields: BTreeMap<String, FieldValue> = record
                    .iter()
                    .filter(|(k, _)| k.as_str() != PROGRAM_FIELD)
                    .map(|(k, v)| (k.clone(), coerce_field(k, v)))
                    .collect();
                fields.insert(PROGRAM_FIELD.to_string(), FieldValue::Text(program));

                NormalizedRecord::new(fields)
            })
            .collect();

        debug!(records = records.len(), ?sources, "Normalized results");
        NormalizedTable::new(records)
    }
}

/// One-shot form of [`ResultNormalizer::flatten`].
pub fn flatten(raw: &Value, requested_programs: &[String]) -> NormalizedTable {
    ResultNormalizer::new(requested_programs).flatten(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Map};

    fn programs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Records as canonical JSON strings, sorted, for multiset comparison.
    fn multiset(table: &NormalizedTable) -> Vec<String> {
        let mut rows: Vec<String> = table.records().iter().map(|r| r.to_json().to_string()).collect();
        rows.sort();
        rows
    }

    #[test]
    fn end_to_end_single_page() {
        let raw = json!({
            "results": {
                "ping-test": [{
                    "probeId": "p1",
                    "avgLatency": "23.5",
                    "dateStart": "2024-01-01T00:00:00Z"
                }]
            }
        });

        let table = flatten(&raw, &programs(&["ping-test", "voice-out"]));

        assert_eq!(table.len(), 1);
        let r = &table.records()[0];
        assert_eq!(r.get("probeId"), Some(&FieldValue::Text("p1".into())));
        assert_eq!(r.get("avgLatency"), Some(&FieldValue::Float(23.5)));
        assert_eq!(
            r.get("dateStart"),
            Some(&FieldValue::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
        );
        assert_eq!(r.program(), "ping-test");
        assert_eq!(r.fields().len(), 4);
    }

    #[test]
    fn resolved_program_overwrites_source_field() {
        let raw = json!({ "cloud-upload": [{ "test": "cloud-download", "program": "stale" }] });
        let table = flatten(&raw, &[]);
        assert_eq!(table.records()[0].program(), "cloud-download");
        assert_eq!(table.records()[0].text("program").as_deref(), Some("cloud-download"));
    }

    #[test]
    fn precedence_through_the_normalizer() {
        let raw = json!({ "results": [
            { "test": "A", "program": "B" },
            { "rssi": -71 },
            { "speedDl": "10" }
        ]});

        let one = flatten(&raw, &programs(&["ping-test"]));
        let tags: Vec<&str> = one.records().iter().map(|r| r.program()).collect();
        assert_eq!(tags, vec!["A", "network", "ping-test"]);

        let many = flatten(&raw, &programs(&["ping-test", "youtube-test"]));
        assert_eq!(many.records()[2].program(), "unknown");
    }

    #[test]
    fn envelope_counters_do_not_swallow_program_lists() {
        let raw = json!({
            "results": {
                "ping-test": [{ "probeId": "p1", "avgLatency": "5" }],
                "total": 1
            }
        });
        let table = flatten(&raw, &programs(&["ping-test", "voice-out"]));

        assert_eq!(table.len(), 1);
        let r = &table.records()[0];
        assert_eq!(r.program(), "ping-test");
        assert_eq!(r.get("avgLatency"), Some(&FieldValue::Integer(5)));
        assert_eq!(r.text("probeId").as_deref(), Some("p1"));
        assert!(r.get("total").is_none());
    }

    #[test]
    fn failed_coercion_keeps_the_original_string() {
        let raw = json!({ "results": [{ "city": "Las Vegas", "latitude": "36,1699", "createdAt": "soon" }] });
        let table = flatten(&raw, &[]);
        let r = &table.records()[0];
        assert_eq!(r.get("city"), Some(&FieldValue::Text("Las Vegas".into())));
        assert_eq!(r.get("latitude"), Some(&FieldValue::Float(36.1699)));
        assert_eq!(r.get("createdAt"), Some(&FieldValue::Null));
    }

    #[test]
    fn empty_inputs_give_an_empty_table() {
        assert!(flatten(&json!({}), &[]).is_empty());
        assert!(flatten(&json!({ "results": [] }), &[]).is_empty());
        assert!(flatten(&json!({ "results": { "ping-test": [] } }), &[]).is_empty());
        assert!(flatten(&Value::Null, &[]).is_empty());
    }

    #[test]
    fn flatten_is_idempotent() {
        let raw = json!({
            "results": {
                "ping-test": [{ "probeId": "7", "avgLatency": "12,5", "dateStart": "2024-03-01 10:00:00" }],
                "network": [{ "rssi": "-80", "isp": "att_us" }]
            }
        });
        let normalizer = ResultNormalizer::new(&programs(&["ping-test"]));
        assert_eq!(normalizer.flatten(&raw), normalizer.flatten(&raw));
    }

    #[test]
    fn rewrapped_tables_flatten_back_to_the_same_records() {
        let raw = json!({
            "ping-test": [
                { "probeId": "p1", "avgLatency": "23.5", "dateStart": "2024-01-01T00:00:00Z" },
                { "probeId": "p2", "avgLatency": 40, "success": true }
            ],
            "network": [{ "rssi": -80, "probe": "p3", "tags": ["4g", "lte"] }],
            "voice-out": [{ "taskName": "call", "extra": { "mos": 4.1 }, "dateStart": null }]
        });
        let requested = programs(&["ping-test", "voice-out"]);
        let original = flatten(&raw, &requested);
        assert_eq!(original.len(), 4);

        let as_json: Vec<Value> = original.records().iter().map(NormalizedRecord::to_json).collect();

        let mut by_program: Map<String, Value> = Map::new();
        for r in original.records() {
            let bucket = by_program
                .entry(r.program().to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = bucket {
                items.push(r.to_json());
            }
        }

        let shapes = [
            json!({ "results": as_json }),
            Value::Object(by_program.clone()),
            json!({ "results": Value::Object(by_program) }),
        ];

        for shape in &shapes {
            assert_eq!(multiset(&flatten(shape, &requested)), multiset(&original));
        }
    }
}
