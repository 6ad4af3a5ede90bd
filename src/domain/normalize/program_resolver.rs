use serde::Serialize;
use serde_json::Value;

use super::raw_node::Record;

pub const PROGRAM_FIELD: &str = "program";
pub const UNKNOWN_PROGRAM: &str = "unknown";
pub const NETWORK_PROGRAM: &str = "network";

/// Which rule produced a program tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    TestField,
    ProgramField,
    TaskName,
    RssiPresent,
    ContainerKey,
    SoleRequested,
    Unknown,
}

/// Assigns a program tag to each record, first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct ProgramResolver {
    sole_requested: Option<String>,
}

impl ProgramResolver {
    pub fn new(requested: &[String]) -> Self {
        let mut distinct: Vec<&str> = Vec::new();
        for p in requested.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            if !distinct.contains(&p) {
                distinct.push(p);
            }
        }

        let sole_requested = match distinct.as_slice() {
            [only] => Some(only.to_string()),
            _ => None,
        };
        Self { sole_requested }
    }

    pub fn resolve(&self, record: &Record, hint: Option<&str>) -> (String, TagSource) {
        if let Some(tag) = tag_field(record, "test") {
            return (tag, TagSource::TestField);
        }
        if let Some(tag) = tag_field(record, PROGRAM_FIELD) {
            return (tag, TagSource::ProgramField);
        }
        if let Some(tag) = tag_field(record, "taskName") {
            return (tag, TagSource::TaskName);
        }
        if record.contains_key("rssi") {
            return (NETWORK_PROGRAM.to_string(), TagSource::RssiPresent);
        }
        if let Some(key) = hint.map(str::trim).filter(|k| !k.is_empty()) {
            return (key.to_string(), TagSource::ContainerKey);
        }
        if let Some(sole) = &self.sole_requested {
            return (sole.clone(), TagSource::SoleRequested);
        }
        (UNKNOWN_PROGRAM.to_string(), TagSource::Unknown)
    }
}

/// Blank values fall through to the next rule.
fn tag_field(record: &Record, field: &str) -> Option<String> {
    let tag = match record.get(field)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!tag.is_empty()).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(resolver: &ProgramResolver, record: Value, hint: Option<&str>) -> (String, TagSource) {
        let record = record.as_object().unwrap().clone();
        resolver.resolve(&record, hint)
    }

    #[test]
    fn precedence() {
        let many = ProgramResolver::new(&["ping-test".into(), "voice-out".into()]);
        let one = ProgramResolver::new(&["ping-test".into()]);

        assert_eq!(
            resolve(&many, json!({ "test": "A", "program": "B" }), Some("C")),
            ("A".into(), TagSource::TestField)
        );
        assert_eq!(resolve(&many, json!({ "program": "B", "taskName": "T" }), None).0, "B");
        assert_eq!(resolve(&many, json!({ "taskName": "T", "rssi": -70 }), None).0, "T");
        assert_eq!(
            resolve(&many, json!({ "rssi": -70 }), Some("cloud-upload")),
            ("network".into(), TagSource::RssiPresent)
        );
        assert_eq!(
            resolve(&many, json!({ "x": 1 }), Some("cloud-upload")),
            ("cloud-upload".into(), TagSource::ContainerKey)
        );
        assert_eq!(
            resolve(&one, json!({ "x": 1 }), None),
            ("ping-test".into(), TagSource::SoleRequested)
        );
        assert_eq!(resolve(&many, json!({ "x": 1 }), None), ("unknown".into(), TagSource::Unknown));
    }

    #[test]
    fn blank_tags_fall_through() {
        let resolver = ProgramResolver::new(&[]);
        assert_eq!(
            resolve(&resolver, json!({ "test": "  ", "program": "" }), Some("voice-out")).0,
            "voice-out"
        );
        assert_eq!(resolve(&resolver, json!({ "test": null }), Some(" ")).0, "unknown");
    }

    #[test]
    fn duplicate_requests_count_as_one_program() {
        let resolver = ProgramResolver::new(&["ping-test".into(), " ping-test ".into()]);
        assert_eq!(resolve(&resolver, json!({}), None).0, "ping-test");
    }
}
