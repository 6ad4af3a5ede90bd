use serde_json::{Map, Value};

pub const RESULTS_FIELD: &str = "results";

pub type Record = Map<String, Value>;

/// Shape of one node in a results payload.
#[derive(Debug, PartialEq)]
pub enum RawNode<'a> {
    /// A measurement record.
    Leaf(&'a Record),
    List(Vec<RawNode<'a>>),
    /// Container whose keys are program labels.
    Keyed(Vec<(&'a str, RawNode<'a>)>),
    /// Scalars and empty objects carry no records.
    Skip,
}

impl<'a> RawNode<'a> {
    /// An object is a container when it has a `results` key, when one of its
    /// values is a list of records (or an empty list), or when it is non-empty
    /// and every value is a list or object. Anything else is a record.
    ///
    /// Inside a container, scalars are envelope metadata and are skipped. Next
    /// to record lists, a plain object (e.g. a `summary`) is skipped as well.
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => RawNode::List(items.iter().map(RawNode::classify).collect()),
            Value::Object(map) => {
                if let Some(inner) = map.get(RESULTS_FIELD) {
                    return RawNode::classify(inner);
                }
                if map.is_empty() {
                    return RawNode::Skip;
                }

                let has_record_list = map.values().any(is_record_list);
                let all_nested = map.values().all(|v| v.is_array() || v.is_object());
                if !has_record_list && !all_nested {
                    return RawNode::Leaf(map);
                }

                let entries = map
                    .iter()
                    .filter_map(|(k, v)| {
                        if !(v.is_array() || v.is_object()) {
                            return None;
                        }
                        let node = RawNode::classify(v);
                        if has_record_list && v.is_object() && matches!(node, RawNode::Leaf(_)) {
                            return None;
                        }
                        Some((k.as_str(), node))
                    })
                    .collect();
                RawNode::Keyed(entries)
            }
            _ => RawNode::Skip,
        }
    }

    /// Flatten into `(program_hint, record)` pairs in encounter order. The
    /// nearest enclosing key wins over an outer one.
    pub fn collect(&self, hint: Option<&'a str>, out: &mut Vec<(Option<&'a str>, &'a Record)>) {
        match self {
            RawNode::Leaf(record) => out.push((hint, record)),
            RawNode::List(items) => {
                for item in items {
                    item.collect(hint, out);
                }
            }
            RawNode::Keyed(entries) => {
                for (key, node) in entries {
                    node.collect(Some(key), out);
                }
            }
            RawNode::Skip => {}
        }
    }
}

fn is_record_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty() || items.iter().any(Value::is_object),
        _ => false,
    }
}

/// Every record reachable from `value`, tagged with its nearest container key.
pub fn records_with_hints(value: &Value) -> Vec<(Option<&str>, &Record)> {
    let mut out = Vec::new();
    RawNode::classify(value).collect(None, &mut out);
    out
}
