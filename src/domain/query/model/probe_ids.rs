use serde_json::Value;

/// Turn one probe identifier from a JSON list or CSV cell into the string the
/// API expects. Nulls, NaNs and blanks are dropped.
pub fn coerce_probe_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => coerce_probe_text(s),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().and_then(format_float_id)
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Text form of [`coerce_probe_id`]; CSV readers hand us strings only.
pub fn coerce_probe_text(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() || is_missing_marker(s) {
        return None;
    }

    // Spreadsheet exports turn integer ids into "12345.0" once a column holds a gap.
    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            if let Some(id) = format_float_id(f) {
                return Some(id);
            }
        }
    }

    Some(s.to_string())
}

pub fn coerce_probe_ids<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().filter_map(coerce_probe_id).collect()
}

fn format_float_id(f: f64) -> Option<String> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(format!("{}", f as i64))
    } else {
        Some(f.to_string())
    }
}

fn is_missing_marker(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "nan" | "null" | "none" | "na" | "n/a"
    )
}
