use serde_json::Value;

use crate::domain::query::model::api_dialect::PaginationProtocol;

pub const NEXT_TOKEN_FIELD: &str = "next_pagination_data";
pub const TOKEN_REQUEST_FIELD: &str = "pagination_data";
pub const PIT_FIELD: &str = "pit";
pub const SEARCH_AFTER_FIELD: &str = "search_after";

/// Continuation state returned by one page and echoed on the next request.
#[derive(Debug, Clone, PartialEq)]
pub enum PaginationCursor {
    Token(Value),
    PointInTime { pit: Value, search_after: Value },
}

impl PaginationCursor {
    /// Read the continuation of `protocol` from a page body.
    /// `None` means the server signalled the last page.
    pub fn from_response(protocol: PaginationProtocol, body: &Value) -> Option<Self> {
        match protocol {
            PaginationProtocol::Token => present(body, NEXT_TOKEN_FIELD)
                .map(|token| PaginationCursor::Token(token.clone())),
            PaginationProtocol::PointInTime => {
                let pit = present(body, PIT_FIELD)?;
                let search_after = present(body, SEARCH_AFTER_FIELD)?;
                Some(PaginationCursor::PointInTime {
                    pit: pit.clone(),
                    search_after: search_after.clone(),
                })
            }
        }
    }
}

fn present<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    body.get(field).filter(|v| !is_blank(v))
}

/// Falsy JSON: null, false, 0, "", [] and {} all end pagination.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
