use serde::Serialize;
use serde_json::Value;

use crate::domain::fetch::pagination_cursor::PaginationCursor;
use crate::domain::query::model::api_dialect::{ApiDialect, PaginationProtocol, ProgramField};
use crate::domain::query::model::query_spec::QuerySpec;

pub const RAW_FORMAT: &str = "raw";
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Body of a POST to the results endpoint.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsRequest {
    #[serde(rename = "tsStart")]
    pub ts_start: i64,
    #[serde(rename = "tsEnd")]
    pub ts_end: i64,
    pub format: &'static str,
    pub programs: Option<Vec<String>>,
    pub tests: Option<Vec<String>>,
    pub probes: Vec<String>,
    pub paginate: Option<bool>,
    pub size: Option<u32>,
    pub pagination_data: Option<Value>,
    pub pit: Option<Value>,
    pub search_after: Option<Value>,
}

/// Pure payload construction for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    dialect: ApiDialect,
    page_size: Option<u32>,
}

impl QueryBuilder {
    pub fn new(dialect: ApiDialect, page_size: Option<u32>) -> Self {
        Self { dialect, page_size }
    }

    pub fn dialect(&self) -> ApiDialect {
        self.dialect
    }

    pub fn build(&self, spec: &QuerySpec, cursor: Option<&PaginationCursor>) -> ResultsRequest {
        let programs = spec.programs.clone();
        let (programs, tests) = match self.dialect.program_field {
            ProgramField::Programs => (Some(programs), None),
            ProgramField::Tests => (None, Some(programs)),
        };

        let mut request = ResultsRequest {
            ts_start: spec.window.start_ms(),
            ts_end: spec.window.end_ms(),
            format: RAW_FORMAT,
            programs,
            tests,
            probes: spec.probe_ids.clone(),
            paginate: None,
            size: self.page_size,
            pagination_data: None,
            pit: None,
            search_after: None,
        };

        if self.dialect.pagination == PaginationProtocol::PointInTime {
            request.paginate = Some(true);
        }

        match cursor {
            Some(PaginationCursor::Token(token)) => {
                request.pagination_data = Some(token.clone());
            }
            Some(PaginationCursor::PointInTime { pit, search_after }) => {
                request.pit = Some(pit.clone());
                request.search_after = Some(search_after.clone());
            }
            None => {}
        }

        request
    }
}
