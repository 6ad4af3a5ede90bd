use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::fetch_progress::FetchProgress;
use super::pagination_cursor::PaginationCursor;
use super::raw_accumulated::{RawAccumulated, NETWORK_BUCKET};
use crate::core::client::results_transport::ResultsTransport;
use crate::domain::query::model::query_spec::QuerySpec;
use crate::domain::query::query_builder::QueryBuilder;
use crate::errors::PipelineError;

/// Guard against a server that never stops handing out cursors.
pub const DEFAULT_PAGE_CAP: usize = 100;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub page_cap: usize,
    /// Courtesy pause between requests; zero disables it.
    pub page_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_cap: DEFAULT_PAGE_CAP,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Why a successful run stopped paginating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    Complete,
    PageCap { cap: usize },
    /// The page could not be interpreted; earlier pages are kept.
    ProtocolViolation { page: usize, message: String },
}

impl StopReason {
    pub fn is_truncated(&self) -> bool {
        !matches!(self, StopReason::Complete)
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub accumulated: RawAccumulated,
    /// Requests issued, including a skipped final page.
    pub pages: usize,
    pub records: usize,
    pub stop: StopReason,
}

/// Sequential page walker over one [`ResultsTransport`].
pub struct PagedFetcher<'a, T: ResultsTransport + ?Sized> {
    transport: &'a T,
    builder: QueryBuilder,
    settings: FetchSettings,
}

impl<'a, T: ResultsTransport + ?Sized> PagedFetcher<'a, T> {
    pub fn new(transport: &'a T, builder: QueryBuilder, settings: FetchSettings) -> Self {
        Self {
            transport,
            builder,
            settings,
        }
    }

    /// Download every page of `spec`. Each request is awaited before the next
    /// one is built; the first non-success status aborts the whole run.
    pub async fn fetch_all(
        &self,
        spec: &QuerySpec,
        progress: &mut dyn FetchProgress,
    ) -> Result<FetchOutcome, PipelineError> {
        let protocol = self.builder.dialect().pagination;
        let page_cap = self.settings.page_cap.max(1);
        let mut accumulated = RawAccumulated::default();
        let mut cursor: Option<PaginationCursor> = None;
        let mut page = 0usize;

        let stop = loop {
            page += 1;
            progress.page_requested(page);

            let request = self.builder.build(spec, cursor.as_ref());
            let payload = serde_json::to_value(&request).map_err(|e| PipelineError::Protocol {
                page,
                message: format!("failed to encode request: {e}"),
            })?;

            debug!(page, dialect = %self.builder.dialect(), "Requesting results page");
            let response = self
                .transport
                .post_page(&payload)
                .await
                .map_err(|source| PipelineError::Network { page, source })?;

            if !response.is_success() {
                return Err(PipelineError::from_status(response.status, page, &response.body));
            }

            let body: Value = serde_json::from_str(&response.body).map_err(|e| {
                PipelineError::Protocol {
                    page,
                    message: format!("response is not valid JSON: {e}"),
                }
            })?;

            match absorb_page(&mut accumulated, &body) {
                Ok(page_records) => {
                    progress.page_done(page, page_records, accumulated.total_records());
                }
                Err(message) => {
                    warn!(page, "Skipping page: {}", message);
                    break StopReason::ProtocolViolation { page, message };
                }
            }

            cursor = PaginationCursor::from_response(protocol, &body);
            if cursor.is_none() {
                break StopReason::Complete;
            }

            if page >= page_cap {
                warn!(page_cap, "Reached the maximum page count; stopping pagination");
                break StopReason::PageCap { cap: page_cap };
            }

            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        };

        let outcome = FetchOutcome {
            records: accumulated.total_records(),
            accumulated,
            pages: page,
            stop,
        };
        progress.finished(&outcome);
        Ok(outcome)
    }
}

/// Merge one page's `results` into the accumulator and return how many records
/// it contributed. `Err` describes a page whose shape cannot be used.
fn absorb_page(accumulated: &mut RawAccumulated, body: &Value) -> Result<usize, String> {
    let Some(object) = body.as_object() else {
        return Err(format!("expected a JSON object, got {}", kind_of(body)));
    };

    match object.get("results") {
        None | Some(Value::Null) => Err("response has no `results` field".to_string()),
        Some(Value::Array(records)) => Ok(accumulated.extend(NETWORK_BUCKET, records.iter().cloned())),
        Some(Value::Object(by_program)) => {
            let mut added = 0;
            for (program, records) in by_program {
                match records {
                    Value::Array(items) => added += accumulated.extend(program, items.iter().cloned()),
                    other => debug!(
                        program = %program,
                        "Ignoring non-list results entry ({})",
                        kind_of(other)
                    ),
                }
            }
            Ok(added)
        }
        Some(other) => Err(format!("unrecognized `results` shape: {}", kind_of(other))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
