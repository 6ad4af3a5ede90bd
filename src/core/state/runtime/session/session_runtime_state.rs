use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::fetch::paged_fetcher::StopReason;
use crate::domain::normalize::normalized_table::NormalizedTable;
use crate::domain::query::model::api_dialect::{ApiDialect, ProgramField};
use crate::domain::query::model::query_spec::QuerySpec;

/// Result of one successful invocation. Immutable once committed.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub invocation_id: Uuid,
    pub spec: QuerySpec,
    pub dialect: ApiDialect,
    pub table: Arc<NormalizedTable>,
    pub pages: usize,
    pub stop: StopReason,
    pub fetched_at: DateTime<Utc>,
}

impl QuerySnapshot {
    /// Zero records is a valid outcome, reported separately from failure.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// In-memory session state for the display layer.
///
/// - lives only in memory (NOT persisted)
/// - `current` is replaced wholesale, never merged
/// - only the most recently begun invocation may commit
#[derive(Debug, Clone, Default)]
pub struct SessionRuntimeState {
    pub latest_invocation: Option<Uuid>,
    pub current: Option<Arc<QuerySnapshot>>,

    /// Program field that produced data under `auto` selection.
    pub cached_program_field: Option<ProgramField>,

    pub invocations_started: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}

impl SessionRuntimeState {
    pub fn begin(&mut self, invocation_id: Uuid) {
        self.latest_invocation = Some(invocation_id);
        self.invocations_started += 1;
    }

    /// Swap in `snapshot` if its invocation is still the latest. Returns
    /// whether the swap happened.
    pub fn commit(&mut self, snapshot: QuerySnapshot) -> bool {
        if self.latest_invocation != Some(snapshot.invocation_id) {
            return false;
        }
        self.last_success_at = Some(snapshot.fetched_at);
        self.last_error_at = None;
        self.last_error_message = None;
        self.current = Some(Arc::new(snapshot));
        true
    }

    /// Record a failure; the current snapshot stays as it was.
    pub fn mark_error(&mut self, msg: String) {
        self.last_error_message = Some(msg);
        self.last_error_at = Some(Utc::now());
    }

    pub fn summary(&self) -> SessionSummary {
        let current = self.current.as_deref();
        SessionSummary {
            latest_invocation: self.latest_invocation,
            current_invocation: current.map(|s| s.invocation_id),
            invocations_started: self.invocations_started,
            records: current.map(|s| s.table.len()).unwrap_or(0),
            pages: current.map(|s| s.pages).unwrap_or(0),
            empty_result: current.map(QuerySnapshot::is_empty).unwrap_or(false),
            programs: current.map(|s| s.table.programs()).unwrap_or_default(),
            window_start_ms: current.map(|s| s.spec.window.start_ms()),
            window_end_ms: current.map(|s| s.spec.window.end_ms()),
            stop: current.map(|s| s.stop.clone()),
            dialect: current.map(|s| s.dialect),
            cached_program_field: self.cached_program_field,
            fetched_at: current.map(|s| s.fetched_at),
            last_error_at: self.last_error_at,
            last_error_message: self.last_error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub latest_invocation: Option<Uuid>,
    pub current_invocation: Option<Uuid>,
    pub invocations_started: u64,
    pub records: usize,
    pub pages: usize,
    pub empty_result: bool,
    pub programs: Vec<String>,
    pub window_start_ms: Option<i64>,
    pub window_end_ms: Option<i64>,
    pub stop: Option<StopReason>,
    pub dialect: Option<ApiDialect>,
    pub cached_program_field: Option<ProgramField>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
}
