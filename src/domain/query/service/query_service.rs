use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::paginated_response::PaginatedResponse;
use crate::api::dto::table_dto::{TableQuery, TableView, DEFAULT_TABLE_LIMIT};
use crate::core::client::results_transport::ResultsTransport;
use crate::core::config::app_config::AppConfig;
use crate::core::state::runtime::session::session_runtime_state::{QuerySnapshot, SessionSummary};
use crate::core::state::runtime::session::session_runtime_state_manager::SessionRuntimeStateManager;
use crate::core::state::runtime::session::session_runtime_state_repository::SessionRuntimeStateRepository;
use crate::domain::fetch::fetch_progress::TracingProgress;
use crate::domain::fetch::paged_fetcher::{FetchOutcome, FetchSettings, PagedFetcher, StopReason};
use crate::domain::metric::kpi_series::{kpi_series, KpiQuery, KpiSeries};
use crate::domain::normalize::normalized_table::{NormalizedTable, ISP_FIELDS, PROBE_FIELDS, TIME_FIELDS};
use crate::domain::normalize::result_normalizer::ResultNormalizer;
use crate::domain::probe::probe_records::{records_for_probe, ProbeGroup};
use crate::domain::probe::probe_status::{derive_probe_status, ProbeStatusRow};
use crate::domain::query::dto::query_request::QueryRequest;
use crate::domain::query::model::api_dialect::{ApiDialect, PaginationProtocol, ProgramFieldSelection};
use crate::domain::query::model::operator_zone::OperatorZone;
use crate::domain::query::model::query_spec::QuerySpec;
use crate::domain::query::model::query_window::QueryWindow;
use crate::domain::query::query_builder::QueryBuilder;
use crate::errors::{PipelineError, SessionError};

pub type SessionManager = SessionRuntimeStateManager<SessionRuntimeStateRepository>;

/// The subset of [`AppConfig`] a query run needs.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub program_field: ProgramFieldSelection,
    pub pagination: PaginationProtocol,
    pub page_size: Option<u32>,
    pub fetch: FetchSettings,
    pub programs: Vec<String>,
    pub probes: Vec<String>,
    pub realtime_hours: u32,
    pub timezone: OperatorZone,
}

impl QuerySettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            program_field: cfg.program_field,
            pagination: cfg.pagination,
            page_size: cfg.page_size,
            fetch: cfg.fetch_settings(),
            programs: cfg.programs.clone(),
            probes: cfg.probes.clone(),
            realtime_hours: cfg.realtime_hours,
            timezone: cfg.timezone,
        }
    }
}

/// What one invocation produced, as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub invocation_id: Uuid,
    /// `false` when a newer invocation began first and this result was dropped.
    pub committed: bool,
    pub records: usize,
    pub pages: usize,
    pub empty_result: bool,
    pub stop: StopReason,
    pub dialect: ApiDialect,
    pub programs: Vec<String>,
    pub window: String,
}

/// Runs build → fetch → normalize and serves views of the committed table.
pub struct QueryService {
    transport: Arc<dyn ResultsTransport>,
    session: Arc<SessionManager>,
    settings: QuerySettings,
}

impl QueryService {
    pub fn new(transport: Arc<dyn ResultsTransport>, session: Arc<SessionManager>, settings: QuerySettings) -> Self {
        Self {
            transport,
            session,
            settings,
        }
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub async fn run_query(&self, req: QueryRequest) -> Result<QueryOutcome> {
        req.validate()?;

        let window = req.window(self.settings.timezone, Utc::now())?;
        let programs = req.programs.clone().unwrap_or_else(|| self.settings.programs.clone());
        let probes = req.probe_ids().unwrap_or_else(|| self.settings.probes.clone());

        Ok(self.run(QuerySpec::new(window, programs, probes)).await?)
    }

    /// Trailing-window query with the configured programs and probes.
    pub async fn run_realtime(&self, now: DateTime<Utc>) -> Result<QueryOutcome> {
        let window = QueryWindow::trailing_hours(now, self.settings.realtime_hours)?;
        let spec = QuerySpec::new(window, self.settings.programs.clone(), self.settings.probes.clone());
        Ok(self.run(spec).await?)
    }

    pub async fn run(&self, spec: QuerySpec) -> Result<QueryOutcome, PipelineError> {
        if let Err(e) = spec.validate() {
            self.session.record_failure(e.to_string()).await;
            return Err(e);
        }

        let invocation_id = self.session.begin_invocation().await;
        let window = spec.window.describe(self.settings.timezone);
        info!(
            invocation = %invocation_id,
            programs = spec.programs.len(),
            probes = spec.probe_ids.len(),
            "🔎 Querying results for {}",
            window
        );

        let (fetched, table, dialect) = match self.execute(&spec, invocation_id).await {
            Ok(done) => done,
            Err(e) => {
                error!(?e, invocation = %invocation_id, "Query failed; keeping the previous table");
                self.session.record_failure(e.to_string()).await;
                return Err(e);
            }
        };

        if table.is_empty() {
            info!(invocation = %invocation_id, "No records returned for the selected window");
        }

        let outcome = QueryOutcome {
            invocation_id,
            committed: false,
            records: table.len(),
            pages: fetched.pages,
            empty_result: table.is_empty(),
            stop: fetched.stop.clone(),
            dialect,
            programs: table.programs(),
            window,
        };

        let committed = self
            .session
            .commit(QuerySnapshot {
                invocation_id,
                spec,
                dialect,
                table: Arc::new(table),
                pages: fetched.pages,
                stop: fetched.stop,
                fetched_at: Utc::now(),
            })
            .await;

        if !committed {
            warn!(invocation = %invocation_id, "Superseded by a newer query; result discarded");
        }

        Ok(QueryOutcome { committed, ..outcome })
    }

    /// Fetch with each candidate program field until one yields records,
    /// then normalize.
    async fn execute(
        &self,
        spec: &QuerySpec,
        invocation_id: Uuid,
    ) -> Result<(FetchOutcome, NormalizedTable, ApiDialect), PipelineError> {
        let cached = self.session.cached_program_field().await;
        let candidates = self.settings.program_field.candidates(cached);
        let probing = candidates.len() > 1;
        let mut last: Option<(FetchOutcome, ApiDialect)> = None;

        for (i, field) in candidates.iter().copied().enumerate() {
            let dialect = ApiDialect::new(field, self.settings.pagination);
            let fetcher = PagedFetcher::new(
                self.transport.as_ref(),
                QueryBuilder::new(dialect, self.settings.page_size),
                self.settings.fetch.clone(),
            );

            let mut progress = TracingProgress::new(invocation_id);
            let fetched = match fetcher.fetch_all(spec, &mut progress).await {
                Ok(fetched) => fetched,
                Err(e) if probing && e.is_request_rejected() && i + 1 < candidates.len() => {
                    warn!(
                        error = %e,
                        "Endpoint rejected the '{}' field; retrying with '{}'",
                        field.wire_name(),
                        candidates[i + 1].wire_name()
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            if fetched.records > 0 {
                if self.settings.program_field.is_auto() && cached != Some(field) {
                    info!("Program field '{}' returned data; using it for this session", field.wire_name());
                    self.session.cache_program_field(field).await;
                }
                last = Some((fetched, dialect));
                break;
            }

            if let Some(next) = candidates.get(i + 1) {
                info!(
                    "No data with '{}' field; retrying with '{}'",
                    field.wire_name(),
                    next.wire_name()
                );
            }
            last = Some((fetched, dialect));
        }

        let (fetched, dialect) =
            last.ok_or_else(|| PipelineError::Config("no program field to query with".into()))?;
        let table = ResultNormalizer::new(&spec.programs).flatten(&fetched.accumulated.to_value());

        Ok((fetched, table, dialect))
    }

    async fn snapshot(&self) -> Result<Arc<QuerySnapshot>> {
        self.session
            .current()
            .await
            .ok_or_else(|| SessionError::NoSnapshot.into())
    }

    pub async fn table_page(&self, q: TableQuery) -> Result<TableView> {
        q.validate()?;
        let snap = self.snapshot().await?;
        let table = &snap.table;

        let limit = q.limit.unwrap_or(DEFAULT_TABLE_LIMIT);
        let offset = q.offset.unwrap_or(0);
        let page = match q.program.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(program) => {
                let rows: Vec<_> = table.filter_program(program).cloned().collect();
                PaginatedResponse::from_slice(&rows, limit, offset)
            }
            None => PaginatedResponse::from_slice(table.records(), limit, offset),
        };

        Ok(TableView {
            invocation_id: snap.invocation_id,
            fetched_at: snap.fetched_at,
            stop: snap.stop.clone(),
            programs: table.programs(),
            columns: table.columns(),
            probe_column: table.detect_column(&PROBE_FIELDS),
            time_column: table.detect_column(&TIME_FIELDS),
            isp_column: table.detect_column(&ISP_FIELDS),
            page,
        })
    }

    pub async fn probe_status(&self, now: DateTime<Utc>) -> Result<Vec<ProbeStatusRow>> {
        let snap = self.snapshot().await?;
        Ok(derive_probe_status(&snap.table, now))
    }

    pub async fn probe_records(&self, probe_id: &str) -> Result<ProbeGroup> {
        let snap = self.snapshot().await?;
        records_for_probe(&snap.table, probe_id)
            .ok_or_else(|| SessionError::ProbeNotFound(probe_id.to_string()).into())
    }

    pub async fn kpi(&self, query: KpiQuery) -> Result<Vec<KpiSeries>> {
        let snap = self.snapshot().await?;
        Ok(kpi_series(&snap.table, &query))
    }

    pub async fn session_summary(&self) -> Result<SessionSummary> {
        Ok(self.session.summary().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::results_transport::{TransportError, TransportResponse};
    use crate::domain::query::model::api_dialect::ProgramField;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;

    type Responder = Box<dyn Fn(&Value) -> TransportResponse + Send + Sync>;

    /// Answers each request with a function of its payload.
    struct FnTransport {
        respond: Mutex<Responder>,
        sent: Mutex<Vec<Value>>,
    }

    impl FnTransport {
        fn new(respond: impl Fn(&Value) -> TransportResponse + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                respond: Mutex::new(Box::new(respond)),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn replace(&self, respond: impl Fn(&Value) -> TransportResponse + Send + Sync + 'static) {
            *self.respond.lock().unwrap() = Box::new(respond);
        }

        fn sent(&self) -> Vec<Value> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultsTransport for FnTransport {
        async fn post_page(&self, payload: &Value) -> Result<TransportResponse, TransportError> {
            self.sent.lock().unwrap().push(payload.clone());
            let respond = self.respond.lock().unwrap();
            Ok(respond(payload))
        }
    }

    fn ok(body: Value) -> TransportResponse {
        TransportResponse { status: 200, body: body.to_string() }
    }

    fn settings(program_field: ProgramFieldSelection) -> QuerySettings {
        QuerySettings {
            program_field,
            pagination: PaginationProtocol::Token,
            page_size: None,
            fetch: FetchSettings { page_cap: 10, page_delay: Duration::ZERO },
            programs: vec!["ping-test".into()],
            probes: vec!["p1".into()],
            realtime_hours: 8,
            timezone: OperatorZone::default(),
        }
    }

    fn service(transport: Arc<FnTransport>, program_field: ProgramFieldSelection) -> QueryService {
        let session = Arc::new(SessionManager::new(SessionRuntimeStateRepository::new().shared()));
        QueryService::new(transport, session, settings(program_field))
    }

    fn ping_page() -> Value {
        json!({ "results": { "ping-test": [
            { "probeId": "p1", "avgLatency": "20.5", "dateStart": "2024-01-01T00:00:00Z", "isp": "att_us" },
            { "probeId": "p1", "avgLatency": "30", "dateStart": "2024-01-01T00:10:00Z", "isp": "att_us" }
        ]}})
    }

    #[tokio::test]
    async fn successful_run_commits_the_table() {
        let transport = FnTransport::new(|_| ok(ping_page()));
        let svc = service(transport.clone(), ProgramFieldSelection::Fixed(ProgramField::Programs));

        let outcome = svc.run_realtime(Utc::now()).await.unwrap();
        assert!(outcome.committed);
        assert_eq!(outcome.records, 2);
        assert_eq!(outcome.stop, StopReason::Complete);
        assert_eq!(transport.sent()[0]["programs"], json!(["ping-test"]));

        let view = svc.table_page(TableQuery { limit: Some(1), ..Default::default() }).await.unwrap();
        assert_eq!(view.page.total, 2);
        assert_eq!(view.page.items.len(), 1);
        assert_eq!(view.probe_column, Some("probeId"));
        assert_eq!(view.time_column, Some("dateStart"));
    }

    #[tokio::test]
    async fn auto_field_falls_back_to_tests_and_caches_it() {
        let transport = FnTransport::new(|payload| {
            if payload.get("tests").is_some() {
                ok(ping_page())
            } else {
                ok(json!({ "results": {} }))
            }
        });
        let svc = service(transport.clone(), ProgramFieldSelection::Auto);

        let outcome = svc.run_realtime(Utc::now()).await.unwrap();
        assert_eq!(outcome.dialect.program_field, ProgramField::Tests);
        assert_eq!(outcome.records, 2);
        assert_eq!(transport.sent().len(), 2);

        svc.run_realtime(Utc::now()).await.unwrap();
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent[2].get("tests").is_some());
        assert_eq!(
            svc.session_summary().await.unwrap().cached_program_field,
            Some(ProgramField::Tests)
        );
    }

    #[tokio::test]
    async fn auto_field_moves_on_when_programs_is_refused() {
        let transport = FnTransport::new(|payload| {
            if payload.get("programs").is_some() {
                TransportResponse { status: 400, body: "unknown field `programs`".into() }
            } else {
                ok(ping_page())
            }
        });
        let svc = service(transport.clone(), ProgramFieldSelection::Auto);

        let outcome = svc.run_realtime(Utc::now()).await.unwrap();
        assert_eq!(outcome.dialect.program_field, ProgramField::Tests);
        assert_eq!(outcome.records, 2);
        assert_eq!(
            svc.session_summary().await.unwrap().cached_program_field,
            Some(ProgramField::Tests)
        );
    }

    #[tokio::test]
    async fn refusal_of_every_field_is_reported() {
        let transport = FnTransport::new(|_| TransportResponse { status: 400, body: "bad request".into() });
        let svc = service(transport.clone(), ProgramFieldSelection::Auto);

        let err = svc.run_realtime(Utc::now()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Server { status: 400, .. })
        ));
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn failed_run_keeps_previous_table() {
        let transport = FnTransport::new(|_| ok(ping_page()));
        let svc = service(transport.clone(), ProgramFieldSelection::Fixed(ProgramField::Programs));
        let first = svc.run_realtime(Utc::now()).await.unwrap();

        transport.replace(|_| TransportResponse { status: 500, body: "boom".into() });
        let err = svc.run_realtime(Utc::now()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Server { status: 500, .. })
        ));

        let summary = svc.session_summary().await.unwrap();
        assert_eq!(summary.current_invocation, Some(first.invocation_id));
        assert_eq!(summary.records, 2);
        assert!(summary.last_error_message.is_some());
    }

    #[tokio::test]
    async fn empty_probe_list_fails_before_any_request() {
        let transport = FnTransport::new(|_| ok(ping_page()));
        let svc = service(transport.clone(), ProgramFieldSelection::Auto);

        let req = QueryRequest {
            last_hours: Some(1),
            probes: Some(vec![Value::Null]),
            ..Default::default()
        };
        let err = svc.run_query(req).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::Config(_))));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn request_overrides_programs_and_probes() {
        let transport = FnTransport::new(|_| ok(json!({ "results": [] })));
        let svc = service(transport.clone(), ProgramFieldSelection::Fixed(ProgramField::Programs));

        let req = QueryRequest {
            ts_start: Some(1_000),
            ts_end: Some(2_000),
            programs: Some(vec!["voice-out".into()]),
            probes: Some(vec![json!(7), json!("8")]),
            ..Default::default()
        };
        let outcome = svc.run_query(req).await.unwrap();
        assert!(outcome.empty_result);
        assert!(outcome.committed);

        let sent = &transport.sent()[0];
        assert_eq!(sent["programs"], json!(["voice-out"]));
        assert_eq!(sent["probes"], json!(["7", "8"]));
        assert_eq!(sent["tsStart"], json!(1_000));
    }

    #[tokio::test]
    async fn views_need_a_completed_query() {
        let transport = FnTransport::new(|_| ok(ping_page()));
        let svc = service(transport, ProgramFieldSelection::Fixed(ProgramField::Programs));

        let err = svc.probe_status(Utc::now()).await.unwrap_err();
        assert!(err.downcast_ref::<SessionError>().is_some());

        svc.run_realtime(Utc::now()).await.unwrap();
        let rows = svc.probe_status(Utc::now()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].isp.as_deref(), Some("AT&T"));

        let group = svc.probe_records("p1").await.unwrap();
        assert_eq!(group.records.len(), 2);
        assert!(svc.probe_records("nope").await.is_err());

        let series = svc.kpi(KpiQuery::new("avgLatency")).await.unwrap();
        assert_eq!(series[0].points.len(), 2);
    }
}
