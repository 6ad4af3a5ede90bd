//! Query controller: runs the results pipeline and serves the current table

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use validator::Validate;

use crate::api::dto::kpi_dto::KpiQueryDto;
use crate::api::dto::table_dto::{TableQuery, TableView};
use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::core::state::runtime::session::session_runtime_state::SessionSummary;
use crate::domain::metric::kpi_series::KpiSeries;
use crate::domain::query::dto::query_request::QueryRequest;
use crate::domain::query::service::query_service::QueryOutcome;
use crate::errors::AppError;

pub struct QueryController;

impl QueryController {
    pub async fn run_query(
        State(state): State<AppState>,
        Json(payload): Json<QueryRequest>,
    ) -> Result<Json<ApiResponse<QueryOutcome>>, AppError> {
        to_json(state.query_service.run_query(payload).await)
    }

    pub async fn run_realtime(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<QueryOutcome>>, AppError> {
        to_json(state.query_service.run_realtime(Utc::now()).await)
    }

    pub async fn get_table(
        State(state): State<AppState>,
        Query(query): Query<TableQuery>,
    ) -> Result<Json<ApiResponse<TableView>>, AppError> {
        to_json(state.query_service.table_page(query).await)
    }

    pub async fn get_kpi(
        State(state): State<AppState>,
        Query(query): Query<KpiQueryDto>,
    ) -> Result<Json<ApiResponse<Vec<KpiSeries>>>, AppError> {
        query.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;
        to_json(state.query_service.kpi(query.into()).await)
    }

    pub async fn get_session(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<SessionSummary>>, AppError> {
        to_json(state.query_service.session_summary().await)
    }
}
