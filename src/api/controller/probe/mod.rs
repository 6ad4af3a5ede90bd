//! Probe controller: status and per-probe records derived from the current table

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::domain::probe::probe_records::ProbeGroup;
use crate::domain::probe::probe_status::ProbeStatusRow;
use crate::errors::AppError;

pub struct ProbeController;

impl ProbeController {
    pub async fn get_status(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Vec<ProbeStatusRow>>>, AppError> {
        to_json(state.query_service.probe_status(Utc::now()).await)
    }

    pub async fn get_records(
        State(state): State<AppState>,
        Path(probe_id): Path<String>,
    ) -> Result<Json<ApiResponse<ProbeGroup>>, AppError> {
        to_json(state.query_service.probe_records(&probe_id).await)
    }
}
