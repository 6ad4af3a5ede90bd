//! System controller: connects routes to system usecases

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::api::dto::ApiResponse;
use crate::api::util::json::to_json;
use crate::app_state::AppState;
use crate::domain::system::service::status_service;
use crate::errors::AppError;

pub struct SystemController;

impl SystemController {
    pub async fn status(
        State(state): State<AppState>,
    ) -> Result<Json<ApiResponse<Value>>, AppError> {
        let session = state.query_service.session_summary().await?;
        to_json(status_service::status(&state.config, session).await)
    }

    pub async fn health() -> Result<Json<ApiResponse<Value>>, AppError> {
        to_json(status_service::health().await)
    }
}
