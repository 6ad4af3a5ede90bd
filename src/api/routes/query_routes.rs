//! Query routes (e.g., /api/v1/query, /api/v1/table)

use axum::{routing::{get, post}, Router};
use crate::api::controller::query::QueryController;
use crate::app_state::AppState;

pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(QueryController::run_query))
        .route("/query/realtime", post(QueryController::run_realtime))
        .route("/table", get(QueryController::get_table))
        .route("/kpi", get(QueryController::get_kpi))
        .route("/session", get(QueryController::get_session))
}
