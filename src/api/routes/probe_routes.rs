//! Probe routes (e.g., /api/v1/probes/*)

use axum::{routing::get, Router};
use crate::api::controller::probe::ProbeController;
use crate::app_state::AppState;

pub fn probe_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(ProbeController::get_status))
        .route("/{probe_id}/records", get(ProbeController::get_records))
}
