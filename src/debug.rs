use chrono::Utc;
use tracing::{error, info};

use crate::app_state::AppState;

/// Runs only when in MEDUX_DEBUG_MODE: one realtime query, a summary, then exit.
pub async fn run_debug(state: &AppState) {
    info!("🔧 Debug mode: running one realtime query...");

    match state.query_service.run_realtime(Utc::now()).await {
        Ok(outcome) => {
            info!(
                "Fetched {} records in {} page(s) ({:?}) with dialect {}",
                outcome.records, outcome.pages, outcome.stop, outcome.dialect
            );
            info!("Programs present: {:?}", outcome.programs);

            if let Ok(rows) = state.query_service.probe_status(Utc::now()).await {
                for row in rows {
                    info!(
                        "probe {} | {} | {} | {:?}",
                        row.probe_id,
                        row.isp.as_deref().unwrap_or("-"),
                        row.last_report,
                        row.status
                    );
                }
            }
        }
        Err(e) => error!(?e, "Debug query failed"),
    }

    info!("Debug tasks completed. Exiting...");
}
