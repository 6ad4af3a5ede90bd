use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use crate::app_state::AppState;

/// One realtime refresh: re-query the trailing window and swap the table.
pub async fn run(state: &AppState) -> Result<()> {
    debug!("Running realtime refresh...");

    let outcome = state.query_service.run_realtime(Utc::now()).await?;
    info!(
        invocation = %outcome.invocation_id,
        records = outcome.records,
        pages = outcome.pages,
        committed = outcome.committed,
        "🔁 Realtime refresh finished"
    );
    Ok(())
}
