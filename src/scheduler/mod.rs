pub mod tasks;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::app_state::AppState;

/// Spawn the realtime refresh loop. Returns `None` when refresh is disabled.
pub fn start_scheduler(state: AppState) -> Option<JoinHandle<()>> {
    let every = state.config.refresh_interval?;
    info!("⏱️ Realtime refresh every {}s", every.as_secs());
    Some(tokio::spawn(refresh_loop(state, every)))
}

async fn refresh_loop(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // a slow fetch must not trigger a burst of catch-up runs
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(e) = tasks::refresh::task::run(&state).await {
            error!(?e, "Realtime refresh failed");
        }
    }
}
