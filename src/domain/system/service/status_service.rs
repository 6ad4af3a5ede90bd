use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};

use crate::core::config::app_config::AppConfig;
use crate::core::state::runtime::session::session_runtime_state::SessionSummary;

pub async fn health() -> Result<Value> {
    Ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "time": Utc::now(),
    }))
}

/// Effective configuration (token masked) alongside the session summary.
pub async fn status(cfg: &AppConfig, session: SessionSummary) -> Result<Value> {
    Ok(json!({
        "api_url": cfg.api_url,
        "token": cfg.token.masked(),
        "probes": cfg.probes.len(),
        "programs": cfg.programs,
        "program_field": cfg.program_field,
        "pagination": cfg.pagination,
        "page_size": cfg.page_size,
        "page_cap": cfg.page_cap,
        "page_delay_ms": cfg.page_delay.as_millis() as u64,
        "timezone": cfg.timezone,
        "realtime_hours": cfg.realtime_hours,
        "refresh_secs": cfg.refresh_interval.map(|d| d.as_secs()),
        "session": session,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::runtime::session::session_runtime_state::SessionRuntimeState;

    #[tokio::test]
    async fn status_never_leaks_the_token() {
        let cfg = AppConfig::from_lookup(|key| match key {
            "MEDUX_TOKEN" => Some("super-secret-token-1234".to_string()),
            "MEDUX_PROBES" => Some("1,2,3".to_string()),
            _ => None,
        })
        .unwrap();

        let value = status(&cfg, SessionRuntimeState::default().summary()).await.unwrap();
        assert_eq!(value["token"], "***1234");
        assert_eq!(value["probes"], 3);
        assert!(!value.to_string().contains("super-secret"));
        assert_eq!(value["session"]["records"], 0);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        assert_eq!(health().await.unwrap()["status"], "ok");
    }
}
