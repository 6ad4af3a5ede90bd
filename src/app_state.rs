use std::sync::Arc;

use anyhow::Result;

use crate::core::client::medux_client::MeduxClient;
use crate::core::client::results_transport::ResultsTransport;
use crate::core::config::app_config::AppConfig;
use crate::core::state::runtime::session::session_runtime_state_repository::SessionRuntimeStateRepository;
use crate::domain::query::service::query_service::{QueryService, QuerySettings, SessionManager};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub query_service: Arc<QueryService>,
}

/// Wire the reqwest transport and a fresh session store.
pub fn build_app_state(config: AppConfig) -> Result<AppState> {
    let client = MeduxClient::new(config.api_url.clone(), config.token.clone(), config.http_timeout)?;
    Ok(build_app_state_with_transport(config, Arc::new(client)))
}

pub fn build_app_state_with_transport(config: AppConfig, transport: Arc<dyn ResultsTransport>) -> AppState {
    let session = Arc::new(SessionManager::new(SessionRuntimeStateRepository::new().shared()));
    let query_service = QueryService::new(transport, session, QuerySettings::from_config(&config));

    AppState {
        config: Arc::new(config),
        query_service: Arc::new(query_service),
    }
}
