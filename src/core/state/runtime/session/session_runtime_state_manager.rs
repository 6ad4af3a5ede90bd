use std::sync::Arc;
use uuid::Uuid;

use crate::core::state::runtime::session::session_runtime_state::{QuerySnapshot, SessionSummary};
use crate::core::state::runtime::session::session_runtime_state_repository_trait::SessionRuntimeStateRepositoryTrait;
use crate::domain::query::model::api_dialect::ProgramField;

pub struct SessionRuntimeStateManager<R: SessionRuntimeStateRepositoryTrait> {
    pub(crate) repo: Arc<R>,
}

impl<R: SessionRuntimeStateRepositoryTrait> SessionRuntimeStateManager<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Start a new invocation; it supersedes any still in flight.
    pub async fn begin_invocation(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.repo.update(|state| state.begin(id)).await;
        id
    }

    /// Commit a finished invocation. `false` means a newer one has begun and
    /// the snapshot was discarded.
    pub async fn commit(&self, snapshot: QuerySnapshot) -> bool {
        self.repo.update(move |state| state.commit(snapshot)).await
    }

    /// Record a failure (current snapshot remains intact).
    pub async fn record_failure(&self, message: String) {
        self.repo.update(|state| state.mark_error(message)).await;
    }

    pub async fn current(&self) -> Option<Arc<QuerySnapshot>> {
        self.repo.get().await.current.clone()
    }

    pub async fn cached_program_field(&self) -> Option<ProgramField> {
        self.repo.get().await.cached_program_field
    }

    pub async fn cache_program_field(&self, field: ProgramField) {
        self.repo
            .update(|state| state.cached_program_field = Some(field))
            .await;
    }

    pub async fn summary(&self) -> SessionSummary {
        self.repo.get().await.summary()
    }
}
